//! Note store trait definitions

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use trellis_core::{GraphPayload, NewNote, Note, NoteId, NoteSummary};

use crate::error::{StoreError, StoreResult};

/// The remote note store the link engine talks to
///
/// Note CRUD, revisions, visibility and attachments all live behind this
/// trait; the engine only needs title search, single-note reads, note
/// creation and the corpus graph.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Search notes by title, in the store's ranking order
    ///
    /// A query starting with `#` searches by tag name instead.
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>>;

    /// Get a note by id
    async fn get_note(&self, id: NoteId) -> StoreResult<Note>;

    /// Create a note and return the stored record
    async fn create_note(&self, note: NewNote) -> StoreResult<Note>;

    /// Read the whole graph: notes, links, tags and tag associations
    async fn get_graph(&self) -> StoreResult<GraphPayload>;

    /// Health check
    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl<S: NoteStore + ?Sized> NoteStore for Arc<S> {
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        (**self).search_notes(query).await
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        (**self).get_note(id).await
    }

    async fn create_note(&self, note: NewNote) -> StoreResult<Note> {
        (**self).create_note(note).await
    }

    async fn get_graph(&self) -> StoreResult<GraphPayload> {
        (**self).get_graph().await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        (**self).health_check().await
    }
}

/// Bound a store call; an elapsed limit becomes [`StoreError::Timeout`]
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
