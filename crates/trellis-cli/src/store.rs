//! Store selection

use std::time::Duration;

use async_trait::async_trait;
use trellis_core::{GraphPayload, NewNote, Note, NoteId, NoteSummary};
use trellis_store::{demo_store, HttpStore, MemoryStore, NoteStore, StoreResult};

/// The store a command runs against
pub enum Backend {
    Http(HttpStore),
    Demo(MemoryStore),
}

impl Backend {
    pub fn http(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        Ok(Self::Http(HttpStore::with_timeout(base_url, timeout)?))
    }

    pub fn demo() -> StoreResult<Self> {
        Ok(Self::Demo(demo_store()?))
    }

    fn inner(&self) -> &dyn NoteStore {
        match self {
            Self::Http(store) => store,
            Self::Demo(store) => store,
        }
    }
}

#[async_trait]
impl NoteStore for Backend {
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        self.inner().search_notes(query).await
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        self.inner().get_note(id).await
    }

    async fn create_note(&self, note: NewNote) -> StoreResult<Note> {
        self.inner().create_note(note).await
    }

    async fn get_graph(&self) -> StoreResult<GraphPayload> {
        self.inner().get_graph().await
    }

    async fn health_check(&self) -> StoreResult<bool> {
        self.inner().health_check().await
    }
}
