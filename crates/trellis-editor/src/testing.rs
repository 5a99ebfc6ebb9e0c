//! Scripted note store for tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use trellis_core::{GraphPayload, NewNote, Note, NoteId, NoteSummary};
use trellis_store::{MemoryStore, NoteStore, StoreError, StoreResult};

/// Returns fixed search results in a fixed order, optionally slowly or not
/// at all. Notes created through it land in an inner [`MemoryStore`].
#[derive(Default)]
pub struct ScriptedStore {
    results: Vec<NoteSummary>,
    slow_query: Option<(String, Duration)>,
    failure: Option<u16>,
    queries: Mutex<Vec<String>>,
    notes: MemoryStore,
}

impl ScriptedStore {
    pub fn returning(results: &[(i64, &str)]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(id, title)| NoteSummary {
                    id: NoteId(*id),
                    title: title.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self::answering_status(503)
    }

    /// Answer every search with an HTTP error status
    pub fn answering_status(status: u16) -> Self {
        Self {
            failure: Some(status),
            ..Default::default()
        }
    }

    /// Delay answers to `query` by `delay`
    pub fn slow_for(mut self, query: &str, delay: Duration) -> Self {
        self.slow_query = Some((query.to_string(), delay));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteStore for ScriptedStore {
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        self.queries.lock().unwrap().push(query.to_string());

        if let Some((slow, delay)) = &self.slow_query {
            if slow == query {
                tokio::time::sleep(*delay).await;
            }
        }
        if let Some(status) = self.failure {
            return Err(StoreError::Status {
                status,
                body: "unavailable".to_string(),
            });
        }
        Ok(self.results.clone())
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        self.notes.get_note(id).await
    }

    async fn create_note(&self, note: NewNote) -> StoreResult<Note> {
        if self.failure.is_some() {
            return Err(StoreError::Timeout(Duration::from_secs(5)));
        }
        self.notes.create_note(note).await
    }

    async fn get_graph(&self) -> StoreResult<GraphPayload> {
        self.notes.get_graph().await
    }
}
