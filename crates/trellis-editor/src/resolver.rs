//! Link resolution
//!
//! Turns the title of a clicked `[[link]]` into a navigation target: an
//! existing note, or the creation flow for a note that does not exist yet.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use trellis_core::{NewNote, Note, NoteId, NoteSummary};
use trellis_store::{with_timeout, NoteStore, StoreResult};

use crate::sequence::RequestSequencer;

/// Default bound on each store call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a link click should take the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Resolution {
    /// Navigate to an existing note
    Open { id: NoteId, title: String },

    /// Open the creation flow pre-filled with the link title
    ///
    /// `degraded` is set when the store could not be searched, so "missing"
    /// may really mean "unreachable".
    Create { title: String, degraded: bool },
}

impl Resolution {
    /// Host route for the resolution
    pub fn route(&self) -> String {
        match self {
            Self::Open { id, .. } => format!("/notes/{}", id),
            Self::Create { title, .. } => format!("/notes/new?title={}", urlencoding::encode(title)),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Create { degraded: true, .. })
    }
}

/// Pick the navigation target among search results
///
/// A case-insensitive exact title match anywhere in the results wins over
/// ranking; otherwise the top-ranked result is taken.
pub fn pick<'a>(title: &str, results: &'a [NoteSummary]) -> Option<&'a NoteSummary> {
    let wanted = title.to_lowercase();
    results
        .iter()
        .find(|note| note.title.to_lowercase() == wanted)
        .or_else(|| results.first())
}

/// Resolves link titles against a note store
pub struct LinkResolver<S> {
    store: S,
    timeout: Duration,
    sequencer: RequestSequencer,
}

impl<S: NoteStore> LinkResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve a link title
    ///
    /// Never fails: a store error or timeout is logged and routed to the
    /// creation flow with `degraded` set. A not-found answer from the store
    /// is an ordinary miss.
    pub async fn resolve(&self, title: &str) -> Resolution {
        match with_timeout(self.timeout, self.store.search_notes(title)).await {
            Ok(results) => match pick(title, &results) {
                Some(note) => {
                    tracing::debug!("Link {:?} resolved to note {}", title, note.id);
                    Resolution::Open {
                        id: note.id,
                        title: note.title.clone(),
                    }
                }
                None => Resolution::Create {
                    title: title.to_string(),
                    degraded: false,
                },
            },
            Err(e) if e.is_not_found() => {
                tracing::debug!("Search for link {:?} found nothing: {}", title, e);
                Resolution::Create {
                    title: title.to_string(),
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!("Search for link {:?} failed, offering creation: {}", title, e);
                Resolution::Create {
                    title: title.to_string(),
                    degraded: true,
                }
            }
        }
    }

    /// Resolve unless a newer resolution was started meanwhile
    pub async fn resolve_latest(&self, title: &str) -> Option<Resolution> {
        let ticket = self.sequencer.issue();
        let resolution = self.resolve(title).await;
        if self.sequencer.is_latest(ticket) {
            Some(resolution)
        } else {
            tracing::debug!("Dropping stale resolution #{} for {:?}", ticket.value(), title);
            None
        }
    }

    /// Run the creation flow for a missing link target
    pub async fn create_missing(&self, title: &str) -> StoreResult<Note> {
        let note = NewNote::from_link(title);
        trellis_core::limits::validate_title(&note.title)?;

        let created = with_timeout(self.timeout, self.store.create_note(note)).await?;
        tracing::info!("Created note {} for link {:?}", created.id, title);
        Ok(created)
    }

    /// Resolve, creating the note when no target exists
    pub async fn open_or_create(&self, title: &str) -> StoreResult<NoteSummary> {
        match self.resolve(title).await {
            Resolution::Open { id, title } => Ok(NoteSummary { id, title }),
            Resolution::Create { title, .. } => Ok(self.create_missing(&title).await?.summary()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStore;
    use std::sync::Arc;
    use trellis_store::MemoryStore;

    #[tokio::test]
    async fn test_exact_match_wins() {
        let resolver = LinkResolver::new(ScriptedStore::returning(&[(1, "Plan"), (2, "plan b")]));
        assert_eq!(
            resolver.resolve("Plan").await,
            Resolution::Open {
                id: NoteId(1),
                title: "Plan".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_exact_match_beats_ranking() {
        let resolver =
            LinkResolver::new(ScriptedStore::returning(&[(7, "Planning"), (3, "plan")]));
        assert_eq!(
            resolver.resolve("PLAN").await,
            Resolution::Open {
                id: NoteId(3),
                title: "plan".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_first_result_without_exact_match() {
        let resolver =
            LinkResolver::new(ScriptedStore::returning(&[(7, "Planning"), (3, "Plan B")]));
        let resolution = resolver.resolve("Plan").await;
        assert_eq!(resolution.route(), "/notes/7");
    }

    #[tokio::test]
    async fn test_no_results_routes_to_creation() {
        let resolver = LinkResolver::new(ScriptedStore::returning(&[]));
        let resolution = resolver.resolve("Ghost").await;

        assert_eq!(
            resolution,
            Resolution::Create {
                title: "Ghost".to_string(),
                degraded: false
            }
        );
        assert_eq!(resolution.route(), "/notes/new?title=Ghost");
    }

    #[tokio::test]
    async fn test_store_failure_is_degraded_creation() {
        let resolver = LinkResolver::new(ScriptedStore::failing());
        let resolution = resolver.resolve("Plan").await;
        assert!(resolution.is_degraded());
        assert_eq!(resolution.route(), "/notes/new?title=Plan");
    }

    #[tokio::test]
    async fn test_not_found_search_is_plain_creation() {
        let resolver = LinkResolver::new(ScriptedStore::answering_status(404));
        let resolution = resolver.resolve("Plan").await;
        assert!(!resolution.is_degraded());
        assert_eq!(resolution.route(), "/notes/new?title=Plan");
    }

    #[tokio::test]
    async fn test_timeout_is_degraded_creation() {
        let store = ScriptedStore::returning(&[(1, "Plan")])
            .slow_for("Plan", Duration::from_secs(10));
        let resolver = LinkResolver::new(store).with_timeout(Duration::from_millis(20));
        assert!(resolver.resolve("Plan").await.is_degraded());
    }

    #[tokio::test]
    async fn test_title_case_is_preserved() {
        let store = ScriptedStore::returning(&[]);
        let resolver = LinkResolver::new(store);
        resolver.resolve("Q3 Roadmap").await;
        assert_eq!(resolver.store().queries(), vec!["Q3 Roadmap".to_string()]);
    }

    #[tokio::test]
    async fn test_newer_resolution_supersedes() {
        let store = ScriptedStore::returning(&[(1, "Plan")])
            .slow_for("Slow", Duration::from_millis(50));
        let resolver = LinkResolver::new(store);

        let (slow, fast) = tokio::join!(resolver.resolve_latest("Slow"), resolver.resolve_latest("Plan"));
        assert_eq!(slow, None);
        assert!(fast.is_some());
    }

    #[tokio::test]
    async fn test_open_or_create() {
        let store = Arc::new(MemoryStore::new());
        let resolver = LinkResolver::new(Arc::clone(&store));

        let created = resolver.open_or_create("Meeting Notes").await.unwrap();
        let note = store.get_note(created.id).await.unwrap();
        assert_eq!(note.content, "# Meeting Notes\n\nStart writing here...");

        let opened = resolver.open_or_create("meeting notes").await.unwrap();
        assert_eq!(opened.id, created.id);
    }

    #[test]
    fn test_route_encoding() {
        let resolution = Resolution::Create {
            title: "Q3 & Q4".to_string(),
            degraded: false,
        };
        assert_eq!(resolution.route(), "/notes/new?title=Q3%20%26%20Q4");

        let resolution = Resolution::Create {
            title: "Café/Ideen".to_string(),
            degraded: false,
        };
        assert_eq!(resolution.route(), "/notes/new?title=Caf%C3%A9%2FIdeen");
    }
}
