//! In-memory note store
//!
//! Derives links and tags from note content the same way a server would:
//! `[[Title]]` targets resolve through the slug of the title, `#tags` are
//! created on first use.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use trellis_core::limits::validate_title;
use trellis_core::markup::{link_titles, tag_names};
use trellis_core::note::slugify;
use trellis_core::{
    GraphPayload, NewNote, Note, NoteId, NoteSummary, PayloadLink, PayloadNode, Tag, TagId,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::NoteStore;

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

#[derive(Default)]
struct State {
    notes: BTreeMap<NoteId, Note>,
    tags: BTreeMap<String, TagId>,
    next_note: i64,
    next_tag: i64,
}

impl State {
    fn tag_id(&mut self, name: &str) -> TagId {
        if let Some(id) = self.tags.get(name) {
            return *id;
        }
        self.next_tag += 1;
        let id = TagId(self.next_tag);
        self.tags.insert(name.to_string(), id);
        id
    }

    fn by_slug(&self, slug: &str) -> Option<NoteId> {
        self.notes.values().find(|n| n.slug == slug).map(|n| n.id)
    }
}

/// In-memory note store
///
/// Useful for testing and for running the engine without a server.
pub struct MemoryStore {
    state: RwLock<State>,
    search_limit: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Insert a note synchronously; used to seed stores
    pub fn insert(&self, new: NewNote) -> StoreResult<Note> {
        validate_title(&new.title)?;
        let slug = slugify(&new.title);

        let mut state = self
            .state
            .write()
            .map_err(|e| StoreError::Database(format!("Lock error: {}", e)))?;

        if state.by_slug(&slug).is_some() {
            return Err(StoreError::Duplicate(new.title));
        }

        let tags = tag_names(&new.content)
            .into_iter()
            .map(|name| Tag {
                id: state.tag_id(&name),
                name,
            })
            .collect();

        state.next_note += 1;
        let note = Note {
            id: NoteId(state.next_note),
            title: new.title,
            slug,
            content: new.content,
            visibility: new.visibility,
            is_favorite: false,
            tags,
            updated_at: Utc::now(),
        };
        state.notes.insert(note.id, note.clone());

        tracing::debug!("Stored note {} ({})", note.id, note.title);
        Ok(note)
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Database(format!("Lock error: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn search_notes(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        let state = self.read()?;

        let mut hits: Vec<&Note> = match query.strip_prefix('#') {
            Some(tag) => state
                .notes
                .values()
                .filter(|n| n.tags.iter().any(|t| t.name == tag))
                .collect(),
            None => {
                let needle = query.to_lowercase();
                state
                    .notes
                    .values()
                    .filter(|n| n.title.to_lowercase().contains(&needle))
                    .collect()
            }
        };

        // Most recently updated first; newer ids win ties
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(hits
            .into_iter()
            .take(self.search_limit)
            .map(Note::summary)
            .collect())
    }

    async fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        self.read()?
            .notes
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn create_note(&self, note: NewNote) -> StoreResult<Note> {
        self.insert(note)
    }

    async fn get_graph(&self) -> StoreResult<GraphPayload> {
        let state = self.read()?;
        let mut payload = GraphPayload::default();

        for note in state.notes.values() {
            payload.nodes.push(PayloadNode {
                id: note.id.0,
                title: note.title.clone(),
                group: Some(note.visibility.as_str().to_string()),
            });

            let targets: BTreeSet<NoteId> = link_titles(&note.content)
                .iter()
                .filter_map(|title| state.by_slug(&slugify(title)))
                .collect();
            payload
                .links
                .extend(targets.into_iter().map(|target| PayloadLink {
                    source: note.id.0,
                    target: target.0,
                }));

            payload.tag_links.extend(note.tags.iter().map(|tag| PayloadLink {
                source: note.id.0,
                target: tag.id.0,
            }));
        }

        payload.tags = state
            .tags
            .iter()
            .map(|(name, id)| PayloadNode {
                id: id.0,
                title: format!("#{}", name),
                group: Some("tag".to_string()),
            })
            .collect();

        Ok(payload)
    }
}
