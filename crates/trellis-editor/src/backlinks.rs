//! Backlinks: the notes whose content links to a given note

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trellis_core::markup::link_snippet;
use trellis_core::{NoteId, NoteSummary};
use trellis_store::{with_timeout, NoteStore, StoreResult};

use crate::resolver::{pick, LinkResolver};

/// Characters of context kept on each side of a backlink
pub const SNIPPET_CONTEXT: usize = 40;

/// A note linking to the target, with the text around the link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlink {
    pub id: NoteId,
    pub title: String,
    pub snippet: String,
}

/// Backlinks of a title
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backlinks {
    /// The note the title resolved to; `None` when nothing matched
    pub target: Option<NoteSummary>,
    pub links: Vec<Backlink>,
}

impl<S: NoteStore> LinkResolver<S> {
    /// Find the notes linking to the note `title` resolves to
    ///
    /// Sources come from the store's graph, in graph order. A source whose
    /// content cannot be fetched is still listed, with an empty snippet.
    pub async fn backlinks(&self, title: &str) -> StoreResult<Backlinks> {
        let results = with_timeout(self.timeout(), self.store().search_notes(title)).await?;
        let Some(target) = pick(title, &results).cloned() else {
            tracing::debug!("No note matches {:?}, no backlinks", title);
            return Ok(Backlinks::default());
        };

        let graph = with_timeout(self.timeout(), self.store().get_graph()).await?;
        let sources: BTreeSet<i64> = graph
            .links
            .iter()
            .filter(|link| link.target == target.id.0 && link.source != target.id.0)
            .map(|link| link.source)
            .collect();

        let mut links = Vec::with_capacity(sources.len());
        for node in graph.nodes.iter().filter(|node| sources.contains(&node.id)) {
            let id = NoteId(node.id);
            let snippet = match with_timeout(self.timeout(), self.store().get_note(id)).await {
                Ok(note) => {
                    let snippet = link_snippet(&note.content, &target.title, SNIPPET_CONTEXT);
                    if snippet.is_empty() {
                        link_snippet(&note.content, title, SNIPPET_CONTEXT)
                    } else {
                        snippet
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not read backlink source {}: {}", id, e);
                    String::new()
                }
            };
            links.push(Backlink {
                id,
                title: node.title.clone(),
                snippet,
            });
        }

        tracing::debug!("{} backlinks to {:?}", links.len(), target.title);
        Ok(Backlinks {
            target: Some(target),
            links,
        })
    }
}
