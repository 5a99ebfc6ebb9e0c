//! Turn the store's graph payload into typed, degree-annotated pools

use std::collections::HashSet;

use crate::graph::{degrees, GraphEdge, GraphId, GraphNode, GraphPayload, NodeGroup};
use crate::note::{NoteId, TagId};

/// Materializer options
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    /// Count tag-association edges towards note degree
    pub count_tag_edges: bool,
}

/// The raw graph: note and tag pools kept apart
///
/// Built once per fetch and never mutated afterwards; the filter engine
/// decides per settings whether the tag pool joins the working set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGraph {
    pub notes: Vec<GraphNode>,
    pub links: Vec<GraphEdge>,
    pub tags: Vec<GraphNode>,
    pub tag_links: Vec<GraphEdge>,
}

impl RawGraph {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.tags.is_empty()
    }

    /// Look a node up in either pool
    pub fn node(&self, id: &GraphId) -> Option<&GraphNode> {
        let pool = if id.is_tag() { &self.tags } else { &self.notes };
        pool.iter().find(|n| n.id == *id)
    }
}

/// Builds a [`RawGraph`] from a [`GraphPayload`]
pub struct Materializer;

impl Materializer {
    /// Materialize with default options
    pub fn materialize(payload: &GraphPayload) -> RawGraph {
        Self::materialize_with(payload, MaterializeOptions::default())
    }

    pub fn materialize_with(payload: &GraphPayload, options: MaterializeOptions) -> RawGraph {
        let mut seen = HashSet::new();
        let mut notes: Vec<GraphNode> = payload
            .nodes
            .iter()
            .filter(|n| Self::first_sighting(&mut seen, GraphId::note(n.id)))
            .map(|n| {
                GraphNode::new(GraphId::note(n.id), &n.title, NodeGroup::from_wire(n.group.as_deref()))
            })
            .collect();

        let mut tags: Vec<GraphNode> = payload
            .tags
            .iter()
            .filter(|t| Self::first_sighting(&mut seen, GraphId::tag(t.id)))
            .map(|t| GraphNode::new(GraphId::tag(t.id), &t.title, NodeGroup::Tag))
            .collect();

        let links: Vec<GraphEdge> = payload
            .links
            .iter()
            .map(|l| GraphEdge::link(NoteId(l.source), NoteId(l.target)))
            .filter(|e| Self::keep_edge(e, &seen))
            .collect();

        let tag_links: Vec<GraphEdge> = payload
            .tag_links
            .iter()
            .map(|l| GraphEdge::tag_assoc(NoteId(l.source), TagId(l.target)))
            .filter(|e| Self::keep_edge(e, &seen))
            .collect();

        let counts = if options.count_tag_edges {
            degrees(links.iter().chain(tag_links.iter()))
        } else {
            degrees(&links)
        };
        let tag_counts = degrees(&tag_links);

        for node in &mut notes {
            node.degree = counts.get(&node.id).copied().unwrap_or(0);
        }
        for node in &mut tags {
            node.degree = tag_counts.get(&node.id).copied().unwrap_or(0);
        }

        tracing::debug!(
            "Materialized graph: {} notes, {} links, {} tags, {} tag links",
            notes.len(),
            links.len(),
            tags.len(),
            tag_links.len()
        );

        RawGraph {
            notes,
            links,
            tags,
            tag_links,
        }
    }

    fn first_sighting(seen: &mut HashSet<GraphId>, id: GraphId) -> bool {
        let fresh = seen.insert(id);
        if !fresh {
            tracing::warn!("Duplicate graph node {}, keeping the first", id);
        }
        fresh
    }

    fn keep_edge(edge: &GraphEdge, known: &HashSet<GraphId>) -> bool {
        let keep = known.contains(&edge.source) && known.contains(&edge.target);
        if !keep {
            tracing::warn!(
                "Dropping edge {} -> {}: endpoint not in payload",
                edge.source,
                edge.target
            );
        }
        keep
    }
}
