//! Graph node and edge types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::note::{NoteId, TagId};

/// Identifier of a graph node
///
/// Notes and tags are numbered independently by the store, so the kind is
/// part of the identity: `Note(1)` and `Tag(1)` are different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum GraphId {
    Note(NoteId),
    Tag(TagId),
}

impl GraphId {
    pub fn note(id: i64) -> Self {
        Self::Note(NoteId(id))
    }

    pub fn tag(id: i64) -> Self {
        Self::Tag(TagId(id))
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// The note this node opens, if it is a note
    pub fn as_note(&self) -> Option<NoteId> {
        match self {
            Self::Note(id) => Some(*id),
            Self::Tag(_) => None,
        }
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note(id) => write!(f, "note:{}", id),
            Self::Tag(id) => write!(f, "tag:{}", id),
        }
    }
}

/// Colour group of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    #[default]
    Public,
    Team,
    Private,
    Tag,
}

impl NodeGroup {
    /// Map the store's free-form group string; unknown or missing is public
    pub fn from_wire(group: Option<&str>) -> Self {
        match group.map(str::to_ascii_lowercase).as_deref() {
            Some("team") => Self::Team,
            Some("private") => Self::Private,
            Some("tag") => Self::Tag,
            _ => Self::Public,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Team => "team",
            Self::Private => "private",
            Self::Tag => "tag",
        }
    }
}

/// A node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: GraphId,
    pub title: String,
    pub group: NodeGroup,

    /// Edges touching this node in whichever edge set produced it
    #[serde(default)]
    pub degree: usize,
}

impl GraphNode {
    pub fn new(id: GraphId, title: impl Into<String>, group: NodeGroup) -> Self {
        Self {
            id,
            title: title.into(),
            group,
            degree: 0,
        }
    }
}

/// Kind of edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Note links to note through `[[...]]`
    Link,
    /// Note carries a `#tag`
    TagAssoc,
}

/// An edge between two nodes
///
/// Direction only matters for drawing arrowheads; degree and orphan checks
/// treat edges as undirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: GraphId,
    pub target: GraphId,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn link(source: NoteId, target: NoteId) -> Self {
        Self {
            source: GraphId::Note(source),
            target: GraphId::Note(target),
            kind: EdgeKind::Link,
        }
    }

    pub fn tag_assoc(note: NoteId, tag: TagId) -> Self {
        Self {
            source: GraphId::Note(note),
            target: GraphId::Tag(tag),
            kind: EdgeKind::TagAssoc,
        }
    }

    pub fn touches(&self, id: &GraphId) -> bool {
        self.source == *id || self.target == *id
    }
}

/// Count, for every endpoint, the edges touching it
///
/// A self-loop counts twice for its node, once per endpoint.
pub fn degrees<'a>(edges: impl IntoIterator<Item = &'a GraphEdge>) -> HashMap<GraphId, usize> {
    let mut counts = HashMap::new();
    for edge in edges {
        *counts.entry(edge.source).or_insert(0) += 1;
        *counts.entry(edge.target).or_insert(0) += 1;
    }
    counts
}

/// A renderable set of nodes and edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(mut self, nodes: Vec<GraphNode>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_edges(mut self, edges: Vec<GraphEdge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn node(&self, id: &GraphId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == *id)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            links: self.edges.len(),
        }
    }
}

/// Node and edge counts shown next to the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub links: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Nodes • {} Links", self.nodes, self.links)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire payload
// ─────────────────────────────────────────────────────────────────────────────

/// Node as sent by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadNode {
    pub id: i64,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Edge as sent by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadLink {
    pub source: i64,
    pub target: i64,
}

/// Raw `GET /graph` response
///
/// `links` join notes to notes; `tag_links` join a note (source) to a tag
/// (target). Older stores omit the tag pools entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<PayloadNode>,
    #[serde(default)]
    pub links: Vec<PayloadLink>,
    #[serde(default)]
    pub tags: Vec<PayloadNode>,
    #[serde(default, rename = "tagLinks")]
    pub tag_links: Vec<PayloadLink>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let graph = Graph::new().with_nodes(vec![]).with_edges(vec![]);

        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.stats().to_string(), "0 Nodes • 0 Links");
    }

    #[test]
    fn test_ids_do_not_collide_across_kinds() {
        assert_ne!(GraphId::note(1), GraphId::tag(1));
        assert_eq!(GraphId::note(1).to_string(), "note:1");
        assert_eq!(
            serde_json::to_value(GraphId::tag(3)).unwrap(),
            serde_json::json!({"kind": "tag", "id": 3})
        );
    }

    #[test]
    fn test_degrees_count_both_endpoints() {
        let edges = vec![
            GraphEdge::link(NoteId(1), NoteId(2)),
            GraphEdge::link(NoteId(2), NoteId(3)),
        ];
        let counts = degrees(&edges);
        assert_eq!(counts[&GraphId::note(1)], 1);
        assert_eq!(counts[&GraphId::note(2)], 2);
        assert_eq!(counts.get(&GraphId::note(4)), None);
    }

    #[test]
    fn test_payload_without_tag_pools() {
        let json = r#"{
            "nodes": [{"id": 1, "title": "Home", "group": "public"}, {"id": 2, "title": "Eng"}],
            "links": [{"source": 1, "target": 2}]
        }"#;
        let payload: GraphPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.nodes[1].group, None);
        assert!(payload.tags.is_empty());
        assert!(payload.tag_links.is_empty());
    }

    #[test]
    fn test_node_group_from_wire() {
        assert_eq!(NodeGroup::from_wire(Some("Team")), NodeGroup::Team);
        assert_eq!(NodeGroup::from_wire(Some("weird")), NodeGroup::Public);
        assert_eq!(NodeGroup::from_wire(None), NodeGroup::Public);
    }
}
