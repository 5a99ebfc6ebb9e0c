//! Trellis Core - Link markup and knowledge-graph engine
//!
//! This crate provides the markup matchers that find `[[links]]` and
//! `#tags` in note text, and the graph pipeline that turns the store's raw
//! graph into the filtered node/edge set a renderer draws.

pub mod filter;
pub mod graph;
pub mod limits;
pub mod markup;
pub mod materialize;
pub mod note;
pub mod settings;

pub use filter::{FilterEngine, GraphView};
pub use graph::{
    EdgeKind, Graph, GraphEdge, GraphId, GraphNode, GraphPayload, GraphStats, NodeGroup,
    PayloadLink, PayloadNode,
};
pub use markup::{scan_links, scan_tags, LinkSpan, MatchSpan, TagSpan};
pub use materialize::{MaterializeOptions, Materializer, RawGraph};
pub use note::{NewNote, Note, NoteId, NoteSummary, Tag, TagId, Visibility};
pub use settings::{FilterKey, ForceParams, GraphSettings};
