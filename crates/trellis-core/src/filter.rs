//! Settings-driven graph filtering

use std::collections::HashSet;
use std::sync::Arc;

use crate::graph::{degrees, Graph, GraphEdge, GraphId, GraphNode};
use crate::materialize::RawGraph;
use crate::settings::{FilterKey, GraphSettings};

/// Graph filter engine
///
/// `apply` is a pure function of (raw graph, settings): the output is always
/// rebuilt from scratch and never shares nodes with a previous output.
pub struct FilterEngine;

impl FilterEngine {
    /// Compute the graph to render
    pub fn apply(raw: &RawGraph, settings: &GraphSettings) -> Graph {
        Self::apply_key(raw, &settings.filter_key())
    }

    fn apply_key(raw: &RawGraph, key: &FilterKey) -> Graph {
        tracing::debug!(
            "Filtering graph: search={:?}, orphans={}, tags={}",
            key.search_query,
            key.show_orphans,
            key.show_tags
        );

        // 1. Working set
        let mut nodes: Vec<&GraphNode> = raw.notes.iter().collect();
        let mut edges: Vec<&GraphEdge> = raw.links.iter().collect();
        if key.show_tags {
            nodes.extend(raw.tags.iter());
            edges.extend(raw.tag_links.iter());
        }

        // 2. Title search
        let query = key.search_query.to_lowercase();
        if !query.is_empty() {
            nodes.retain(|n| n.title.to_lowercase().contains(&query));
        }

        // Edges only survive between surviving nodes
        let present: HashSet<GraphId> = nodes.iter().map(|n| n.id).collect();
        edges.retain(|e| present.contains(&e.source) && present.contains(&e.target));

        // 3. Orphans
        if !key.show_orphans {
            let connected: HashSet<GraphId> =
                edges.iter().flat_map(|e| [e.source, e.target]).collect();
            nodes.retain(|n| connected.contains(&n.id));
        }

        // 4. Degree against what is actually shown
        let counts = degrees(edges.iter().copied());
        let nodes: Vec<GraphNode> = nodes
            .into_iter()
            .map(|n| GraphNode {
                degree: counts.get(&n.id).copied().unwrap_or(0),
                ..n.clone()
            })
            .collect();

        // 5. Fresh edges holding bare ids
        let edges: Vec<GraphEdge> = edges.into_iter().copied().collect();

        tracing::debug!("Filtered graph: {} nodes, {} edges", nodes.len(), edges.len());

        Graph { nodes, edges }
    }
}

/// Memoized view over one raw graph
///
/// Holds the raw graph read-only and caches the last filtered output. A
/// settings change that leaves [`FilterKey`] unchanged (node size, forces,
/// labels, ...) reuses the cached graph.
pub struct GraphView {
    raw: Arc<RawGraph>,
    settings: GraphSettings,
    cached: Option<(FilterKey, Arc<Graph>)>,
}

impl GraphView {
    pub fn new(raw: Arc<RawGraph>) -> Self {
        Self::with_settings(raw, GraphSettings::default())
    }

    pub fn with_settings(raw: Arc<RawGraph>, settings: GraphSettings) -> Self {
        Self {
            raw,
            settings,
            cached: None,
        }
    }

    pub fn raw(&self) -> &Arc<RawGraph> {
        &self.raw
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Replace the raw graph after a refetch
    pub fn set_raw(&mut self, raw: Arc<RawGraph>) {
        self.raw = raw;
        self.cached = None;
    }

    pub fn set_settings(&mut self, settings: GraphSettings) {
        self.settings = settings;
    }

    /// Apply a change to the settings in place
    pub fn update_settings(&mut self, f: impl FnOnce(&mut GraphSettings)) {
        f(&mut self.settings);
    }

    /// The filtered graph for the current settings
    pub fn graph(&mut self) -> Arc<Graph> {
        let key = self.settings.filter_key();
        if let Some((cached_key, graph)) = &self.cached {
            if *cached_key == key {
                return Arc::clone(graph);
            }
        }

        let graph = Arc::new(FilterEngine::apply_key(&self.raw, &key));
        self.cached = Some((key, Arc::clone(&graph)));
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphPayload, PayloadLink, PayloadNode};
    use crate::materialize::Materializer;

    fn node(id: i64, title: &str) -> PayloadNode {
        PayloadNode {
            id,
            title: title.to_string(),
            group: Some("team".to_string()),
        }
    }

    fn link(source: i64, target: i64) -> PayloadLink {
        PayloadLink { source, target }
    }

    fn create_test_graph() -> RawGraph {
        // Home -> Engineering -> Roadmap, Home -> Product, Archive alone
        // #eng tags Engineering and Roadmap
        Materializer::materialize(&GraphPayload {
            nodes: vec![
                node(1, "Home"),
                node(2, "Engineering"),
                node(3, "Product"),
                node(4, "Roadmap"),
                node(5, "Archive"),
            ],
            links: vec![link(1, 2), link(1, 3), link(2, 4)],
            tags: vec![node(1, "#eng")],
            tag_links: vec![link(2, 1), link(4, 1)],
        })
    }

    fn ids(graph: &Graph) -> Vec<GraphId> {
        graph.nodes.iter().map(|n| n.id).collect()
    }

    fn assert_referential_integrity(graph: &Graph) {
        let present: HashSet<GraphId> = graph.nodes.iter().map(|n| n.id).collect();
        for edge in &graph.edges {
            assert!(present.contains(&edge.source), "dangling source {}", edge.source);
            assert!(present.contains(&edge.target), "dangling target {}", edge.target);
        }
    }

    #[test]
    fn test_default_settings_show_notes_only() {
        let raw = create_test_graph();
        let graph = FilterEngine::apply(&raw, &GraphSettings::default());

        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.nodes.iter().all(|n| !n.id.is_tag()));
    }

    #[test]
    fn test_orphans_hidden_keeps_degrees() {
        let raw = Materializer::materialize(&GraphPayload {
            nodes: vec![node(1, "A"), node(2, "B"), node(3, "C")],
            links: vec![link(1, 2)],
            ..Default::default()
        });
        let graph = FilterEngine::apply(&raw, &GraphSettings::default().with_orphans(false));

        assert_eq!(ids(&graph), vec![GraphId::note(1), GraphId::note(2)]);
        assert!(graph.nodes.iter().all(|n| n.degree == 1));
    }

    #[test]
    fn test_search_drops_edges_of_filtered_nodes() {
        let raw = Materializer::materialize(&GraphPayload {
            nodes: vec![node(1, "Engineering"), node(2, "Product")],
            links: vec![link(1, 2)],
            ..Default::default()
        });
        let graph = FilterEngine::apply(&raw, &GraphSettings::default().with_search("eng"));

        assert_eq!(ids(&graph), vec![GraphId::note(1)]);
        assert!(graph.edges.is_empty());
        assert_eq!(graph.nodes[0].degree, 0);
    }

    #[test]
    fn test_tags_join_the_working_set() {
        let raw = create_test_graph();
        let graph = FilterEngine::apply(&raw, &GraphSettings::default().with_tags(true));

        assert_eq!(graph.nodes.len(), 6);
        assert_eq!(graph.edges.len(), 5);
        let engineering = graph.node(&GraphId::note(2)).unwrap();
        // Home link, Roadmap link, #eng association
        assert_eq!(engineering.degree, 3);
        assert_eq!(graph.node(&GraphId::tag(1)).unwrap().degree, 2);
        assert_referential_integrity(&graph);
    }

    #[test]
    fn test_degree_reflects_filtered_edges() {
        let raw = create_test_graph();
        let graph = FilterEngine::apply(&raw, &GraphSettings::default().with_search("o"));

        // Home, Product, Roadmap survive; Engineering ("o"-less) drops
        assert_eq!(
            ids(&graph),
            vec![GraphId::note(1), GraphId::note(3), GraphId::note(4)]
        );
        assert_eq!(graph.node(&GraphId::note(1)).unwrap().degree, 1);
        assert_eq!(graph.node(&GraphId::note(4)).unwrap().degree, 0);
        assert_referential_integrity(&graph);
    }

    #[test]
    fn test_orphan_toggle_is_reversible() {
        let raw = create_test_graph();
        let settings = GraphSettings::default().with_tags(true).with_search("e");

        let shown = FilterEngine::apply(&raw, &settings);
        let hidden = FilterEngine::apply(&raw, &settings.clone().with_orphans(false));
        let restored = FilterEngine::apply(&raw, &settings);

        let orphans: Vec<GraphId> = shown
            .nodes
            .iter()
            .filter(|n| n.degree == 0)
            .map(|n| n.id)
            .collect();
        assert!(!orphans.is_empty());
        for node in &shown.nodes {
            let kept = hidden.node(&node.id).is_some();
            assert_eq!(kept, node.degree > 0, "node {}", node.id);
        }
        assert_eq!(shown, restored);
    }

    #[test]
    fn test_referential_integrity_across_settings() {
        let raw = create_test_graph();
        for query in ["", "e", "eng", "road", "zzz"] {
            for orphans in [true, false] {
                for tags in [true, false] {
                    let settings = GraphSettings::default()
                        .with_search(query)
                        .with_orphans(orphans)
                        .with_tags(tags);
                    assert_referential_integrity(&FilterEngine::apply(&raw, &settings));
                }
            }
        }
    }

    #[test]
    fn test_view_reuses_output_for_display_changes() {
        let mut view = GraphView::new(Arc::new(create_test_graph()));
        let first = view.graph();

        view.update_settings(|s| {
            s.node_size = 12.0;
            s.repel_force = -900.0;
        });
        assert!(Arc::ptr_eq(&first, &view.graph()));

        view.update_settings(|s| s.show_orphans = false);
        let second = view.graph();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.nodes.len(), 4);
    }
}
