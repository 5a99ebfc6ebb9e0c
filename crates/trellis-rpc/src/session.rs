//! Per-connection engine state
//!
//! A session owns everything one host surface interacts with: the current
//! document and its decorations, the link resolver and autocomplete
//! provider, and the graph view with its layout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use trellis_core::limits::validate_search;
use trellis_core::{
    Graph, GraphPayload, GraphSettings, GraphStats, GraphView, MaterializeOptions, Materializer,
    NoteSummary,
};
use trellis_editor::{
    AutocompleteProvider, Backlinks, Completion, Decorations, DecorationEngine,
    DocumentSnapshot, Interaction, LinkResolver, Modifiers, Resolution, Viewport,
};
use trellis_layout::controller::{DEFAULT_FIT_PADDING, FIT_TRANSITION_MS};
use trellis_layout::{Camera, LayoutController, NodePosition, RenderStyle};
use trellis_store::{with_timeout, NoteStore, StoreResult};

use crate::error::{RpcError, RpcResult};

/// Frame step used when settling the layout
const TICK_SECONDS: f32 = 0.016;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on every store call
    pub timeout: Duration,
    /// Only decorate spans inside the viewport
    pub prune_to_viewport: bool,
    /// Settings the graph view starts with
    pub settings: GraphSettings,
    pub materialize: MaterializeOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            prune_to_viewport: false,
            settings: GraphSettings::default(),
            materialize: MaterializeOptions::default(),
        }
    }
}

/// Result of a click on the document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClickOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
    /// Where a link click leads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// A newer click superseded this one
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

/// The graph to render with its drawing parameters
#[derive(Debug, Clone, Serialize)]
pub struct GraphFrame {
    pub graph: Arc<Graph>,
    pub stats: GraphStats,
    pub style: RenderStyle,
}

/// Settled node positions and the camera that fits them
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutFrame {
    pub positions: Vec<NodePosition>,
    pub camera: Camera,
    pub ticks: u32,
    pub transition_ms: u64,
}

pub struct Session<S> {
    store: Arc<S>,
    options: SessionOptions,
    document: Option<DocumentSnapshot>,
    decorations: DecorationEngine,
    resolver: Arc<LinkResolver<Arc<S>>>,
    autocomplete: Arc<AutocompleteProvider<Arc<S>>>,
    view: Option<GraphView>,
    layout: LayoutController,
    laid_out: Option<Arc<Graph>>,
}

/// Store-bound work started by a session method
///
/// The future owns what it needs, so the caller may keep serving requests
/// while it runs.
pub trait Pending<T>: Future<Output = T> + Send + 'static {}

impl<T, F: Future<Output = T> + Send + 'static> Pending<T> for F {}

impl<S: NoteStore + 'static> Session<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_options(store, SessionOptions::default())
    }

    pub fn with_options(store: Arc<S>, options: SessionOptions) -> Self {
        Self {
            resolver: Arc::new(
                LinkResolver::new(Arc::clone(&store)).with_timeout(options.timeout),
            ),
            autocomplete: Arc::new(
                AutocompleteProvider::new(Arc::clone(&store)).with_timeout(options.timeout),
            ),
            decorations: DecorationEngine::new()
                .with_viewport_pruning(options.prune_to_viewport),
            layout: LayoutController::new(options.settings.forces()),
            store,
            options,
            document: None,
            view: None,
            laid_out: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the document and return its decorations
    pub fn update_document(
        &mut self,
        text: String,
        version: u64,
        viewport: Option<Viewport>,
    ) -> Arc<Decorations> {
        let snapshot = DocumentSnapshot::new(text, version);
        let decorations = self.decorations.update(&snapshot, viewport);
        self.document = Some(snapshot);
        decorations
    }

    /// Dispatch a click
    ///
    /// The hit test runs against the current decorations right away; a link
    /// click is then resolved against the store by the returned future.
    pub fn click(&self, pos: usize, modifiers: Modifiers) -> RpcResult<impl Pending<ClickOutcome>> {
        if self.document.is_none() {
            return Err(RpcError::NoDocument);
        }

        let interaction = self.decorations.click(pos, modifiers);
        let resolver = Arc::clone(&self.resolver);
        Ok(async move {
            let Some(interaction) = interaction else {
                return ClickOutcome::default();
            };

            let mut outcome = ClickOutcome {
                interaction: Some(interaction.clone()),
                ..Default::default()
            };
            if let Interaction::OpenLink { title } = &interaction {
                match resolver.resolve_latest(title).await {
                    Some(resolution) => {
                        outcome.route = Some(resolution.route());
                        outcome.resolution = Some(resolution);
                    }
                    None => outcome.stale = true,
                }
            }
            outcome
        })
    }

    /// Creation flow for a link without a target
    pub fn create_note(&self, title: String) -> impl Pending<RpcResult<NoteSummary>> {
        let resolver = Arc::clone(&self.resolver);
        async move {
            let note = resolver.create_missing(&title).await?;
            Ok::<_, RpcError>(note.summary())
        }
    }

    pub fn complete(&self, text: String, cursor: usize, explicit: bool) -> impl Pending<Completion> {
        let autocomplete = Arc::clone(&self.autocomplete);
        async move { autocomplete.complete(&text, cursor, explicit).await }
    }

    /// Notes linking to `title`, with the text around each link
    pub fn backlinks(&self, title: String) -> impl Pending<RpcResult<Backlinks>> {
        let resolver = Arc::clone(&self.resolver);
        async move { resolver.backlinks(&title).await.map_err(RpcError::from) }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph
    // ─────────────────────────────────────────────────────────────────────────

    /// Refetch and materialize the corpus graph
    ///
    /// Returns the stats of the filtered graph under the current settings.
    pub async fn refresh_graph(&mut self) -> RpcResult<GraphStats> {
        let payload = self.fetch_graph().await?;
        self.apply_graph(&payload)
    }

    /// Fetch the raw graph without touching the session
    pub fn fetch_graph(&self) -> impl Pending<StoreResult<GraphPayload>> {
        let store = Arc::clone(&self.store);
        let timeout = self.options.timeout;
        async move { with_timeout(timeout, store.get_graph()).await }
    }

    /// Materialize a fetched graph into the view, keeping its settings
    pub fn apply_graph(&mut self, payload: &GraphPayload) -> RpcResult<GraphStats> {
        let raw = Arc::new(Materializer::materialize_with(
            payload,
            self.options.materialize,
        ));

        match &mut self.view {
            Some(view) => view.set_raw(raw),
            None => {
                self.view = Some(GraphView::with_settings(raw, self.options.settings.clone()))
            }
        }
        Ok(self.frame(None)?.stats)
    }

    /// The filtered graph, after optionally replacing the settings
    ///
    /// Out-of-range numbers are clamped to the slider ranges; an oversized
    /// search query is rejected.
    pub fn frame(&mut self, settings: Option<GraphSettings>) -> RpcResult<GraphFrame> {
        let view = self.view.as_mut().ok_or(RpcError::GraphNotLoaded)?;

        if let Some(settings) = settings {
            validate_search(&settings.search_query)?;
            view.set_settings(settings.clamped());
        }

        let graph = view.graph();
        let settings = view.settings().clone();

        self.layout.set_forces(settings.forces());
        let changed = !matches!(&self.laid_out, Some(prev) if Arc::ptr_eq(prev, &graph));
        if changed {
            self.layout.load(&graph);
            self.laid_out = Some(Arc::clone(&graph));
        }

        Ok(GraphFrame {
            stats: graph.stats(),
            style: RenderStyle::from_settings(&settings),
            graph,
        })
    }

    pub fn settings(&self) -> Option<&GraphSettings> {
        self.view.as_ref().map(GraphView::settings)
    }

    /// Settle the layout and fit it into a `width` x `height` viewport
    pub fn layout(&mut self, width: f64, height: f64, padding: Option<f64>) -> RpcResult<LayoutFrame> {
        if self.laid_out.is_none() {
            self.frame(None)?;
        }

        let ticks = self.layout.settle(TICK_SECONDS);
        Ok(LayoutFrame {
            positions: self.layout.positions(),
            camera: self
                .layout
                .fit_to_view(width, height, padding.unwrap_or(DEFAULT_FIT_PADDING)),
            ticks,
            transition_ms: FIT_TRANSITION_MS,
        })
    }

    /// Restart settling without moving any node
    pub fn reheat(&mut self) {
        self.layout.reheat();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_store::demo_store;

    fn session() -> Session<trellis_store::MemoryStore> {
        Session::new(Arc::new(demo_store().unwrap()))
    }

    #[tokio::test]
    async fn test_click_before_document() {
        let session = session();
        assert!(matches!(
            session.click(0, Modifiers::meta()),
            Err(RpcError::NoDocument)
        ));
    }

    #[tokio::test]
    async fn test_link_click_resolves() {
        let mut session = session();
        let text = "See [[roadmap]] and [[Nope]]";
        session.update_document(text.to_string(), 1, None);

        let hit = session.click(7, Modifiers::meta()).unwrap().await;
        assert_eq!(
            hit.interaction,
            Some(Interaction::OpenLink {
                title: "roadmap".to_string()
            })
        );
        assert_eq!(hit.route.as_deref(), Some("/notes/4"));

        let miss = session
            .click(text.find("Nope").unwrap(), Modifiers::ctrl())
            .unwrap()
            .await;
        assert_eq!(miss.route.as_deref(), Some("/notes/new?title=Nope"));

        let plain = session.click(7, Modifiers::none()).unwrap().await;
        assert_eq!(plain, ClickOutcome::default());
    }

    #[tokio::test]
    async fn test_graph_requires_refresh() {
        let mut session = session();
        assert!(matches!(session.frame(None), Err(RpcError::GraphNotLoaded)));

        let stats = session.refresh_graph().await.unwrap();
        assert_eq!(stats.nodes, 7);
        assert_eq!(stats.links, 8);
    }

    #[tokio::test]
    async fn test_click_sees_decorations_at_dispatch() {
        let mut session = session();
        session.update_document("[[Roadmap]]".to_string(), 1, None);
        let pending = session.click(3, Modifiers::meta()).unwrap();

        // The document moves on before the store answers
        session.update_document("plain".to_string(), 2, None);
        assert_eq!(pending.await.route.as_deref(), Some("/notes/4"));
    }

    #[tokio::test]
    async fn test_fetched_graph_applies_later() {
        let mut session = session();
        let fetch = session.fetch_graph();
        assert!(matches!(session.frame(None), Err(RpcError::GraphNotLoaded)));

        let payload = fetch.await.unwrap();
        assert_eq!(session.apply_graph(&payload).unwrap().nodes, 7);
        assert!(session.frame(None).is_ok());
    }

    #[tokio::test]
    async fn test_backlinks() {
        let session = session();
        let backlinks = session.backlinks("Home".to_string()).await.unwrap();
        assert_eq!(backlinks.links.len(), 1);
        assert_eq!(backlinks.links[0].title, "Standups");
        assert!(backlinks.links[0].snippet.contains("[[Home]]"));
    }

    #[tokio::test]
    async fn test_settings_are_clamped() {
        let mut session = session();
        session.refresh_graph().await.unwrap();

        let frame = session
            .frame(Some(GraphSettings {
                node_size: 500.0,
                show_arrows: false,
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(frame.style.node_radius, 20.0);
        assert_eq!(frame.style.arrow_length, 0.0);
    }

    #[tokio::test]
    async fn test_layout_frame() {
        let mut session = session();
        session.refresh_graph().await.unwrap();

        let frame = session.layout(800.0, 600.0, None).unwrap();
        assert_eq!(frame.positions.len(), 7);
        assert_eq!(frame.ticks, 100);
        assert_eq!(frame.transition_ms, 400);

        // Settled layouts do not move until reheated
        assert_eq!(session.layout(800.0, 600.0, None).unwrap().ticks, 0);
        session.reheat();
        assert_eq!(session.layout(800.0, 600.0, None).unwrap().ticks, 100);
    }
}
