//! Live decoration engine
//!
//! Keeps the link and tag regions of a document in sync with the text
//! surface. Decorations are derived state: they are a pure function of the
//! current snapshot and viewport, and are only recomputed when either
//! changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trellis_core::{scan_links, scan_tags, LinkSpan, TagSpan};

pub const LINK_CLASS: &str = "cm-wikilink";
pub const TAG_CLASS: &str = "cm-hashtag";
pub const LINK_TOOLTIP: &str = "Cmd+Click to open note";
pub const TAG_TOOLTIP: &str = "Click to filter by this tag";

/// Immutable view of the document owned by the text surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    text: Arc<str>,
    version: u64,
}

impl DocumentSnapshot {
    pub fn new(text: impl Into<Arc<str>>, version: u64) -> Self {
        Self {
            text: text.into(),
            version,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Visible byte range of the document, half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub from: usize,
    pub to: usize,
}

impl Viewport {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Link,
    Tag,
}

impl RegionKind {
    pub fn class(&self) -> &'static str {
        match self {
            Self::Link => LINK_CLASS,
            Self::Tag => TAG_CLASS,
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            Self::Link => LINK_TOOLTIP,
            Self::Tag => TAG_TOOLTIP,
        }
    }
}

/// Interactive region as handed to the host surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub from: usize,
    pub to: usize,
    pub kind: RegionKind,
    pub class: &'static str,
    pub tooltip: &'static str,
}

impl Region {
    fn new(from: usize, to: usize, kind: RegionKind) -> Self {
        Self {
            from,
            to,
            kind,
            class: kind.class(),
            tooltip: kind.tooltip(),
        }
    }
}

/// Decorations of one (snapshot, viewport) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorations {
    /// The text the spans index into
    pub text: Arc<str>,
    pub version: u64,
    pub viewport: Option<Viewport>,
    pub links: Vec<LinkSpan>,
    pub tags: Vec<TagSpan>,
}

impl Decorations {
    /// Scan a snapshot
    ///
    /// Tags inside a link (`[[Issue #12]]`) belong to the link and are
    /// dropped. With a viewport, only spans intersecting it are kept.
    pub fn compute(snapshot: &DocumentSnapshot, viewport: Option<Viewport>) -> Self {
        let text = snapshot.text();
        let mut links = scan_links(text);
        let mut tags: Vec<TagSpan> = scan_tags(text)
            .into_iter()
            .filter(|tag| {
                !links
                    .iter()
                    .any(|link| link.span.overlaps(tag.span.from, tag.span.to))
            })
            .collect();

        if let Some(vp) = viewport {
            links.retain(|l| l.span.overlaps(vp.from, vp.to));
            tags.retain(|t| t.span.overlaps(vp.from, vp.to));
        }

        Self {
            text: Arc::clone(&snapshot.text),
            version: snapshot.version(),
            viewport,
            links,
            tags,
        }
    }

    /// All regions ordered by position
    pub fn regions(&self) -> Vec<Region> {
        let mut regions: Vec<Region> = self
            .links
            .iter()
            .map(|l| Region::new(l.span.from, l.span.to, RegionKind::Link))
            .chain(
                self.tags
                    .iter()
                    .map(|t| Region::new(t.span.from, t.span.to, RegionKind::Tag)),
            )
            .collect();
        regions.sort_by_key(|r| r.from);
        regions
    }

    /// Whether these decorations were computed for `snapshot`'s text
    pub fn annotates(&self, snapshot: &DocumentSnapshot) -> bool {
        self.version == snapshot.version
            && (Arc::ptr_eq(&self.text, &snapshot.text) || self.text == snapshot.text)
    }

    pub fn link_at(&self, pos: usize) -> Option<&LinkSpan> {
        self.links.iter().find(|l| l.span.contains(pos))
    }

    pub fn tag_at(&self, pos: usize) -> Option<&TagSpan> {
        self.tags.iter().find(|t| t.span.contains(pos))
    }
}

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub ctrl: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn meta() -> Self {
        Self {
            meta: true,
            ctrl: false,
        }
    }

    pub fn ctrl() -> Self {
        Self {
            meta: false,
            ctrl: true,
        }
    }

    /// Cmd on macOS, Ctrl elsewhere
    pub fn is_secondary(&self) -> bool {
        self.meta || self.ctrl
    }
}

/// What a click on a decorated region asks the host to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Resolve and open the link target
    OpenLink { title: String },
    /// Filter by the tag
    SelectTag { name: String },
}

/// Decoration engine for one document
#[derive(Debug, Default)]
pub struct DecorationEngine {
    prune_to_viewport: bool,
    current: Option<Arc<Decorations>>,
}

impl DecorationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only spans that intersect the viewport
    pub fn with_viewport_pruning(mut self, prune: bool) -> Self {
        self.prune_to_viewport = prune;
        self
    }

    /// Bring decorations up to date with the surface
    ///
    /// Returns the cached decorations when neither the document nor the
    /// viewport changed. A reused version number with different text still
    /// recomputes.
    pub fn update(
        &mut self,
        snapshot: &DocumentSnapshot,
        viewport: Option<Viewport>,
    ) -> Arc<Decorations> {
        let viewport = if self.prune_to_viewport {
            viewport
        } else {
            None
        };

        if let Some(current) = &self.current {
            if current.annotates(snapshot) && current.viewport == viewport {
                return Arc::clone(current);
            }
        }

        let decorations = Arc::new(Decorations::compute(snapshot, viewport));
        tracing::debug!(
            "Decorated v{}: {} links, {} tags",
            decorations.version,
            decorations.links.len(),
            decorations.tags.len()
        );
        self.current = Some(Arc::clone(&decorations));
        decorations
    }

    pub fn current(&self) -> Option<&Arc<Decorations>> {
        self.current.as_ref()
    }

    /// Dispatch a click at byte offset `pos`
    ///
    /// A link opens only with a secondary modifier; a tag reacts to any
    /// click.
    pub fn click(&self, pos: usize, modifiers: Modifiers) -> Option<Interaction> {
        let decorations = self.current.as_ref()?;

        if let Some(link) = decorations.link_at(pos) {
            return modifiers.is_secondary().then(|| Interaction::OpenLink {
                title: link.title().to_string(),
            });
        }

        decorations.tag_at(pos).map(|tag| Interaction::SelectTag {
            name: tag.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "See [[Plan|the plan]] and #ops, also [[Issue #12]].";

    fn engine_with(text: &str) -> DecorationEngine {
        let mut engine = DecorationEngine::new();
        engine.update(&DocumentSnapshot::new(text, 1), None);
        engine
    }

    #[test]
    fn test_link_and_tag_regions() {
        let engine = engine_with(DOC);
        let decorations = engine.current().unwrap();

        assert_eq!(decorations.links.len(), 2);
        // `#12` sits inside a link and is not a tag
        assert_eq!(decorations.tags.len(), 1);
        assert_eq!(decorations.tags[0].name(), "ops");

        let regions = decorations.regions();
        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].class, "cm-wikilink");
        assert_eq!(regions[0].tooltip, "Cmd+Click to open note");
        assert_eq!(regions[1].class, "cm-hashtag");
        assert_eq!(regions[1].tooltip, "Click to filter by this tag");
    }

    #[test]
    fn test_recompute_only_on_change() {
        let mut engine = DecorationEngine::new();
        let v1 = DocumentSnapshot::new(DOC, 1);

        let first = engine.update(&v1, None);
        let again = engine.update(&v1, None);
        assert!(Arc::ptr_eq(&first, &again));

        let v2 = DocumentSnapshot::new("no markup", 2);
        let second = engine.update(&v2, None);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.links.is_empty());
    }

    #[test]
    fn test_same_version_new_text_recomputes() {
        let mut engine = DecorationEngine::new();
        engine.update(&DocumentSnapshot::new("[[A]]", 1), None);

        let text = "xxxxxx [[B]] #t";
        let decorations = engine.update(&DocumentSnapshot::new(text, 1), None);
        assert_eq!(decorations.links.len(), 1);
        assert_eq!(decorations.links[0].title(), "B");
        assert_eq!(decorations.tags.len(), 1);
        assert_eq!(&*decorations.text, text);

        assert_eq!(
            engine.click(text.find('B').unwrap(), Modifiers::meta()),
            Some(Interaction::OpenLink {
                title: "B".to_string()
            })
        );
    }

    #[test]
    fn test_equal_text_in_new_allocation_is_cached() {
        let mut engine = DecorationEngine::new();
        let first = engine.update(&DocumentSnapshot::new(DOC, 3), None);
        let again = engine.update(&DocumentSnapshot::new(DOC.to_string(), 3), None);
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn test_viewport_pruning() {
        let mut engine = DecorationEngine::new().with_viewport_pruning(true);
        let snapshot = DocumentSnapshot::new(DOC, 1);

        // Covers only the first link
        let first = engine.update(&snapshot, Some(Viewport::new(0, 10)));
        assert_eq!(first.links.len(), 1);
        assert!(first.tags.is_empty());

        // Scrolling recomputes even though the version is unchanged
        let scrolled = engine.update(&snapshot, Some(Viewport::new(20, DOC.len())));
        assert_eq!(scrolled.links.len(), 2);
        assert_eq!(scrolled.tags.len(), 1);
    }

    #[test]
    fn test_viewport_ignored_without_pruning() {
        let mut engine = DecorationEngine::new();
        let snapshot = DocumentSnapshot::new(DOC, 1);

        let first = engine.update(&snapshot, Some(Viewport::new(0, 10)));
        let second = engine.update(&snapshot, Some(Viewport::new(20, 30)));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.links.len(), 2);
    }

    #[test]
    fn test_link_click_needs_modifier() {
        let engine = engine_with(DOC);
        let inside_link = DOC.find("the plan").unwrap();

        assert_eq!(engine.click(inside_link, Modifiers::none()), None);
        assert_eq!(
            engine.click(inside_link, Modifiers::meta()),
            Some(Interaction::OpenLink {
                title: "Plan".to_string()
            })
        );
        assert_eq!(
            engine.click(inside_link, Modifiers::ctrl()),
            Some(Interaction::OpenLink {
                title: "Plan".to_string()
            })
        );
    }

    #[test]
    fn test_tag_click_without_modifier() {
        let engine = engine_with(DOC);
        let on_tag = DOC.find("#ops").unwrap() + 1;

        assert_eq!(
            engine.click(on_tag, Modifiers::none()),
            Some(Interaction::SelectTag {
                name: "ops".to_string()
            })
        );
    }

    #[test]
    fn test_hash_inside_link_opens_link() {
        let engine = engine_with(DOC);
        let on_hash = DOC.find("#12").unwrap();

        assert_eq!(
            engine.click(on_hash, Modifiers::meta()),
            Some(Interaction::OpenLink {
                title: "Issue #12".to_string()
            })
        );
        assert_eq!(engine.click(on_hash, Modifiers::none()), None);
    }

    #[test]
    fn test_click_on_plain_text() {
        let engine = engine_with(DOC);
        assert_eq!(engine.click(0, Modifiers::meta()), None);
        assert_eq!(DecorationEngine::new().click(0, Modifiers::meta()), None);
    }

    #[test]
    fn test_interaction_wire_format() {
        let json = serde_json::to_value(Interaction::SelectTag {
            name: "ops".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "select_tag");
        assert_eq!(json["name"], "ops");
    }
}
