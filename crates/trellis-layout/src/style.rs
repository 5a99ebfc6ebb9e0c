//! Render style derived from graph settings

use serde::Serialize;
use trellis_core::{GraphId, GraphNode, GraphSettings, NodeGroup};

pub const COLOR_PUBLIC: &str = "#22c55e";
pub const COLOR_TEAM: &str = "#3b82f6";
pub const COLOR_PRIVATE: &str = "#ef4444";
pub const COLOR_TAG: &str = "#a855f7";
pub const COLOR_HOVERED: &str = "#3b82f6";

pub const LINK_COLOR: &str = "rgba(148, 163, 184, 0.4)";
pub const LABEL_COLOR: &str = "rgba(30, 41, 59, 0.9)";
pub const BACKGROUND_COLOR: &str = "#f8fafc";

/// Arrowhead length when arrows are on
pub const ARROW_LENGTH: f64 = 4.0;

/// Label font size at zoom 1
pub const BASE_FONT_SIZE: f64 = 12.0;

pub fn node_color(group: NodeGroup, hovered: bool) -> &'static str {
    if hovered {
        return COLOR_HOVERED;
    }
    match group {
        NodeGroup::Public => COLOR_PUBLIC,
        NodeGroup::Team => COLOR_TEAM,
        NodeGroup::Private => COLOR_PRIVATE,
        NodeGroup::Tag => COLOR_TAG,
    }
}

/// Drawing parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderStyle {
    pub node_radius: f64,
    pub link_width: f64,
    pub arrow_length: f64,
    pub show_labels: bool,
    pub text_fade_threshold: f64,
}

impl RenderStyle {
    pub fn from_settings(settings: &GraphSettings) -> Self {
        Self {
            node_radius: settings.node_size,
            link_width: settings.link_thickness,
            arrow_length: if settings.show_arrows {
                ARROW_LENGTH
            } else {
                0.0
            },
            show_labels: settings.show_labels,
            text_fade_threshold: settings.text_fade_threshold,
        }
    }

    /// Labels fade in once the zoom reaches the threshold
    pub fn label_visible(&self, zoom: f64) -> bool {
        self.show_labels && zoom >= self.text_fade_threshold
    }

    /// Font size in graph units, so labels keep their screen size
    pub fn font_size(&self, zoom: f64) -> f64 {
        BASE_FONT_SIZE / zoom.max(f64::EPSILON)
    }

    pub fn node(&self, node: &GraphNode, hovered: Option<GraphId>, zoom: f64) -> NodeStyle {
        NodeStyle {
            id: node.id,
            color: node_color(node.group, hovered == Some(node.id)),
            radius: self.node_radius,
            label: self.label_visible(zoom).then(|| node.title.clone()),
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from_settings(&GraphSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeStyle {
    pub id: GraphId,
    pub color: &'static str,
    pub radius: f64,
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_colors() {
        assert_eq!(node_color(NodeGroup::Public, false), "#22c55e");
        assert_eq!(node_color(NodeGroup::Private, false), "#ef4444");
        assert_eq!(node_color(NodeGroup::Tag, false), "#a855f7");
        assert_eq!(node_color(NodeGroup::Private, true), COLOR_HOVERED);
    }

    #[test]
    fn test_arrows() {
        assert_eq!(RenderStyle::default().arrow_length, 4.0);

        let settings = GraphSettings {
            show_arrows: false,
            ..Default::default()
        };
        assert_eq!(RenderStyle::from_settings(&settings).arrow_length, 0.0);
    }

    #[test]
    fn test_label_fade() {
        let style = RenderStyle::default();
        assert!(!style.label_visible(1.0));
        assert!(style.label_visible(1.5));

        let hidden = RenderStyle::from_settings(&GraphSettings {
            show_labels: false,
            ..Default::default()
        });
        assert!(!hidden.label_visible(10.0));
    }

    #[test]
    fn test_node_style() {
        let style = RenderStyle::default();
        let node = GraphNode::new(GraphId::tag(3), "#eng", NodeGroup::Tag);

        let far = style.node(&node, None, 1.0);
        assert_eq!(far.color, COLOR_TAG);
        assert_eq!(far.label, None);
        assert_eq!(far.radius, 6.0);

        let near = style.node(&node, Some(GraphId::tag(3)), 2.0);
        assert_eq!(near.color, COLOR_HOVERED);
        assert_eq!(near.label.as_deref(), Some("#eng"));
        assert_eq!(style.font_size(2.0), 6.0);
    }
}
