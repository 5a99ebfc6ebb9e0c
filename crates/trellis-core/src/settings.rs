//! User-adjustable graph settings

use serde::{Deserialize, Serialize};

use crate::limits::{self, ValidationError};

/// Graph view settings
///
/// Every axis is independent; any combination is valid. Only
/// [`FilterKey`] fields change which nodes and edges are shown, the rest
/// affect drawing and physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    // Filters
    /// Case-insensitive title substring; empty shows everything
    pub search_query: String,
    pub show_orphans: bool,
    pub show_tags: bool,

    // Display
    pub show_arrows: bool,
    pub show_labels: bool,
    pub node_size: f64,
    pub link_thickness: f64,
    /// Labels are drawn at or above this zoom level
    pub text_fade_threshold: f64,

    // Forces
    pub center_force: f64,
    pub repel_force: f64,
    pub link_distance: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            show_orphans: true,
            show_tags: false,
            show_arrows: true,
            show_labels: true,
            node_size: 6.0,
            link_thickness: 1.5,
            text_fade_threshold: 1.5,
            center_force: 1.0,
            repel_force: -300.0,
            link_distance: 50.0,
        }
    }
}

/// The settings that decide graph membership
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub search_query: String,
    pub show_orphans: bool,
    pub show_tags: bool,
}

/// Physical coefficients handed to the layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub center: f64,
    pub repel: f64,
    pub link_distance: f64,
}

impl Default for ForceParams {
    fn default() -> Self {
        GraphSettings::default().forces()
    }
}

impl GraphSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_orphans(mut self, show: bool) -> Self {
        self.show_orphans = show;
        self
    }

    pub fn with_tags(mut self, show: bool) -> Self {
        self.show_tags = show;
        self
    }

    pub fn with_forces(mut self, center: f64, repel: f64, link_distance: f64) -> Self {
        self.center_force = center;
        self.repel_force = repel;
        self.link_distance = link_distance;
        self
    }

    pub fn filter_key(&self) -> FilterKey {
        FilterKey {
            search_query: self.search_query.clone(),
            show_orphans: self.show_orphans,
            show_tags: self.show_tags,
        }
    }

    pub fn forces(&self) -> ForceParams {
        ForceParams {
            center: self.center_force,
            repel: self.repel_force,
            link_distance: self.link_distance,
        }
    }

    /// Check every numeric axis against its slider range
    pub fn validate(&self) -> Result<(), ValidationError> {
        limits::validate_search(&self.search_query)?;
        limits::validate_range("node_size", self.node_size, &limits::NODE_SIZE)?;
        limits::validate_range("link_thickness", self.link_thickness, &limits::LINK_THICKNESS)?;
        limits::validate_range(
            "text_fade_threshold",
            self.text_fade_threshold,
            &limits::TEXT_FADE_THRESHOLD,
        )?;
        limits::validate_range("center_force", self.center_force, &limits::CENTER_FORCE)?;
        limits::validate_range("repel_force", self.repel_force, &limits::REPEL_FORCE)?;
        limits::validate_range("link_distance", self.link_distance, &limits::LINK_DISTANCE)?;
        Ok(())
    }

    /// Copy with every numeric axis pulled into its slider range
    pub fn clamped(&self) -> Self {
        Self {
            search_query: self.search_query.clone(),
            node_size: limits::clamp(self.node_size, &limits::NODE_SIZE),
            link_thickness: limits::clamp(self.link_thickness, &limits::LINK_THICKNESS),
            text_fade_threshold: limits::clamp(self.text_fade_threshold, &limits::TEXT_FADE_THRESHOLD),
            center_force: limits::clamp(self.center_force, &limits::CENTER_FORCE),
            repel_force: limits::clamp(self.repel_force, &limits::REPEL_FORCE),
            link_distance: limits::clamp(self.link_distance, &limits::LINK_DISTANCE),
            ..*self
        }
    }
}
