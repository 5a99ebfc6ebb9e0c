//! Trellis Layout - Force-directed layout for the graph view
//!
//! [`LayoutController`] runs the simulation over the filtered graph;
//! [`RenderStyle`] turns display settings into drawing parameters.

pub mod controller;
pub mod style;

pub use controller::{Camera, Cooling, LayoutController, NodePosition};
pub use style::{NodeStyle, RenderStyle};
