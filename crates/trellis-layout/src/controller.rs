//! Force-layout controller
//!
//! Wraps a [`ForceGraph`] simulation with the user's force coefficients, a
//! cooling schedule and camera fitting. Node positions belong to the
//! controller and survive both coefficient changes and graph reloads.

use std::collections::HashMap;
use std::f32::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use serde::{Deserialize, Serialize};
use trellis_core::limits::CENTER_FORCE;
use trellis_core::{ForceParams, Graph, GraphId};

// ─────────────────────────────────────────────────────────────────────────────
// Simulation constants
// ─────────────────────────────────────────────────────────────────────────────

const NODE_MASS: f32 = 10.0;
const SEED_RADIUS: f32 = 100.0;

/// `force_charge` per unit of repel force
const CHARGE_SCALE: f32 = 0.5;
/// Spring stiffness at the default link distance
const BASE_SPRING: f32 = 0.05;
const BASE_LINK_DISTANCE: f32 = 50.0;

const FORCE_MAX: f32 = 100.0;
const NODE_SPEED: f32 = 3000.0;

/// Fraction of velocity lost per step
pub const VELOCITY_DECAY: f32 = 0.3;

/// Largest zoom `fit_to_view` will choose
pub const MAX_ZOOM: f64 = 8.0;

/// Padding used by the "reset view" action, in screen pixels
pub const DEFAULT_FIT_PADDING: f64 = 50.0;

/// Camera transition length hosts should animate a fit with
pub const FIT_TRANSITION_MS: u64 = 400;

/// Map user force coefficients onto simulation parameters
///
/// Repulsion is negative in the settings (attraction is never offered), so
/// its magnitude drives the charge. A longer link distance means a softer
/// spring.
pub fn simulation_parameters(forces: &ForceParams) -> SimulationParameters {
    let distance = forces.link_distance.max(1.0) as f32;
    SimulationParameters {
        force_charge: forces.repel.abs() as f32 * CHARGE_SCALE,
        force_spring: BASE_SPRING * BASE_LINK_DISTANCE / distance,
        force_max: FORCE_MAX,
        node_speed: NODE_SPEED,
        damping_factor: 1.0 - VELOCITY_DECAY,
    }
}

/// Settling schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooling {
    /// Fraction of alpha lost per tick
    pub alpha_decay: f64,
    /// Settled once alpha drops below this
    pub alpha_min: f64,
    /// Settled after this many ticks regardless of alpha
    pub cooldown_ticks: u32,
}

impl Default for Cooling {
    fn default() -> Self {
        Self {
            alpha_decay: 0.02,
            alpha_min: 0.001,
            cooldown_ticks: 100,
        }
    }
}

/// Node position in graph space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: GraphId,
    pub x: f32,
    pub y: f32,
}

/// Screen transform: `screen = graph * k + (x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Camera {
    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.k + self.x, y * self.k + self.y)
    }
}

/// Drives the force simulation for the rendered graph
pub struct LayoutController {
    sim: ForceGraph<GraphId, ()>,
    index: HashMap<GraphId, DefaultNodeIdx>,
    forces: ForceParams,
    cooling: Cooling,
    alpha: f64,
    ticks: u32,
}

impl LayoutController {
    pub fn new(forces: ForceParams) -> Self {
        Self {
            sim: ForceGraph::new(simulation_parameters(&forces)),
            index: HashMap::new(),
            forces,
            cooling: Cooling::default(),
            alpha: 1.0,
            ticks: 0,
        }
    }

    pub fn with_cooling(mut self, cooling: Cooling) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn forces(&self) -> ForceParams {
        self.forces
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    /// Load a freshly filtered graph
    ///
    /// Nodes that were already laid out keep their position; new nodes are
    /// seeded on a circle around the origin. The simulation is reheated.
    pub fn load(&mut self, graph: &Graph) {
        let previous: HashMap<GraphId, (f32, f32)> = self
            .positions()
            .into_iter()
            .map(|p| (p.id, (p.x, p.y)))
            .collect();

        let mut sim = ForceGraph::new(simulation_parameters(&self.forces));
        let mut index = HashMap::with_capacity(graph.nodes.len());
        let count = graph.nodes.len().max(1) as f32;
        let mut kept = 0;

        for (i, node) in graph.nodes.iter().enumerate() {
            let (x, y) = match previous.get(&node.id) {
                Some(&pos) => {
                    kept += 1;
                    pos
                }
                None => {
                    let angle = i as f32 * 2.0 * PI / count;
                    (SEED_RADIUS * angle.cos(), SEED_RADIUS * angle.sin())
                }
            };
            let idx = sim.add_node(NodeData {
                x,
                y,
                mass: NODE_MASS,
                is_anchor: false,
                user_data: node.id,
            });
            index.insert(node.id, idx);
        }

        for edge in &graph.edges {
            if edge.source == edge.target {
                continue;
            }
            if let (Some(&src), Some(&tgt)) = (index.get(&edge.source), index.get(&edge.target)) {
                sim.add_edge(src, tgt, EdgeData::default());
            }
        }

        tracing::debug!(
            "Layout loaded {} nodes ({} kept position), {} edges",
            graph.nodes.len(),
            kept,
            graph.edges.len()
        );

        self.sim = sim;
        self.index = index;
        self.reheat();
    }

    /// Apply new force coefficients to the running simulation
    ///
    /// Positions are untouched; settling restarts from them.
    pub fn set_forces(&mut self, forces: ForceParams) {
        if forces == self.forces {
            return;
        }
        tracing::debug!(
            "Forces: center={}, repel={}, distance={}",
            forces.center,
            forces.repel,
            forces.link_distance
        );
        self.forces = forces;
        self.sim.parameters = simulation_parameters(&forces);
        self.reheat();
    }

    /// Restart settling from the current positions
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.ticks = 0;
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < self.cooling.alpha_min || self.ticks >= self.cooling.cooldown_ticks
    }

    /// Advance one step; returns whether the layout is still moving
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.is_settled() {
            return false;
        }

        self.sim.update(dt * self.alpha as f32);
        self.apply_center();

        self.alpha *= 1.0 - self.cooling.alpha_decay;
        self.ticks += 1;
        !self.is_settled()
    }

    /// Tick until settled; returns the number of ticks run
    pub fn settle(&mut self, dt: f32) -> u32 {
        let start = self.ticks;
        while self.tick(dt) {}
        let ran = self.ticks - start;
        tracing::debug!("Layout settled after {} ticks (alpha {:.4})", ran, self.alpha);
        ran
    }

    /// Pull the centroid toward the origin, in proportion to the center force
    fn apply_center(&mut self) {
        let strength = (self.forces.center / CENTER_FORCE.end()).clamp(0.0, 1.0) as f32;
        if strength == 0.0 || self.index.is_empty() {
            return;
        }

        let (mut sx, mut sy) = (0.0f32, 0.0f32);
        self.sim.visit_nodes(|node| {
            sx += node.x();
            sy += node.y();
        });
        let n = self.index.len() as f32;
        let (dx, dy) = (sx / n * strength, sy / n * strength);

        self.sim.visit_nodes_mut(|node| {
            if !node.data.is_anchor {
                node.data.x -= dx;
                node.data.y -= dy;
            }
        });
    }

    /// Current positions, ordered by id
    pub fn positions(&self) -> Vec<NodePosition> {
        let mut positions = Vec::with_capacity(self.index.len());
        self.sim.visit_nodes(|node| {
            positions.push(NodePosition {
                id: node.data.user_data,
                x: node.x(),
                y: node.y(),
            });
        });
        positions.sort_by_key(|p| p.id);
        positions
    }

    pub fn position(&self, id: &GraphId) -> Option<(f32, f32)> {
        let idx = *self.index.get(id)?;
        let mut found = None;
        self.sim.visit_nodes(|node| {
            if node.index() == idx {
                found = Some((node.x(), node.y()));
            }
        });
        found
    }

    /// Camera that shows every node inside a `width` x `height` viewport,
    /// keeping `padding` screen pixels free on each side
    pub fn fit_to_view(&self, width: f64, height: f64, padding: f64) -> Camera {
        let positions = self.positions();
        if positions.is_empty() {
            return Camera {
                x: width / 2.0,
                y: height / 2.0,
                k: 1.0,
            };
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &positions {
            min_x = min_x.min(p.x as f64);
            min_y = min_y.min(p.y as f64);
            max_x = max_x.max(p.x as f64);
            max_y = max_y.max(p.y as f64);
        }

        let avail_w = (width - 2.0 * padding).max(1.0);
        let avail_h = (height - 2.0 * padding).max(1.0);
        let span_w = max_x - min_x;
        let span_h = max_y - min_y;

        let fit = |avail: f64, span: f64| {
            if span > 0.0 {
                avail / span
            } else {
                MAX_ZOOM
            }
        };
        let k = fit(avail_w, span_w).min(fit(avail_h, span_h)).min(MAX_ZOOM);

        let (cx, cy) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
        Camera {
            x: width / 2.0 - cx * k,
            y: height / 2.0 - cy * k,
            k,
        }
    }
}

impl Default for LayoutController {
    fn default() -> Self {
        Self::new(ForceParams::default())
    }
}
