//! Force-directed graph layout and SVG rendering.
//!
//! - [`SimulationHandle`] reconciles a declarative [`SimulationConfig`] into a
//!   long-lived [`SimulationEngine`], touching only what changed
//! - [`ForceSimulation`] is the built-in d3-force compatible engine
//! - [`GraphSession`] coalesces simulation ticks into one position read per frame
//! - [`ForceGraphSvg`] renders the result, optionally inside a pan/zoom surface
//!
//! # Example
//!
//! ```ignore
//! use svg_force_graph::{ForceGraphSvg, GraphData, GraphLink, GraphNode, SimulationConfig};
//!
//! let data = GraphData {
//!     nodes: vec![GraphNode::new("a"), GraphNode::new("b")],
//!     links: vec![GraphLink::new("a", "b", 1.0)],
//! };
//! let config = SimulationConfig::new(data, Default::default());
//!
//! view! { <ForceGraphSvg config=Signal::stored_local(config) /> }
//! ```

mod component;
pub mod engine;
pub mod geometry;
pub mod reconcile;
pub mod session;
pub mod simulation;
mod types;

pub use component::{ForceGraphSvg, RafScheduler};
pub use engine::SimulationEngine;
pub use reconcile::{
	AlphaSchedule, ForceStrengths, SimulationConfig, SimulationHandle, SimulationOptions,
	StrengthSpec, UpdateOutcome, convergence_steps,
};
pub use session::{FrameScheduler, GraphSession, Layout, LinkPosition, NodePosition};
pub use simulation::ForceSimulation;
pub use types::{DEFAULT_NODE_RADIUS, GraphData, GraphLink, GraphNode, link_id, node_id};
