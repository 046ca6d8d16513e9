//! The force-layout engine contract.
//!
//! The reconciler never integrates physics itself. It talks to an engine
//! through [`SimulationEngine`]: node and link working sets, typed force
//! slots, and the alpha (energy) schedule. [`ForceSimulation`] is the
//! built-in implementation.
//!
//! [`ForceSimulation`]: super::simulation::ForceSimulation

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use super::types::{GraphLink, GraphNode, link_id, pick_attrs};

/// Per-node accessor function, installed on forces.
pub type NodeFn = Rc<dyn Fn(&SimNode) -> f64>;

/// A numeric force parameter: either a constant or evaluated per node.
#[derive(Clone)]
pub enum Accessor {
	/// Same value for every node.
	Constant(f64),
	/// Called once per node.
	PerNode(NodeFn),
}

impl Accessor {
	/// Value of the parameter for `node`.
	pub fn eval(&self, node: &SimNode) -> f64 {
		match self {
			Accessor::Constant(value) => *value,
			Accessor::PerNode(f) => f(node),
		}
	}
}

impl fmt::Debug for Accessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Accessor::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			Accessor::PerNode(_) => f.write_str("PerNode(..)"),
		}
	}
}

/// The engine's working copy of a node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimNode {
	/// Unique node id.
	pub id: String,
	/// Node radius; collision radius is derived from it.
	pub radius: f64,
	/// Fixed x coordinate. Pins the node horizontally.
	pub fx: Option<f64>,
	/// Fixed y coordinate. Pins the node vertically.
	pub fy: Option<f64>,
	/// Declared extra attributes copied from the caller's node.
	pub attrs: Map<String, Value>,
	/// Position in the node list, assigned by the engine.
	pub index: usize,
	/// Simulated x position.
	pub x: f64,
	/// Simulated y position.
	pub y: f64,
	/// Horizontal velocity, carried between ticks.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
}

impl SimNode {
	/// Shallow copy of a caller node carrying only `{id, radius, fx, fy}`
	/// plus the declared attributes.
	pub fn from_graph_node(node: &GraphNode, declared: &[String]) -> Self {
		Self {
			id: node.id.clone(),
			radius: node.radius,
			fx: node.fx,
			fy: node.fy,
			attrs: pick_attrs(&node.attrs, declared),
			..Default::default()
		}
	}

	/// Rendered position: a fixed coordinate wins over the simulated one.
	pub fn position(&self) -> (f64, f64) {
		(self.fx.unwrap_or(self.x), self.fy.unwrap_or(self.y))
	}
}

/// The engine's working copy of a link. Endpoints are resolved to node
/// indices by id whenever nodes or links are replaced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimLink {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Link weight.
	pub value: f64,
	/// Declared extra attributes copied from the caller's link.
	pub attrs: Map<String, Value>,
	/// Resolved source index, `None` for an unknown id.
	pub source_index: Option<usize>,
	/// Resolved target index, `None` for an unknown id.
	pub target_index: Option<usize>,
}

impl SimLink {
	/// Shallow copy carrying only `{source, target, value}` plus the declared attributes.
	pub fn from_graph_link(link: &GraphLink, declared: &[String]) -> Self {
		Self {
			source: link.source.clone(),
			target: link.target.clone(),
			value: link.value,
			attrs: pick_attrs(&link.attrs, declared),
			source_index: None,
			target_index: None,
		}
	}

	/// `"source=>target"`, the key the reconciler compares link sets by.
	pub fn id(&self) -> String {
		link_id(&self.source, &self.target)
	}

	/// Both endpoints, when they resolved to known nodes.
	pub fn endpoints(&self) -> Option<(usize, usize)> {
		Some((self.source_index?, self.target_index?))
	}
}

/// Shifts all nodes so their mean position sits on `(x, y)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CenterForce {
	/// Target x.
	pub x: f64,
	/// Target y.
	pub y: f64,
}

/// Pairwise attraction (positive strength) or repulsion (negative).
#[derive(Clone, Debug)]
pub struct ManyBodyForce {
	/// Repulsive when negative.
	pub strength: Accessor,
	/// Smallest pair distance the force is computed with.
	pub distance_min: f64,
}

impl Default for ManyBodyForce {
	fn default() -> Self {
		Self {
			strength: Accessor::Constant(-30.0),
			distance_min: 1.0,
		}
	}
}

/// Keeps nodes from overlapping, treating each as a circle.
#[derive(Clone, Debug)]
pub struct CollideForce {
	/// Collision radius of each node.
	pub radius: Accessor,
	/// Evaluated once, not per node.
	pub strength: f64,
}

impl Default for CollideForce {
	fn default() -> Self {
		Self {
			radius: Accessor::Constant(1.0),
			strength: 1.0,
		}
	}
}

/// Spring force between linked nodes.
#[derive(Clone, Debug)]
pub struct LinkForce {
	/// Rest length of every link.
	pub distance: f64,
	links: Vec<SimLink>,
}

impl Default for LinkForce {
	fn default() -> Self {
		Self {
			distance: 30.0,
			links: Vec::new(),
		}
	}
}

impl LinkForce {
	/// Links in the order they were installed.
	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub(crate) fn links_mut(&mut self) -> &mut [SimLink] {
		&mut self.links
	}

	pub(crate) fn replace_links(&mut self, links: Vec<SimLink>) {
		self.links = links;
	}
}

/// Pulls each node towards `target` along one axis.
#[derive(Clone, Debug)]
pub struct PositionForce {
	/// Coordinate nodes are pulled towards.
	pub target: f64,
	/// Fraction of the remaining distance applied per tick.
	pub strength: Accessor,
}

impl Default for PositionForce {
	fn default() -> Self {
		Self {
			target: 0.0,
			strength: Accessor::Constant(0.1),
		}
	}
}

/// Named force slots. A slot is `None` until something installs it.
#[derive(Clone, Debug, Default)]
pub struct Forces {
	/// Centering force.
	pub center: Option<CenterForce>,
	/// Many-body force.
	pub charge: Option<ManyBodyForce>,
	/// Collision force.
	pub collide: Option<CollideForce>,
	/// Link (spring) force.
	pub link: Option<LinkForce>,
	/// Horizontal positioning force.
	pub x: Option<PositionForce>,
	/// Vertical positioning force.
	pub y: Option<PositionForce>,
}

/// Contract of a force-layout engine driven by the reconciler.
///
/// `tick` advances exactly one step and never stops the engine on its own.
/// `step` is the timer-driven form: it ticks only while running, stops once
/// alpha drops below `alpha_min`, and returns `true` when a tick happened
/// (the tick notification).
pub trait SimulationEngine {
	/// Mark the engine running. Alpha is left as is.
	fn restart(&mut self);
	/// Halt timer-driven stepping.
	fn stop(&mut self);
	/// Whether timer-driven stepping is active.
	fn is_running(&self) -> bool;
	/// Decay alpha once and apply every installed force.
	fn tick(&mut self);
	/// Timer step: tick while running, stop below `alpha_min`.
	fn step(&mut self) -> bool;

	/// Current node working set.
	fn nodes(&self) -> &[SimNode];
	/// Replace the node working set, re-resolving link endpoints.
	fn set_nodes(&mut self, nodes: Vec<SimNode>);
	/// Links of the link force, empty when the force is absent.
	fn links(&self) -> &[SimLink];
	/// Replace the link working set, creating the link force when missing.
	fn set_links(&mut self, links: Vec<SimLink>);

	/// Installed force slots.
	fn forces(&self) -> &Forces;
	/// Mutable force slots, for installing or tuning forces.
	fn forces_mut(&mut self) -> &mut Forces;

	/// Current energy level.
	fn alpha(&self) -> f64;
	/// Set the energy level.
	fn set_alpha(&mut self, alpha: f64);
	/// Level below which stepping stops.
	fn alpha_min(&self) -> f64;
	/// Set the level below which stepping stops.
	fn set_alpha_min(&mut self, alpha_min: f64);
	/// Fraction of the gap to `alpha_target` closed per tick.
	fn alpha_decay(&self) -> f64;
	/// Set the per-tick decay.
	fn set_alpha_decay(&mut self, alpha_decay: f64);
	/// Level alpha decays towards.
	fn alpha_target(&self) -> f64;
	/// Set the level alpha decays towards.
	fn set_alpha_target(&mut self, alpha_target: f64);
	/// Fraction of velocity lost per tick.
	fn velocity_decay(&self) -> f64;
	/// Set the per-tick velocity loss.
	fn set_velocity_decay(&mut self, velocity_decay: f64);
}
