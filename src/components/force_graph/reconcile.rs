//! Simulation reconciliation.
//!
//! [`SimulationHandle`] owns an engine plus the bookkeeping needed to apply a
//! declarative [`SimulationConfig`] incrementally: the last strengths and
//! radius margin it installed, and a dirty flag raised whenever topology or a
//! force parameter changes. When animation is off, a dirty update runs the
//! engine to convergence before returning.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Deserializer};

use super::engine::{
	Accessor, CenterForce, CollideForce, ManyBodyForce, NodeFn, PositionForce, SimLink, SimNode,
	SimulationEngine,
};
use super::simulation::ForceSimulation;
use super::types::{GraphData, link_id, node_id};
use crate::error::{SimulationError, SimulationResult};

/// Requested strength of a force: a constant or a per-node function.
///
/// Equality is by value for constants and by reference for functions, so
/// passing the same `Rc` twice is not a change.
#[derive(Clone)]
pub enum StrengthSpec {
	/// The same strength for every node.
	Constant(f64),
	/// Strength computed per node.
	Function(NodeFn),
}

impl StrengthSpec {
	/// Wrap a closure as a per-node strength.
	pub fn function(f: impl Fn(&SimNode) -> f64 + 'static) -> Self {
		StrengthSpec::Function(Rc::new(f))
	}

	fn accessor(&self) -> Accessor {
		match self {
			StrengthSpec::Constant(value) => Accessor::Constant(*value),
			StrengthSpec::Function(f) => Accessor::PerNode(f.clone()),
		}
	}

	/// Collapse to a single number. Functions are sampled against a blank node.
	fn evaluate_once(&self) -> f64 {
		match self {
			StrengthSpec::Constant(value) => *value,
			StrengthSpec::Function(f) => f(&SimNode::default()),
		}
	}
}

impl PartialEq for StrengthSpec {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(StrengthSpec::Constant(a), StrengthSpec::Constant(b)) => a == b,
			(StrengthSpec::Function(a), StrengthSpec::Function(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for StrengthSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StrengthSpec::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			StrengthSpec::Function(_) => f.write_str("Function(..)"),
		}
	}
}

impl From<f64> for StrengthSpec {
	fn from(value: f64) -> Self {
		StrengthSpec::Constant(value)
	}
}

impl<'de> Deserialize<'de> for StrengthSpec {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		f64::deserialize(deserializer).map(StrengthSpec::Constant)
	}
}

/// Strengths for the named forces. `None` leaves the engine default.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForceStrengths {
	/// Many-body strength, negative to repel.
	pub charge: Option<StrengthSpec>,
	/// Collision strength in `[0, 1]`.
	pub collide: Option<StrengthSpec>,
	/// Pull towards the horizontal centre.
	pub x: Option<StrengthSpec>,
	/// Pull towards the vertical centre.
	pub y: Option<StrengthSpec>,
}

/// Alpha schedule overrides. Absent fields leave the engine untouched.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlphaSchedule {
	/// Starting alpha.
	pub alpha: Option<f64>,
	/// Fraction of the gap to the target closed each tick.
	pub alpha_decay: Option<f64>,
	/// Alpha below which the simulation stops.
	pub alpha_min: Option<f64>,
	/// Alpha the simulation decays towards.
	pub alpha_target: Option<f64>,
	/// Velocity lost each tick, as a fraction.
	pub velocity_decay: Option<f64>,
}

/// Simulation options, everything but the graph data.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationOptions {
	/// Leave the simulation running (`true`) or settle it synchronously.
	pub animate: bool,
	/// Canvas width; the centre force sits at its midpoint.
	pub width: f64,
	/// Canvas height.
	pub height: f64,
	/// Alpha parameters, read from the top level of the options.
	#[serde(flatten)]
	pub schedule: AlphaSchedule,
	/// Padding added to each node radius by the collision force.
	pub radius_margin: f64,
	/// Extra node attributes copied into the simulation.
	pub node_attrs: Vec<String>,
	/// Extra link attributes copied into the simulation.
	pub link_attrs: Vec<String>,
	/// Per-force strength overrides.
	pub strength: ForceStrengths,
}

impl Default for SimulationOptions {
	fn default() -> Self {
		Self {
			animate: false,
			width: 900.0,
			height: 600.0,
			schedule: AlphaSchedule::default(),
			radius_margin: 3.0,
			node_attrs: Vec::new(),
			link_attrs: Vec::new(),
			strength: ForceStrengths::default(),
		}
	}
}

/// Desired simulation state for one update.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
	#[serde(default)]
	/// Nodes and links to simulate.
	pub data: GraphData,
	/// Everything else, read from the top level of the config.
	#[serde(flatten)]
	pub options: SimulationOptions,
}

impl SimulationConfig {
	/// Pair graph data with options.
	pub fn new(data: GraphData, options: SimulationOptions) -> Self {
		Self { data, options }
	}
}

/// What an [`SimulationHandle::update`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
	/// Topology or a force parameter changed.
	pub changed: bool,
	/// Ticks taken by the synchronous run, when one happened.
	pub converged_in: Option<usize>,
}

/// Number of ticks for alpha to fall from `alpha` to `alpha_min` under the
/// d3 recurrence `alpha += (alpha_target - alpha) * alpha_decay`.
///
/// Returns `None` when the schedule never gets there.
pub fn convergence_steps(
	alpha: f64,
	alpha_decay: f64,
	alpha_min: f64,
	alpha_target: f64,
) -> Option<usize> {
	let finite = [alpha, alpha_decay, alpha_min, alpha_target]
		.iter()
		.all(|v| v.is_finite());
	if !finite {
		return None;
	}
	if alpha <= alpha_min {
		return Some(0);
	}
	if alpha_decay <= 0.0 || alpha_target >= alpha_min {
		return None;
	}
	if alpha_decay >= 1.0 {
		return Some(1);
	}
	// A decay below f64 resolution leaves alpha where it is.
	if 1.0 - alpha_decay == 1.0 {
		return None;
	}
	let ratio = (alpha_min - alpha_target) / (alpha - alpha_target);
	let steps = (ratio.ln() / (1.0 - alpha_decay).ln()).ceil();
	if !steps.is_finite() || steps > usize::MAX as f64 {
		return None;
	}
	Some(steps.max(0.0) as usize)
}

fn center_target(dimension: f64) -> f64 {
	if dimension.is_finite() && dimension > 0.0 {
		dimension / 2.0
	} else {
		0.0
	}
}

/// A long-lived simulation plus the cache that makes updates incremental.
pub struct SimulationHandle<E: SimulationEngine = ForceSimulation> {
	engine: E,
	strengths: ForceStrengths,
	radius_margin: Option<f64>,
	initial_alpha: f64,
	dirty: bool,
	runs: usize,
}

impl SimulationHandle<ForceSimulation> {
	/// Allocate a fresh built-in simulation and apply `config` to it.
	pub fn create(config: &SimulationConfig) -> SimulationResult<Self> {
		Self::with_engine(ForceSimulation::new(), config)
	}
}

impl<E: SimulationEngine> SimulationHandle<E> {
	/// Wrap `engine` with an empty strength cache and apply `config` to it.
	pub fn with_engine(engine: E, config: &SimulationConfig) -> SimulationResult<Self> {
		let initial_alpha = engine.alpha();
		let mut handle = Self {
			engine,
			strengths: ForceStrengths::default(),
			radius_margin: None,
			initial_alpha,
			dirty: false,
			runs: 0,
		};
		handle.update(config)?;
		Ok(handle)
	}

	/// The wrapped engine.
	pub fn engine(&self) -> &E {
		&self.engine
	}

	/// Mutable access to the wrapped engine. Changes made here are not
	/// seen by the next `update`.
	pub fn engine_mut(&mut self) -> &mut E {
		&mut self.engine
	}

	/// Changes are pending a convergence run. Only `true` between updates
	/// after a failed run.
	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	/// Synchronous convergence runs performed so far.
	pub fn runs(&self) -> usize {
		self.runs
	}

	/// Stop the engine.
	pub fn stop(&mut self) {
		self.engine.stop();
	}

	/// Apply the deltas between the engine's current state and `config`.
	///
	/// Steps run in a fixed order: alpha schedule, center, charge, collide,
	/// nodes and links, then the x/y axis forces.
	///
	/// A failed convergence run leaves the handle dirty, so the next update
	/// runs again even when nothing else changed.
	pub fn update(&mut self, config: &SimulationConfig) -> SimulationResult<UpdateOutcome> {
		let options = &config.options;
		self.apply_schedule(&options.schedule);
		self.apply_center(options.width, options.height);
		self.apply_charge(&options.strength);
		self.apply_collide(options.radius_margin, &options.strength);
		self.apply_topology(config);
		self.apply_axes(&options.strength);

		let changed = self.dirty;
		let converged_in = if !options.animate && self.dirty {
			Some(self.run_to_convergence()?)
		} else {
			None
		};
		self.dirty = false;

		Ok(UpdateOutcome {
			changed,
			converged_in,
		})
	}

	/// Reset alpha to its initial level, tick until it reaches `alpha_min`,
	/// then stop. Returns the number of ticks.
	pub fn run_to_convergence(&mut self) -> SimulationResult<usize> {
		let (alpha, decay, min, target) = (
			self.initial_alpha,
			self.engine.alpha_decay(),
			self.engine.alpha_min(),
			self.engine.alpha_target(),
		);
		let bound = convergence_steps(alpha, decay, min, target).ok_or(
			SimulationError::NonConvergent {
				alpha,
				alpha_decay: decay,
				alpha_min: min,
				alpha_target: target,
			},
		)?;

		self.engine.set_alpha(alpha);
		self.engine.restart();
		let mut steps = 0;
		// One extra tick absorbs rounding in the closed-form bound.
		while self.engine.alpha() > self.engine.alpha_min() && steps <= bound {
			self.engine.tick();
			steps += 1;
		}
		self.engine.stop();
		if self.engine.alpha() > self.engine.alpha_min() {
			return Err(SimulationError::NonConvergent {
				alpha,
				alpha_decay: decay,
				alpha_min: min,
				alpha_target: target,
			});
		}
		self.runs += 1;
		debug!("reconcile: converged in {steps} ticks");
		Ok(steps)
	}

	fn apply_schedule(&mut self, schedule: &AlphaSchedule) {
		if let Some(alpha) = schedule.alpha {
			self.engine.set_alpha(alpha);
			self.initial_alpha = alpha;
		}
		if let Some(decay) = schedule.alpha_decay {
			self.engine.set_alpha_decay(decay);
		}
		if let Some(min) = schedule.alpha_min {
			self.engine.set_alpha_min(min);
		}
		if let Some(target) = schedule.alpha_target {
			self.engine.set_alpha_target(target);
		}
		if let Some(decay) = schedule.velocity_decay {
			self.engine.set_velocity_decay(decay);
		}
	}

	fn apply_center(&mut self, width: f64, height: f64) {
		let (cx, cy) = (center_target(width), center_target(height));
		let center = self.engine.forces_mut().center.get_or_insert_with(CenterForce::default);
		if center.x != cx {
			center.x = cx;
			self.dirty = true;
			debug!("reconcile: center x -> {cx}");
		}
		if center.y != cy {
			center.y = cy;
			self.dirty = true;
			debug!("reconcile: center y -> {cy}");
		}
	}

	fn apply_charge(&mut self, strength: &ForceStrengths) {
		let charge = self.engine.forces_mut().charge.get_or_insert_with(ManyBodyForce::default);
		if strength.charge != self.strengths.charge {
			charge.strength = strength
				.charge
				.as_ref()
				.map(StrengthSpec::accessor)
				.unwrap_or_else(|| ManyBodyForce::default().strength);
			self.strengths.charge = strength.charge.clone();
			self.dirty = true;
			debug!("reconcile: charge strength -> {:?}", strength.charge);
		}
	}

	fn apply_collide(&mut self, radius_margin: f64, strength: &ForceStrengths) {
		let collide = self.engine.forces_mut().collide.get_or_insert_with(CollideForce::default);
		if self.radius_margin != Some(radius_margin) {
			collide.radius = Accessor::PerNode(Rc::new(move |node: &SimNode| {
				node.radius + radius_margin
			}));
			self.radius_margin = Some(radius_margin);
			self.dirty = true;
			debug!("reconcile: collide radius margin -> {radius_margin}");
		}
		if strength.collide != self.strengths.collide {
			collide.strength = strength
				.collide
				.as_ref()
				.map(StrengthSpec::evaluate_once)
				.unwrap_or_else(|| CollideForce::default().strength);
			self.strengths.collide = strength.collide.clone();
			self.dirty = true;
			debug!("reconcile: collide strength -> {}", collide.strength);
		}
	}

	fn apply_topology(&mut self, config: &SimulationConfig) {
		let options = &config.options;
		let nodes = &config.data.nodes;
		let links = &config.data.links;

		let current: HashSet<&str> = self.engine.nodes().iter().map(|n| n.id.as_str()).collect();
		let desired: HashSet<&str> = nodes.iter().map(node_id).collect();
		if current != desired {
			let copies = nodes
				.iter()
				.map(|n| SimNode::from_graph_node(n, &options.node_attrs))
				.collect();
			self.engine.set_nodes(copies);
			self.dirty = true;
			debug!("reconcile: node set replaced ({} nodes)", nodes.len());
		}

		let current: HashSet<String> = self.engine.links().iter().map(SimLink::id).collect();
		let desired: HashSet<String> = links.iter().map(|l| link_id(&l.source, &l.target)).collect();
		// The link force exists once topology has been reconciled, even when empty.
		if current != desired || self.engine.forces().link.is_none() {
			let copies = links
				.iter()
				.map(|l| SimLink::from_graph_link(l, &options.link_attrs))
				.collect();
			self.engine.set_links(copies);
			if current != desired {
				self.dirty = true;
				debug!("reconcile: link set replaced ({} links)", links.len());
			}
		}
	}

	fn apply_axes(&mut self, strength: &ForceStrengths) {
		let forces = self.engine.forces_mut();
		let fx = forces.x.get_or_insert_with(PositionForce::default);
		if strength.x != self.strengths.x {
			fx.strength = strength
				.x
				.as_ref()
				.map(StrengthSpec::accessor)
				.unwrap_or_else(|| PositionForce::default().strength);
			self.strengths.x = strength.x.clone();
			self.dirty = true;
			debug!("reconcile: x strength -> {:?}", strength.x);
		}

		let fy = forces.y.get_or_insert_with(PositionForce::default);
		if strength.y != self.strengths.y {
			fy.strength = strength
				.y
				.as_ref()
				.map(StrengthSpec::accessor)
				.unwrap_or_else(|| PositionForce::default().strength);
			self.strengths.y = strength.y.clone();
			self.dirty = true;
			debug!("reconcile: y strength -> {:?}", strength.y);
		}
	}
}
