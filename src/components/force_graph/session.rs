//! Graph session: a reconciled simulation plus frame-coalesced position reads.
//!
//! Created once per graph view, then updated on every configuration change.
//! Simulation ticks never read positions directly; each one schedules a read
//! on the next animation frame, and a newer tick replaces a read that has not
//! fired yet, so at most one read is ever pending.

use std::collections::HashMap;

use log::{debug, info};

use super::engine::SimulationEngine;
use super::reconcile::{SimulationConfig, SimulationHandle, UpdateOutcome};
use super::simulation::ForceSimulation;
use crate::error::SimulationResult;

/// Schedules a callback for the next animation frame.
///
/// The session only keeps the token; the host calls
/// [`GraphSession::on_frame`] when the frame fires.
pub trait FrameScheduler {
	/// Handle for cancelling a requested frame.
	type Token;

	/// Ask for one callback on the next frame.
	fn request_frame(&mut self) -> Self::Token;
	/// Withdraw a request that has not fired yet.
	fn cancel_frame(&mut self, token: Self::Token);
}

/// Rendered node position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NodePosition {
	/// Centre x.
	pub cx: f64,
	/// Centre y.
	pub cy: f64,
}

/// Rendered link endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkPosition {
	/// Source x.
	pub x1: f64,
	/// Source y.
	pub y1: f64,
	/// Target x.
	pub x2: f64,
	/// Target y.
	pub y2: f64,
}

impl LinkPosition {
	/// Distance between the endpoints.
	pub fn length(&self) -> f64 {
		((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
	}
}

/// Positions read out of the simulation, keyed by node id and link id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	/// Node centres by node id.
	pub nodes: HashMap<String, NodePosition>,
	/// Endpoints of each resolved link by link id.
	pub links: HashMap<String, LinkPosition>,
}

impl Layout {
	/// Read every node and resolved link position from `engine`.
	pub fn capture<E: SimulationEngine>(engine: &E) -> Self {
		let sim_nodes = engine.nodes();
		let nodes = sim_nodes
			.iter()
			.map(|node| {
				let (cx, cy) = node.position();
				(node.id.clone(), NodePosition { cx, cy })
			})
			.collect();
		let links = engine
			.links()
			.iter()
			.filter_map(|link| {
				let (s, t) = link.endpoints()?;
				let (x1, y1) = sim_nodes.get(s)?.position();
				let (x2, y2) = sim_nodes.get(t)?.position();
				Some((link.id(), LinkPosition { x1, y1, x2, y2 }))
			})
			.collect();
		Self { nodes, links }
	}
}

/// A reconciled simulation bound to a frame scheduler.
pub struct GraphSession<S: FrameScheduler, E: SimulationEngine = ForceSimulation> {
	handle: SimulationHandle<E>,
	scheduler: S,
	pending: Option<S::Token>,
	layout: Layout,
}

impl<S: FrameScheduler> GraphSession<S, ForceSimulation> {
	/// Create the simulation for `config` and schedule the first position read.
	pub fn create(config: &SimulationConfig, scheduler: S) -> SimulationResult<Self> {
		let handle = SimulationHandle::create(config)?;
		info!(
			"session: created with {} nodes, {} links",
			config.data.nodes.len(),
			config.data.links.len()
		);
		Ok(Self::new(handle, scheduler))
	}
}

impl<S: FrameScheduler, E: SimulationEngine> GraphSession<S, E> {
	/// Wrap an existing handle and schedule the first position read.
	pub fn new(handle: SimulationHandle<E>, scheduler: S) -> Self {
		let mut session = Self {
			handle,
			scheduler,
			pending: None,
			layout: Layout::default(),
		};
		session.on_tick();
		session
	}

	/// The reconciled simulation.
	pub fn handle(&self) -> &SimulationHandle<E> {
		&self.handle
	}

	/// The frame scheduler.
	pub fn scheduler(&self) -> &S {
		&self.scheduler
	}

	/// Positions from the most recent read.
	pub fn layout(&self) -> &Layout {
		&self.layout
	}

	/// A position read has been requested and has not fired.
	pub fn has_pending_read(&self) -> bool {
		self.pending.is_some()
	}

	/// Reconcile against `config`, then schedule a position read.
	pub fn update(&mut self, config: &SimulationConfig) -> SimulationResult<UpdateOutcome> {
		let outcome = self.handle.update(config)?;
		self.on_tick();
		Ok(outcome)
	}

	/// Advance an animating simulation by one timer step. A tick schedules a read.
	pub fn advance(&mut self) -> bool {
		let ticked = self.handle.engine_mut().step();
		if ticked {
			self.on_tick();
		}
		ticked
	}

	/// Start (or reheat) an animating simulation ahead of [`advance`](Self::advance).
	pub fn restart(&mut self) {
		self.handle.engine_mut().restart();
	}

	/// Schedule a position read, replacing any read still pending.
	pub fn on_tick(&mut self) {
		if let Some(token) = self.pending.take() {
			debug!("session: replacing pending position read");
			self.scheduler.cancel_frame(token);
		}
		self.pending = Some(self.scheduler.request_frame());
	}

	/// The scheduled frame fired: read positions out of the simulation.
	pub fn on_frame(&mut self) -> &Layout {
		self.pending = None;
		self.layout = Layout::capture(self.handle.engine());
		&self.layout
	}

	/// Cancel any pending read and halt the simulation.
	pub fn teardown(&mut self) {
		if let Some(token) = self.pending.take() {
			self.scheduler.cancel_frame(token);
		}
		self.handle.stop();
	}
}

impl<S: FrameScheduler, E: SimulationEngine> Drop for GraphSession<S, E> {
	fn drop(&mut self) {
		self.teardown();
	}
}
