//! Built-in force simulation.
//!
//! Follows the d3-force model: a decaying `alpha` scales every force, each
//! force adjusts node velocities, and velocities are damped by
//! `velocity_decay` before being integrated into positions. Forces run in
//! slot order: center, charge, collide, link, x, y.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::warn;

use super::engine::{Forces, LinkForce, SimLink, SimNode, SimulationEngine};

/// Radius of the first ring of the initial phyllotaxis layout.
const INITIAL_RADIUS: f64 = 10.0;

/// Default alpha decay: reach `alpha_min = 0.001` from `alpha = 1` in 300 ticks.
pub fn default_alpha_decay() -> f64 {
	1.0 - 0.001_f64.powf(1.0 / 300.0)
}

/// CPU force simulation implementing [`SimulationEngine`].
#[derive(Clone, Debug)]
pub struct ForceSimulation {
	nodes: Vec<SimNode>,
	forces: Forces,
	alpha: f64,
	alpha_min: f64,
	alpha_decay: f64,
	alpha_target: f64,
	velocity_decay: f64,
	running: bool,
}

impl Default for ForceSimulation {
	fn default() -> Self {
		Self {
			nodes: Vec::new(),
			forces: Forces::default(),
			alpha: 1.0,
			alpha_min: 0.001,
			alpha_decay: default_alpha_decay(),
			alpha_target: 0.0,
			velocity_decay: 0.4,
			running: false,
		}
	}
}

impl ForceSimulation {
	/// An empty, stopped simulation with d3 defaults.
	pub fn new() -> Self {
		Self::default()
	}

	/// Place nodes on a phyllotaxis spiral; fixed coordinates are honoured.
	fn place_nodes(&mut self) {
		let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
		for (i, node) in self.nodes.iter_mut().enumerate() {
			node.index = i;
			let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
			let angle = i as f64 * golden_angle;
			node.x = node.fx.unwrap_or(radius * angle.cos());
			node.y = node.fy.unwrap_or(radius * angle.sin());
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	fn resolve_links(&mut self) {
		let by_id: HashMap<&str, usize> = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		let Some(link_force) = self.forces.link.as_mut() else {
			return;
		};
		for link in link_force.links_mut() {
			link.source_index = by_id.get(link.source.as_str()).copied();
			link.target_index = by_id.get(link.target.as_str()).copied();
			if link.endpoints().is_none() {
				warn!("simulation: link {} references an unknown node", link.id());
			}
		}
	}

	fn apply_center(&mut self) {
		let Some(center) = &self.forces.center else {
			return;
		};
		let n = self.nodes.len();
		if n == 0 {
			return;
		}
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let (dx, dy) = (sx / n as f64 - center.x, sy / n as f64 - center.y);
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}

	fn apply_charge(&mut self) {
		let Some(charge) = &self.forces.charge else {
			return;
		};
		let strengths: Vec<f64> = self.nodes.iter().map(|n| charge.strength.eval(n)).collect();
		let distance_min2 = charge.distance_min * charge.distance_min;
		let n = self.nodes.len();
		let alpha = self.alpha;

		for i in 0..n {
			let (mut ax, mut ay) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let dx = self.nodes[j].x - self.nodes[i].x;
				let dy = self.nodes[j].y - self.nodes[i].y;
				let mut l = dx * dx + dy * dy;
				// Coincident nodes exert nothing on each other.
				if l == 0.0 {
					continue;
				}
				if l < distance_min2 {
					l = (distance_min2 * l).sqrt();
				}
				let w = strengths[j] * alpha / l;
				ax += dx * w;
				ay += dy * w;
			}
			self.nodes[i].vx += ax;
			self.nodes[i].vy += ay;
		}
	}

	fn apply_collide(&mut self) {
		let Some(collide) = &self.forces.collide else {
			return;
		};
		let radii: Vec<f64> = self.nodes.iter().map(|n| collide.radius.eval(n)).collect();
		let strength = collide.strength;
		let n = self.nodes.len();

		for i in 0..n {
			for j in (i + 1)..n {
				let r = radii[i] + radii[j];
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut dx = (a.x + a.vx) - (b.x + b.vx);
				let mut dy = (a.y + a.vy) - (b.y + b.vy);
				let l2 = dx * dx + dy * dy;
				if l2 == 0.0 || l2 >= r * r {
					continue;
				}
				let l = l2.sqrt();
				let k = (r - l) / l * strength;
				dx *= k;
				dy *= k;
				let (ri2, rj2) = (radii[i] * radii[i], radii[j] * radii[j]);
				let ratio = if ri2 + rj2 > 0.0 { rj2 / (ri2 + rj2) } else { 0.5 };
				self.nodes[i].vx += dx * ratio;
				self.nodes[i].vy += dy * ratio;
				self.nodes[j].vx -= dx * (1.0 - ratio);
				self.nodes[j].vy -= dy * (1.0 - ratio);
			}
		}
	}

	fn apply_links(&mut self) {
		let Some(link_force) = &self.forces.link else {
			return;
		};
		let mut degree = vec![0usize; self.nodes.len()];
		for (s, t) in link_force.links().iter().filter_map(SimLink::endpoints) {
			degree[s] += 1;
			degree[t] += 1;
		}

		for (s, t) in link_force.links().iter().filter_map(SimLink::endpoints) {
			if s == t {
				continue;
			}
			let (source, target) = (&self.nodes[s], &self.nodes[t]);
			let mut dx = (target.x + target.vx) - (source.x + source.vx);
			let mut dy = (target.y + target.vy) - (source.y + source.vy);
			let l = (dx * dx + dy * dy).sqrt();
			if l == 0.0 {
				continue;
			}
			let strength = 1.0 / degree[s].min(degree[t]) as f64;
			let k = (l - link_force.distance) / l * self.alpha * strength;
			dx *= k;
			dy *= k;
			let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;
			self.nodes[t].vx -= dx * bias;
			self.nodes[t].vy -= dy * bias;
			self.nodes[s].vx += dx * (1.0 - bias);
			self.nodes[s].vy += dy * (1.0 - bias);
		}
	}

	fn apply_axes(&mut self) {
		let alpha = self.alpha;
		if let Some(fx) = &self.forces.x {
			for node in &mut self.nodes {
				let k = fx.strength.eval(node) * alpha;
				node.vx += (fx.target - node.x) * k;
			}
		}
		if let Some(fy) = &self.forces.y {
			for node in &mut self.nodes {
				let k = fy.strength.eval(node) * alpha;
				node.vy += (fy.target - node.y) * k;
			}
		}
	}

	fn integrate(&mut self) {
		let damping = 1.0 - self.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= damping;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= damping;
					node.y += node.vy;
				}
			}
		}
	}
}

impl SimulationEngine for ForceSimulation {
	fn restart(&mut self) {
		self.running = true;
	}

	fn stop(&mut self) {
		self.running = false;
	}

	fn is_running(&self) -> bool {
		self.running
	}

	fn tick(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

		self.apply_center();
		self.apply_charge();
		self.apply_collide();
		self.apply_links();
		self.apply_axes();
		self.integrate();
	}

	fn step(&mut self) -> bool {
		if !self.running {
			return false;
		}
		self.tick();
		if self.alpha < self.alpha_min {
			self.running = false;
		}
		true
	}

	fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	fn set_nodes(&mut self, nodes: Vec<SimNode>) {
		self.nodes = nodes;
		self.place_nodes();
		self.resolve_links();
	}

	fn links(&self) -> &[SimLink] {
		self.forces.link.as_ref().map(LinkForce::links).unwrap_or(&[])
	}

	fn set_links(&mut self, links: Vec<SimLink>) {
		self.forces
			.link
			.get_or_insert_with(LinkForce::default)
			.replace_links(links);
		self.resolve_links();
	}

	fn forces(&self) -> &Forces {
		&self.forces
	}

	fn forces_mut(&mut self) -> &mut Forces {
		&mut self.forces
	}

	fn alpha(&self) -> f64 {
		self.alpha
	}

	fn set_alpha(&mut self, alpha: f64) {
		self.alpha = alpha;
	}

	fn alpha_min(&self) -> f64 {
		self.alpha_min
	}

	fn set_alpha_min(&mut self, alpha_min: f64) {
		self.alpha_min = alpha_min;
	}

	fn alpha_decay(&self) -> f64 {
		self.alpha_decay
	}

	fn set_alpha_decay(&mut self, alpha_decay: f64) {
		self.alpha_decay = alpha_decay;
	}

	fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	fn set_alpha_target(&mut self, alpha_target: f64) {
		self.alpha_target = alpha_target;
	}

	fn velocity_decay(&self) -> f64 {
		self.velocity_decay
	}

	fn set_velocity_decay(&mut self, velocity_decay: f64) {
		self.velocity_decay = velocity_decay;
	}
}
