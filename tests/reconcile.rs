//! End-to-end reconciliation scenarios against an instrumented engine.

use std::collections::HashSet;

use proptest::prelude::*;
use svg_force_graph::components::force_graph::engine::{Forces, SimLink, SimNode};
use svg_force_graph::components::force_graph::{
	ForceSimulation, GraphData, GraphLink, GraphNode, SimulationConfig, SimulationEngine,
	SimulationHandle, SimulationOptions, StrengthSpec,
};
use svg_force_graph::SimulationError;

/// Built-in engine that counts wholesale replacements and ticks.
#[derive(Default)]
struct Recording {
	inner: ForceSimulation,
	node_sets: usize,
	link_sets: usize,
	ticks: usize,
}

impl SimulationEngine for Recording {
	fn restart(&mut self) {
		self.inner.restart();
	}

	fn stop(&mut self) {
		self.inner.stop();
	}

	fn is_running(&self) -> bool {
		self.inner.is_running()
	}

	fn tick(&mut self) {
		self.ticks += 1;
		self.inner.tick();
	}

	fn step(&mut self) -> bool {
		self.inner.step()
	}

	fn nodes(&self) -> &[SimNode] {
		self.inner.nodes()
	}

	fn set_nodes(&mut self, nodes: Vec<SimNode>) {
		self.node_sets += 1;
		self.inner.set_nodes(nodes);
	}

	fn links(&self) -> &[SimLink] {
		self.inner.links()
	}

	fn set_links(&mut self, links: Vec<SimLink>) {
		self.link_sets += 1;
		self.inner.set_links(links);
	}

	fn forces(&self) -> &Forces {
		self.inner.forces()
	}

	fn forces_mut(&mut self) -> &mut Forces {
		self.inner.forces_mut()
	}

	fn alpha(&self) -> f64 {
		self.inner.alpha()
	}

	fn set_alpha(&mut self, alpha: f64) {
		self.inner.set_alpha(alpha);
	}

	fn alpha_min(&self) -> f64 {
		self.inner.alpha_min()
	}

	fn set_alpha_min(&mut self, alpha_min: f64) {
		self.inner.set_alpha_min(alpha_min);
	}

	fn alpha_decay(&self) -> f64 {
		self.inner.alpha_decay()
	}

	fn set_alpha_decay(&mut self, alpha_decay: f64) {
		self.inner.set_alpha_decay(alpha_decay);
	}

	fn alpha_target(&self) -> f64 {
		self.inner.alpha_target()
	}

	fn set_alpha_target(&mut self, alpha_target: f64) {
		self.inner.set_alpha_target(alpha_target);
	}

	fn velocity_decay(&self) -> f64 {
		self.inner.velocity_decay()
	}

	fn set_velocity_decay(&mut self, velocity_decay: f64) {
		self.inner.set_velocity_decay(velocity_decay);
	}
}

fn graph(ids: &[&str], links: &[(&str, &str)]) -> GraphData {
	GraphData {
		nodes: ids.iter().map(|id| GraphNode::new(*id)).collect(),
		links: links.iter().map(|(s, t)| GraphLink::new(*s, *t, 1.0)).collect(),
	}
}

fn static_config(data: GraphData) -> SimulationConfig {
	let mut options = SimulationOptions::default();
	options.schedule.alpha_decay = Some(0.0228);
	SimulationConfig::new(data, options)
}

#[test]
fn static_graph_settles_in_300_ticks() {
	let cfg = static_config(graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
	let handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();

	assert_eq!(handle.engine().ticks, 300);
	assert_eq!(handle.runs(), 1);
	assert!(!handle.engine().is_running());
}

#[test]
fn unchanged_config_costs_nothing() {
	let cfg = static_config(graph(&["a", "b"], &[("a", "b")]));
	let mut handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();
	let before = handle.engine().nodes().to_vec();

	for _ in 0..3 {
		let outcome = handle.update(&cfg).unwrap();
		assert!(!outcome.changed);
		assert_eq!(outcome.converged_in, None);
	}

	let engine = handle.engine();
	assert_eq!((engine.node_sets, engine.link_sets, engine.ticks), (1, 1, 300));
	assert_eq!(engine.nodes(), &before[..]);
}

#[test]
fn reordered_nodes_are_not_a_topology_change() {
	let mut cfg = static_config(graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]));
	let mut handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();

	cfg.data.nodes.reverse();
	cfg.data.links.reverse();
	assert!(!handle.update(&cfg).unwrap().changed);
	assert_eq!(handle.engine().node_sets, 1);
	assert_eq!(handle.engine().link_sets, 1);
}

#[test]
fn strength_change_reruns_without_replacing_topology() {
	let mut cfg = static_config(graph(&["a", "b"], &[("a", "b")]));
	let mut handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();

	cfg.options.strength.charge = Some(StrengthSpec::Constant(-80.0));
	let outcome = handle.update(&cfg).unwrap();

	assert!(outcome.changed);
	assert_eq!(outcome.converged_in, Some(300));
	assert_eq!(handle.runs(), 2);
	assert_eq!(handle.engine().node_sets, 1);
}

#[test]
fn removing_a_strength_restores_the_default() {
	let mut cfg = static_config(graph(&["a"], &[]));
	cfg.options.strength.x = Some(StrengthSpec::Constant(0.5));
	let mut handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();

	cfg.options.strength.x = None;
	assert!(handle.update(&cfg).unwrap().changed);
	let x = handle.engine().forces().x.as_ref().unwrap();
	assert_eq!(x.strength.eval(&SimNode::default()), 0.1);
}

#[test]
fn links_to_missing_nodes_are_passed_through() {
	let cfg = static_config(graph(&["a", "b"], &[("a", "b"), ("a", "ghost")]));
	let handle = SimulationHandle::create(&cfg).unwrap();

	let links = handle.engine().links();
	assert_eq!(links.len(), 2);
	assert!(links[0].endpoints().is_some());
	assert_eq!(links[1].endpoints(), None);
}

#[test]
fn empty_graph_still_installs_every_force() {
	let cfg = static_config(GraphData::default());
	let handle = SimulationHandle::create(&cfg).unwrap();

	let forces = handle.engine().forces();
	assert!(forces.center.is_some());
	assert!(forces.charge.is_some());
	assert!(forces.collide.is_some());
	assert!(forces.link.is_some());
	assert!(forces.x.is_some());
	assert!(forces.y.is_some());
}

#[test]
fn target_above_minimum_is_non_convergent() {
	let mut cfg = static_config(graph(&["a"], &[]));
	cfg.options.schedule.alpha_target = Some(0.3);

	match SimulationHandle::create(&cfg) {
		Err(SimulationError::NonConvergent { alpha_target, .. }) => assert_eq!(alpha_target, 0.3),
		other => panic!("expected NonConvergent, got {:?}", other.err()),
	}
}

#[test]
fn config_parses_from_page_json() {
	let cfg: SimulationConfig = serde_json::from_str(
		r#"{
			"data": {
				"nodes": [{ "id": "a", "radius": 8, "group": 2 }, { "id": "b", "fx": 10, "fy": 20 }],
				"links": [{ "source": "a", "target": "b", "value": 4 }]
			},
			"nodeAttrs": ["group"],
			"alphaDecay": 0.05
		}"#,
	)
	.unwrap();
	let handle = SimulationHandle::create(&cfg).unwrap();

	let nodes = handle.engine().nodes();
	assert_eq!(nodes[0].radius, 8.0);
	assert!(nodes[0].attrs.contains_key("group"));
	assert_eq!(nodes[1].position(), (10.0, 20.0));
	assert_eq!(handle.engine().links()[0].value, 4.0);
}

fn ids_and_permutation() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
	prop::collection::hash_set("[a-z]{1,4}", 1..8).prop_flat_map(|set| {
		let ids: Vec<String> = set.into_iter().collect();
		(Just(ids.clone()), Just(ids).prop_shuffle())
	})
}

fn animated(ids: &[String]) -> SimulationConfig {
	let data = GraphData {
		nodes: ids.iter().map(GraphNode::new).collect(),
		links: ids.windows(2).map(|w| GraphLink::new(&w[0], &w[1], 1.0)).collect(),
	};
	SimulationConfig::new(
		data,
		SimulationOptions {
			animate: true,
			..Default::default()
		},
	)
}

proptest! {
	#[test]
	fn node_order_never_triggers_replacement((ids, shuffled) in ids_and_permutation()) {
		let mut cfg = animated(&ids);
		let mut handle = SimulationHandle::with_engine(Recording::default(), &cfg).unwrap();

		cfg.data.nodes = shuffled.iter().map(GraphNode::new).collect();
		let outcome = handle.update(&cfg).unwrap();

		prop_assert!(!outcome.changed);
		prop_assert_eq!(handle.engine().node_sets, 1);
		let engine_ids: HashSet<&str> = handle.engine().nodes().iter().map(|n| n.id.as_str()).collect();
		let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
		prop_assert_eq!(engine_ids, wanted);
	}
}
