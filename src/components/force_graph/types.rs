//! Graph data structures supplied by the rendering layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Radius used when a node does not declare one.
pub const DEFAULT_NODE_RADIUS: f64 = 5.0;

fn default_radius() -> f64 {
	DEFAULT_NODE_RADIUS
}

fn default_value() -> f64 {
	1.0
}

/// A node in the graph.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphNode {
	/// Unique identifier for this node. Used to reference nodes in links.
	pub id: String,
	/// Node radius, used for drawing and for the collision force.
	#[serde(default = "default_radius")]
	pub radius: f64,
	/// Fixed x position. Overrides the simulated value when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fx: Option<f64>,
	/// Fixed y position. Overrides the simulated value when set.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fy: Option<f64>,
	/// Any other caller attributes. Only the ones named in `nodeAttrs`
	/// reach the simulation.
	#[serde(flatten)]
	pub attrs: Map<String, Value>,
}

impl GraphNode {
	/// A free node with the default radius.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			radius: DEFAULT_NODE_RADIUS,
			fx: None,
			fy: None,
			attrs: Map::new(),
		}
	}

	/// Set the radius.
	pub fn with_radius(mut self, radius: f64) -> Self {
		self.radius = radius;
		self
	}

	/// Pin the node at `(fx, fy)`.
	pub fn with_fixed(mut self, fx: f64, fy: f64) -> Self {
		self.fx = Some(fx);
		self.fy = Some(fy);
		self
	}

	/// Add a caller attribute.
	pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attrs.insert(key.into(), value.into());
		self
	}
}

/// A directed edge between two nodes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GraphLink {
	/// Source node ID.
	pub source: String,
	/// Target node ID.
	pub target: String,
	/// Link weight. Drives the default stroke width (`sqrt(value)`).
	#[serde(default = "default_value")]
	pub value: f64,
	/// Explicit stroke width, overriding the weight-derived one.
	#[serde(default, rename = "strokeWidth", skip_serializing_if = "Option::is_none")]
	pub stroke_width: Option<f64>,
	/// Any other caller attributes. Only the ones named in `linkAttrs`
	/// reach the simulation.
	#[serde(flatten)]
	pub attrs: Map<String, Value>,
}

impl GraphLink {
	/// A link of weight `value`.
	pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			value,
			stroke_width: None,
			attrs: Map::new(),
		}
	}

	/// Add a caller attribute.
	pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attrs.insert(key.into(), value.into());
		self
	}

	/// Identity of this link, see [`link_id`].
	pub fn id(&self) -> String {
		link_id(&self.source, &self.target)
	}
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct GraphData {
	/// Nodes, in render order.
	pub nodes: Vec<GraphNode>,
	/// Links, in render order. Endpoints may name absent nodes.
	pub links: Vec<GraphLink>,
}

/// Identity of a node.
pub fn node_id(node: &GraphNode) -> &str {
	&node.id
}

/// Identity of a link: `"<source>=><target>"`.
pub fn link_id(source: &str, target: &str) -> String {
	format!("{source}=>{target}")
}

/// Copy the declared extra attributes out of `attrs`.
pub(crate) fn pick_attrs(attrs: &Map<String, Value>, declared: &[String]) -> Map<String, Value> {
	declared
		.iter()
		.filter_map(|name| attrs.get(name).map(|value| (name.clone(), value.clone())))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn link_id_joins_endpoints() {
		assert_eq!(link_id("a", "b"), "a=>b");
		assert_eq!(GraphLink::new("x", "y", 2.0).id(), "x=>y");
	}

	#[test]
	fn deserializes_with_defaults_and_extra_attrs() {
		let data: GraphData = serde_json::from_str(
			r#"{
				"nodes": [{ "id": "a", "group": "left" }, { "id": "b", "radius": 9, "fx": 10 }],
				"links": [{ "source": "a", "target": "b", "value": 4, "kind": "dep" }]
			}"#,
		)
		.unwrap();

		assert_eq!(data.nodes[0].radius, DEFAULT_NODE_RADIUS);
		assert_eq!(data.nodes[0].attrs.get("group"), Some(&Value::from("left")));
		assert_eq!(data.nodes[1].radius, 9.0);
		assert_eq!(data.nodes[1].fx, Some(10.0));
		assert_eq!(data.nodes[1].fy, None);
		assert_eq!(data.links[0].value, 4.0);
		assert_eq!(data.links[0].attrs.get("kind"), Some(&Value::from("dep")));
	}

	#[test]
	fn pick_attrs_keeps_only_declared_keys() {
		let node = GraphNode::new("a").with_attr("group", "left").with_attr("secret", 1);
		let picked = pick_attrs(&node.attrs, &["group".to_string(), "missing".to_string()]);

		assert_eq!(picked.len(), 1);
		assert_eq!(picked.get("group"), Some(&Value::from("left")));
	}
}
