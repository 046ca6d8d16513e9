//! svg-force-graph: declarative force-directed graphs rendered as SVG.
//!
//! The core is DOM-free: a reconciler that applies configuration changes to a
//! long-lived force simulation incrementally, and a pan/zoom controller that
//! turns pointer gestures into a bounded transform. Leptos components bind
//! both to the browser for the CSR build.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod error;

pub use components::force_graph::{
	ForceGraphSvg, ForceSimulation, GraphData, GraphLink, GraphNode, GraphSession, Layout,
	SimulationConfig, SimulationEngine, SimulationHandle, SimulationOptions,
};
pub use components::pan_zoom::{PanZoomConfig, PanZoomController, Transform, ZoomableGroup};
pub use error::{PanZoomError, SimulationError};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("svg-force-graph: logging initialized");
}

/// Parse the JSON body of the `<script>` element with the given id.
fn load_json<T: DeserializeOwned>(id: &str) -> Option<T> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match serde_json::from_str::<T>(&json_text) {
		Ok(value) => Some(value),
		Err(e) => {
			warn!("svg-force-graph: failed to parse #{id}: {e}");
			None
		}
	}
}

/// Graph data from `<script id="graph-data">`: `{ nodes: [...], links: [...] }`.
fn load_graph_data() -> Option<GraphData> {
	let data: GraphData = load_json("graph-data")?;
	info!(
		"svg-force-graph: loaded {} nodes, {} links",
		data.nodes.len(),
		data.links.len()
	);
	Some(data)
}

/// Simulation options from `<script id="graph-options">`.
fn load_graph_options() -> Option<SimulationOptions> {
	load_json("graph-options")
}

/// Demo application: loads the graph from the page and renders it zoomable.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let config = SimulationConfig::new(
		load_graph_data().unwrap_or_default(),
		load_graph_options().unwrap_or_default(),
	);
	let config = Signal::stored_local(config);

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Force Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="graph-container">
			<ForceGraphSvg config=config zoom=PanZoomConfig::default() />
			<p class="subtitle">"Scroll or pinch to zoom. Drag the background to pan."</p>
		</div>
	}
}
