//! Leptos component rendering a force-directed graph as SVG.
//!
//! The component owns a [`GraphSession`] for its lifetime. Configuration
//! changes are reconciled in an effect; position reads are scheduled through
//! `requestAnimationFrame` by [`RafScheduler`], and an animating simulation
//! is stepped by a separate frame loop until it cools down. Unmounting drops
//! the session, which tears it down.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;

use super::engine::SimulationEngine;
use super::geometry::{LinkShape, link_shape, link_stroke_width, zoom_compensated};
use super::reconcile::SimulationConfig;
use super::session::{FrameScheduler, GraphSession, Layout};
use super::types::node_id;
use crate::components::pan_zoom::{PanZoomConfig, ZoomableGroup};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn request_frame(callback: &FrameCallback) -> Option<i32> {
	let window = web_sys::window()?;
	let callback = callback.borrow();
	let callback = callback.as_ref()?;
	match window.request_animation_frame(callback.as_ref().unchecked_ref()) {
		Ok(id) => Some(id),
		Err(e) => {
			warn!("force-graph: requestAnimationFrame failed: {e:?}");
			None
		}
	}
}

/// [`FrameScheduler`] backed by `requestAnimationFrame`.
pub struct RafScheduler {
	callback: FrameCallback,
}

impl FrameScheduler for RafScheduler {
	type Token = Option<i32>;

	fn request_frame(&mut self) -> Option<i32> {
		request_frame(&self.callback)
	}

	fn cancel_frame(&mut self, token: Option<i32>) {
		if let (Some(id), Some(window)) = (token, web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
	}
}

type Session = GraphSession<RafScheduler>;

/// Marker referenced by arrow links.
const ARROW_MARKER: &str = "force-graph-arrow";

/// How links are drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LinkStyle {
	arrows: bool,
	edge_offset: f64,
}

/// Link lines and node circles, in data order, at the latest read positions.
fn graph_layers(
	config: Signal<SimulationConfig, LocalStorage>,
	layout: ReadSignal<Layout>,
	scale: ReadSignal<f64>,
	style: LinkStyle,
) -> impl IntoView {
	let links = move || {
		let k = scale.get();
		layout.with(|layout| {
			config.with(|config| {
				let radii: HashMap<&str, f64> = config
					.data
					.nodes
					.iter()
					.map(|node| (node_id(node), node.radius))
					.collect();
				config
					.data
					.links
					.iter()
					.filter_map(|link| {
						let p = *layout.links.get(&link.id())?;
						let width = zoom_compensated(link_stroke_width(link), k);
						let arrow_radius = style
							.arrows
							.then(|| radii.get(link.target.as_str()).copied())
							.flatten();
						let shape = match link_shape(p, style.edge_offset, arrow_radius) {
							LinkShape::Arrow(d) => view! {
								<path
									class="graph-link"
									d=d
									stroke-width=width
									marker-end=format!("url(#{ARROW_MARKER})")
								/>
							}
							.into_any(),
							LinkShape::Line(p) => view! {
								<line
									class="graph-link"
									x1=p.x1
									y1=p.y1
									x2=p.x2
									y2=p.y2
									stroke-width=width
								/>
							}
							.into_any(),
						};
						Some(shape)
					})
					.collect_view()
			})
		})
	};
	let nodes = move || {
		layout.with(|layout| {
			config.with(|config| {
				config
					.data
					.nodes
					.iter()
					.filter_map(|node| {
						let id = node_id(node);
						let p = *layout.nodes.get(id)?;
						let id = id.to_string();
						Some(view! {
							<circle class="graph-node" data-id=id cx=p.cx cy=p.cy r=node.radius />
						})
					})
					.collect_view()
			})
		})
	};
	let defs = style.arrows.then(|| {
		view! {
			<defs>
				<marker
					id=ARROW_MARKER
					viewBox="0 -5 10 10"
					refX="10"
					refY="0"
					markerWidth="6"
					markerHeight="6"
					orient="auto"
				>
					<path d="M0,-5L10,0L0,5" />
				</marker>
			</defs>
		}
	});

	view! {
		{defs}
		<g class="graph-links">{links}</g>
		<g class="graph-nodes">{nodes}</g>
	}
}

/// Renders an interactive force-directed graph as SVG.
///
/// Each change of `config` is reconciled into the running simulation. With
/// `options.animate` off the layout is computed synchronously and drawn once;
/// otherwise nodes move every frame until the simulation cools. Passing `zoom`
/// wraps the graph in a [`ZoomableGroup`] sized to the configured canvas. The
/// canvas follows `options.width` and `options.height` as they change.
#[component]
pub fn ForceGraphSvg(
	/// Graph data and simulation options.
	#[prop(into)]
	config: Signal<SimulationConfig, LocalStorage>,
	/// Pan/zoom settings. Its `width` and `height` are taken from `config`.
	#[prop(optional)]
	zoom: Option<PanZoomConfig>,
	/// Draw links as arrows ending at the target node's edge.
	#[prop(default = false)]
	arrows: bool,
	/// Distance both link ends are pulled in towards each other.
	#[prop(default = 0.0)]
	edge_offset: f64,
) -> impl IntoView {
	let style = LinkStyle { arrows, edge_offset };
	let (layout, set_layout) = signal(Layout::default());
	let (scale, set_scale) = signal(1.0_f64);
	let session: Rc<RefCell<Option<Session>>> = Rc::new(RefCell::new(None));
	let read: FrameCallback = Rc::new(RefCell::new(None));
	let ticker: FrameCallback = Rc::new(RefCell::new(None));
	let ticking = Rc::new(Cell::new(false));

	let session_read = session.clone();
	*read.borrow_mut() = Some(Closure::new(move || {
		if let Some(session) = session_read.borrow_mut().as_mut() {
			set_layout.set(session.on_frame().clone());
		}
	}));

	let (session_tick, ticker_inner, ticking_inner) =
		(session.clone(), ticker.clone(), ticking.clone());
	*ticker.borrow_mut() = Some(Closure::new(move || {
		let running = match session_tick.borrow_mut().as_mut() {
			Some(session) => {
				session.advance();
				session.handle().engine().is_running()
			}
			None => false,
		};
		if !running || request_frame(&ticker_inner).is_none() {
			ticking_inner.set(false);
		}
	}));

	let (session_fx, read_fx, ticker_fx) = (session.clone(), read.clone(), ticker.clone());
	Effect::new(move |_| {
		let animate = config.with(|c| c.options.animate);
		let mut slot = session_fx.borrow_mut();
		let changed = if let Some(session) = slot.as_mut() {
			config.with(|c| session.update(c)).map(|outcome| outcome.changed)
		} else {
			let scheduler = RafScheduler {
				callback: read_fx.clone(),
			};
			config
				.with(|c| GraphSession::create(c, scheduler))
				.map(|created| {
					*slot = Some(created);
					true
				})
		};

		match changed {
			Err(e) => error!("force-graph: {e}"),
			Ok(true) if animate => {
				if let Some(session) = slot.as_mut() {
					session.restart();
				}
				drop(slot);
				if !ticking.get() {
					ticking.set(request_frame(&ticker_fx).is_some());
				}
			}
			Ok(_) => {}
		}
	});

	// Dropping the session cancels its pending read and stops the engine; the
	// ticker sees the empty slot on its next frame and ends.
	let owned = StoredValue::new_local(session);
	on_cleanup(move || {
		let _ = owned.try_with_value(|session| session.borrow_mut().take());
	});

	let size = Signal::derive(move || config.with(|c| (c.options.width, c.options.height)));
	let width = move || size.get().0;
	let height = move || size.get().1;
	let view_box = move || {
		let (width, height) = size.get();
		format!("0 0 {width} {height}")
	};

	match zoom {
		Some(zoom) => {
			let (initial_width, initial_height) = size.get_untracked();
			let zoom = PanZoomConfig {
				width: initial_width,
				height: initial_height,
				..zoom
			};
			let on_zoom = Callback::new(move |k: f64| set_scale.set(k));
			view! {
				<svg class="force-graph" width=width height=height viewBox=view_box>
					<ZoomableGroup config=zoom size=size on_zoom=on_zoom>
						{graph_layers(config, layout, scale, style)}
					</ZoomableGroup>
				</svg>
			}
			.into_any()
		}
		None => view! {
			<svg class="force-graph" width=width height=height viewBox=view_box>
				{graph_layers(config, layout, scale, style)}
			</svg>
		}
		.into_any(),
	}
}
