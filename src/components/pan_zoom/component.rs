//! Leptos wrapper turning an SVG `<g>` into a pan/zoom surface.
//!
//! DOM events are translated into [`PanZoomController`] calls; the returned
//! [`GestureResponse`] decides `preventDefault`/`stopPropagation`, and any
//! committed change re-renders the group's `transform` attribute.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::JsCast;
use web_sys::{Event, MouseEvent, SvgGraphicsElement, TouchEvent, TouchList, WheelEvent};

use super::controller::{GestureResponse, PanZoomConfig, PanZoomController, PanZoomEvent, TouchPoint};
use super::transform::Transform;

/// Shared state of one mounted surface.
#[derive(Clone)]
struct Surface {
	controller: Rc<RefCell<PanZoomController>>,
	set_transform: WriteSignal<Option<String>>,
	on_zoom: Option<Callback<f64>>,
	on_pan: Option<Callback<(f64, f64)>>,
}

impl Surface {
	fn dispatch(&self, ev: &Event, gesture: impl FnOnce(&mut PanZoomController) -> GestureResponse) {
		let response = {
			let mut controller = self.controller.borrow_mut();
			if let Some(screen) = screen_matrix(ev) {
				controller.set_screen_matrix(screen);
			}
			let response = gesture(&mut controller);
			if response.event.is_some() {
				self.set_transform.set(controller.svg_transform());
			}
			response
		};

		if response.prevent_default {
			ev.prevent_default();
		}
		if response.stop_propagation {
			ev.stop_propagation();
		}
		match response.event {
			Some(PanZoomEvent::Zoomed { scale }) => {
				if let Some(on_zoom) = &self.on_zoom {
					on_zoom.run(scale);
				}
			}
			Some(PanZoomEvent::Panned { x, y }) => {
				if let Some(on_pan) = &self.on_pan {
					on_pan.run((x, y));
				}
			}
			None => {}
		}
	}
}

/// Screen transform of the SVG element owning the event's group.
fn screen_matrix(ev: &Event) -> Option<Transform> {
	let group: SvgGraphicsElement = ev.current_target()?.dyn_into().ok()?;
	let ctm = group.owner_svg_element()?.get_screen_ctm()?;
	Transform::from_values(&[
		ctm.a().into(),
		ctm.b().into(),
		ctm.c().into(),
		ctm.d().into(),
		ctm.e().into(),
		ctm.f().into(),
	])
}

fn touch_points(list: &TouchList) -> Vec<TouchPoint> {
	(0..list.length())
		.filter_map(|i| list.get(i))
		.map(|touch| TouchPoint::new(touch.client_x().into(), touch.client_y().into()))
		.collect()
}

fn client_point(ev: &MouseEvent) -> (f64, f64) {
	(ev.client_x().into(), ev.client_y().into())
}

/// SVG group that pans on drag and zooms on wheel or pinch.
///
/// The transform starts at identity on mount. With `disabled = true` the
/// children render untransformed and no handlers are attached. When `size`
/// changes the pan limit follows it; the current transform is kept.
#[component]
pub fn ZoomableGroup(
	/// Gesture settings, validated on mount.
	#[prop(optional)]
	config: PanZoomConfig,
	/// Render the children without gestures.
	#[prop(default = false)]
	disabled: bool,
	/// Viewport size. Defaults to the configured `width` and `height`.
	#[prop(optional, into)]
	size: Option<Signal<(f64, f64)>>,
	/// Called with the new scale after each committed zoom.
	#[prop(optional, into)]
	on_zoom: Option<Callback<f64>>,
	/// Called with the new translation after each committed pan.
	#[prop(optional, into)]
	on_pan: Option<Callback<(f64, f64)>>,
	/// Content to transform.
	children: Children,
) -> impl IntoView {
	if disabled {
		return view! { <g class="zoomable-group">{children()}</g> }.into_any();
	}

	let size = size.unwrap_or_else(|| Signal::stored((config.width, config.height)));
	let controller = match PanZoomController::new(config) {
		Ok(controller) => controller,
		Err(e) => {
			error!("pan-zoom: {e}; rendering without gestures");
			return view! { <g class="zoomable-group">{children()}</g> }.into_any();
		}
	};
	let hover = controller.hover_enabled();
	let (transform, set_transform) = signal(controller.svg_transform());
	let surface = Surface {
		controller: Rc::new(RefCell::new(controller)),
		set_transform,
		on_zoom,
		on_pan,
	};

	let resized = surface.controller.clone();
	Effect::new(move |_| {
		let (width, height) = size.get();
		resized.borrow_mut().resize(width, height);
	});

	let s = surface.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let (x, y) = client_point(&ev);
		s.dispatch(&ev, |c| c.on_mouse_down(x, y, ev.button() == 0));
	};
	let s = surface.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let (x, y) = client_point(&ev);
		s.dispatch(&ev, |c| c.on_mouse_move(x, y));
	};
	let s = surface.clone();
	let on_mouseup = move |ev: MouseEvent| s.dispatch(&ev, |c| c.on_mouse_up());
	let s = surface.clone();
	let on_wheel = move |ev: WheelEvent| {
		let (x, y) = client_point(&ev);
		let delta = ev.delta_y();
		s.dispatch(&ev, |c| c.on_wheel(x, y, delta));
	};
	let s = surface.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let touches = touch_points(&ev.touches());
		s.dispatch(&ev, |c| c.on_touch_start(&touches));
	};
	let s = surface.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let touches = touch_points(&ev.touches());
		s.dispatch(&ev, |c| c.on_touch_move(&touches));
	};
	let s = surface.clone();
	let on_touchend = move |ev: TouchEvent| s.dispatch(&ev, |c| c.on_touch_end());
	let s = surface;
	let on_touchcancel = move |ev: TouchEvent| s.dispatch(&ev, |c| c.on_touch_cancel());

	view! {
		<g
			class="zoomable-group"
			class:hoverable=hover
			transform=move || transform.get()
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			on:touchcancel=on_touchcancel
		>
			<rect
				class="zoomable-group-hit"
				x=move || -size.get().0
				y=move || -size.get().1
				width=move || size.get().0 * 3.0
				height=move || size.get().1 * 3.0
				fill="transparent"
			/>
			{children()}
		</g>
	}
	.into_any()
}
