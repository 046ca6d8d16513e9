//! Pan/zoom gesture controller.
//!
//! Turns mouse, wheel and touch input into a uniform-scale [`Transform`].
//! Each handler returns a [`GestureResponse`] telling the DOM adapter whether
//! to prevent the default action, stop propagation, and which change (if any)
//! to report.
//!
//! Bounds are soft: a zoom step leaving `[min_scale, max_scale]`, or a pan step
//! leaving the pan limit, is dropped whole. The transform is never snapped to
//! the boundary.

use serde::Deserialize;

use super::transform::Transform;
use crate::error::PanZoomError;

/// Pan/zoom configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanZoomConfig {
	/// Viewport width, the base of the horizontal pan limit.
	pub width: f64,
	/// Viewport height, the base of the vertical pan limit.
	pub height: f64,
	/// Fraction of the current scale added or removed per zoom step.
	pub zoom_speed: f64,
	/// Fraction of the viewport dimension beyond which panning is rejected.
	pub pan_limit: f64,
	/// Smallest scale a zoom step may reach.
	pub min_scale: f64,
	/// Largest scale a zoom step may reach.
	pub max_scale: f64,
	/// The device reports touch input; hover feedback is disabled.
	pub touch: bool,
}

impl Default for PanZoomConfig {
	fn default() -> Self {
		Self {
			width: 900.0,
			height: 600.0,
			zoom_speed: 0.065,
			pan_limit: 0.75,
			min_scale: 0.0,
			max_scale: f64::INFINITY,
			touch: false,
		}
	}
}

impl PanZoomConfig {
	/// Check the settings a controller cannot work with.
	pub fn validate(&self) -> Result<(), PanZoomError> {
		if !(self.zoom_speed > 0.0 && self.zoom_speed < 1.0) {
			return Err(PanZoomError::InvalidZoomSpeed(self.zoom_speed));
		}
		if !(self.pan_limit >= 0.0 && self.pan_limit.is_finite()) {
			return Err(PanZoomError::InvalidPanLimit(self.pan_limit));
		}
		if !(self.min_scale >= 0.0 && self.min_scale <= self.max_scale) {
			return Err(PanZoomError::InvalidScaleBounds {
				min: self.min_scale,
				max: self.max_scale,
			});
		}
		Ok(())
	}
}

/// A touch contact in client coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TouchPoint {
	/// Client x.
	pub x: f64,
	/// Client y.
	pub y: f64,
}

impl TouchPoint {
	/// A contact at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Point halfway between two contacts.
	pub fn midpoint(self, other: TouchPoint) -> TouchPoint {
		TouchPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}
}

/// Squared distance between two fingers. Only its change matters, so the
/// root is never taken.
pub fn pinch_length(first: TouchPoint, second: TouchPoint) -> f64 {
	(first.x - second.x).powi(2) + (first.y - second.y).powi(2)
}

/// Wheel-style delta from two pinch samples: fingers closing zoom out (`1`),
/// opening zoom in (`-1`).
pub fn pinch_delta(previous: f64, current: f64) -> f64 {
	if current < previous {
		1.0
	} else if current > previous {
		-1.0
	} else {
		0.0
	}
}

/// Where the active gesture came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerSource {
	/// Primary mouse button.
	Mouse,
	/// A single finger.
	Touch,
}

/// Gesture state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
	/// No gesture in progress.
	#[default]
	Idle,
	/// A pan in progress.
	Dragging {
		/// Last accepted pointer position.
		anchor: TouchPoint,
		/// Input that started the drag.
		source: PointerSource,
	},
	/// Two or more fingers down.
	Pinching {
		/// Last pinch sample, see [`pinch_length`].
		length: Option<f64>,
	},
}

/// A committed transform change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PanZoomEvent {
	/// The scale changed.
	Zoomed {
		/// Scale after the step.
		scale: f64,
	},
	/// The translation changed.
	Panned {
		/// Horizontal translation after the step.
		x: f64,
		/// Vertical translation after the step.
		y: f64,
	},
}

/// How the DOM adapter should treat the input event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureResponse {
	/// The committed change, if any.
	pub event: Option<PanZoomEvent>,
	/// Call `preventDefault` on the event.
	pub prevent_default: bool,
	/// Call `stopPropagation` on the event.
	pub stop_propagation: bool,
}

impl GestureResponse {
	/// Not ours: let the event continue untouched.
	pub fn pass_through() -> Self {
		Self::default()
	}

	/// Swallow the event without acting on it.
	pub fn suppressed() -> Self {
		Self {
			stop_propagation: true,
			..Self::default()
		}
	}

	/// Consume the event, reporting `event` if a change was committed.
	pub fn handled(event: Option<PanZoomEvent>) -> Self {
		Self {
			event,
			..Self::default()
		}
	}

	fn prevent_default(mut self) -> Self {
		self.prevent_default = true;
		self
	}
}

/// Maintains the pan/zoom transform for one view.
#[derive(Clone, Debug)]
pub struct PanZoomController {
	config: PanZoomConfig,
	transform: Transform,
	screen: Transform,
	gesture: GestureState,
}

impl PanZoomController {
	/// A controller at identity. Fails if `config` does not validate.
	pub fn new(config: PanZoomConfig) -> Result<Self, PanZoomError> {
		config.validate()?;
		Ok(Self {
			config,
			transform: Transform::IDENTITY,
			screen: Transform::IDENTITY,
			gesture: GestureState::Idle,
		})
	}

	/// Current configuration.
	pub fn config(&self) -> &PanZoomConfig {
		&self.config
	}

	/// Current transform.
	pub fn transform(&self) -> Transform {
		self.transform
	}

	/// Current scale.
	pub fn scale(&self) -> f64 {
		self.transform.scale()
	}

	/// Current gesture state.
	pub fn gesture(&self) -> GestureState {
		self.gesture
	}

	/// Hover feedback only makes sense without touch input.
	pub fn hover_enabled(&self) -> bool {
		!self.config.touch
	}

	/// Reset to identity, as on mount.
	pub fn reset(&mut self) {
		self.transform = Transform::IDENTITY;
		self.gesture = GestureState::Idle;
	}

	/// Track a new viewport size. The transform is kept; only the pan limit moves.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.config.width = width;
		self.config.height = height;
	}

	/// Screen transform of the owning SVG element, used to map client
	/// coordinates into its coordinate space before zooming.
	pub fn set_screen_matrix(&mut self, screen: Transform) {
		self.screen = screen;
	}

	/// Transform attribute to render, `None` when the matrix is unusable.
	pub fn svg_transform(&self) -> Option<String> {
		self.transform.svg_attr()
	}

	/// Scale multiplier for a wheel-style delta.
	pub fn scale_multiplier(&self, delta: f64) -> f64 {
		if delta > 0.0 {
			1.0 - self.config.zoom_speed
		} else if delta < 0.0 {
			1.0 + self.config.zoom_speed
		} else {
			1.0
		}
	}

	/// Zoom by `multiplier` keeping the client point `(client_x, client_y)` fixed.
	///
	/// Returns `None`, leaving the transform untouched, when the new scale
	/// falls outside the bounds or the input is degenerate.
	pub fn zoom_to(&mut self, client_x: f64, client_y: f64, multiplier: f64) -> Option<PanZoomEvent> {
		let previous = self.transform;
		let scale = previous.scale() * multiplier;
		if !(scale.is_finite() && scale > 0.0) {
			return None;
		}
		if scale > self.config.max_scale || scale < self.config.min_scale {
			return None;
		}

		let x = client_x * self.screen.a() - self.screen.translate_x();
		let y = client_y * self.screen.d() - self.screen.translate_y();
		let next = Transform::new(
			scale,
			x - multiplier * (x - previous.translate_x()),
			y - multiplier * (y - previous.translate_y()),
		);
		if !next.is_valid() {
			return None;
		}

		self.transform = next;
		Some(PanZoomEvent::Zoomed { scale })
	}

	/// Pan from the drag anchor to `(client_x, client_y)`.
	///
	/// Returns `None` without a drag anchor, or when the step would cross the
	/// pan limit; in that case the anchor is kept as well.
	pub fn pan_by(&mut self, client_x: f64, client_y: f64) -> Option<PanZoomEvent> {
		let GestureState::Dragging { anchor, source } = self.gesture else {
			return None;
		};
		let scale = self.transform.scale();
		let x = self.transform.translate_x() + (client_x - anchor.x);
		let y = self.transform.translate_y() + (client_y - anchor.y);

		// TODO: the limit assumes the content fits the viewport at scale >= 1;
		// graphs larger than the canvas get blocked before their edge is visible.
		let limit_x = self.config.width * self.config.pan_limit;
		let limit_y = self.config.height * self.config.pan_limit;
		let within = (x / scale).abs() <= limit_x && (y / scale).abs() <= limit_y;
		if !within {
			return None;
		}

		self.transform = self.transform.with_translate(x, y);
		self.gesture = GestureState::Dragging {
			anchor: TouchPoint::new(client_x, client_y),
			source,
		};
		Some(PanZoomEvent::Panned { x, y })
	}

	fn touch_active(&self) -> bool {
		matches!(
			self.gesture,
			GestureState::Pinching { .. }
				| GestureState::Dragging {
					source: PointerSource::Touch,
					..
				}
		)
	}

	/// Zoom about the pointer: `delta_y > 0` zooms out, `< 0` zooms in.
	pub fn on_wheel(&mut self, client_x: f64, client_y: f64, delta_y: f64) -> GestureResponse {
		let multiplier = self.scale_multiplier(delta_y);
		if multiplier == 1.0 {
			return GestureResponse::pass_through();
		}
		GestureResponse::handled(self.zoom_to(client_x, client_y, multiplier)).prevent_default()
	}

	/// `primary` is true for the main (usually left) mouse button.
	pub fn on_mouse_down(&mut self, client_x: f64, client_y: f64, primary: bool) -> GestureResponse {
		if self.touch_active() {
			return GestureResponse::suppressed();
		}
		if !primary {
			return GestureResponse::pass_through();
		}
		self.gesture = GestureState::Dragging {
			anchor: TouchPoint::new(client_x, client_y),
			source: PointerSource::Mouse,
		};
		GestureResponse::handled(None)
	}

	/// Pan while a mouse drag is active.
	pub fn on_mouse_move(&mut self, client_x: f64, client_y: f64) -> GestureResponse {
		if self.touch_active() {
			return GestureResponse::suppressed();
		}
		match self.gesture {
			GestureState::Dragging { .. } => GestureResponse::handled(self.pan_by(client_x, client_y)),
			_ => GestureResponse::pass_through(),
		}
	}

	/// End a mouse drag.
	pub fn on_mouse_up(&mut self) -> GestureResponse {
		if self.touch_active() {
			return GestureResponse::suppressed();
		}
		self.gesture = GestureState::Idle;
		GestureResponse::handled(None)
	}

	/// One finger starts a drag, two or more start a pinch.
	pub fn on_touch_start(&mut self, touches: &[TouchPoint]) -> GestureResponse {
		self.gesture = match touches {
			[] => return GestureResponse::pass_through(),
			[only] => GestureState::Dragging {
				anchor: *only,
				source: PointerSource::Touch,
			},
			[..] => GestureState::Pinching { length: None },
		};
		GestureResponse::handled(None)
	}

	/// Pan with one finger, zoom about the midpoint with two.
	pub fn on_touch_move(&mut self, touches: &[TouchPoint]) -> GestureResponse {
		match touches {
			[] => GestureResponse::pass_through(),
			[only] => {
				if matches!(self.gesture, GestureState::Pinching { .. }) {
					return GestureResponse::suppressed().prevent_default();
				}
				GestureResponse::handled(self.pan_by(only.x, only.y)).prevent_default()
			}
			[first, second, ..] => {
				let length = pinch_length(*first, *second);
				let previous = match self.gesture {
					GestureState::Pinching { length } => length,
					_ => None,
				};
				self.gesture = GestureState::Pinching {
					length: Some(length),
				};

				let event = previous.and_then(|previous| {
					let multiplier = self.scale_multiplier(pinch_delta(previous, length));
					if multiplier == 1.0 {
						return None;
					}
					let origin = first.midpoint(*second);
					self.zoom_to(origin.x, origin.y, multiplier)
				});
				GestureResponse::handled(event).prevent_default()
			}
		}
	}

	/// All fingers lifted.
	pub fn on_touch_end(&mut self) -> GestureResponse {
		self.on_touch_cancel()
	}

	/// The browser cancelled the touch sequence.
	pub fn on_touch_cancel(&mut self) -> GestureResponse {
		self.gesture = GestureState::Idle;
		GestureResponse::handled(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn controller() -> PanZoomController {
		PanZoomController::new(PanZoomConfig {
			width: 100.0,
			height: 100.0,
			zoom_speed: 0.1,
			pan_limit: 0.5,
			min_scale: 0.5,
			max_scale: 2.0,
			touch: false,
		})
		.unwrap()
	}

	fn approx(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-9
	}

	#[test]
	fn starts_at_identity() {
		let c = controller();
		assert_eq!(c.transform(), Transform::IDENTITY);
		assert_eq!(c.gesture(), GestureState::Idle);
	}

	#[test]
	fn wheel_direction_maps_to_multiplier() {
		let c = controller();
		assert!(approx(c.scale_multiplier(5.0), 0.9));
		assert!(approx(c.scale_multiplier(-5.0), 1.1));
		assert_eq!(c.scale_multiplier(0.0), 1.0);
	}

	#[test]
	fn zero_wheel_delta_is_ignored() {
		let mut c = controller();
		let response = c.on_wheel(10.0, 10.0, 0.0);
		assert_eq!(response, GestureResponse::pass_through());
		assert_eq!(c.transform(), Transform::IDENTITY);
	}

	#[test]
	fn zoom_keeps_point_under_cursor_fixed() {
		let mut c = controller();
		let event = c.zoom_to(40.0, 20.0, 1.5);

		assert_eq!(event, Some(PanZoomEvent::Zoomed { scale: 1.5 }));
		let t = c.transform();
		// (40, 20) maps to itself: 40 * 1.5 + e == 40
		assert!(approx(40.0 * t.scale() + t.translate_x(), 40.0));
		assert!(approx(20.0 * t.scale() + t.translate_y(), 20.0));
	}

	#[test]
	fn zoom_beyond_bounds_is_rejected_whole() {
		let mut c = controller();
		c.zoom_to(0.0, 0.0, 1.9).unwrap();
		let before = c.transform();

		assert_eq!(c.zoom_to(30.0, 30.0, 1.1), None);
		assert_eq!(c.transform(), before);
	}

	#[test]
	fn wheel_prevents_default_even_when_rejected() {
		let mut c = controller();
		for _ in 0..7 {
			c.on_wheel(0.0, 0.0, 1.0);
		}
		let response = c.on_wheel(0.0, 0.0, 1.0);
		assert!(response.prevent_default);
		assert_eq!(response.event, None);
		assert!(c.scale() >= 0.5);
	}

	#[test]
	fn screen_matrix_offsets_zoom_origin() {
		let mut c = controller();
		c.set_screen_matrix(Transform::new(1.0, 10.0, 0.0));
		c.zoom_to(50.0, 0.0, 2.0).unwrap();
		// client 50 maps to 40 in element space; 40 - 2 * 40 = -40
		assert!(approx(c.transform().translate_x(), -40.0));
	}

	#[test]
	fn mouse_drag_pans_and_moves_anchor() {
		let mut c = controller();
		c.on_mouse_down(10.0, 10.0, true);
		let response = c.on_mouse_move(20.0, 15.0);

		assert_eq!(response.event, Some(PanZoomEvent::Panned { x: 10.0, y: 5.0 }));
		assert_eq!(
			c.gesture(),
			GestureState::Dragging {
				anchor: TouchPoint::new(20.0, 15.0),
				source: PointerSource::Mouse
			}
		);
	}

	#[test]
	fn pan_beyond_limit_is_rejected_whole() {
		let mut c = controller();
		c.on_mouse_down(0.0, 0.0, true);
		c.on_mouse_move(45.0, 0.0).event.unwrap();

		// 45 + 10 = 55 > 0.5 * 100
		assert_eq!(c.on_mouse_move(55.0, 0.0).event, None);
		assert_eq!(c.transform().translate_x(), 45.0);
		// Anchor stayed at 45, so a small step still works.
		assert!(c.on_mouse_move(50.0, 0.0).event.is_some());
	}

	#[test]
	fn moves_without_a_drag_pass_through() {
		let mut c = controller();
		assert_eq!(c.on_mouse_move(5.0, 5.0), GestureResponse::pass_through());
		assert_eq!(c.pan_by(5.0, 5.0), None);
	}

	#[test]
	fn secondary_button_does_not_start_a_drag() {
		let mut c = controller();
		c.on_mouse_down(0.0, 0.0, false);
		assert_eq!(c.gesture(), GestureState::Idle);
	}

	#[test]
	fn mouse_up_ends_drag() {
		let mut c = controller();
		c.on_mouse_down(0.0, 0.0, true);
		c.on_mouse_up();
		assert_eq!(c.gesture(), GestureState::Idle);
	}

	#[test]
	fn emulated_mouse_events_are_suppressed_during_touch() {
		let mut c = controller();
		c.on_touch_start(&[TouchPoint::new(0.0, 0.0)]);

		assert!(c.on_mouse_down(0.0, 0.0, true).stop_propagation);
		assert!(c.on_mouse_move(10.0, 0.0).stop_propagation);
		assert!(c.on_mouse_up().stop_propagation);
		assert_eq!(c.transform(), Transform::IDENTITY);
	}

	#[test]
	fn single_finger_pans() {
		let mut c = controller();
		c.on_touch_start(&[TouchPoint::new(0.0, 0.0)]);
		let response = c.on_touch_move(&[TouchPoint::new(5.0, -5.0)]);

		assert!(response.prevent_default);
		assert_eq!(response.event, Some(PanZoomEvent::Panned { x: 5.0, y: -5.0 }));
	}

	#[test]
	fn pinch_delta_sign() {
		assert_eq!(pinch_delta(800.0, 400.0), 1.0);
		assert_eq!(pinch_delta(400.0, 800.0), -1.0);
		assert_eq!(pinch_delta(400.0, 400.0), 0.0);
	}

	#[test]
	fn pinch_length_is_squared_distance() {
		assert_eq!(pinch_length(TouchPoint::new(0.0, 0.0), TouchPoint::new(3.0, 4.0)), 25.0);
	}

	#[test]
	fn pinching_zooms_about_the_midpoint() {
		let mut c = controller();
		let near = [TouchPoint::new(40.0, 50.0), TouchPoint::new(60.0, 50.0)];
		let far = [TouchPoint::new(30.0, 50.0), TouchPoint::new(70.0, 50.0)];
		c.on_touch_start(&near);

		// First sample only records the distance.
		assert_eq!(c.on_touch_move(&near).event, None);
		let response = c.on_touch_move(&far);

		assert!(matches!(response.event, Some(PanZoomEvent::Zoomed { .. })));
		assert!(approx(c.scale(), 1.1));
		let t = c.transform();
		assert!(approx(50.0 * t.scale() + t.translate_x(), 50.0));

		c.on_touch_move(&near);
		assert!(approx(c.scale(), 1.1 * 0.9));
	}

	#[test]
	fn single_touch_moves_are_ignored_while_pinching() {
		let mut c = controller();
		c.on_touch_start(&[TouchPoint::new(0.0, 0.0), TouchPoint::new(10.0, 0.0)]);
		let response = c.on_touch_move(&[TouchPoint::new(30.0, 0.0)]);

		assert!(response.stop_propagation);
		assert_eq!(response.event, None);
		assert_eq!(c.transform(), Transform::IDENTITY);
	}

	#[test]
	fn touch_end_returns_to_idle() {
		let mut c = controller();
		c.on_touch_start(&[TouchPoint::new(0.0, 0.0), TouchPoint::new(10.0, 0.0)]);
		c.on_touch_end();
		assert_eq!(c.gesture(), GestureState::Idle);
	}

	#[test]
	fn wheel_still_zooms_while_dragging() {
		let mut c = controller();
		c.on_mouse_down(0.0, 0.0, true);
		assert!(c.on_wheel(0.0, 0.0, -1.0).event.is_some());
		assert!(matches!(c.gesture(), GestureState::Dragging { .. }));
	}

	#[test]
	fn hover_follows_touch_capability() {
		assert!(controller().hover_enabled());
		let touch = PanZoomController::new(PanZoomConfig {
			touch: true,
			..Default::default()
		})
		.unwrap();
		assert!(!touch.hover_enabled());
	}

	#[test]
	fn invalid_configs_are_rejected() {
		let bad_speed = PanZoomConfig {
			zoom_speed: 1.0,
			..Default::default()
		};
		assert_eq!(
			PanZoomController::new(bad_speed).err(),
			Some(PanZoomError::InvalidZoomSpeed(1.0))
		);

		let inverted = PanZoomConfig {
			min_scale: 3.0,
			max_scale: 2.0,
			..Default::default()
		};
		assert!(matches!(
			PanZoomController::new(inverted),
			Err(PanZoomError::InvalidScaleBounds { .. })
		));
	}

	#[test]
	fn resize_moves_the_pan_limit_and_keeps_the_transform() {
		let mut c = controller();
		c.on_mouse_down(0.0, 0.0, true);
		c.on_mouse_move(40.0, 0.0).event.unwrap();

		c.resize(200.0, 100.0);
		assert_eq!(c.transform().translate_x(), 40.0);
		assert_eq!(c.config().width, 200.0);
		// 40 + 30 = 70: over the old limit of 50, under the new one of 100.
		assert!(c.on_mouse_move(70.0, 0.0).event.is_some());

		c.resize(100.0, 100.0);
		assert_eq!(c.on_mouse_move(75.0, 0.0).event, None);
	}

	#[test]
	fn reset_restores_identity() {
		let mut c = controller();
		c.zoom_to(10.0, 10.0, 1.5).unwrap();
		c.on_mouse_down(0.0, 0.0, true);
		c.reset();
		assert_eq!(c.transform(), Transform::IDENTITY);
		assert_eq!(c.gesture(), GestureState::Idle);
	}
}
