//! Pan and zoom for SVG content.
//!
//! [`PanZoomController`] holds the gesture state machine and the transform;
//! it has no DOM dependency and is driven directly in tests. The
//! [`ZoomableGroup`] component binds it to browser events.
//!
//! # Example
//!
//! ```ignore
//! use svg_force_graph::{PanZoomConfig, ZoomableGroup};
//!
//! view! {
//!     <svg width="900" height="600">
//!         <ZoomableGroup config=PanZoomConfig::default() on_zoom=move |k| log::info!("{k}")>
//!             <circle cx="10" cy="10" r="5" />
//!         </ZoomableGroup>
//!     </svg>
//! }
//! ```

mod component;
mod controller;
mod transform;

pub use component::ZoomableGroup;
pub use controller::{
	GestureResponse, GestureState, PanZoomConfig, PanZoomController, PanZoomEvent, PointerSource,
	TouchPoint, pinch_delta, pinch_length,
};
pub use transform::Transform;
