//! Link geometry helpers for the rendering layer.
//!
//! Degenerate input (zero-length segments, zero or non-finite scale) leaves
//! values unchanged instead of producing `NaN` or infinities.

use super::session::LinkPosition;
use super::types::GraphLink;

/// Below this length a segment has no usable direction.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Stroke width of a link: an explicit non-zero width, else `sqrt(value)`.
pub fn link_stroke_width(link: &GraphLink) -> f64 {
	link.stroke_width
		.filter(|width| *width != 0.0 && width.is_finite())
		.unwrap_or_else(|| link.value.sqrt())
}

/// Keep a size constant on screen under zoom `scale`.
pub fn zoom_compensated(size: f64, scale: f64) -> f64 {
	if scale.is_finite() && scale > 0.0 {
		size / scale
	} else {
		size
	}
}

/// Pull both ends of a segment in by `offset` along its direction.
pub fn offset_line(line: LinkPosition, offset: f64) -> LinkPosition {
	let (dx, dy) = (line.x2 - line.x1, line.y2 - line.y1);
	let length = line.length();
	if length < MIN_SEGMENT_LENGTH || offset == 0.0 {
		return line;
	}
	let (ox, oy) = (dx / length * offset, dy / length * offset);
	LinkPosition {
		x1: line.x1 + ox,
		y1: line.y1 + oy,
		x2: line.x2 - ox,
		y2: line.y2 - oy,
	}
}

/// SVG path for an arrow link that stops at the target node's edge.
///
/// Returns `None` for a zero-length link; the caller keeps its previous path.
pub fn arrow_path(line: LinkPosition, target_radius: f64) -> Option<String> {
	let length = line.length();
	if length < MIN_SEGMENT_LENGTH || !length.is_finite() || !target_radius.is_finite() {
		return None;
	}
	let (dx, dy) = (line.x2 - line.x1, line.y2 - line.y1);
	let (ox, oy) = (dx * target_radius / length, dy * target_radius / length);
	Some(format!(
		"M{},{}L{},{}",
		line.x1,
		line.y1,
		line.x2 - ox,
		line.y2 - oy
	))
}

/// What to draw for one link.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkShape {
	/// A plain `<line>`.
	Line(LinkPosition),
	/// A `<path>` ending at the target node's edge, carrying an arrow marker.
	Arrow(String),
}

/// Shape of a link after pulling its ends in by `edge_offset`.
///
/// With `arrow_radius` set the link becomes an arrow stopping that far short
/// of the target; a link too short for an arrow falls back to a line.
pub fn link_shape(line: LinkPosition, edge_offset: f64, arrow_radius: Option<f64>) -> LinkShape {
	let line = offset_line(line, edge_offset);
	match arrow_radius.and_then(|radius| arrow_path(line, radius)) {
		Some(path) => LinkShape::Arrow(path),
		None => LinkShape::Line(line),
	}
}
