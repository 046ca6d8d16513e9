//! 2-D affine transform used for pan and zoom.
//!
//! Stored as the SVG matrix `[a, b, c, d, e, f]`. Pan/zoom only ever writes
//! uniform, non-rotating transforms: `a == d == scale`, `b == c == 0`, with
//! `(e, f)` the translation.

use std::fmt;

/// An SVG-style affine matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform(pub [f64; 6]);

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Transform {
	/// No scale, no translation.
	pub const IDENTITY: Transform = Transform([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

	/// Uniform scale followed by a translation.
	pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
		Transform([scale, 0.0, 0.0, scale, translate_x, translate_y])
	}

	/// Build from raw values, rejecting anything that is not six numbers.
	pub fn from_values(values: &[f64]) -> Option<Self> {
		let matrix: [f64; 6] = values.try_into().ok()?;
		let transform = Transform(matrix);
		transform.is_valid().then_some(transform)
	}

	/// Horizontal scale component.
	pub fn a(&self) -> f64 {
		self.0[0]
	}

	/// Vertical scale component.
	pub fn d(&self) -> f64 {
		self.0[3]
	}

	/// Uniform scale, read from `a`.
	pub fn scale(&self) -> f64 {
		self.0[0]
	}

	/// Horizontal translation in screen units.
	pub fn translate_x(&self) -> f64 {
		self.0[4]
	}

	/// Vertical translation in screen units.
	pub fn translate_y(&self) -> f64 {
		self.0[5]
	}

	/// Same linear part, new translation.
	pub fn with_translate(self, translate_x: f64, translate_y: f64) -> Self {
		let mut matrix = self.0;
		matrix[4] = translate_x;
		matrix[5] = translate_y;
		Transform(matrix)
	}

	/// Every component is a finite number.
	pub fn is_valid(&self) -> bool {
		self.0.iter().all(|v| v.is_finite())
	}

	/// `matrix(a b c d e f)` for an SVG `transform` attribute, or `None`
	/// when the matrix is unusable and no transform should be applied.
	pub fn svg_attr(&self) -> Option<String> {
		self.is_valid().then(|| self.to_string())
	}
}

impl fmt::Display for Transform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let [a, b, c, d, e, g] = self.0;
		write!(f, "matrix({a} {b} {c} {d} {e} {g})")
	}
}
