//! Error types for simulation reconciliation and pan/zoom configuration.
//!
//! Rejected gesture steps are not errors: an out-of-bounds zoom or pan is
//! dropped silently by the controller. These types only cover configurations
//! that can never work.

use thiserror::Error;

/// Errors raised while driving a simulation to convergence.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
	/// The alpha schedule never reaches `alpha_min`, so a synchronous run would not end.
	#[error(
		"simulation cannot converge: alpha {alpha} with decay {alpha_decay} never reaches {alpha_min} (target {alpha_target})"
	)]
	NonConvergent {
		/// Alpha when the run gave up.
		alpha: f64,
		/// Configured alpha decay.
		alpha_decay: f64,
		/// Configured stopping threshold.
		alpha_min: f64,
		/// Configured alpha target.
		alpha_target: f64,
	},
}

/// Errors raised when a pan/zoom configuration is unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PanZoomError {
	/// Zoom speed must lie strictly between 0 and 1.
	#[error("zoom speed must be in (0, 1), got {0}")]
	InvalidZoomSpeed(f64),

	/// Pan limit must be a non-negative number.
	#[error("pan limit must be non-negative, got {0}")]
	InvalidPanLimit(f64),

	/// Scale bounds must satisfy `0 <= min <= max`.
	#[error("invalid scale bounds: min {min}, max {max}")]
	InvalidScaleBounds {
		/// Configured minimum scale.
		min: f64,
		/// Configured maximum scale.
		max: f64,
	},
}

/// Result alias for reconciler operations.
pub type SimulationResult<T> = Result<T, SimulationError>;
