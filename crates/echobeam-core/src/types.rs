//! Core types for ultrasound beamforming
//!
//! This module defines the fundamental types used throughout the beamforming
//! library: sample aliases for real RF and complex I/Q data, the shared error
//! enum, and the result alias every fallible entry point returns.
//!
//! ## RF vs. I/Q data
//!
//! Raw element data arrives either as real-valued RF traces (one voltage
//! sample per fast-time index) or as complex analytic/demodulated I/Q
//! samples. The delay-and-sum path handles both; the complex path applies a
//! carrier phase rotation on top of the fractional-delay interpolation.

use num_complex::Complex64;

/// A real-valued RF sample.
pub type Sample = f64;

/// A complex I/Q (analytic or demodulated) sample.
pub type IqSample = Complex64;

/// One element's trace of real RF samples.
pub type RfTrace = Vec<Sample>;

/// Result type for beamforming operations.
pub type BeamformResult<T> = Result<T, BeamformError>;

/// Errors that can occur during beamforming.
///
/// Per-sample numerical degeneracies are absorbed locally and never surface
/// through this enum: a singular covariance matrix yields 0 for that sample
/// (see [`crate::minimum_variance::MvBeamformer::beamform_sample`]), and an
/// out-of-range fast-time index masks the element. Only fatal conditions —
/// inputs or geometry the whole reconstruction cannot proceed from — are
/// reported here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BeamformError {
    /// Frame or line input failed schema validation. Fatal: processing
    /// halts with no partial output.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Geometry parameters that cannot produce a finite virtual source or
    /// aperture (e.g. `sin(beta) = 0`, zero array width).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}
