//! Minimum-variance (Capon) adaptive beamformer.
//!
//! Instead of fixed aperture weights, each fast-time sample gets its own
//! weight vector: the one minimizing output power subject to unit gain on
//! the steering vector. With a calibrated, non-directional array response
//! the steering vector is all-ones, so the constraint reduces to "pass the
//! coherent sum through unscaled".
//!
//! Per sample row `u` (after coherence-factor weighting):
//!
//! 1. `R = u * u^T` — single-snapshot spatial covariance.
//! 2. `R += delta * trace(R) * I` with `delta = 1/N` — diagonal loading;
//!    the raw outer product is rank-1, loading makes it invertible.
//! 3. `w = R^{-1} a / (a^T R^{-1} a)`.
//! 4. Output `v = w^T u`.
//!
//! Samples whose loaded covariance still fails to invert (all-silent rows)
//! produce 0 so one bad sample never aborts a line.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::minimum_variance::MvBeamformer;
//!
//! let mv = MvBeamformer::new(4);
//! // A coherent sample vector passes through with unit aperture gain
//! let v = mv.beamform_sample(&[0.5, 0.5, 0.5, 0.5]);
//! assert!((v - 0.5).abs() < 1e-9);
//!
//! // Silence maps to 0, not NaN
//! assert_eq!(mv.beamform_sample(&[0.0; 4]), 0.0);
//! ```

use tracing::debug;

use crate::coherence::apply_coherence_factor;
use crate::frame::LineData;
use crate::image::BeamformedImage;
use crate::matrix::{dot, Matrix};
use crate::types::BeamformResult;

/// Denominator magnitude below which `a^T R^{-1} a` counts as degenerate.
const DENOM_EPS: f64 = 1e-300;

/// Minimum-variance beamformer for a fixed active-aperture width.
#[derive(Debug, Clone)]
pub struct MvBeamformer {
    num_active_elements: usize,
    loading_factor: f64,
}

impl MvBeamformer {
    /// Create a beamformer for `num_active_elements` with the standard
    /// loading factor `delta = 1 / num_active_elements`.
    pub fn new(num_active_elements: usize) -> Self {
        assert!(num_active_elements > 0, "aperture must be nonzero");
        Self {
            num_active_elements,
            loading_factor: 1.0 / num_active_elements as f64,
        }
    }

    /// Override the diagonal loading factor (must be positive to guarantee
    /// invertibility of the loaded covariance).
    pub fn with_loading_factor(mut self, loading_factor: f64) -> Self {
        assert!(loading_factor > 0.0, "loading factor must be positive");
        self.loading_factor = loading_factor;
        self
    }

    /// Active-aperture width this beamformer expects.
    pub fn num_active_elements(&self) -> usize {
        self.num_active_elements
    }

    /// Diagonal loading factor delta.
    pub fn loading_factor(&self) -> f64 {
        self.loading_factor
    }

    /// Adaptive weight vector for one sample's per-element values.
    ///
    /// Returns `None` when the loaded covariance is singular or the
    /// unit-gain denominator degenerates (both only happen for silent or
    /// non-finite input).
    pub fn weights(&self, u: &[f64]) -> Option<Vec<f64>> {
        assert_eq!(
            u.len(),
            self.num_active_elements,
            "sample vector length must match the active aperture"
        );
        let n = self.num_active_elements;

        let mut r = Matrix::outer(u);
        r.add_scaled_identity(self.loading_factor * r.trace());
        let r_inv = r.inverse()?;

        // Steering vector: all-ones (calibrated, non-directional response)
        let a = vec![1.0; n];
        let r_inv_a = r_inv.mat_vec(&a);
        let denom = dot(&a, &r_inv_a);
        if !denom.is_finite() || denom.abs() < DENOM_EPS {
            return None;
        }
        Some(r_inv_a.iter().map(|v| v / denom).collect())
    }

    /// Beamform one sample row: `v = w^T u`, or 0 when the sample is
    /// degenerate.
    pub fn beamform_sample(&self, u: &[f64]) -> f64 {
        match self.weights(u) {
            Some(w) => dot(&w, u),
            None => {
                debug!("degenerate covariance sample, emitting 0");
                0.0
            }
        }
    }

    /// Beamform one line: coherence-factor weighting, then one adaptive
    /// weight solve per fast-time sample. Rows are independent.
    pub fn beamform_line(&self, line: &LineData) -> BeamformResult<Vec<f64>> {
        line.validate(Some(self.num_active_elements))?;
        let mut weighted = line.v_short.clone();
        apply_coherence_factor(&mut weighted);
        Ok(weighted.iter().map(|row| self.beamform_sample(row)).collect())
    }

    /// Beamform a whole frame of per-line data into an image buffer.
    ///
    /// The image height is the longest line; shorter lines leave their
    /// trailing rows zero. Returns the image plus each line's start time
    /// for subsequent time alignment.
    pub fn beamform_image(&self, lines: &[LineData]) -> BeamformResult<(BeamformedImage, Vec<f64>)> {
        let max_samples = lines.iter().map(LineData::num_samples).max().unwrap_or(0);
        let mut image = BeamformedImage::new(max_samples, lines.len());
        let mut t_starts = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let samples = self.beamform_line(line)?;
            image.set_line(index, &samples);
            t_starts.push(line.t_start);
        }
        Ok((image, t_starts))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
