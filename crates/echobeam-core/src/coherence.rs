//! Coherence factor weighting — coherent-to-incoherent energy ratio.
//!
//! For one fast-time sample across the active aperture, the coherence
//! factor is `(sum u)^2 / (n * sum u^2)`: 1.0 for perfectly coherent
//! element signals, approaching 0 for incoherent ones. It scales each
//! element's sample in place before adaptive processing, suppressing
//! focusing errors and off-axis clutter.
//!
//! A silent sample vector (zero denominator) yields 0 rather than NaN.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::coherence::coherence_factor;
//!
//! // Identical element values are fully coherent
//! assert!((coherence_factor(&[0.5, 0.5, 0.5, 0.5]) - 1.0).abs() < 1e-12);
//!
//! // A sign-alternating vector cancels: zero coherence
//! assert_eq!(coherence_factor(&[1.0, -1.0, 1.0, -1.0]), 0.0);
//!
//! // All-zero input would divide 0/0 — replaced by 0
//! assert_eq!(coherence_factor(&[0.0; 8]), 0.0);
//! ```

/// Coherence factor of one per-element sample vector, in `[0, 1]`.
///
/// `(sum u)^2 / (n * sum u^2)`; a zero denominator (all elements silent)
/// returns 0 instead of NaN.
pub fn coherence_factor(u: &[f64]) -> f64 {
    if u.is_empty() {
        return 0.0;
    }
    let sum: f64 = u.iter().sum();
    let sum_sq: f64 = u.iter().map(|v| v * v).sum();
    let denominator = u.len() as f64 * sum_sq;
    if denominator <= 0.0 {
        return 0.0;
    }
    (sum * sum) / denominator
}

/// Scale every element of every sample row by that row's coherence factor,
/// in place. Rows are fast-time samples, columns are active elements.
///
/// Returns the per-row coherence factors.
pub fn apply_coherence_factor(samples: &mut [Vec<f64>]) -> Vec<f64> {
    let mut factors = Vec::with_capacity(samples.len());
    for row in samples.iter_mut() {
        let cf = coherence_factor(row);
        for v in row.iter_mut() {
            *v *= cf;
        }
        factors.push(cf);
    }
    factors
}

// ===========================================================================
// Tests
// ===========================================================================
