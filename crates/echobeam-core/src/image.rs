//! Image buffer and B-mode post-processing.
//!
//! The beamformers fill a [`BeamformedImage`] one line (column) at a time.
//! Post-processing turns it into a displayable B-mode frame: envelope
//! detection via the analytic signal, NaN/Inf scrubbing, normalization by
//! the global maximum, per-line time alignment onto a shared fast-time
//! axis, and logarithmic compression into a dB display range.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::image::BeamformedImage;
//!
//! let mut image = BeamformedImage::new(4, 2);
//! image.set_line(0, &[1.0, 2.0, 4.0, 8.0]);
//! image.set_line(1, &[0.5, 0.25]); // short lines leave the rest zero
//!
//! image.normalize_max();
//! assert_eq!(image.get(3, 0), 1.0);
//!
//! let db = image.log_compress(60.0);
//! assert_eq!(db.get(3, 0), 60.0); // peak maps to the top of the range
//! ```

use num_complex::Complex64;
use rustfft::FftPlanner;
use tracing::debug;

// ---------------------------------------------------------------------------
// BeamformedImage
// ---------------------------------------------------------------------------

/// A 2-D real-valued image, indexed by `(sample, line)` — rows are
/// fast-time samples (depth), columns are image lines. Stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamformedImage {
    data: Vec<f64>,
    num_samples: usize,
    num_lines: usize,
}

impl BeamformedImage {
    /// Create an all-zero image of the given shape.
    pub fn new(num_samples: usize, num_lines: usize) -> Self {
        Self {
            data: vec![0.0; num_samples * num_lines],
            num_samples,
            num_lines,
        }
    }

    /// Rows (fast-time samples per line).
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Columns (image lines).
    pub fn num_lines(&self) -> usize {
        self.num_lines
    }

    /// Value at `(sample, line)`. Panics if out of bounds.
    #[inline]
    pub fn get(&self, sample: usize, line: usize) -> f64 {
        assert!(sample < self.num_samples && line < self.num_lines);
        self.data[sample * self.num_lines + line]
    }

    /// Set the value at `(sample, line)`. Panics if out of bounds.
    #[inline]
    pub fn set(&mut self, sample: usize, line: usize, value: f64) {
        assert!(sample < self.num_samples && line < self.num_lines);
        self.data[sample * self.num_lines + line] = value;
    }

    /// Write one line's samples into column `line`, starting at row 0.
    /// Samples beyond the image height are dropped; rows past the input
    /// stay at their current value.
    pub fn set_line(&mut self, line: usize, samples: &[f64]) {
        assert!(line < self.num_lines, "line index out of bounds");
        for (sample, &v) in samples.iter().enumerate().take(self.num_samples) {
            self.data[sample * self.num_lines + line] = v;
        }
    }

    /// Flat view of the pixel data, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Replace every NaN or infinite value with 0. Runs before
    /// normalization so one bad sample cannot poison the global maximum.
    pub fn scrub_non_finite(&mut self) {
        let mut scrubbed = 0usize;
        for v in self.data.iter_mut() {
            if !v.is_finite() {
                *v = 0.0;
                scrubbed += 1;
            }
        }
        if scrubbed > 0 {
            debug!(scrubbed, "replaced non-finite image samples with 0");
        }
    }

    /// Divide the image by its global maximum absolute value.
    ///
    /// An all-zero image is left untouched — no divide-by-zero, no NaN.
    pub fn normalize_max(&mut self) {
        let max_abs = self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if max_abs > 0.0 {
            for v in self.data.iter_mut() {
                *v /= max_abs;
            }
        }
    }

    /// Logarithmic compression: `20 * log10(|v|) + dynamic_range_db`,
    /// clamped to the display range `[0, dynamic_range_db]`.
    ///
    /// Zero-valued pixels land at the bottom of the range.
    pub fn log_compress(&self, dynamic_range_db: f64) -> BeamformedImage {
        let data = self
            .data
            .iter()
            .map(|&v| (20.0 * v.abs().log10() + dynamic_range_db).clamp(0.0, dynamic_range_db))
            .collect();
        BeamformedImage {
            data,
            num_samples: self.num_samples,
            num_lines: self.num_lines,
        }
    }

    /// Shift each line onto a shared fast-time axis.
    ///
    /// Line `l` is moved down by `round(t_starts[l] * sampling_rate)`
    /// samples into a double-height output buffer; everything else is zero.
    /// Offsets that push samples outside the buffer drop those samples.
    pub fn time_align(&self, t_starts: &[f64], sampling_rate: f64) -> BeamformedImage {
        assert_eq!(
            t_starts.len(),
            self.num_lines,
            "one start time per line required"
        );
        let out_samples = self.num_samples * 2;
        let mut out = BeamformedImage::new(out_samples, self.num_lines);
        for (line, &t_start) in t_starts.iter().enumerate() {
            let offset = (t_start * sampling_rate).round() as isize;
            for sample in 0..self.num_samples {
                let dst = sample as isize + offset;
                if dst >= 0 && (dst as usize) < out_samples {
                    out.data[dst as usize * self.num_lines + line] =
                        self.data[sample * self.num_lines + line];
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Envelope detection
// ---------------------------------------------------------------------------

/// Envelope of a real-valued signal via the analytic signal (Hilbert
/// transform): FFT, zero the negative frequencies, double the positive
/// ones, inverse FFT, take magnitudes.
pub fn envelope_detect(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex64> = signal.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    fft.process(&mut spectrum);

    // DC (and Nyquist for even n) stay as-is; positive bins double,
    // negative bins vanish. For odd n the positive bins run up to and
    // including (n - 1) / 2, so the doubling bound is ceil(n / 2).
    for bin in spectrum.iter_mut().take(n.div_ceil(2)).skip(1) {
        *bin *= 2.0;
    }
    for bin in spectrum.iter_mut().skip(n / 2 + 1) {
        *bin = Complex64::new(0.0, 0.0);
    }

    ifft.process(&mut spectrum);
    let scale = 1.0 / n as f64;
    spectrum.iter().map(|c| c.norm() * scale).collect()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-12;

    // --- 1. buffer basics ---------------------------------------------------

    #[test]
    fn test_new_is_zero() {
        let img = BeamformedImage::new(3, 2);
        assert_eq!(img.num_samples(), 3);
        assert_eq!(img.num_lines(), 2);
        assert!(img.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_set_line_short_and_long() {
        let mut img = BeamformedImage::new(3, 2);
        img.set_line(0, &[1.0]); // short: rest of the column stays zero
        img.set_line(1, &[4.0, 5.0, 6.0, 7.0]); // long: excess dropped
        assert_eq!(img.get(0, 0), 1.0);
        assert_eq!(img.get(1, 0), 0.0);
        assert_eq!(img.get(2, 1), 6.0);
    }

    // --- 2. scrubbing & normalization ---------------------------------------

    #[test]
    fn test_scrub_non_finite() {
        let mut img = BeamformedImage::new(2, 2);
        img.set(0, 0, f64::NAN);
        img.set(0, 1, f64::INFINITY);
        img.set(1, 0, -3.0);
        img.scrub_non_finite();
        assert_eq!(img.get(0, 0), 0.0);
        assert_eq!(img.get(0, 1), 0.0);
        assert_eq!(img.get(1, 0), -3.0);
    }

    #[test]
    fn test_normalize_max() {
        let mut img = BeamformedImage::new(2, 1);
        img.set(0, 0, -4.0);
        img.set(1, 0, 2.0);
        img.normalize_max();
        assert_relative_eq!(img.get(0, 0), -1.0, epsilon = EPS);
        assert_relative_eq!(img.get(1, 0), 0.5, epsilon = EPS);
    }

    #[test]
    fn test_normalize_all_zero_stays_zero() {
        let mut img = BeamformedImage::new(8, 4);
        img.normalize_max();
        assert!(img.as_slice().iter().all(|&v| v == 0.0 && !v.is_nan()));
    }

    // --- 3. log compression --------------------------------------------------

    #[test]
    fn test_log_compress_peak_and_floor() {
        let mut img = BeamformedImage::new(3, 1);
        img.set(0, 0, 1.0); // 0 dB -> 60
        img.set(1, 0, 0.001); // -60 dB -> 0
        img.set(2, 0, 0.0); // -inf dB -> clamped to 0
        let db = img.log_compress(60.0);
        assert_relative_eq!(db.get(0, 0), 60.0, epsilon = 1e-9);
        assert_relative_eq!(db.get(1, 0), 0.0, epsilon = 1e-9);
        assert_eq!(db.get(2, 0), 0.0);
    }

    #[test]
    fn test_log_compress_within_range() {
        let mut img = BeamformedImage::new(100, 1);
        for i in 0..100 {
            img.set(i, 0, (i as f64 + 1.0) / 100.0);
        }
        let db = img.log_compress(40.0);
        for &v in db.as_slice() {
            assert!((0.0..=40.0).contains(&v), "out of display range: {v}");
        }
    }

    // --- 4. time alignment ----------------------------------------------------

    #[test]
    fn test_time_align_shifts_by_rounded_offset() {
        let mut img = BeamformedImage::new(3, 2);
        img.set_line(0, &[1.0, 2.0, 3.0]);
        img.set_line(1, &[4.0, 5.0, 6.0]);
        // line 0: offset round(1.6) = 2; line 1: offset round(0.4) = 0
        let aligned = img.time_align(&[1.6, 0.4], 1.0);
        assert_eq!(aligned.num_samples(), 6);
        assert_eq!(aligned.get(0, 0), 0.0);
        assert_eq!(aligned.get(2, 0), 1.0);
        assert_eq!(aligned.get(4, 0), 3.0);
        assert_eq!(aligned.get(0, 1), 4.0);
        assert_eq!(aligned.get(2, 1), 6.0);
        assert_eq!(aligned.get(3, 1), 0.0);
    }

    #[test]
    fn test_time_align_drops_out_of_range() {
        let mut img = BeamformedImage::new(2, 1);
        img.set_line(0, &[1.0, 2.0]);
        // Offset 3 pushes sample 1 to row 4, equal to the buffer height: dropped
        let aligned = img.time_align(&[3.0], 1.0);
        assert_eq!(aligned.get(3, 0), 1.0);
        assert_eq!(aligned.num_samples(), 4);
    }

    // --- 5. envelope detection --------------------------------------------------

    #[test]
    fn test_envelope_of_sine_is_amplitude() {
        let n = 128;
        let amplitude = 2.5;
        let signal: Vec<f64> = (0..n)
            .map(|i| amplitude * (2.0 * PI * 8.0 * i as f64 / n as f64).sin())
            .collect();
        let env = envelope_detect(&signal);
        assert_eq!(env.len(), n);
        for (i, &e) in env.iter().enumerate().take(n - 8).skip(8) {
            assert!(
                (e - amplitude).abs() < 0.1,
                "env[{i}] = {e}, expected ~{amplitude}"
            );
        }
    }

    #[test]
    fn test_envelope_odd_length_highest_bin() {
        // Odd n has no Nyquist bin: the top positive bin (n - 1) / 2 must be
        // doubled like the rest, or a cosine there loses half its energy.
        let n = 127;
        let k = 63.0; // (n - 1) / 2
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * k * i as f64 / n as f64).cos())
            .collect();
        let env = envelope_detect(&signal);
        assert_eq!(env.len(), n);
        for &e in &env {
            assert_relative_eq!(e, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_envelope_of_dc() {
        let env = envelope_detect(&[1.5; 64]);
        for &e in &env {
            assert_relative_eq!(e, 1.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_envelope_empty() {
        assert!(envelope_detect(&[]).is_empty());
    }
}
