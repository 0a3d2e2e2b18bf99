//! Delay-and-sum (DAS) beamformer with fractional-delay interpolation.
//!
//! For each output `(sample, line)` position the beamformer computes every
//! element's fractional fast-time index, splits it into an integer floor
//! and a non-positive remainder `frac = floor(index) - index`, and forms a
//! two-tap interpolation: weight `1 + frac` on the floor sample and
//! `-frac` on its successor. Elements masked out by the bounds or
//! f-number aperture checks contribute zero, as does a tap that would
//! reach past the end of an element's trace.
//!
//! The I/Q path additionally rotates the two-tap result by
//! `exp(i*2*pi*fc*tau)` to re-align the carrier phase of demodulated data.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::config::ImagingConfig;
//! use echobeam_core::das::DasBeamformer;
//! use echobeam_core::geometry::Point3;
//!
//! let das = DasBeamformer::new(ImagingConfig::default()).unwrap();
//! let rf = vec![vec![0.0; 2122]; 128]; // rows = elements
//! let v = das.beamform_point(&rf, Point3::new(0.0, 0.0, 0.05));
//! assert_eq!(v, 0.0); // silence in, silence out
//! ```

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::config::ImagingConfig;
use crate::delay::DelayTable;
use crate::geometry::{virtual_source, Point3, TransducerGeometry};
use crate::image::BeamformedImage;
use crate::types::{BeamformError, BeamformResult, IqSample, RfTrace, Sample};

/// Delay-and-sum beamformer for one acquisition geometry.
///
/// Holds the immutable configuration plus the derived element layout and
/// virtual-source position.
#[derive(Debug, Clone)]
pub struct DasBeamformer {
    config: ImagingConfig,
    geometry: TransducerGeometry,
    virtual_source: Point3,
}

impl DasBeamformer {
    /// Build a beamformer from the configuration.
    ///
    /// Fails with [`BeamformError::DegenerateGeometry`] on an invalid
    /// config (zero array width, `sin(beta) = 0`, ...).
    pub fn new(config: ImagingConfig) -> BeamformResult<Self> {
        config.validate()?;
        let geometry = TransducerGeometry::new(config.num_elements, config.pitch)?;
        let virtual_source = virtual_source(geometry.array_width(), config.theta, config.beta)?;
        Ok(Self {
            config,
            geometry,
            virtual_source,
        })
    }

    /// The configuration this beamformer was built from.
    pub fn config(&self) -> &ImagingConfig {
        &self.config
    }

    /// The derived element layout.
    pub fn geometry(&self) -> &TransducerGeometry {
        &self.geometry
    }

    /// The derived virtual-source position.
    pub fn virtual_source(&self) -> Point3 {
        self.virtual_source
    }

    /// Depth (m) imaged by output sample `s`: `s * c / (2 * fs)`.
    pub fn depth_of_sample(&self, sample: usize) -> f64 {
        sample as f64 * self.config.speed_of_sound / (2.0 * self.config.sampling_rate)
    }

    /// Number of output samples needed to cover `scan_depth`.
    pub fn num_output_samples(&self) -> usize {
        let per_sample = self.config.speed_of_sound / (2.0 * self.config.sampling_rate);
        (self.config.scan_depth / per_sample).ceil() as usize
    }

    /// Lateral positions (m) of the image lines, spread uniformly across
    /// the array width.
    pub fn line_positions(&self) -> Vec<f64> {
        let n = self.config.number_of_lines;
        let width = self.geometry.array_width();
        if n <= 1 {
            return vec![0.0];
        }
        (0..n)
            .map(|l| l as f64 * width / (n as f64 - 1.0) - width / 2.0)
            .collect()
    }

    /// Delay table for one focus point against traces of `num_samples`.
    pub fn delay_table(&self, focus: Point3, num_samples: usize) -> DelayTable {
        DelayTable::compute(
            &self.geometry,
            self.virtual_source,
            focus,
            self.config.sampling_rate,
            self.config.speed_of_sound,
            num_samples,
            self.config.f_number(focus.z),
        )
    }

    /// Beamform one focus point from real RF traces (rows = elements).
    ///
    /// Non-viable elements and taps past the end of a trace contribute
    /// zero, and so does an element whose trace is missing or shorter than
    /// its tap positions — the per-point entries mask shape problems the
    /// same way they mask out-of-bounds delays, while [`Self::beamform_image`]
    /// rejects malformed grids up front.
    pub fn beamform_point(&self, rf: &[RfTrace], focus: Point3) -> Sample {
        let num_samples = rf.first().map_or(0, Vec::len);
        let table = self.delay_table(focus, num_samples);
        let mut acc = 0.0;
        for (element, (index, viable)) in table.iter().enumerate() {
            if !viable {
                continue;
            }
            let Some(trace) = rf.get(element) else {
                continue; // absent rows mask out like non-viable elements
            };
            let i0f = index.floor();
            let frac = i0f - index; // non-positive correction weight
            let i0 = i0f as usize;
            if i0 + 1 >= trace.len() {
                continue; // truncate rather than wrap
            }
            acc += (1.0 + frac) * trace[i0] + (-frac) * trace[i0 + 1];
        }
        acc
    }

    /// Beamform one focus point from complex I/Q traces, rotating each
    /// element's two-tap value by `exp(i*2*pi*fc*tau)`.
    ///
    /// Missing or short traces mask out exactly as in
    /// [`Self::beamform_point`].
    pub fn beamform_point_iq(&self, iq: &[Vec<IqSample>], focus: Point3) -> IqSample {
        let num_samples = iq.first().map_or(0, Vec::len);
        let table = self.delay_table(focus, num_samples);
        let fc = self.config.center_frequency;
        let fs = self.config.sampling_rate;
        let mut acc = Complex64::new(0.0, 0.0);
        for (element, (index, viable)) in table.iter().enumerate() {
            if !viable {
                continue;
            }
            let Some(trace) = iq.get(element) else {
                continue;
            };
            let i0f = index.floor();
            let frac = i0f - index;
            let i0 = i0f as usize;
            if i0 + 1 >= trace.len() {
                continue;
            }
            let tap = trace[i0] * (1.0 + frac) + trace[i0 + 1] * (-frac);
            let travel_time = index / fs;
            let rotation = Complex64::from_polar(1.0, 2.0 * PI * fc * travel_time);
            acc += rotation * tap;
        }
        acc
    }

    /// Beamform a full line at lateral position `line_x`, one output value
    /// per depth sample.
    pub fn beamform_line(&self, rf: &[RfTrace], line_x: f64) -> Vec<Sample> {
        (0..self.num_output_samples())
            .map(|s| self.beamform_point(rf, Point3::new(line_x, 0.0, self.depth_of_sample(s))))
            .collect()
    }

    /// Beamform a full I/Q line at lateral position `line_x`.
    pub fn beamform_line_iq(&self, iq: &[Vec<IqSample>], line_x: f64) -> Vec<IqSample> {
        (0..self.num_output_samples())
            .map(|s| self.beamform_point_iq(iq, Point3::new(line_x, 0.0, self.depth_of_sample(s))))
            .collect()
    }

    /// Reconstruct the whole frame: one column per line position.
    ///
    /// The RF grid must be rectangular with one row per physical element;
    /// anything else is [`BeamformError::MalformedInput`].
    pub fn beamform_image(&self, rf: &[RfTrace]) -> BeamformResult<BeamformedImage> {
        self.validate_rf(rf)?;
        let mut image = BeamformedImage::new(self.num_output_samples(), self.config.number_of_lines);
        for (line, &line_x) in self.line_positions().iter().enumerate() {
            let samples = self.beamform_line(rf, line_x);
            image.set_line(line, &samples);
        }
        Ok(image)
    }

    /// Shape-check an RF grid against this beamformer's element count.
    pub(crate) fn validate_rf(&self, rf: &[RfTrace]) -> BeamformResult<()> {
        if rf.len() != self.config.num_elements {
            return Err(BeamformError::MalformedInput(format!(
                "RF grid has {} rows, expected {} elements",
                rf.len(),
                self.config.num_elements
            )));
        }
        let num_samples = rf[0].len();
        if num_samples == 0 {
            return Err(BeamformError::MalformedInput(
                "RF rows contain no samples".into(),
            ));
        }
        for (i, row) in rf.iter().enumerate() {
            if row.len() != num_samples {
                return Err(BeamformError::MalformedInput(format!(
                    "ragged RF grid: row {i} has {} samples, expected {num_samples}",
                    row.len()
                )));
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn reference_beamformer() -> DasBeamformer {
        DasBeamformer::new(ImagingConfig::default()).unwrap()
    }

    fn ramp_rf(num_elements: usize, num_samples: usize) -> Vec<RfTrace> {
        // Each trace is the identity ramp rf[el][s] = s, so a two-tap
        // interpolation at fractional index i recovers exactly i.
        vec![(0..num_samples).map(|s| s as f64).collect(); num_elements]
    }

    // --- 1. construction ----------------------------------------------------

    #[test]
    fn test_new_rejects_degenerate_config() {
        let config = ImagingConfig {
            beta: 0.0,
            ..ImagingConfig::default()
        };
        assert!(DasBeamformer::new(config).is_err());
    }

    #[test]
    fn test_scan_grid_extents() {
        let das = reference_beamformer();
        // 0.05 m at c/(2 fs) per sample
        assert_eq!(das.num_output_samples(), 1351);
        assert_relative_eq!(das.depth_of_sample(0), 0.0, epsilon = 1e-15);
        let lines = das.line_positions();
        assert_eq!(lines.len(), 204);
        assert_relative_eq!(lines[0], -das.geometry().array_width() / 2.0, epsilon = 1e-12);
        assert_relative_eq!(lines[0] + lines[203], 0.0, epsilon = 1e-12);
    }

    // --- 2. interpolation semantics ----------------------------------------

    #[test]
    fn test_two_tap_interpolation_recovers_fractional_index() {
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        let rf = ramp_rf(128, 2122);
        let table = das.delay_table(focus, 2122);

        let expected: f64 = table
            .iter()
            .filter(|&(_, viable)| viable)
            .map(|(index, _)| index)
            .sum();
        let got = das.beamform_point(&rf, focus);
        assert_relative_eq!(got, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_truncation_past_buffer_end() {
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        // Centre indices are ~1350.65, so a 1351-sample buffer keeps the
        // floor in range but pushes the second tap out for the innermost
        // elements: those must contribute zero, not wrap or panic.
        let rf = vec![vec![1.0; 1351]; 128];
        let table = das.delay_table(focus, 1351);
        let fully_in = table
            .iter()
            .filter(|&(index, viable)| viable && (index.floor() as usize) + 1 < 1351)
            .count() as f64;
        let got = das.beamform_point(&rf, focus);
        // Constant traces: every surviving element contributes exactly 1.
        assert_relative_eq!(got, fully_in, epsilon = 1e-9);
        assert!(fully_in < 128.0, "expected some truncated elements");
    }

    #[test]
    fn test_masked_elements_contribute_zero() {
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        // 10-sample traces: every index is out of bounds, output is zero
        // even though the traces are loud.
        let rf = vec![vec![1e6; 10]; 128];
        assert_eq!(das.beamform_point(&rf, focus), 0.0);
    }

    // --- 3. I/Q path ---------------------------------------------------------

    #[test]
    fn test_iq_rotation_unit_magnitude() {
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        // One constant-phase trace per element: each viable element
        // contributes a unit-magnitude rotated sample.
        let iq = vec![vec![Complex64::new(1.0, 0.0); 2122]; 128];
        let table = das.delay_table(focus, 2122);
        let fc = das.config().center_frequency;
        let fs = das.config().sampling_rate;
        let expected: Complex64 = table
            .iter()
            .filter(|&(_, viable)| viable)
            .map(|(index, _)| Complex64::from_polar(1.0, 2.0 * PI * fc * index / fs))
            .sum();
        let got = das.beamform_point_iq(&iq, focus);
        assert_relative_eq!(got.re, expected.re, epsilon = 1e-6);
        assert_relative_eq!(got.im, expected.im, epsilon = 1e-6);
    }

    // --- 4. shape robustness --------------------------------------------------

    #[test]
    fn test_point_masks_absent_rows() {
        // Only 10 of the 128 element traces present: the per-point entry
        // masks the missing rows instead of panicking.
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        let rf = vec![vec![1.0; 2122]; 10];
        let table = das.delay_table(focus, 2122);
        let expected = (0..10).filter(|&el| table.is_viable(el)).count() as f64;
        assert_relative_eq!(das.beamform_point(&rf, focus), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_point_masks_short_row() {
        // One trace far shorter than its tap positions contributes zero;
        // every other element is unaffected.
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        let mut rf = vec![vec![1.0; 2122]; 128];
        rf[64].truncate(100);
        let table = das.delay_table(focus, 2122);
        let expected = (0..128)
            .filter(|&el| el != 64 && table.is_viable(el))
            .count() as f64;
        assert_relative_eq!(das.beamform_point(&rf, focus), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_point_iq_masks_absent_rows() {
        let das = reference_beamformer();
        let focus = Point3::new(0.0, 0.0, 0.05);
        let iq = vec![vec![Complex64::new(1.0, 0.0); 2122]; 10];
        let table = das.delay_table(focus, 2122);
        let fc = das.config().center_frequency;
        let fs = das.config().sampling_rate;
        let expected: Complex64 = table
            .iter()
            .enumerate()
            .filter(|&(el, (_, viable))| el < 10 && viable)
            .map(|(_, (index, _))| Complex64::from_polar(1.0, 2.0 * PI * fc * index / fs))
            .sum();
        let got = das.beamform_point_iq(&iq, focus);
        assert_relative_eq!(got.re, expected.re, epsilon = 1e-9);
        assert_relative_eq!(got.im, expected.im, epsilon = 1e-9);
    }

    // --- 5. lines & image -----------------------------------------------------

    fn small_beamformer() -> DasBeamformer {
        DasBeamformer::new(ImagingConfig {
            num_elements: 16,
            number_of_lines: 12,
            scan_depth: 0.008,
            ..ImagingConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_all_zero_frame_reconstructs_to_zero() {
        // End-to-end: silence in, a perfectly zero image out, and
        // normalization must not introduce NaN.
        let das = small_beamformer();
        let rf = vec![vec![0.0; 512]; 16];
        let mut image = das.beamform_image(&rf).unwrap();
        assert!(image.as_slice().iter().all(|&v| v == 0.0));
        image.scrub_non_finite();
        image.normalize_max();
        assert!(image.as_slice().iter().all(|&v| v == 0.0 && !v.is_nan()));
    }

    #[test]
    fn test_image_shape() {
        let das = small_beamformer();
        let rf = vec![vec![0.0; 64]; 16];
        let image = das.beamform_image(&rf).unwrap();
        assert_eq!(image.num_lines(), 12);
        assert_eq!(image.num_samples(), das.num_output_samples());
    }

    #[test]
    fn test_image_rejects_bad_rf_shape() {
        let das = small_beamformer();
        let wrong_rows = vec![vec![0.0; 64]; 10];
        assert!(matches!(
            das.beamform_image(&wrong_rows),
            Err(BeamformError::MalformedInput(_))
        ));
        let mut ragged = vec![vec![0.0; 64]; 16];
        ragged[5].pop();
        assert!(das.beamform_image(&ragged).is_err());
    }
}
