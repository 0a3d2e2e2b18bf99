//! Parallel Reconstruction Module
//!
//! Rayon-based per-line reconstruction. Enable with the `parallel` feature
//! flag.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! echobeam-core = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! Lines are independent: no inter-sample state crosses a line boundary,
//! each worker owns one output column, and the per-sample covariance solve
//! uses only that sample's own local matrix. The parallel entry points
//! therefore produce bit-identical output to their sequential
//! counterparts.

use rayon::prelude::*;

use crate::das::DasBeamformer;
use crate::frame::LineData;
use crate::image::BeamformedImage;
use crate::minimum_variance::MvBeamformer;
use crate::types::{BeamformResult, RfTrace, Sample};

/// Beamform many per-line files concurrently, one worker per line.
///
/// Fails fast on the first malformed line, producing no partial output.
pub fn mv_beamform_lines(
    mv: &MvBeamformer,
    lines: &[LineData],
) -> BeamformResult<Vec<Vec<f64>>> {
    lines.par_iter().map(|line| mv.beamform_line(line)).collect()
}

/// Parallel counterpart of [`MvBeamformer::beamform_image`]: per-line
/// solves run concurrently, column assembly stays sequential.
pub fn mv_beamform_image(
    mv: &MvBeamformer,
    lines: &[LineData],
) -> BeamformResult<(BeamformedImage, Vec<f64>)> {
    let columns = mv_beamform_lines(mv, lines)?;
    let max_samples = columns.iter().map(Vec::len).max().unwrap_or(0);
    let mut image = BeamformedImage::new(max_samples, lines.len());
    let mut t_starts = Vec::with_capacity(lines.len());
    for (index, (column, line)) in columns.iter().zip(lines.iter()).enumerate() {
        image.set_line(index, column);
        t_starts.push(line.t_start);
    }
    Ok((image, t_starts))
}

/// Parallel counterpart of [`DasBeamformer::beamform_image`]: one worker
/// per image line.
pub fn das_beamform_image(
    das: &DasBeamformer,
    rf: &[RfTrace],
) -> BeamformResult<BeamformedImage> {
    das.validate_rf(rf)?;
    let line_positions = das.line_positions();
    let columns: Vec<Vec<Sample>> = line_positions
        .par_iter()
        .map(|&line_x| das.beamform_line(rf, line_x))
        .collect();
    let mut image = BeamformedImage::new(das.num_output_samples(), line_positions.len());
    for (index, column) in columns.iter().enumerate() {
        image.set_line(index, column);
    }
    Ok(image)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImagingConfig;

    fn pseudo_random_vector(len: usize, seed: u64) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0
            })
            .collect()
    }

    #[test]
    fn test_parallel_mv_matches_sequential() {
        let mv = MvBeamformer::new(4);
        let lines: Vec<LineData> = (1..=16)
            .map(|l| LineData {
                line_number: l,
                t_start: l as f64 * 1.0e-7,
                v_short: (0..30)
                    .map(|r| pseudo_random_vector(4, (l * 100 + r) as u64 + 1))
                    .collect(),
            })
            .collect();

        let (seq, seq_t) = mv.beamform_image(&lines).unwrap();
        let (par, par_t) = mv_beamform_image(&mv, &lines).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq_t, par_t);
    }

    #[test]
    fn test_parallel_das_matches_sequential() {
        let config = ImagingConfig {
            num_elements: 16,
            number_of_lines: 8,
            scan_depth: 0.004,
            ..ImagingConfig::default()
        };
        let das = DasBeamformer::new(config).unwrap();
        let rf: Vec<Vec<f64>> = (0..16)
            .map(|el| pseudo_random_vector(512, el as u64 + 1))
            .collect();

        let seq = das.beamform_image(&rf).unwrap();
        let par = das_beamform_image(&das, &rf).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_parallel_mv_fails_fast_on_malformed_line() {
        let mv = MvBeamformer::new(4);
        let lines = vec![LineData {
            line_number: 1,
            t_start: 0.0,
            v_short: vec![vec![1.0, 2.0]], // wrong aperture width
        }];
        assert!(mv_beamform_lines(&mv, &lines).is_err());
    }
}
