//! # Imaging Configuration
//!
//! Immutable configuration record for a phased-array acquisition: transducer
//! geometry, transmit model angles, sampling, and reconstruction extents.
//! Every beamformer entry point takes this record (or values derived from
//! it) explicitly — there is no process-wide mutable state.
//!
//! The defaults describe the reference probe used throughout the tests, an
//! ATL L7-4 style linear array: 128 elements at 0.245 mm pitch, 5.2 MHz
//! centre frequency sampled at 4x, soft-tissue sound speed of 1540 m/s.
//!
//! ## Example
//!
//! ```rust
//! use echobeam_core::config::ImagingConfig;
//!
//! let config = ImagingConfig::default();
//! assert_eq!(config.num_elements, 128);
//! assert!((config.array_width() - 127.0 * 0.000245).abs() < 1e-12);
//! config.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::types::{BeamformError, BeamformResult};

/// Threshold below which `sin(beta)` is considered degenerate.
const SIN_BETA_EPS: f64 = 1e-12;

/// Acquisition and reconstruction parameters for one static frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagingConfig {
    /// Speed of sound in the medium (m/s). Soft tissue ~ 1540 m/s.
    pub speed_of_sound: f64,
    /// Transducer centre frequency (Hz).
    pub center_frequency: f64,
    /// Fast-time sampling rate (Hz).
    pub sampling_rate: f64,
    /// Number of physical transducer elements.
    pub num_elements: usize,
    /// Centre-to-centre element spacing (m).
    pub pitch: f64,
    /// Virtual-source tilt from the z axis (radians).
    pub theta: f64,
    /// Virtual-source beamwidth angle (radians). Must satisfy `sin(beta) != 0`.
    pub beta: f64,
    /// Maximum reconstruction depth (m).
    pub scan_depth: f64,
    /// Number of image lines in the reconstructed frame.
    pub number_of_lines: usize,
    /// Number of elements in the receive aperture (MV beamformer input width).
    pub number_of_active_elements: usize,
}

impl Default for ImagingConfig {
    fn default() -> Self {
        let fc = 5.2e6;
        Self {
            speed_of_sound: 1540.0,
            center_frequency: fc,
            sampling_rate: 4.0 * fc,
            num_elements: 128,
            pitch: 0.000245,
            theta: 0.0,
            beta: PI / 6.0,
            scan_depth: 0.05,
            number_of_lines: 204,
            number_of_active_elements: 64,
        }
    }
}

impl ImagingConfig {
    /// Physical width of the array: `(num_elements - 1) * pitch` (m).
    pub fn array_width(&self) -> f64 {
        (self.num_elements as f64 - 1.0) * self.pitch
    }

    /// F-number of the full aperture at the given focal depth (m).
    pub fn f_number(&self, focus_z: f64) -> f64 {
        focus_z / self.array_width()
    }

    /// Check that the configuration can drive a reconstruction.
    ///
    /// The virtual-source formulas divide by `sin(beta)`, so `beta` at a
    /// multiple of pi is rejected here rather than producing NaN downstream.
    pub fn validate(&self) -> BeamformResult<()> {
        if self.num_elements < 2 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "num_elements = {}, need at least 2 for a nonzero array width",
                self.num_elements
            )));
        }
        if self.pitch <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "pitch = {} m, must be positive",
                self.pitch
            )));
        }
        if self.beta.sin().abs() < SIN_BETA_EPS {
            return Err(BeamformError::DegenerateGeometry(format!(
                "sin(beta) vanishes for beta = {} rad",
                self.beta
            )));
        }
        if self.sampling_rate <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "sampling_rate = {} Hz, must be positive",
                self.sampling_rate
            )));
        }
        if self.speed_of_sound <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "speed_of_sound = {} m/s, must be positive",
                self.speed_of_sound
            )));
        }
        if self.center_frequency <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "center_frequency = {} Hz, must be positive",
                self.center_frequency
            )));
        }
        if self.scan_depth <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "scan_depth = {} m, must be positive",
                self.scan_depth
            )));
        }
        if self.number_of_lines == 0 {
            return Err(BeamformError::DegenerateGeometry(
                "number_of_lines must be nonzero".into(),
            ));
        }
        if self.number_of_active_elements == 0 {
            return Err(BeamformError::DegenerateGeometry(
                "number_of_active_elements must be nonzero".into(),
            ));
        }
        Ok(())
    }
}
