//! Input frame and per-line JSON schema — loading and validation.
//!
//! Two producers feed the beamformers:
//!
//! - A whole-frame JSON object carrying transducer metadata, optional
//!   simulation ground truth, transmit delays, and the raw `RF` sample
//!   grid (rows = elements).
//! - Per-line files `line<N>.json`, each holding one image line's
//!   `v_short` grid (rows = fast-time samples, columns = active elements)
//!   plus its start time.
//!
//! Schema validation happens here, before any processing: malformed input
//! is fatal and surfaced immediately, with no partial output. Round
//! tripping a frame through the schema preserves the numeric arrays
//! exactly.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::frame::LineData;
//!
//! let json = r#"{"lineNumber": 1, "t_start": 2.5e-6,
//!                "v_short": [[0.1, 0.2], [0.3, 0.4]]}"#;
//! let line = LineData::from_json(json).unwrap();
//! assert_eq!(line.num_samples(), 2);
//! assert_eq!(line.num_active_elements(), 2);
//! line.validate(Some(2)).unwrap();
//! assert!(line.validate(Some(64)).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{BeamformError, BeamformResult};

// ---------------------------------------------------------------------------
// Frame schema
// ---------------------------------------------------------------------------

/// Transducer acquisition parameters embedded in a frame file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransducerParams {
    /// Centre frequency (Hz).
    pub fc: f64,
    /// Number of physical elements.
    #[serde(rename = "Nelements")]
    pub num_elements: usize,
    /// Sampling rate (Hz).
    pub fs: f64,
    /// Element pitch (m).
    pub pitch: f64,
}

/// Optional simulation ground truth: point scatterer positions and
/// reflection coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scatterers {
    /// Lateral positions (m).
    pub x: Vec<f64>,
    /// Axial positions (m).
    pub z: Vec<f64>,
    /// Reflection coefficients.
    #[serde(rename = "RC")]
    pub rc: Vec<f64>,
}

/// A complete raw RF frame: one acquisition of the full array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfFrame {
    /// Probe identifier, e.g. `"ATL L7-4"`.
    pub transducer_name: String,
    /// Acquisition parameters.
    pub transducer_params: TransducerParams,
    /// Simulation ground truth, when the frame came from a simulator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scatterers: Option<Scatterers>,
    /// Per-element transmit delays (s).
    pub transmit_delays: Vec<f64>,
    /// Raw sample grid, rows = elements, columns = fast-time samples.
    #[serde(rename = "RF")]
    pub rf: Vec<Vec<f64>>,
}

impl RfFrame {
    /// Parse a frame from a JSON string.
    pub fn from_json(json: &str) -> BeamformResult<Self> {
        let frame: Self = serde_json::from_str(json)
            .map_err(|e| BeamformError::MalformedInput(format!("frame JSON: {e}")))?;
        frame.validate()?;
        Ok(frame)
    }

    /// Load and validate a frame from a file.
    pub fn from_path(path: &Path) -> BeamformResult<Self> {
        debug!(path = %path.display(), "loading RF frame");
        let json = fs::read_to_string(path).map_err(|e| {
            BeamformError::MalformedInput(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Check the structural invariants of the frame.
    pub fn validate(&self) -> BeamformResult<()> {
        if self.rf.is_empty() {
            return Err(BeamformError::MalformedInput("RF grid is empty".into()));
        }
        let num_samples = self.rf[0].len();
        if num_samples == 0 {
            return Err(BeamformError::MalformedInput(
                "RF rows contain no samples".into(),
            ));
        }
        for (i, row) in self.rf.iter().enumerate() {
            if row.len() != num_samples {
                return Err(BeamformError::MalformedInput(format!(
                    "ragged RF grid: row {i} has {} samples, expected {num_samples}",
                    row.len()
                )));
            }
        }
        if self.rf.len() != self.transducer_params.num_elements {
            return Err(BeamformError::MalformedInput(format!(
                "RF grid has {} rows but Nelements = {}",
                self.rf.len(),
                self.transducer_params.num_elements
            )));
        }
        if let Some(s) = &self.scatterers {
            if s.x.len() != s.z.len() || s.x.len() != s.rc.len() {
                return Err(BeamformError::MalformedInput(format!(
                    "scatterer arrays disagree: x={}, z={}, RC={}",
                    s.x.len(),
                    s.z.len(),
                    s.rc.len()
                )));
            }
        }
        Ok(())
    }

    /// Fast-time samples per element trace.
    pub fn num_samples(&self) -> usize {
        self.rf.first().map_or(0, Vec::len)
    }
}

// ---------------------------------------------------------------------------
// Per-line schema
// ---------------------------------------------------------------------------

/// One image line's pre-focused element data, as produced by the per-line
/// acquisition files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineData {
    /// 1-based line number within the frame.
    #[serde(rename = "lineNumber")]
    pub line_number: usize,
    /// Start time of this line's fast-time axis (s).
    pub t_start: f64,
    /// Sample grid, rows = fast-time samples, columns = active elements.
    pub v_short: Vec<Vec<f64>>,
}

impl LineData {
    /// Parse a line from a JSON string.
    pub fn from_json(json: &str) -> BeamformResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| BeamformError::MalformedInput(format!("line JSON: {e}")))
    }

    /// Load a line from a file.
    pub fn from_path(path: &Path) -> BeamformResult<Self> {
        debug!(path = %path.display(), "loading line data");
        let json = fs::read_to_string(path).map_err(|e| {
            BeamformError::MalformedInput(format!("reading {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Check the structural invariants: non-empty, rectangular, and — when
    /// given — the expected active-element column count.
    pub fn validate(&self, expected_active_elements: Option<usize>) -> BeamformResult<()> {
        if self.v_short.is_empty() {
            return Err(BeamformError::MalformedInput(format!(
                "line {}: v_short is empty",
                self.line_number
            )));
        }
        let cols = self.v_short[0].len();
        for (i, row) in self.v_short.iter().enumerate() {
            if row.len() != cols {
                return Err(BeamformError::MalformedInput(format!(
                    "line {}: ragged v_short, row {i} has {} columns, expected {cols}",
                    self.line_number,
                    row.len()
                )));
            }
        }
        if let Some(expected) = expected_active_elements {
            if cols != expected {
                return Err(BeamformError::MalformedInput(format!(
                    "line {}: v_short has {cols} columns, expected {expected} active elements",
                    self.line_number
                )));
            }
        }
        Ok(())
    }

    /// Fast-time samples in this line.
    pub fn num_samples(&self) -> usize {
        self.v_short.len()
    }

    /// Active elements (columns) in this line.
    pub fn num_active_elements(&self) -> usize {
        self.v_short.first().map_or(0, Vec::len)
    }
}

/// File name for a 1-based line number: `line<N>.json`.
pub fn line_filename(line_number: usize) -> String {
    format!("line{line_number}.json")
}

/// Load and validate one `line<N>.json` file from `dir`.
pub fn load_line(
    dir: &Path,
    line_number: usize,
    expected_active_elements: Option<usize>,
) -> BeamformResult<LineData> {
    let path: PathBuf = dir.join(line_filename(line_number));
    let line = LineData::from_path(&path)?;
    line.validate(expected_active_elements)?;
    Ok(line)
}

// ===========================================================================
// Tests
// ===========================================================================
