//! Transducer array geometry — element positions, virtual source, distances.
//!
//! The array is a 1-D linear aperture laid out along the x axis, centred on
//! x = 0, with the imaging plane at y = 0 and depth increasing along +z. The
//! transmit model is a virtual point source behind (or in front of) the
//! array, parameterised by a tilt angle `theta` and a beamwidth angle
//! `beta`.
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::geometry::{distance, element_positions, virtual_source, Point3};
//!
//! let elements = element_positions(128, 0.000245);
//! assert_eq!(elements.len(), 128);
//! // Symmetric about x = 0
//! assert!((elements[0].x + elements[127].x).abs() < 1e-15);
//!
//! let vs = virtual_source(0.031115, 0.0, 30_f64.to_radians()).unwrap();
//! assert_eq!(vs.y, 0.0);
//! assert!(vs.z < 0.0); // behind the array face for a broadside beam
//!
//! let d = distance(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 0.0, 4.0));
//! assert!((d - 5.0).abs() < 1e-12);
//! ```

use crate::types::{BeamformError, BeamformResult};

/// Threshold below which `sin(beta)` is considered degenerate.
const SIN_BETA_EPS: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Point type
// ---------------------------------------------------------------------------

/// A point in 3-D space, coordinates in metres. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    /// Lateral position (along the array).
    pub x: f64,
    /// Elevation (out of the imaging plane; 0 by convention).
    pub y: f64,
    /// Axial position (depth).
    pub z: f64,
}

impl Point3 {
    /// Create a point from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Euclidean distance between two points.
pub fn distance(p1: Point3, p2: Point3) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    let dz = p1.z - p2.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

// ---------------------------------------------------------------------------
// Element layout
// ---------------------------------------------------------------------------

/// Physical width of an array: `(num_elements - 1) * pitch` (m).
pub fn array_width(num_elements: usize, pitch: f64) -> f64 {
    (num_elements as f64 - 1.0) * pitch
}

/// Compute element centre positions for a linear array.
///
/// Element `i` sits at `x = i * pitch - array_width / 2`, `y = z = 0`, so
/// the positions are symmetric about x = 0 and strictly increasing in x.
pub fn element_positions(num_elements: usize, pitch: f64) -> Vec<Point3> {
    let half_width = array_width(num_elements, pitch) / 2.0;
    (0..num_elements)
        .map(|i| Point3::new(i as f64 * pitch - half_width, 0.0, 0.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Virtual source
// ---------------------------------------------------------------------------

/// Place the transmit virtual source for tilt `theta` and beamwidth `beta`
/// (both radians).
///
/// ```text
/// x = (W/2) * sin(2*theta) / sin(beta)
/// z = -(W/2) * (cos(beta) + cos(2*theta)) / sin(beta)
/// ```
///
/// `y` is always 0 (no out-of-plane steering). Returns
/// [`BeamformError::DegenerateGeometry`] when `sin(beta)` vanishes
/// (`beta = 0, pi, 2*pi, ...`) instead of letting NaN propagate.
pub fn virtual_source(array_width: f64, theta: f64, beta: f64) -> BeamformResult<Point3> {
    let sin_beta = beta.sin();
    if sin_beta.abs() < SIN_BETA_EPS {
        return Err(BeamformError::DegenerateGeometry(format!(
            "sin(beta) vanishes for beta = {beta} rad"
        )));
    }
    let half_width = array_width / 2.0;
    let x = half_width * (2.0 * theta).sin() / sin_beta;
    let z = -half_width * (beta.cos() + (2.0 * theta).cos()) / sin_beta;
    Ok(Point3::new(x, 0.0, z))
}

// ---------------------------------------------------------------------------
// TransducerGeometry
// ---------------------------------------------------------------------------

/// A linear transducer array: ordered element centres plus pitch and the
/// derived array width.
#[derive(Debug, Clone)]
pub struct TransducerGeometry {
    /// Element centre positions, strictly increasing in x.
    elements: Vec<Point3>,
    /// Centre-to-centre element spacing (m).
    pitch: f64,
    /// `(num_elements - 1) * pitch` (m).
    array_width: f64,
}

impl TransducerGeometry {
    /// Build the geometry for `num_elements` elements at the given pitch.
    ///
    /// Fails with [`BeamformError::DegenerateGeometry`] for fewer than two
    /// elements or a non-positive pitch (zero array width).
    pub fn new(num_elements: usize, pitch: f64) -> BeamformResult<Self> {
        if num_elements < 2 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "num_elements = {num_elements}, need at least 2"
            )));
        }
        if pitch <= 0.0 {
            return Err(BeamformError::DegenerateGeometry(format!(
                "pitch = {pitch} m, must be positive"
            )));
        }
        Ok(Self {
            elements: element_positions(num_elements, pitch),
            pitch,
            array_width: array_width(num_elements, pitch),
        })
    }

    /// Element centre positions.
    pub fn elements(&self) -> &[Point3] {
        &self.elements
    }

    /// Number of physical elements.
    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Centre-to-centre spacing (m).
    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// Physical width of the aperture (m).
    pub fn array_width(&self) -> f64 {
        self.array_width
    }
}

// ===========================================================================
// Tests
// ===========================================================================
