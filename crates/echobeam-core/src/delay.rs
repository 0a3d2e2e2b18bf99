//! Travel-time and fast-time index computation for virtual-source transmit.
//!
//! Converts array geometry into two-way travel times and fractional
//! fast-time sample indices, and decides per-element viability (bounds and
//! f-number aperture masks). Both beamformers consume this module.
//!
//! The transmit distance uses a Heaviside-gated end-element adjustment: when
//! the virtual source projects laterally outside the physical array, the
//! overshoot contributes to the correction; at or inside the footprint the
//! gate is closed (`heaviside(0) = 0`).
//!
//! # Example
//!
//! ```rust
//! use echobeam_core::delay::{fast_time_index, two_way_travel_time};
//! use echobeam_core::geometry::{element_positions, virtual_source, Point3};
//!
//! let width = 127.0 * 0.000245;
//! let elements = element_positions(128, 0.000245);
//! let vs = virtual_source(width, 0.0, 30_f64.to_radians()).unwrap();
//! let focus = Point3::new(0.0, 0.0, 0.05);
//!
//! let tau = two_way_travel_time(focus, elements[0], vs, width, 1540.0);
//! let index = fast_time_index(tau, 20.8e6);
//! assert!(index > 0.0 && index.fract() != 0.0); // fractional, not rounded
//! ```

use crate::geometry::{distance, Point3, TransducerGeometry};

// ---------------------------------------------------------------------------
// Travel time
// ---------------------------------------------------------------------------

/// Two-way travel time (seconds) from the virtual source to `focus` and back
/// to `element`.
///
/// The raw virtual-source-to-focus distance is shortened by the adjustment
/// `sqrt(gate(|vs.x| - W/2)^2 + vs.z^2)`, where the gate passes only a
/// strictly positive lateral overshoot past the array end.
pub fn two_way_travel_time(
    focus: Point3,
    element: Point3,
    virtual_source: Point3,
    array_width: f64,
    speed_of_sound: f64,
) -> f64 {
    let rx_distance = distance(focus, element);
    let tx_distance_raw = distance(virtual_source, focus);

    let overshoot = virtual_source.x.abs() - array_width / 2.0;
    // heaviside(0) = 0: the gate opens only for strictly positive overshoot
    let end_element_offset = if overshoot > 0.0 { overshoot } else { 0.0 };
    let adjustment =
        (end_element_offset * end_element_offset + virtual_source.z * virtual_source.z).sqrt();

    let tx_distance = tx_distance_raw - adjustment;
    (tx_distance + rx_distance) / speed_of_sound
}

/// Convert a travel time to a fractional fast-time sample index.
///
/// The index is NOT rounded; downstream consumers interpolate or floor per
/// their own policy.
pub fn fast_time_index(travel_time: f64, sampling_rate: f64) -> f64 {
    travel_time * sampling_rate
}

// ---------------------------------------------------------------------------
// Viability masks
// ---------------------------------------------------------------------------

/// An index is in-bounds iff `0 <= index < num_samples`.
///
/// NaN, negative, and past-the-end indices all mark the element as
/// non-viable for the focus point. This is a masking condition, not an
/// error.
pub fn in_bounds(index: f64, num_samples: usize) -> bool {
    index.is_finite() && index >= 0.0 && index < num_samples as f64
}

/// F-number aperture mask: element viable iff
/// `|focus.x - element.x| < focus.z / (2 * f_number)`.
pub fn within_aperture(focus: Point3, element: Point3, f_number: f64) -> bool {
    (focus.x - element.x).abs() < focus.z / (2.0 * f_number)
}

// ---------------------------------------------------------------------------
// DelayTable
// ---------------------------------------------------------------------------

/// Per-element fractional fast-time indices and viability for one focus
/// point. Computed once per focus/geometry configuration, read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct DelayTable {
    indices: Vec<f64>,
    viable: Vec<bool>,
}

impl DelayTable {
    /// Compute the table for every element of `geometry` focused at `focus`.
    ///
    /// Viability combines the bounds check against `num_samples` with the
    /// f-number aperture mask (logical AND).
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        geometry: &TransducerGeometry,
        virtual_source: Point3,
        focus: Point3,
        sampling_rate: f64,
        speed_of_sound: f64,
        num_samples: usize,
        f_number: f64,
    ) -> Self {
        let width = geometry.array_width();
        let mut indices = Vec::with_capacity(geometry.num_elements());
        let mut viable = Vec::with_capacity(geometry.num_elements());
        for &element in geometry.elements() {
            let tau = two_way_travel_time(focus, element, virtual_source, width, speed_of_sound);
            let index = fast_time_index(tau, sampling_rate);
            viable.push(in_bounds(index, num_samples) && within_aperture(focus, element, f_number));
            indices.push(index);
        }
        Self { indices, viable }
    }

    /// Number of elements covered by the table.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when the table covers no elements.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Fractional fast-time index for `element`.
    pub fn index(&self, element: usize) -> f64 {
        self.indices[element]
    }

    /// Whether `element` contributes at this focus point.
    pub fn is_viable(&self, element: usize) -> bool {
        self.viable[element]
    }

    /// Iterate over `(index, viable)` pairs in element order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, bool)> + '_ {
        self.indices.iter().copied().zip(self.viable.iter().copied())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
