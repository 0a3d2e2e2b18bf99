//! # Ultrasound Phased-Array Beamforming Library
//!
//! This crate reconstructs focused B-mode images from raw per-element RF
//! (radio-frequency) sample data acquired by a linear transducer array with
//! a virtual-source transmit model. Two reconstruction paths are provided:
//!
//! - **Delay-and-sum (DAS)**: fixed aperture weighting with
//!   fractional-sample-accurate delays and f-number masking
//! - **Minimum variance (Capon)**: a per-sample spatially-adaptive weight
//!   vector from a diagonally-loaded single-snapshot covariance estimate,
//!   preceded by coherence-factor weighting
//!
//! ## Signal Flow
//!
//! ```text
//! Geometry → Travel Times → {DAS, CF → MV} → Image → Envelope/Normalize/Log → B-mode
//! ```
//!
//! ## Example
//!
//! ```rust
//! use echobeam_core::{ImagingConfig, MvBeamformer};
//! use echobeam_core::frame::LineData;
//!
//! let config = ImagingConfig::default();
//! let mv = MvBeamformer::new(4);
//!
//! // One 3-sample line across a 4-element active aperture
//! let line = LineData {
//!     line_number: 1,
//!     t_start: 0.0,
//!     v_short: vec![vec![0.5; 4]; 3],
//! };
//! let (mut image, t_starts) = mv.beamform_image(&[line]).unwrap();
//! image.scrub_non_finite();
//! image.normalize_max();
//! let bmode = image.time_align(&t_starts, config.sampling_rate).log_compress(60.0);
//! assert_eq!(bmode.num_lines(), 1);
//! ```
//!
//! Reconstruction is a bounded, deterministic batch job: all entry points
//! are pure functions over immutable inputs plus one output buffer written
//! line by line. The optional `parallel` feature distributes lines across
//! Rayon workers without changing the output.

pub mod coherence;
pub mod config;
pub mod das;
pub mod delay;
pub mod frame;
pub mod geometry;
pub mod image;
pub mod matrix;
pub mod minimum_variance;
pub mod types;

// Parallel reconstruction (requires `parallel` feature)
#[cfg(feature = "parallel")]
pub mod parallel;

// Re-export main types
pub use coherence::{apply_coherence_factor, coherence_factor};
pub use config::ImagingConfig;
pub use das::DasBeamformer;
pub use delay::{fast_time_index, two_way_travel_time, DelayTable};
pub use frame::{LineData, RfFrame};
pub use geometry::{distance, element_positions, virtual_source, Point3, TransducerGeometry};
pub use image::{envelope_detect, BeamformedImage};
pub use matrix::Matrix;
pub use minimum_variance::MvBeamformer;
pub use types::{BeamformError, BeamformResult, IqSample, RfTrace, Sample};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ImagingConfig;
    pub use crate::das::DasBeamformer;
    pub use crate::frame::{LineData, RfFrame};
    pub use crate::geometry::Point3;
    pub use crate::image::BeamformedImage;
    pub use crate::minimum_variance::MvBeamformer;
    pub use crate::types::{BeamformError, BeamformResult};
}
