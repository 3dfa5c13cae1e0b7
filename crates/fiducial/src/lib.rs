//! Fiducial-marker detection and pose estimation core.
//!
//! Given a camera frame, locates planar square markers with 5x5-bit
//! payloads, decodes their identifiers, and estimates 3D pose relative to
//! calibrated camera intrinsics. Also supports one-off camera intrinsic
//! calibration from a chessboard pattern.
//!
//! ## Quickstart
//!
//! ```
//! use fiducial::detect_markers;
//! use fiducial_core::BgrImage;
//! use nalgebra::Matrix3;
//!
//! let frame = BgrImage { width: 64, height: 64, data: vec![0u8; 64 * 64 * 3] };
//! let k = Matrix3::identity();
//! let (markers, _annotated) = detect_markers(&frame, k, [0.0; 8]).unwrap();
//! assert!(markers.is_empty());
//! ```

mod detect;
mod error;
mod overlay;

pub use detect::{compute_intrinsics, detect_markers, find_calibration_pattern};
pub use error::Error;
pub use overlay::render_overlay;

pub use fiducial_calib::{CalibrationSession, CALIBRATION_SAMPLES, POINTS_PER_CALIBRATION_SAMPLE};
pub use fiducial_marker::{DecodedCandidate, ExtractorConfig, RefineConfig};
pub use fiducial_pose::Marker;
pub use fiducial_vision::CameraModel;
