//! Crate-boundary error type: precondition violations only. "Not found"
//! outcomes (no markers, chessboard absent) are represented as plain
//! `Ok` values, never as errors, see the module docs on each operation.

use fiducial_calib::CalibrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("frame has zero width or height")]
    EmptyFrame,

    #[error("frame too small for adaptive thresholding (got {width}x{height}, need at least 7x7)")]
    FrameTooSmall { width: usize, height: usize },

    #[error("camera intrinsics must be a 3x3 matrix in row-major order (got {len} elements)")]
    InvalidIntrinsicsShape { len: usize },

    #[error("distortion coefficients must have exactly 8 elements (got {len})")]
    InvalidDistortionShape { len: usize },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
