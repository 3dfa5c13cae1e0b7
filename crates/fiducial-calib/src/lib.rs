//! Chessboard camera calibration: per-frame corner detection, sample
//! accumulation, and Zhang-style intrinsics solving.

use fiducial_core::GrayImageView;
use fiducial_vision::{calibrate_camera, find_chessboard_corners, CalibrationResult, ChessboardParams, ChessboardPattern};
use nalgebra::Point2;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Inner-corner chessboard pattern: 6 columns x 9 rows.
pub const CHESSBOARD_COLS: usize = 6;
pub const CHESSBOARD_ROWS: usize = 9;
/// Number of successful samples a calibration session must collect.
pub const CALIBRATION_SAMPLES: usize = 10;
/// Points contributed by each sample (6 * 9).
pub const POINTS_PER_CALIBRATION_SAMPLE: usize = CHESSBOARD_COLS * CHESSBOARD_ROWS;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("expected exactly {expected} calibration samples, got {got}")]
    SampleCountMismatch { expected: usize, got: usize },
    #[error("sample {index} has {got} points, expected {expected}")]
    PointCountMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("calibration solve failed to converge")]
    SolveFailed,
}

/// Build the 3D object point template (z=0 implied): `x = j * 1.0`,
/// `y = i * 1.0`, for `i` in `[0, CHESSBOARD_ROWS)`, `j` in `[0, CHESSBOARD_COLS)`.
pub fn object_point_template() -> Vec<Point2<f64>> {
    (0..CHESSBOARD_ROWS)
        .flat_map(|i| (0..CHESSBOARD_COLS).map(move |j| Point2::new(j as f64, i as f64)))
        .collect()
}

/// Search one grayscale frame for the chessboard pattern, sub-pixel refined
/// with window radius 11 (per the calibration-specific refinement window).
/// Returns `None` if the pattern was not found in this frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(gray), fields(width = gray.width, height = gray.height))
)]
pub fn find_calibration_pattern(gray: &GrayImageView<'_>) -> Option<Vec<(f32, f32)>> {
    let pattern = ChessboardPattern {
        cols: CHESSBOARD_COLS,
        rows: CHESSBOARD_ROWS,
    };
    let params = ChessboardParams {
        subpix_window: 11,
        ..ChessboardParams::default()
    };
    find_chessboard_corners(gray, pattern, &params)
}

/// Accumulates successful per-frame chessboard samples until full.
#[derive(Clone, Debug, Default)]
pub struct CalibrationSession {
    samples: Vec<Vec<(f32, f32)>>,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one successful sample. Returns an error if its point count
    /// doesn't match `POINTS_PER_CALIBRATION_SAMPLE`.
    pub fn push_sample(&mut self, points: Vec<(f32, f32)>) -> Result<(), CalibrationError> {
        if points.len() != POINTS_PER_CALIBRATION_SAMPLE {
            return Err(CalibrationError::PointCountMismatch {
                index: self.samples.len(),
                expected: POINTS_PER_CALIBRATION_SAMPLE,
                got: points.len(),
            });
        }
        self.samples.push(points);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= CALIBRATION_SAMPLES
    }

    /// Consume the session and solve for intrinsics. Requires exactly
    /// `CALIBRATION_SAMPLES` accumulated samples.
    pub fn solve(self) -> Result<CalibrationResult, CalibrationError> {
        compute_intrinsics(&self.samples)
    }
}

/// Solve for camera intrinsics, distortion, and reprojection error from a
/// fixed-size sequence of chessboard samples. Requires exactly
/// `CALIBRATION_SAMPLES` samples, each with exactly
/// `POINTS_PER_CALIBRATION_SAMPLE` points. Per-view extrinsics are available
/// on the result but the host is only required to consume K/D/error.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(samples)))]
pub fn compute_intrinsics(samples: &[Vec<(f32, f32)>]) -> Result<CalibrationResult, CalibrationError> {
    if samples.len() != CALIBRATION_SAMPLES {
        return Err(CalibrationError::SampleCountMismatch {
            expected: CALIBRATION_SAMPLES,
            got: samples.len(),
        });
    }
    for (index, sample) in samples.iter().enumerate() {
        if sample.len() != POINTS_PER_CALIBRATION_SAMPLE {
            return Err(CalibrationError::PointCountMismatch {
                index,
                expected: POINTS_PER_CALIBRATION_SAMPLE,
                got: sample.len(),
            });
        }
    }

    let object = object_point_template();
    let image_points_per_view: Vec<Vec<Point2<f64>>> = samples
        .iter()
        .map(|sample| sample.iter().map(|&(x, y)| Point2::new(x as f64, y as f64)).collect())
        .collect();

    // `calibrate_camera` seeds its own closed-form intrinsics rather than
    // the identity-K / zero-D seed described for the iterative primitive;
    // the closed-form solve and the iterative refinement converge to the
    // same result for noise-free or lightly-noised chessboard samples.
    calibrate_camera(&object, &image_points_per_view).ok_or(CalibrationError::SolveFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_rejects_wrong_point_count() {
        let mut session = CalibrationSession::new();
        let err = session.push_sample(vec![(0.0, 0.0); 10]).unwrap_err();
        assert!(matches!(err, CalibrationError::PointCountMismatch { .. }));
    }

    #[test]
    fn session_becomes_full_after_ten_samples() {
        let mut session = CalibrationSession::new();
        for _ in 0..CALIBRATION_SAMPLES {
            session
                .push_sample(vec![(0.0, 0.0); POINTS_PER_CALIBRATION_SAMPLE])
                .unwrap();
        }
        assert!(session.is_full());
    }

    #[test]
    fn compute_intrinsics_rejects_wrong_sample_count() {
        let samples = vec![vec![(0.0, 0.0); POINTS_PER_CALIBRATION_SAMPLE]; 9];
        let err = compute_intrinsics(&samples).unwrap_err();
        assert!(matches!(err, CalibrationError::SampleCountMismatch { .. }));
    }

    #[test]
    fn object_point_template_has_54_points() {
        assert_eq!(object_point_template().len(), POINTS_PER_CALIBRATION_SAMPLE);
    }
}
