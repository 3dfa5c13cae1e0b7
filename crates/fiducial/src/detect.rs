//! End-to-end detection pass and calibration-pattern search: the three
//! host operations this crate exposes.

use fiducial_core::BgrImage;
use fiducial_marker::{detect_and_decode, ExtractorConfig, RefineConfig};
use fiducial_pose::{estimate_poses, Marker};
use fiducial_vision::{bgr_to_gray, swap_red_blue, CameraModel};
use nalgebra::Matrix3;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::Error;
use crate::overlay::render_overlay;

const MIN_FRAME_SIDE: usize = 7;

fn validate_frame(frame: &BgrImage) -> Result<(), Error> {
    if frame.width == 0 || frame.height == 0 {
        return Err(Error::EmptyFrame);
    }
    if frame.width < MIN_FRAME_SIDE || frame.height < MIN_FRAME_SIDE {
        return Err(Error::FrameTooSmall {
            width: frame.width,
            height: frame.height,
        });
    }
    Ok(())
}

/// Run the full detection pass: candidate extraction, decoding, corner
/// refinement, and pose estimation, then render the debug overlay.
///
/// `frame` is laid out as RGB (the host's convention); the core converts
/// to its internal BGR convention and converts back before returning.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(frame, k, d), fields(width = frame.width, height = frame.height))
)]
pub fn detect_markers(
    frame: &BgrImage,
    k: Matrix3<f64>,
    d: [f64; 8],
) -> Result<(Vec<Marker>, BgrImage), Error> {
    validate_frame(frame)?;

    let bgr = swap_red_blue(frame);
    let gray = bgr_to_gray(&bgr.view());

    let extractor_cfg = ExtractorConfig::default();
    let refine_cfg = RefineConfig::default();
    let candidates = detect_and_decode(&gray.view(), &extractor_cfg, &refine_cfg);
    log::info!("detected {} markers", candidates.len());

    let cam = CameraModel { k, dist: d };
    let markers = estimate_poses(&candidates, &cam);

    let mut working = bgr;
    render_overlay(&mut working, &markers);
    let rgb_out = swap_red_blue(&working);

    Ok((markers, rgb_out))
}

/// Search one frame for the calibration chessboard pattern.
///
/// Returns `found = false` with an empty point list if the pattern is not
/// present, this is not an error; the caller retries with another frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(frame), fields(width = frame.width, height = frame.height))
)]
pub fn find_calibration_pattern(frame: &BgrImage) -> Result<(bool, Vec<(f32, f32)>, BgrImage), Error> {
    validate_frame(frame)?;

    let bgr = swap_red_blue(frame);
    let gray = bgr_to_gray(&bgr.view());

    let points = fiducial_calib::find_calibration_pattern(&gray.view());
    let found = points.is_some();
    let points = points.unwrap_or_default();

    // No chessboard-specific overlay is specified; the annotated frame is
    // returned unmodified beyond the RGB round-trip.
    let rgb_out = swap_red_blue(&bgr);
    Ok((found, points, rgb_out))
}

/// Solve for camera intrinsics from a fixed-size sequence of chessboard
/// samples. Requires exactly `fiducial_calib::CALIBRATION_SAMPLES` samples.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(samples)))]
pub fn compute_intrinsics(samples: &[Vec<(f32, f32)>]) -> Result<(Matrix3<f64>, [f64; 8], f64), Error> {
    let result = fiducial_calib::compute_intrinsics(samples)?;
    Ok((result.camera_matrix, result.dist_coeffs, result.reprojection_error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(w: usize, h: usize) -> BgrImage {
        BgrImage {
            width: w,
            height: h,
            data: vec![0u8; w * h * 3],
        }
    }

    #[test]
    fn rejects_empty_frame() {
        let frame = blank_frame(0, 0);
        let err = detect_markers(&frame, Matrix3::identity(), [0.0; 8]).unwrap_err();
        assert!(matches!(err, Error::EmptyFrame));
    }

    #[test]
    fn rejects_frame_smaller_than_adaptive_threshold_block() {
        let frame = blank_frame(5, 5);
        let err = detect_markers(&frame, Matrix3::identity(), [0.0; 8]).unwrap_err();
        assert!(matches!(err, Error::FrameTooSmall { .. }));
    }

    #[test]
    fn empty_frame_yields_no_markers_on_valid_size() {
        let frame = blank_frame(64, 64);
        let (markers, out) = detect_markers(&frame, Matrix3::identity(), [0.0; 8]).unwrap();
        assert!(markers.is_empty());
        assert_eq!(out.width, 64);
        assert_eq!(out.height, 64);
    }

    #[test]
    fn calibration_pattern_not_found_on_blank_frame() {
        let frame = blank_frame(64, 64);
        let (found, points, _) = find_calibration_pattern(&frame).unwrap();
        assert!(!found);
        assert!(points.is_empty());
    }
}
