//! Per-marker pose estimation: solves PnP against a fixed unit-square
//! reference model and stores the camera pose in the marker's frame.

use fiducial_marker::DecodedCandidate;
use fiducial_vision::{matrix_to_rodrigues, rodrigues_to_matrix, solve_pnp_planar, CameraModel};
use nalgebra::{Matrix3, Point2, Point3, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A decoded marker with its estimated pose.
#[derive(Clone, Copy, Debug)]
pub struct Marker {
    pub code: u32,
    pub corners: [Point2<f32>; 4],
    /// Rotation matrix, stored transposed per the camera-pose-in-marker-frame
    /// convention (see crate docs). Zero until pose estimation succeeds.
    pub rotation: Matrix3<f32>,
    /// Translation, stored negated per the same convention.
    pub translation: Vector3<f32>,
}

/// The marker's reference model: a unit square at Z=0, CCW in the marker
/// plane, matching the corner ordering produced by `fiducial-marker`.
fn reference_model() -> [Point3<f64>; 4] {
    [
        Point3::new(-0.5, -0.5, 0.0),
        Point3::new(-0.5, 0.5, 0.0),
        Point3::new(0.5, 0.5, 0.0),
        Point3::new(0.5, -0.5, 0.0),
    ]
}

/// Estimate pose for one decoded candidate.
///
/// On PnP non-convergence (degenerate point configuration), returns a
/// `Marker` with zero rotation/translation rather than dropping it, so its
/// `code` remains usable by the host even without a transform.
pub fn estimate_pose(candidate: &DecodedCandidate, cam: &CameraModel) -> Marker {
    let object = reference_model();
    let image: Vec<Point2<f64>> = candidate
        .corners
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();

    match solve_pnp_planar(&object, &image, cam) {
        Some((rvec, t)) => {
            let r = rodrigues_to_matrix(rvec);
            let rotation = r.transpose().map(|v| v as f32);
            let translation = (-t).map(|v| v as f32);
            Marker {
                code: candidate.code,
                corners: candidate.corners,
                rotation,
                translation,
            }
        }
        None => {
            log::warn!("pnp did not converge for marker code {}", candidate.code);
            Marker {
                code: candidate.code,
                corners: candidate.corners,
                rotation: Matrix3::zeros(),
                translation: Vector3::zeros(),
            }
        }
    }
}

/// Estimate poses for every decoded candidate in a detection pass.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(candidates, cam), fields(count = candidates.len()))
)]
pub fn estimate_poses(candidates: &[DecodedCandidate], cam: &CameraModel) -> Vec<Marker> {
    candidates.iter().map(|c| estimate_pose(c, cam)).collect()
}

/// Verify that `rmat`'s corresponding quad was generated from CCW corners:
/// recompute the 2D signed area of the (unrefined) image quad.
pub fn is_ccw(corners: &[Point2<f32>; 4]) -> bool {
    let cross = (corners[1].x - corners[0].x) * (corners[2].y - corners[0].y)
        - (corners[1].y - corners[0].y) * (corners[2].x - corners[0].x);
    cross > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fronto_parallel_marker_yields_identity_rotation_and_expected_translation() {
        let k = Matrix3::new(100.0, 0.0, 160.0, 0.0, 100.0, 120.0, 0.0, 0.0, 1.0);
        let cam = CameraModel { k, dist: [0.0; 8] };
        let z = 5.0;
        let object = reference_model();
        let corners: Vec<Point2<f32>> = object
            .iter()
            .map(|p| {
                let u = k[(0, 0)] * (p.x / z) + k[(0, 2)];
                let v = k[(1, 1)] * (p.y / z) + k[(1, 2)];
                Point2::new(u as f32, v as f32)
            })
            .collect();
        let candidate = DecodedCandidate {
            code: 42,
            corners: corners.try_into().unwrap(),
        };

        let marker = estimate_pose(&candidate, &cam);
        assert_eq!(marker.code, 42);
        assert_relative_eq!(marker.rotation, Matrix3::identity(), epsilon = 1e-3);
        assert_relative_eq!(marker.translation, Vector3::new(0.0, 0.0, -z as f32), epsilon = 1e-2);
    }

    #[test]
    fn ccw_quad_is_detected() {
        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        assert!(is_ccw(&corners));
    }
}
