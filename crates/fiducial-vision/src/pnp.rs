//! Planar pose-from-point-correspondences (`solvePnP`-equivalent).
//!
//! Every caller in this pipeline (marker pose, per-view chessboard
//! extrinsics during calibration) supplies coplanar object points
//! (`z == 0`), so pose recovery is done via homography decomposition
//! rather than a general 6-DoF PnP solver: build the homography from the
//! object plane to normalized (distortion-corrected) camera coordinates,
//! then factor it into a rotation and translation.

use fiducial_core::{estimate_homography_dlt, homography_from_4pt, Homography};
use nalgebra::{Matrix3, Point2, Point3, Vector3};

use crate::distortion::undistort_normalized;

/// Camera intrinsics (3x3) and distortion coefficients, `(k1,k2,p1,p2,k3,k4,k5,k6)`.
#[derive(Clone, Copy, Debug)]
pub struct CameraModel {
    pub k: Matrix3<f64>,
    pub dist: [f64; 8],
}

/// Solve for the pose `(rotation vector, translation)` of a planar point set.
///
/// `object_points` must have `z == 0` (planar target). Returns `None` if the
/// homography cannot be estimated (degenerate point configuration).
pub fn solve_pnp_planar(
    object_points: &[Point3<f64>],
    image_points: &[Point2<f64>],
    cam: &CameraModel,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    if object_points.len() != image_points.len() || object_points.len() < 4 {
        return None;
    }

    let k_inv = cam.k.try_inverse()?;

    let obj_xy: Vec<Point2<f32>> = object_points
        .iter()
        .map(|p| Point2::new(p.x as f32, p.y as f32))
        .collect();

    let normalized: Vec<Point2<f32>> = image_points
        .iter()
        .map(|p| {
            let pixel = Vector3::new(p.x, p.y, 1.0);
            let cam_ray = k_inv * pixel;
            let n = Point2::new(cam_ray.x / cam_ray.z, cam_ray.y / cam_ray.z);
            let u = undistort_normalized(n, &cam.dist);
            Point2::new(u.x as f32, u.y as f32)
        })
        .collect();

    let h = if obj_xy.len() == 4 {
        let src: [Point2<f32>; 4] = obj_xy.try_into().ok()?;
        let dst: [Point2<f32>; 4] = normalized.try_into().ok()?;
        homography_from_4pt(&src, &dst)?
    } else {
        estimate_homography_dlt(&obj_xy, &normalized)?
    };

    decompose_planar_homography(h)
}

fn decompose_planar_homography(h: Homography) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let h1 = h.h.column(0).into_owned();
    let h2 = h.h.column(1).into_owned();
    let h3 = h.h.column(2).into_owned();

    let norm1 = h1.norm();
    let norm2 = h2.norm();
    if norm1 < 1e-12 || norm2 < 1e-12 {
        return None;
    }
    let lambda = 2.0 / (norm1 + norm2);

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let t = h3 * lambda;
    let r3 = r1.cross(&r2);

    let m = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = m.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_fixed = u;
        for i in 0..3 {
            u_fixed[(i, 2)] = -u_fixed[(i, 2)];
        }
        r = u_fixed * v_t;
    }

    let rvec = crate::rodrigues::matrix_to_rodrigues(r);
    Some((rvec, t))
}
