//! Camera calibration from multiple chessboard views, after Zhang's
//! closed-form method: recover the image of the absolute conic from a
//! stack of per-view homographies, factor it into intrinsics, then solve
//! per-view extrinsics and a first-order radial distortion correction.

use fiducial_core::{estimate_homography_dlt, Homography};
use nalgebra::{DMatrix, DVector, Matrix3, Point2, Vector3};

use crate::rodrigues::matrix_to_rodrigues;

#[derive(Clone, Debug)]
pub struct CalibrationResult {
    pub camera_matrix: Matrix3<f64>,
    pub dist_coeffs: [f64; 8],
    /// Per-view rotation vectors and translations, one pair per sample.
    pub extrinsics: Vec<(Vector3<f64>, Vector3<f64>)>,
    /// RMS reprojection error in pixels across all views and points.
    pub reprojection_error: f64,
}

fn v_ij(h: &Matrix3<f64>, i: usize, j: usize) -> [f64; 6] {
    [
        h[(0, i)] * h[(0, j)],
        h[(0, i)] * h[(1, j)] + h[(1, i)] * h[(0, j)],
        h[(1, i)] * h[(1, j)],
        h[(2, i)] * h[(0, j)] + h[(0, i)] * h[(2, j)],
        h[(2, i)] * h[(1, j)] + h[(1, i)] * h[(2, j)],
        h[(2, i)] * h[(2, j)],
    ]
}

fn intrinsics_from_absolute_conic(homographies: &[Matrix3<f64>]) -> Option<Matrix3<f64>> {
    let n = homographies.len();
    let mut v = DMatrix::<f64>::zeros(2 * n, 6);
    for (k, h) in homographies.iter().enumerate() {
        let v01 = v_ij(h, 0, 1);
        let v00 = v_ij(h, 0, 0);
        let v11 = v_ij(h, 1, 1);
        for c in 0..6 {
            v[(2 * k, c)] = v01[c];
            v[(2 * k + 1, c)] = v00[c] - v11[c];
        }
    }

    let svd = v.svd(true, true);
    let vt = svd.v_t?;
    let last = vt.nrows().checked_sub(1)?;
    let b = vt.row(last);
    let (b11, b12, b22, b13, b23, b33) = (b[0], b[1], b[2], b[3], b[4], b[5]);

    let denom = b11 * b22 - b12 * b12;
    if denom.abs() < 1e-15 {
        return None;
    }
    let v0 = (b12 * b13 - b11 * b23) / denom;
    let lambda = b33 - (b13 * b13 + v0 * (b12 * b13 - b11 * b23)) / b11;
    if lambda <= 0.0 || b11 <= 0.0 {
        return None;
    }
    let alpha = (lambda / b11).sqrt();
    let beta = (lambda * b11 / denom).sqrt();
    let gamma = -b12 * alpha * alpha * beta / lambda;
    let u0 = gamma * v0 / beta - b13 * alpha * alpha / lambda;

    Some(Matrix3::new(
        alpha, gamma, u0, //
        0.0, beta, v0, //
        0.0, 0.0, 1.0,
    ))
}

fn extrinsics_from_homography(h: &Matrix3<f64>, k_inv: &Matrix3<f64>) -> Option<(Matrix3<f64>, Vector3<f64>)> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    let kh1 = k_inv * h1;
    let kh2 = k_inv * h2;
    let kh3 = k_inv * h3;

    let n1 = kh1.norm();
    let n2 = kh2.norm();
    if n1 < 1e-12 || n2 < 1e-12 {
        return None;
    }
    let lambda = 2.0 / (n1 + n2);

    let r1 = kh1 * lambda;
    let r2 = kh2 * lambda;
    let r3 = r1.cross(&r2);
    let t = kh3 * lambda;

    let m = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = m.svd(true, true);
    let (u, vt) = (svd.u?, svd.v_t?);
    let mut r = u * vt;
    if r.determinant() < 0.0 {
        let mut u_fixed = u;
        for i in 0..3 {
            u_fixed[(i, 2)] = -u_fixed[(i, 2)];
        }
        r = u_fixed * vt;
    }
    Some((r, t))
}

/// Solve for a first-order (`k1`, `k2`) radial distortion correction by
/// linear least squares over the ideal-vs-observed pixel residuals of every
/// view, holding the just-recovered intrinsics and extrinsics fixed. This is
/// the classical Zhang appendix trick: radial distortion enters the
/// projection equations linearly once the undistorted projection is known.
fn solve_radial_distortion(
    k: &Matrix3<f64>,
    extrinsics: &[(Matrix3<f64>, Vector3<f64>)],
    object_points: &[Point2<f64>],
    image_points_per_view: &[Vec<Point2<f64>>],
) -> [f64; 2] {
    let (u0, v0) = (k[(0, 2)], k[(1, 2)]);
    let mut rows = Vec::new();
    let mut rhs = Vec::new();

    for ((r, t), observed) in extrinsics.iter().zip(image_points_per_view.iter()) {
        for (obj, obs) in object_points.iter().zip(observed.iter()) {
            let p = Vector3::new(obj.x, obj.y, 0.0);
            let cam = r * p + t;
            if cam.z.abs() < 1e-12 {
                continue;
            }
            let xn = cam.x / cam.z;
            let yn = cam.y / cam.z;
            let r2 = xn * xn + yn * yn;
            let r4 = r2 * r2;

            let proj = k * Vector3::new(xn, yn, 1.0);
            let (u_ideal, v_ideal) = (proj.x, proj.y);

            rows.push([(u_ideal - u0) * r2, (u_ideal - u0) * r4]);
            rhs.push(obs.x - u_ideal);
            rows.push([(v_ideal - v0) * r2, (v_ideal - v0) * r4]);
            rhs.push(obs.y - v_ideal);
        }
    }

    if rows.is_empty() {
        return [0.0, 0.0];
    }
    let n = rows.len();
    let mut a = DMatrix::<f64>::zeros(n, 2);
    let mut b = DVector::<f64>::zeros(n);
    for (i, row) in rows.iter().enumerate() {
        a[(i, 0)] = row[0];
        a[(i, 1)] = row[1];
        b[i] = rhs[i];
    }

    match a.clone().svd(true, true).solve(&b, 1e-9) {
        Ok(sol) => [sol[0], sol[1]],
        Err(_) => [0.0, 0.0],
    }
}

fn reprojection_rms(
    k: &Matrix3<f64>,
    dist: &[f64; 8],
    extrinsics: &[(Matrix3<f64>, Vector3<f64>)],
    object_points: &[Point2<f64>],
    image_points_per_view: &[Vec<Point2<f64>>],
) -> f64 {
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for ((r, t), observed) in extrinsics.iter().zip(image_points_per_view.iter()) {
        for (obj, obs) in object_points.iter().zip(observed.iter()) {
            let p = Vector3::new(obj.x, obj.y, 0.0);
            let cam = r * p + t;
            if cam.z.abs() < 1e-12 {
                continue;
            }
            let xn = cam.x / cam.z;
            let yn = cam.y / cam.z;
            let und = crate::distortion::distort_normalized(Point2::new(xn, yn), dist);
            let proj = k * Vector3::new(und.x, und.y, 1.0);
            let dx = proj.x - obs.x;
            let dy = proj.y - obs.y;
            sum_sq += dx * dx + dy * dy;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        (sum_sq / count as f64).sqrt()
    }
}

/// Calibrate a camera from `N` chessboard views, each contributing the same
/// planar `object_points` template and its corresponding `image_points`
/// (both row-major, same ordering and count per view).
pub fn calibrate_camera(
    object_points: &[Point2<f64>],
    image_points_per_view: &[Vec<Point2<f64>>],
) -> Option<CalibrationResult> {
    if image_points_per_view.len() < 3 {
        return None;
    }

    let obj_f32: Vec<Point2<f32>> = object_points.iter().map(|p| Point2::new(p.x as f32, p.y as f32)).collect();

    let homographies: Vec<Homography> = image_points_per_view
        .iter()
        .map(|view| {
            let dst: Vec<Point2<f32>> = view.iter().map(|p| Point2::new(p.x as f32, p.y as f32)).collect();
            estimate_homography_dlt(&obj_f32, &dst)
        })
        .collect::<Option<Vec<_>>>()?;

    let hs: Vec<Matrix3<f64>> = homographies.iter().map(|h| h.h).collect();
    let k = intrinsics_from_absolute_conic(&hs)?;
    let k_inv = k.try_inverse()?;

    let extrinsics: Vec<(Matrix3<f64>, Vector3<f64>)> = hs
        .iter()
        .map(|h| extrinsics_from_homography(h, &k_inv))
        .collect::<Option<Vec<_>>>()?;

    let radial = solve_radial_distortion(&k, &extrinsics, object_points, image_points_per_view);
    let dist = [radial[0], radial[1], 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

    let rms = reprojection_rms(&k, &dist, &extrinsics, object_points, image_points_per_view);

    let extrinsic_vecs = extrinsics
        .iter()
        .map(|(r, t)| (matrix_to_rodrigues(*r), *t))
        .collect();

    Some(CalibrationResult {
        camera_matrix: k,
        dist_coeffs: dist,
        extrinsics: extrinsic_vecs,
        reprojection_error: rms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chessboard_object_points(cols: usize, rows: usize) -> Vec<Point2<f64>> {
        (0..rows)
            .flat_map(|j| (0..cols).map(move |i| Point2::new(i as f64, j as f64)))
            .collect()
    }

    #[test]
    fn recovers_known_intrinsics_from_synthetic_views() {
        let k = Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
        let object = chessboard_object_points(9, 6);

        let views = [
            (Vector3::new(0.1, -0.05, 0.0), Vector3::new(-1.0, -0.5, 6.0)),
            (Vector3::new(-0.2, 0.1, 0.1), Vector3::new(0.5, -0.2, 5.5)),
            (Vector3::new(0.05, 0.2, -0.1), Vector3::new(-0.3, 0.4, 6.5)),
            (Vector3::new(0.3, 0.0, 0.05), Vector3::new(0.2, 0.1, 7.0)),
        ];

        let mut image_points_per_view = Vec::new();
        for (rvec, t) in views {
            let r = crate::rodrigues::rodrigues_to_matrix(rvec);
            let pts: Vec<Point2<f64>> = object
                .iter()
                .map(|obj| {
                    let p = Vector3::new(obj.x, obj.y, 0.0);
                    let cam = r * p + t;
                    let proj = k * Vector3::new(cam.x / cam.z, cam.y / cam.z, 1.0);
                    Point2::new(proj.x, proj.y)
                })
                .collect();
            image_points_per_view.push(pts);
        }

        let result = calibrate_camera(&object, &image_points_per_view).expect("calibration");
        assert!((result.camera_matrix[(0, 0)] - 800.0).abs() < 5.0);
        assert!((result.camera_matrix[(1, 1)] - 800.0).abs() < 5.0);
        assert!((result.camera_matrix[(0, 2)] - 320.0).abs() < 5.0);
        assert!((result.camera_matrix[(1, 2)] - 240.0).abs() < 5.0);
        assert!(result.reprojection_error < 1.0);
        assert_eq!(result.extrinsics.len(), views.len());
    }

    #[test]
    fn rejects_fewer_than_three_views() {
        let object = chessboard_object_points(9, 6);
        let image_points_per_view = vec![vec![Point2::new(0.0, 0.0); object.len()]; 2];
        assert!(calibrate_camera(&object, &image_points_per_view).is_none());
    }
}
