//! Rodrigues' rotation formula: rotation vector <-> rotation matrix.

use nalgebra::{Matrix3, Vector3};

/// Convert an axis-angle rotation vector (direction = axis, norm = angle in
/// radians) to a 3x3 rotation matrix.
pub fn rodrigues_to_matrix(r: Vector3<f64>) -> Matrix3<f64> {
    let theta = r.norm();
    if theta < 1e-12 {
        return Matrix3::identity();
    }

    let k = r / theta;
    let kx = Matrix3::new(0.0, -k.z, k.y, k.z, 0.0, -k.x, -k.y, k.x, 0.0);

    Matrix3::identity() + theta.sin() * kx + (1.0 - theta.cos()) * (kx * kx)
}

/// Convert a rotation matrix back to an axis-angle rotation vector.
pub fn matrix_to_rodrigues(rmat: Matrix3<f64>) -> Vector3<f64> {
    let trace = rmat.trace();
    let cos_theta = ((trace - 1.0) / 2.0).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();

    if theta.abs() < 1e-9 {
        return Vector3::zeros();
    }

    if (std::f64::consts::PI - theta).abs() < 1e-6 {
        // Near-pi case: extract axis from the symmetric part.
        let axis = Vector3::new(
            (rmat[(0, 0)] + 1.0).max(0.0).sqrt(),
            (rmat[(1, 1)] + 1.0).max(0.0).sqrt(),
            (rmat[(2, 2)] + 1.0).max(0.0).sqrt(),
        );
        let axis = if axis.norm() < 1e-9 {
            Vector3::x()
        } else {
            axis.normalize()
        };
        return axis * theta;
    }

    let w = Vector3::new(
        rmat[(2, 1)] - rmat[(1, 2)],
        rmat[(0, 2)] - rmat[(2, 0)],
        rmat[(1, 0)] - rmat[(0, 1)],
    );
    w * (theta / (2.0 * theta.sin()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_round_trips() {
        let r = Vector3::zeros();
        let m = rodrigues_to_matrix(r);
        assert_relative_eq!(m, Matrix3::identity(), epsilon = 1e-9);
        let back = matrix_to_rodrigues(m);
        assert_relative_eq!(back, r, epsilon = 1e-9);
    }

    #[test]
    fn quarter_turn_about_z_round_trips() {
        let r = Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let m = rodrigues_to_matrix(r);
        // Rotating the x-axis by +90 deg about z should land on y.
        let rotated = m * Vector3::x();
        assert_relative_eq!(rotated, Vector3::y(), epsilon = 1e-9);

        let back = matrix_to_rodrigues(m);
        assert_relative_eq!(back, r, epsilon = 1e-9);
    }
}
