//! Lens distortion model: OpenCV's rational radial/tangential model with
//! 8 coefficients `(k1, k2, p1, p2, k3, k4, k5, k6)`.
//!
//! ```text
//! radial(r2)     = (1 + k1*r2 + k2*r2^2 + k3*r2^3) / (1 + k4*r2 + k5*r2^2 + k6*r2^3)
//! x_distorted    = x * radial + 2*p1*x*y + p2*(r2 + 2*x^2)
//! y_distorted    = y * radial + p1*(r2 + 2*y^2) + 2*p2*x*y
//! ```
//! where `(x, y)` are normalized (camera-plane, not pixel) coordinates.

use nalgebra::Point2;

/// Apply the distortion model to a normalized point.
pub fn distort_normalized(p: Point2<f64>, d: &[f64; 8]) -> Point2<f64> {
    let (x, y) = (p.x, p.y);
    let r2 = x * x + y * y;
    let r4 = r2 * r2;
    let r6 = r4 * r2;

    let num = 1.0 + d[0] * r2 + d[1] * r4 + d[4] * r6;
    let den = 1.0 + d[5] * r2 + d[6] * r4 + d[7] * r6;
    let radial = if den.abs() > 1e-12 { num / den } else { num };

    let x_d = x * radial + 2.0 * d[2] * x * y + d[3] * (r2 + 2.0 * x * x);
    let y_d = y * radial + d[2] * (r2 + 2.0 * y * y) + 2.0 * d[3] * x * y;
    Point2::new(x_d, y_d)
}

/// Invert the distortion model by fixed-point iteration: repeatedly guess an
/// undistorted point, distort it, and correct the guess by the residual.
/// Five iterations is what `cv::undistortPoints` uses by default and is
/// enough for the mild distortion this pipeline expects from chessboard
/// calibration.
pub fn undistort_normalized(p: Point2<f64>, d: &[f64; 8]) -> Point2<f64> {
    if d.iter().all(|c| c.abs() < 1e-15) {
        return p;
    }

    let mut guess = p;
    for _ in 0..5 {
        let distorted = distort_normalized(guess, d);
        guess = Point2::new(guess.x + (p.x - distorted.x), guess.y + (p.y - distorted.y));
    }
    guess
}
