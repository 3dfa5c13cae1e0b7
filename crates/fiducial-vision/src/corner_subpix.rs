//! Sub-pixel corner refinement (`cornerSubPix`-equivalent).
//!
//! Iterative refinement: at each step, the corner estimate is moved to the
//! point that minimizes the sum, over a square window, of the squared
//! distance from each sampled pixel to the line through that pixel along
//! its local image gradient. This is the same formulation OpenCV's
//! `cornerSubPix` uses; the zero-zone mask (an inner region excluded from
//! the sums to avoid noise bias) is configurable but unused here, matching
//! the "no zero-zone" contract of the corner refiner stage.

use fiducial_core::{sample_bilinear, GrayImageView};
use nalgebra::{Matrix2, Vector2};

/// Termination criteria shared by `cornerSubPix`, `calibrateCamera`, and
/// chessboard corner refinement: stop after `max_iter` iterations or once
/// the update is smaller than `epsilon`, whichever comes first.
#[derive(Clone, Copy, Debug)]
pub struct TermCriteria {
    pub max_iter: u32,
    pub epsilon: f32,
}

impl TermCriteria {
    pub const fn new(max_iter: u32, epsilon: f32) -> Self {
        Self { max_iter, epsilon }
    }
}

#[inline]
fn gradient_at(img: &GrayImageView<'_>, x: f32, y: f32) -> Vector2<f32> {
    const H: f32 = 1.0;
    let gx = sample_bilinear(img, x + H, y) - sample_bilinear(img, x - H, y);
    let gy = sample_bilinear(img, x, y + H) - sample_bilinear(img, x, y - H);
    Vector2::new(gx, gy)
}

/// Refine one corner estimate `(x, y)` to sub-pixel accuracy using a
/// `(2*window_radius+1)`-side window.
pub fn refine_corner(
    img: &GrayImageView<'_>,
    init: (f32, f32),
    window_radius: i32,
    term: TermCriteria,
) -> (f32, f32) {
    let mut q = Vector2::new(init.0, init.1);

    for _ in 0..term.max_iter {
        let mut g = Matrix2::<f32>::zeros();
        let mut b = Vector2::<f32>::zeros();

        for dy in -window_radius..=window_radius {
            for dx in -window_radius..=window_radius {
                let px = q.x + dx as f32;
                let py = q.y + dy as f32;
                if px < 1.0
                    || py < 1.0
                    || px >= (img.width as f32 - 1.0)
                    || py >= (img.height as f32 - 1.0)
                {
                    continue;
                }

                let grad = gradient_at(img, px, py);
                let gg = grad * grad.transpose();
                g += gg;
                b += gg * Vector2::new(px, py);
            }
        }

        let Some(g_inv) = g.try_inverse() else {
            break;
        };
        let q_new = g_inv * b;
        let delta = (q_new - q).norm();
        q = q_new;
        if delta < term.epsilon {
            break;
        }
    }

    (q.x, q.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_image(side: usize) -> fiducial_core::GrayImage {
        let mut data = vec![0u8; side * side];
        for y in 0..side {
            for x in 0..side {
                let white = (x >= side / 2) != (y >= side / 2);
                data[y * side + x] = if white { 255 } else { 0 };
            }
        }
        fiducial_core::GrayImage {
            width: side,
            height: side,
            data,
        }
    }

    #[test]
    fn refines_toward_checkerboard_saddle_point() {
        let img = checker_image(40);
        let view = img.view();
        let term = TermCriteria::new(30, 0.01);
        let refined = refine_corner(&view, (17.0, 23.0), 5, term);
        assert!((refined.0 - 20.0).abs() < 1.5, "got {:?}", refined);
        assert!((refined.1 - 20.0).abs() < 1.5, "got {:?}", refined);
    }
}
