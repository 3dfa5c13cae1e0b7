//! Perspective rectifier: warp a quadrilateral candidate's interior to a
//! fixed-size axis-aligned square, then Otsu-binarize it.

use fiducial_core::{homography_from_4pt, warp_perspective_gray, GrayImage, GrayImageView};
use fiducial_vision::otsu_binarize;
use nalgebra::Point2;

use crate::config::RECTIFIED_SIZE;
use crate::extract::Quad;

/// Rectify `quad`'s interior from `gray` into a `RECTIFIED_SIZE`-square
/// binary image (values in `{0, 255}`). Returns `None` only if the
/// quadrilateral is degenerate (the 4-point homography solve failed).
pub fn rectify_marker(gray: &GrayImageView<'_>, quad: &Quad) -> Option<GrayImage> {
    let side = RECTIFIED_SIZE as f32 - 1.0;
    let dst_square = [
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(side, side),
        Point2::new(0.0, side),
    ];

    let h_src_from_dst = homography_from_4pt(&dst_square, quad)?;
    let warped = warp_perspective_gray(gray, h_src_from_dst, RECTIFIED_SIZE, RECTIFIED_SIZE);
    let binary = otsu_binarize(&warped.view());
    Some(GrayImage {
        width: RECTIFIED_SIZE,
        height: RECTIFIED_SIZE,
        data: binary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectifies_axis_aligned_quad_to_fixed_size() {
        let side = 100usize;
        let mut data = vec![255u8; side * side];
        for y in 20..80 {
            for x in 20..80 {
                data[y * side + x] = 0;
            }
        }
        let gray = GrayImage {
            width: side,
            height: side,
            data,
        };
        let quad: Quad = [
            Point2::new(20.0, 20.0),
            Point2::new(80.0, 20.0),
            Point2::new(80.0, 80.0),
            Point2::new(20.0, 80.0),
        ];
        let rectified = rectify_marker(&gray.view(), &quad).expect("rectifiable");
        assert_eq!(rectified.width, RECTIFIED_SIZE);
        assert_eq!(rectified.height, RECTIFIED_SIZE);
        assert!(rectified.data.iter().all(|&v| v == 0 || v == 255));
    }
}
