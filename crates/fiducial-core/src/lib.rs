//! Core geometric types shared by every stage of the fiducial-marker
//! pipeline. Intentionally small and purely numeric: it does not know
//! about contours, markers, or cameras.

mod homography;
mod image;
pub mod logger;

pub use homography::{
    estimate_homography_dlt, homography_from_4pt, warp_perspective_gray, Homography,
};
pub use image::{
    sample_bilinear, sample_bilinear_u8, BgrImage, BgrImageView, GrayImage, GrayImageView,
};
