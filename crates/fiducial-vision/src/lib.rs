//! Image-processing primitives shared by marker detection and camera
//! calibration: grayscale conversion, thresholding, contour extraction,
//! polygon simplification, sub-pixel corner refinement, lens distortion,
//! planar PnP, chessboard corner detection, and Zhang-style calibration.
//!
//! None of these modules know about markers or codewords; that lives one
//! layer up, in `fiducial-marker`.

mod approx_poly;
mod calibrate;
mod chessboard;
mod contour;
mod corner_subpix;
mod distortion;
mod grayscale;
mod pnp;
mod rodrigues;
mod threshold;

pub use approx_poly::{approx_poly_dp, perimeter};
pub use calibrate::{calibrate_camera, CalibrationResult};
pub use chessboard::{find_chessboard_corners, ChessboardParams, ChessboardPattern};
pub use contour::{find_contours, find_contours_in, Contour};
pub use corner_subpix::{refine_corner, TermCriteria};
pub use distortion::{distort_normalized, undistort_normalized};
pub use grayscale::{bgr_to_gray, swap_red_blue};
pub use pnp::{solve_pnp_planar, CameraModel};
pub use rodrigues::{matrix_to_rodrigues, rodrigues_to_matrix};
pub use threshold::{adaptive_mean_threshold_inv, otsu_binarize, otsu_threshold};
