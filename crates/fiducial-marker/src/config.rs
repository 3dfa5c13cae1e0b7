//! Fixed parameters for candidate extraction, rectification, and decoding.
//!
//! Kept as both a `Default`-implementing config struct (for callers who want
//! to override thresholds) and `pub const` module items matching the names
//! used elsewhere in this crate's doc comments.

/// Minimum number of contour points to consider for polygon approximation.
pub const MIN_POINTS: usize = 40;
/// Minimum squared side length (pixels^2) of a valid quadrilateral.
pub const MIN_CONTOUR_LENGTH: f32 = 0.1;
/// Squared-distance threshold (pixels^2) for near-duplicate dedup.
pub const DEDUP_DISTANCE_SQ: f32 = 100.0;
/// Side length of the rectified marker image.
pub const RECTIFIED_SIZE: usize = 350;
/// Cells per side of the 7x7 marker grid (border + 5x5 payload).
pub const GRID_CELLS: usize = 7;
/// Pixels per cell in the rectified image (350 / 7).
pub const CELL_SIZE: usize = RECTIFIED_SIZE / GRID_CELLS;

#[derive(Clone, Copy, Debug)]
pub struct ExtractorConfig {
    pub adaptive_block_size: usize,
    pub adaptive_c: i32,
    pub min_points: usize,
    pub approx_epsilon_ratio: f32,
    pub min_contour_length: f32,
    pub dedup_distance_sq: f32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            adaptive_block_size: 7,
            adaptive_c: 7,
            min_points: MIN_POINTS,
            approx_epsilon_ratio: 0.05,
            min_contour_length: MIN_CONTOUR_LENGTH,
            dedup_distance_sq: DEDUP_DISTANCE_SQ,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RefineConfig {
    pub window_radius: i32,
    pub max_iter: u32,
    pub epsilon: f32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            window_radius: 10,
            max_iter: 30,
            epsilon: 0.1,
        }
    }
}
