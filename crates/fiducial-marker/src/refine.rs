//! Thin wrapper around sub-pixel corner refinement for a decoded marker's
//! four corners.

use fiducial_core::GrayImageView;
use fiducial_vision::{refine_corner, TermCriteria};
use nalgebra::Point2;

use crate::config::RefineConfig;
use crate::extract::Quad;

/// Refine all four corners of `quad` against the grayscale frame they were
/// extracted from.
pub fn refine_quad(gray: &GrayImageView<'_>, quad: &Quad, cfg: &RefineConfig) -> Quad {
    let term = TermCriteria::new(cfg.max_iter, cfg.epsilon);
    quad.map(|p| {
        let (x, y) = refine_corner(gray, (p.x, p.y), cfg.window_radius, term);
        Point2::new(x, y)
    })
}
