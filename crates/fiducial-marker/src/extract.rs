//! Candidate extractor: grayscale -> adaptive threshold -> contours ->
//! polygon approximation -> quadrilateral filtering -> dedup.

use fiducial_core::GrayImageView;
use fiducial_vision::{
    adaptive_mean_threshold_inv, approx_poly_dp, find_contours, perimeter,
};
use nalgebra::Point2;

use crate::config::ExtractorConfig;

/// A CCW-oriented, convex quadrilateral candidate.
pub type Quad = [Point2<f32>; 4];

fn cross2(o: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn is_convex(pts: &[(f32, f32); 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let o = pts[i];
        let a = pts[(i + 1) % 4];
        let b = pts[(i + 2) % 4];
        let cross = cross2(o, a, b);
        if cross.abs() < 1e-9 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn min_side_length_sq(pts: &[(f32, f32); 4]) -> f32 {
    (0..4)
        .map(|i| {
            let a = pts[i];
            let b = pts[(i + 1) % 4];
            let dx = b.0 - a.0;
            let dy = b.1 - a.1;
            dx * dx + dy * dy
        })
        .fold(f32::INFINITY, f32::min)
}

/// Rotate the vertex order so the polygon is CCW (swap indices 1 and 3 if
/// the signed area computed from the first three vertices is negative).
fn orient_ccw(mut pts: [(f32, f32); 4]) -> [(f32, f32); 4] {
    let cross = cross2(pts[0], pts[1], pts[2]);
    if cross < 0.0 {
        pts.swap(1, 3);
    }
    pts
}

fn mean_sq_corner_distance(a: &Quad, b: &Quad) -> f32 {
    let mut sum = 0.0f32;
    for k in 0..4 {
        let dx = a[k].x - b[k].x;
        let dy = a[k].y - b[k].y;
        sum += dx * dx + dy * dy;
    }
    sum / 4.0
}

fn quad_perimeter(q: &Quad) -> f32 {
    perimeter(&q.map(|p| (p.x, p.y)))
}

/// Extract candidate quadrilaterals from a grayscale frame.
pub fn extract_candidates(gray: &GrayImageView<'_>, cfg: &ExtractorConfig) -> Vec<Quad> {
    let binary = adaptive_mean_threshold_inv(gray, cfg.adaptive_block_size, cfg.adaptive_c);
    let contours = find_contours(&binary, gray.width, gray.height);

    let mut candidates: Vec<Quad> = Vec::new();
    for contour in contours {
        if contour.len() < cfg.min_points {
            continue;
        }
        let float_pts: Vec<(f32, f32)> = contour.iter().map(|&(x, y)| (x as f32, y as f32)).collect();
        let length = perimeter(&float_pts);
        let approx = approx_poly_dp(&float_pts, cfg.approx_epsilon_ratio * length);
        if approx.len() != 4 {
            continue;
        }
        let quad: [(f32, f32); 4] = [approx[0], approx[1], approx[2], approx[3]];
        if !is_convex(&quad) {
            continue;
        }
        if min_side_length_sq(&quad) < cfg.min_contour_length {
            continue;
        }
        let oriented = orient_ccw(quad);
        candidates.push(oriented.map(|(x, y)| Point2::new(x, y)));
    }

    dedup_candidates(candidates, cfg.dedup_distance_sq)
}

/// Drop every candidate that is a near-duplicate (by mean squared per-corner
/// distance) of another candidate with larger perimeter. A candidate flagged
/// in any pairwise comparison is removed, regardless of how many pairs flag
/// it.
fn dedup_candidates(candidates: Vec<Quad>, threshold_sq: f32) -> Vec<Quad> {
    let n = candidates.len();
    let mut drop = vec![false; n];
    for i in 0..n {
        for j in (i + 1)..n {
            if mean_sq_corner_distance(&candidates[i], &candidates[j]) < threshold_sq {
                let pi = quad_perimeter(&candidates[i]);
                let pj = quad_perimeter(&candidates[j]);
                if pi < pj {
                    drop[i] = true;
                } else {
                    drop[j] = true;
                }
            }
        }
    }
    candidates
        .into_iter()
        .zip(drop)
        .filter_map(|(c, d)| if d { None } else { Some(c) })
        .collect()
}
