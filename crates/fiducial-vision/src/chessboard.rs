//! Chessboard inner-corner detection (`findChessboardCorners`-equivalent),
//! grounded on the same grid-graph idea as a ChESS-based detector: find
//! strong corner candidates, estimate local grid axes, grow a 4-connected
//! graph outward from a seed, and keep the component that matches the
//! expected pattern size.
//!
//! This implementation uses a plain Harris corner response instead of a
//! dedicated ChESS filter, and assembles the grid with a direct
//! nearest-neighbor search rather than a spatial index: the target pattern
//! is small (tens of points), so the quadratic scan is cheap.

use fiducial_core::GrayImageView;
use nalgebra::Vector2;

use crate::corner_subpix::{refine_corner, TermCriteria};

/// Expected chessboard inner-corner grid size, e.g. `(9, 6)` for a 10x7
/// square chessboard (9 columns, 6 rows of interior corners).
#[derive(Clone, Copy, Debug)]
pub struct ChessboardPattern {
    pub cols: usize,
    pub rows: usize,
}

impl ChessboardPattern {
    pub const fn points(&self) -> usize {
        self.cols * self.rows
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChessboardParams {
    /// Harris response threshold, relative to the frame's maximum response.
    pub response_threshold: f32,
    /// Minimum pixel separation enforced between kept corner candidates.
    pub min_separation: f32,
    /// Sub-pixel refinement window half-size.
    pub subpix_window: i32,
}

impl Default for ChessboardParams {
    fn default() -> Self {
        Self {
            response_threshold: 0.01,
            min_separation: 8.0,
            subpix_window: 5,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    pos: Vector2<f32>,
    response: f32,
}

fn harris_response(img: &GrayImageView<'_>) -> Vec<f32> {
    let (w, h) = (img.width, img.height);
    let mut ix = vec![0.0f32; w * h];
    let mut iy = vec![0.0f32; w * h];

    let at = |x: i32, y: i32| -> f32 {
        let x = x.clamp(0, w as i32 - 1) as usize;
        let y = y.clamp(0, h as i32 - 1) as usize;
        img.data[y * img.width + x] as f32
    };

    for y in 0..h {
        for x in 0..w {
            let gx = at(x as i32 + 1, y as i32) - at(x as i32 - 1, y as i32);
            let gy = at(x as i32, y as i32 + 1) - at(x as i32, y as i32 - 1);
            ix[y * w + x] = gx;
            iy[y * w + x] = gy;
        }
    }

    const K: f32 = 0.04;
    const RADIUS: i32 = 2;
    let mut response = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
            for dy in -RADIUS..=RADIUS {
                for dx in -RADIUS..=RADIUS {
                    let xx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                    let yy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                    let gx = ix[yy * w + xx];
                    let gy = iy[yy * w + xx];
                    sxx += gx * gx;
                    syy += gy * gy;
                    sxy += gx * gy;
                }
            }
            let det = sxx * syy - sxy * sxy;
            let trace = sxx + syy;
            response[y * w + x] = det - K * trace * trace;
        }
    }
    response
}

fn find_candidates(response: &[f32], w: usize, h: usize, params: &ChessboardParams) -> Vec<Candidate> {
    let max_resp = response.iter().cloned().fold(0.0f32, f32::max);
    if max_resp <= 0.0 {
        return Vec::new();
    }
    let threshold = max_resp * params.response_threshold;

    let mut raw: Vec<Candidate> = Vec::new();
    const NMS_RADIUS: i32 = 3;
    for y in 0..h {
        for x in 0..w {
            let v = response[y * w + x];
            if v < threshold {
                continue;
            }
            let mut is_max = true;
            'nms: for dy in -NMS_RADIUS..=NMS_RADIUS {
                for dx in -NMS_RADIUS..=NMS_RADIUS {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let xx = x as i32 + dx;
                    let yy = y as i32 + dy;
                    if xx < 0 || yy < 0 || xx >= w as i32 || yy >= h as i32 {
                        continue;
                    }
                    if response[yy as usize * w + xx as usize] > v {
                        is_max = false;
                        break 'nms;
                    }
                }
            }
            if is_max {
                raw.push(Candidate {
                    pos: Vector2::new(x as f32, y as f32),
                    response: v,
                });
            }
        }
    }

    raw.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap());
    let mut kept: Vec<Candidate> = Vec::new();
    for c in raw {
        if kept
            .iter()
            .all(|k| (k.pos - c.pos).norm() >= params.min_separation)
        {
            kept.push(c);
        }
    }
    kept
}

fn nearest(points: &[Vector2<f32>], from: usize, used: &[bool]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, p) in points.iter().enumerate() {
        if i == from || used[i] {
            continue;
        }
        let d = (p - points[from]).norm();
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best
}

/// Estimate the dominant grid spacing from the median nearest-neighbor
/// distance among candidates.
fn estimate_spacing(points: &[Vector2<f32>]) -> Option<f32> {
    if points.len() < 2 {
        return None;
    }
    let mut dists: Vec<f32> = (0..points.len())
        .filter_map(|i| {
            let used = vec![false; points.len()];
            nearest(points, i, &used).map(|(_, d)| d)
        })
        .collect();
    dists.sort_by(|a, b| a.partial_cmp(b).unwrap());
    dists.get(dists.len() / 2).copied()
}

/// Grow a 4-connected grid outward from `seed`, assigning integer `(i, j)`
/// coordinates by repeatedly matching each unassigned candidate against the
/// four axis-aligned directions from every already-assigned node.
fn assemble_grid(
    points: &[Vector2<f32>],
    spacing: f32,
    pattern: ChessboardPattern,
) -> Option<Vec<Vector2<f32>>> {
    let n = points.len();
    if n < pattern.points() {
        return None;
    }

    // Seed axes: PCA-free heuristic using the two smallest-angle separated
    // nearest neighbors of the densest point (most neighbors within 1.5x
    // spacing), taken as the local row/col directions.
    let seed = (0..n)
        .max_by_key(|&i| {
            points
                .iter()
                .filter(|p| (*p - points[i]).norm() < spacing * 1.6)
                .count()
        })
        .unwrap();

    let mut neighbor_dirs: Vec<Vector2<f32>> = points
        .iter()
        .enumerate()
        .filter(|(i, p)| *i != seed && (*p - points[seed]).norm() < spacing * 1.6)
        .map(|(_, p)| (p - points[seed]).normalize())
        .collect();
    if neighbor_dirs.len() < 2 {
        return None;
    }
    neighbor_dirs.sort_by(|a, b| {
        a.y.atan2(a.x)
            .partial_cmp(&b.y.atan2(b.x))
            .unwrap()
    });
    let u = neighbor_dirs[0];
    // Pick the neighbor direction closest to orthogonal to `u`.
    let v = *neighbor_dirs
        .iter()
        .skip(1)
        .max_by(|a, b| u.dot(a).abs().partial_cmp(&u.dot(b).abs()).unwrap().reverse())
        .unwrap_or(&neighbor_dirs[1]);

    use std::collections::HashMap;
    let mut grid: HashMap<(i32, i32), usize> = HashMap::new();
    grid.insert((0, 0), seed);
    let mut frontier = vec![(0i32, 0i32)];
    let mut assigned = vec![false; n];
    assigned[seed] = true;

    let tol = spacing * 0.5;
    while let Some((gi, gj)) = frontier.pop() {
        let base = points[grid[&(gi, gj)]];
        let dirs = [
            ((gi + 1, gj), u),
            ((gi - 1, gj), -u),
            ((gi, gj + 1), v),
            ((gi, gj - 1), -v),
        ];
        for (cell, dir) in dirs {
            if grid.contains_key(&cell) {
                continue;
            }
            let target = base + dir * spacing;
            let mut best: Option<(usize, f32)> = None;
            for (idx, p) in points.iter().enumerate() {
                if assigned[idx] {
                    continue;
                }
                let d = (p - target).norm();
                if d < tol && best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((idx, d));
                }
            }
            if let Some((idx, _)) = best {
                grid.insert(cell, idx);
                assigned[idx] = true;
                frontier.push(cell);
            }
        }
    }

    let is = grid.keys().map(|c| c.0).collect::<Vec<_>>();
    let js = grid.keys().map(|c| c.1).collect::<Vec<_>>();
    let (imin, imax) = (*is.iter().min()?, *is.iter().max()?);
    let (jmin, jmax) = (*js.iter().min()?, *js.iter().max()?);
    let width = (imax - imin + 1) as usize;
    let height = (jmax - jmin + 1) as usize;

    let (cols, rows, transpose) = if width == pattern.cols && height == pattern.rows {
        (pattern.cols, pattern.rows, false)
    } else if width == pattern.rows && height == pattern.cols {
        (pattern.rows, pattern.cols, true)
    } else {
        return None;
    };
    if grid.len() != cols * rows {
        return None;
    }

    let mut ordered = Vec::with_capacity(cols * rows);
    for j in 0..rows {
        for i in 0..cols {
            let cell = if transpose {
                (jmin + i as i32, imin + j as i32)
            } else {
                (imin + i as i32, jmin + j as i32)
            };
            let idx = *grid.get(&cell)?;
            ordered.push(points[idx]);
        }
    }
    Some(ordered)
}

/// Detect the chessboard's inner corners, in row-major order starting from
/// the top-left corner of the detected component. Returns `None` if a grid
/// matching `pattern` could not be assembled.
pub fn find_chessboard_corners(
    img: &GrayImageView<'_>,
    pattern: ChessboardPattern,
    params: &ChessboardParams,
) -> Option<Vec<(f32, f32)>> {
    let response = harris_response(img);
    let candidates = find_candidates(&response, img.width, img.height, params);
    let points: Vec<Vector2<f32>> = candidates.iter().map(|c| c.pos).collect();
    let spacing = estimate_spacing(&points)?;
    let grid = assemble_grid(&points, spacing, pattern)?;

    let term = TermCriteria::new(30, 0.01);
    Some(
        grid.into_iter()
            .map(|p| refine_corner(img, (p.x, p.y), params.subpix_window, term))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiducial_core::GrayImage;

    fn checkerboard(cols: usize, rows: usize, cell: usize) -> GrayImage {
        let w = (cols + 1) * cell;
        let h = (rows + 1) * cell;
        let mut data = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                let cx = x / cell;
                let cy = y / cell;
                let white = (cx + cy) % 2 == 0;
                data[y * w + x] = if white { 255 } else { 0 };
            }
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn finds_inner_corners_of_synthetic_board() {
        let pattern = ChessboardPattern { cols: 3, rows: 2 };
        let img = checkerboard(4, 3, 30);
        let view = img.view();
        let params = ChessboardParams::default();
        let corners = find_chessboard_corners(&view, pattern, &params);
        assert!(corners.is_some());
        assert_eq!(corners.unwrap().len(), pattern.points());
    }

    #[test]
    fn rejects_blank_image() {
        let img = GrayImage {
            width: 64,
            height: 64,
            data: vec![128u8; 64 * 64],
        };
        let pattern = ChessboardPattern { cols: 9, rows: 6 };
        let params = ChessboardParams::default();
        assert!(find_chessboard_corners(&img.view(), pattern, &params).is_none());
    }
}
