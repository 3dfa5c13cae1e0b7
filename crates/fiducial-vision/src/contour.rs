//! Contour extraction from a binary image.
//!
//! Mirrors OpenCV's `RETR_LIST` + `CHAIN_APPROX_NONE` contract named in the
//! spec: every connected foreground (255) blob yields one contour, in
//! outer-boundary order, keeping every boundary pixel (no polyline
//! simplification at this stage). Component discovery uses union-find
//! (grounded on the same technique QR finder-pattern detectors use for
//! connected-component extraction); the boundary itself is recovered with
//! Moore-neighbor tracing.

use fiducial_core::GrayImageView;

/// An ordered sequence of integer pixel coordinates tracing one connected
/// component's outer boundary.
pub type Contour = Vec<(i32, i32)>;

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        if self.parent[x as usize] != x {
            self.parent[x as usize] = self.find(self.parent[x as usize]);
        }
        self.parent[x as usize]
    }

    fn union(&mut self, x: u32, y: u32) {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx != ry {
            self.parent[rx as usize] = ry;
        }
    }
}

/// Find all 8-connected foreground (`binary[i] != 0`) components and return
/// one representative seed pixel (the topmost, then leftmost) per component.
fn component_seeds(binary: &[u8], width: usize, height: usize) -> Vec<(i32, i32)> {
    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    let mut uf = UnionFind::new(width * height + 1);

    for y in 0..height {
        for x in 0..width {
            if binary[y * width + x] == 0 {
                continue;
            }
            let idx = y * width + x;
            let mut neighbors = [0u32; 4];
            let mut n = 0;
            if x > 0 && binary[idx - 1] != 0 {
                neighbors[n] = labels[idx - 1];
                n += 1;
            }
            if y > 0 && binary[idx - width] != 0 {
                neighbors[n] = labels[idx - width];
                n += 1;
            }
            if x > 0 && y > 0 && binary[idx - width - 1] != 0 {
                neighbors[n] = labels[idx - width - 1];
                n += 1;
            }
            if x + 1 < width && y > 0 && binary[idx - width + 1] != 0 {
                neighbors[n] = labels[idx - width + 1];
                n += 1;
            }

            if n == 0 {
                labels[idx] = next_label;
                next_label += 1;
            } else {
                let min_label = neighbors[..n].iter().copied().min().unwrap();
                labels[idx] = min_label;
                for &l in &neighbors[..n] {
                    if l != min_label {
                        uf.union(min_label, l);
                    }
                }
            }
        }
    }

    let mut seed_for_root: std::collections::HashMap<u32, (i32, i32)> =
        std::collections::HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            seed_for_root.entry(root).or_insert((x as i32, y as i32));
        }
    }

    let mut seeds: Vec<(i32, i32)> = seed_for_root.into_values().collect();
    seeds.sort_by_key(|&(x, y)| (y, x));
    seeds
}

#[inline]
fn is_set(binary: &[u8], width: i32, height: i32, x: i32, y: i32) -> bool {
    if x < 0 || y < 0 || x >= width || y >= height {
        return false;
    }
    binary[(y * width + x) as usize] != 0
}

/// Moore-neighbor boundary trace starting at `seed`, which must be the
/// topmost-then-leftmost pixel of its component (guarantees the initial
/// "came from" direction is well-defined: west).
fn trace_boundary(binary: &[u8], width: usize, height: usize, seed: (i32, i32)) -> Contour {
    const DIRS: [(i32, i32); 8] = [
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
        (0, -1),
        (1, -1),
    ];

    let (w, h) = (width as i32, height as i32);
    let start = seed;
    let mut contour = vec![start];

    // Single-pixel component: nothing to trace.
    let has_any_neighbor = DIRS.iter().any(|&(dx, dy)| {
        is_set(binary, w, h, start.0 + dx, start.1 + dy)
    });
    if !has_any_neighbor {
        return contour;
    }

    let mut current = start;
    // We arrived at `start` from the west (it is topmost-leftmost), so begin
    // the neighbor search just after the "backtrack" direction (index 4 = west).
    let mut backtrack_idx = 4usize;

    loop {
        let mut found = None;
        for step in 1..=8 {
            let idx = (backtrack_idx + step) % 8;
            let (dx, dy) = DIRS[idx];
            let cand = (current.0 + dx, current.1 + dy);
            if is_set(binary, w, h, cand.0, cand.1) {
                found = Some((cand, idx));
                break;
            }
        }

        let (next, arrived_idx) = match found {
            Some(v) => v,
            None => break, // isolated pixel already handled above
        };

        if next == start && contour.len() > 1 {
            break;
        }

        contour.push(next);
        // Next search starts from the direction opposite the one we arrived by.
        backtrack_idx = (arrived_idx + 4) % 8;
        current = next;

        if contour.len() > width * height {
            break; // defensive: never loop forever on pathological input
        }
    }

    contour
}

/// Find all contours in a binarized image (non-zero = foreground), per
/// `RETR_LIST`/`CHAIN_APPROX_NONE`: every boundary pixel kept, no hierarchy.
pub fn find_contours(binary: &[u8], width: usize, height: usize) -> Vec<Contour> {
    component_seeds(binary, width, height)
        .into_iter()
        .map(|seed| trace_boundary(binary, width, height, seed))
        .collect()
}

/// Convenience wrapper matching the spec's named pipeline step: threshold
/// output is already a binary buffer, but callers may also want the view's
/// dimensions for free.
pub fn find_contours_in(src: &GrayImageView<'_>) -> Vec<Contour> {
    find_contours(src.data, src.width, src.height)
}
