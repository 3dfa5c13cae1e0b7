//! End-to-end scenarios exercised through the public facade API.

use fiducial::{compute_intrinsics, detect_markers};
use fiducial_core::BgrImage;
use fiducial_marker::CODEWORDS;
use nalgebra::Matrix3;

const CELL: usize = 50;
const GRID: usize = 7;
const TILE: usize = CELL * GRID; // 350, matches fiducial_marker::config::RECTIFIED_SIZE

/// Map a (bit1, bit3) pair to the codeword row that encodes it, every
/// combination appears in exactly one of the four dictionary rows.
fn row_for_bits(b1: bool, b3: bool) -> [bool; 5] {
    match (b1, b3) {
        (false, false) => CODEWORDS[0],
        (false, true) => CODEWORDS[1],
        (true, true) => CODEWORDS[2],
        (true, false) => CODEWORDS[3],
    }
}

fn bits_for_code(code: u32) -> [[bool; 5]; 5] {
    let mut bits = [[false; 5]; 5];
    for (y, row) in bits.iter_mut().enumerate() {
        let shift = 8 - 2 * y as u32;
        let b1 = (code >> (shift + 1)) & 1 == 1;
        let b3 = (code >> shift) & 1 == 1;
        *row = row_for_bits(b1, b3);
    }
    bits
}

/// Render a `TILE`x`TILE` grayscale byte buffer for `code`: a black 1-cell
/// border ring around a 5x5 payload, white cells where the bit is set.
fn render_marker_tile(code: u32) -> Vec<u8> {
    let bits = bits_for_code(code);
    let mut tile = vec![0u8; TILE * TILE];
    for (i, row) in bits.iter().enumerate() {
        for (j, &bit) in row.iter().enumerate() {
            if !bit {
                continue;
            }
            let (gy, gx) = (i + 1, j + 1);
            for y in (gy * CELL)..(gy * CELL + CELL) {
                for x in (gx * CELL)..(gx * CELL + CELL) {
                    tile[y * TILE + x] = 255;
                }
            }
        }
    }
    tile
}

/// Paste a marker tile axis-aligned into a white `w`x`h` BGR frame at
/// `(ox, oy)`. Returns the frame and the quad's four corners in CCW image
/// order, matching the orientation convention `extract_candidates` uses.
fn frame_with_marker(w: usize, h: usize, ox: usize, oy: usize, code: u32) -> (BgrImage, [(f32, f32); 4]) {
    let tile = render_marker_tile(code);
    let mut frame = BgrImage {
        width: w,
        height: h,
        data: vec![255u8; w * h * 3],
    };
    for y in 0..TILE {
        for x in 0..TILE {
            let v = tile[y * TILE + x];
            frame.set_pixel(ox + x, oy + y, (v, v, v));
        }
    }
    let corners = [
        (ox as f32, oy as f32),
        ((ox + TILE - 1) as f32, oy as f32),
        ((ox + TILE - 1) as f32, (oy + TILE - 1) as f32),
        (ox as f32, (oy + TILE - 1) as f32),
    ];
    (frame, corners)
}

fn corner_set_matches(got: &[nalgebra::Point2<f32>; 4], expected: &[(f32, f32); 4], tol: f32) -> bool {
    expected.iter().all(|&(ex, ey)| {
        got.iter()
            .any(|p| (p.x - ex).abs() < tol && (p.y - ey).abs() < tol)
    })
}

#[test]
fn single_centered_marker_is_detected_with_correct_code_and_corners() {
    let (frame, expected_corners) = frame_with_marker(640, 480, 145, 65, 272);
    let k = Matrix3::new(640.0, 0.0, 320.0, 0.0, 640.0, 240.0, 0.0, 0.0, 1.0);
    let (markers, annotated) = detect_markers(&frame, k, [0.0; 8]).expect("valid frame");

    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].code, 272);
    assert!(corner_set_matches(&markers[0].corners, &expected_corners, 2.0));
    assert_eq!(annotated.width, 640);
    assert_eq!(annotated.height, 480);
}

#[test]
fn blank_frame_yields_no_markers() {
    let frame = BgrImage {
        width: 640,
        height: 480,
        data: vec![255u8; 640 * 480 * 3],
    };
    let k = Matrix3::identity();
    let (markers, _) = detect_markers(&frame, k, [0.0; 8]).expect("valid frame");
    assert!(markers.is_empty());
}

#[test]
fn compute_intrinsics_requires_exactly_ten_samples() {
    let too_few = vec![vec![(0.0f32, 0.0f32); 54]; 5];
    assert!(compute_intrinsics(&too_few).is_err());
}
