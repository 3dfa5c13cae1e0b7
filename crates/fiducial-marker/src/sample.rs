//! Cell sampler: partitions the rectified 350x350 image into a 7x7 grid,
//! validates the border, and extracts the interior 5x5 bit matrix.

use fiducial_core::GrayImageView;

use crate::config::{CELL_SIZE, GRID_CELLS};

/// 5x5 interior bit matrix, row-major, `true` meaning a white (1) cell.
pub type BitMatrix = [[bool; 5]; 5];

fn cell_white_count(rectified: &GrayImageView<'_>, row: usize, col: usize) -> usize {
    let mut count = 0;
    let y0 = row * CELL_SIZE;
    let x0 = col * CELL_SIZE;
    for y in y0..y0 + CELL_SIZE {
        for x in x0..x0 + CELL_SIZE {
            if rectified.data[y * rectified.width + x] != 0 {
                count += 1;
            }
        }
    }
    count
}

fn is_border_cell(row: usize, col: usize) -> bool {
    row == 0 || row == GRID_CELLS - 1 || col == 0 || col == GRID_CELLS - 1
}

/// Sample the 5x5 payload from a rectified, Otsu-binarized marker image.
/// Returns `None` if any border cell is not majority-black.
pub fn sample_cells(rectified: &GrayImageView<'_>) -> Option<BitMatrix> {
    let half_cell = CELL_SIZE * CELL_SIZE / 2;

    for row in 0..GRID_CELLS {
        for col in 0..GRID_CELLS {
            if !is_border_cell(row, col) {
                continue;
            }
            let white = cell_white_count(rectified, row, col);
            if white > half_cell {
                return None;
            }
        }
    }

    let mut bits = [[false; 5]; 5];
    for (y, row) in bits.iter_mut().enumerate() {
        for (x, bit) in row.iter_mut().enumerate() {
            let white = cell_white_count(rectified, y + 1, x + 1);
            *bit = white > half_cell;
        }
    }
    Some(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiducial_core::GrayImage;
    use crate::config::RECTIFIED_SIZE;

    fn blank_marker() -> GrayImage {
        // All black: every border cell passes, every interior bit is 0.
        GrayImage::new(RECTIFIED_SIZE, RECTIFIED_SIZE)
    }

    fn set_cell_white(img: &mut GrayImage, row: usize, col: usize) {
        let y0 = row * CELL_SIZE;
        let x0 = col * CELL_SIZE;
        for y in y0..y0 + CELL_SIZE {
            for x in x0..x0 + CELL_SIZE {
                img.data[y * img.width + x] = 255;
            }
        }
    }

    #[test]
    fn all_black_marker_decodes_to_zero_bits() {
        let img = blank_marker();
        let bits = sample_cells(&img.view()).expect("border ok");
        assert!(bits.iter().all(|row| row.iter().all(|&b| !b)));
    }

    #[test]
    fn white_border_is_rejected() {
        let mut img = blank_marker();
        set_cell_white(&mut img, 0, 3);
        assert!(sample_cells(&img.view()).is_none());
    }

    #[test]
    fn interior_white_cell_sets_corresponding_bit() {
        let mut img = blank_marker();
        set_cell_white(&mut img, 2, 2); // interior (1,1) in 0-indexed 5x5
        let bits = sample_cells(&img.view()).expect("border ok");
        assert!(bits[1][1]);
        assert_eq!(bits.iter().flatten().filter(|&&b| b).count(), 1);
    }
}
