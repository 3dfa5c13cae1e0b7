//! Color conversion.

use fiducial_core::{BgrImage, BgrImageView, GrayImage};

/// Convert a BGR frame to grayscale using the Rec. 601 luma weights.
pub fn bgr_to_gray(src: &BgrImageView<'_>) -> GrayImage {
    let mut data = vec![0u8; src.width * src.height];
    for (i, px) in src.data.chunks_exact(3).enumerate() {
        let (b, g, r) = (px[0] as f32, px[1] as f32, px[2] as f32);
        data[i] = (0.114 * b + 0.587 * g + 0.299 * r).round().clamp(0.0, 255.0) as u8;
    }
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}

/// Swap the R and B channels (RGB<->BGR, involutive).
pub fn swap_red_blue(img: &BgrImage) -> BgrImage {
    let mut data = vec![0u8; img.data.len()];
    for (dst, src) in data.chunks_exact_mut(3).zip(img.data.chunks_exact(3)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    BgrImage {
        width: img.width,
        height: img.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_of_white_is_white() {
        let img = BgrImage {
            width: 1,
            height: 1,
            data: vec![255, 255, 255],
        };
        let gray = bgr_to_gray(&img.view());
        assert_eq!(gray.data[0], 255);
    }

    #[test]
    fn swap_red_blue_is_involutive() {
        let img = BgrImage {
            width: 2,
            height: 1,
            data: vec![10, 20, 30, 40, 50, 60],
        };
        let swapped = swap_red_blue(&img);
        let back = swap_red_blue(&swapped);
        assert_eq!(back.data, img.data);
    }
}
