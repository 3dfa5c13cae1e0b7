//! Thresholding: adaptive mean (candidate extraction) and Otsu (rectified
//! marker binarization).

use fiducial_core::GrayImageView;

/// Adaptive mean threshold, inverted-binary output (pixel becomes 255 when
/// it is darker than its local block mean minus `c`, 0 otherwise).
///
/// `block_size` must be odd; values are produced via an integral image so
/// the cost is independent of `block_size`.
pub fn adaptive_mean_threshold_inv(src: &GrayImageView<'_>, block_size: usize, c: i32) -> Vec<u8> {
    assert!(block_size % 2 == 1, "block_size must be odd");
    let (w, h) = (src.width, src.height);
    let integral = build_integral_image(src);
    let half = (block_size / 2) as i32;

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let x1 = (x as i32 - half).max(0) as usize;
            let y1 = (y as i32 - half).max(0) as usize;
            let x2 = ((x as i32 + half) as usize).min(w - 1);
            let y2 = ((y as i32 + half) as usize).min(h - 1);

            let count = ((x2 - x1 + 1) * (y2 - y1 + 1)) as i64;
            let sum = query_integral_sum(&integral, w, x1, y1, x2, y2);
            let mean = (sum as f64 / count as f64).round() as i32;

            let v = src.data[y * w + x] as i32;
            out[y * w + x] = if v < mean - c { 255 } else { 0 };
        }
    }
    out
}

fn build_integral_image(src: &GrayImageView<'_>) -> Vec<i64> {
    let (w, h) = (src.width, src.height);
    let mut integral = vec![0i64; w * h];
    for y in 0..h {
        let mut row_sum = 0i64;
        for x in 0..w {
            row_sum += src.data[y * w + x] as i64;
            integral[y * w + x] = row_sum + if y > 0 { integral[(y - 1) * w + x] } else { 0 };
        }
    }
    integral
}

fn query_integral_sum(
    integral: &[i64],
    width: usize,
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
) -> i64 {
    let a = if x1 > 0 && y1 > 0 {
        integral[(y1 - 1) * width + (x1 - 1)]
    } else {
        0
    };
    let b = if y1 > 0 { integral[(y1 - 1) * width + x2] } else { 0 };
    let c = if x1 > 0 { integral[y2 * width + (x1 - 1)] } else { 0 };
    let d = integral[y2 * width + x2];
    d + a - c - b
}

/// Otsu's method: pick the threshold maximizing inter-class variance.
pub fn otsu_threshold(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return 127;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }

    let total = samples.len() as f64;
    let mut sum_total = 0f64;
    for (i, &h) in hist.iter().enumerate() {
        sum_total += (i as f64) * (h as f64);
    }

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += (t as f64) * (h as f64);
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Binarize a grayscale image using Otsu's threshold, output in {0, 255}.
pub fn otsu_binarize(src: &GrayImageView<'_>) -> Vec<u8> {
    let t = otsu_threshold(src.data);
    src.data
        .iter()
        .map(|&v| if v >= t { 255 } else { 0 })
        .collect()
}
