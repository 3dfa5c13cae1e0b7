//! Debug overlay renderer: draws each marker's corner polygon onto a
//! zero canvas, then blends it additively into the working frame. Not on
//! the correctness-critical path, a rendering bug here never fails
//! detection.

use fiducial_core::BgrImage;
use fiducial_pose::Marker;

fn draw_line(canvas: &mut BgrImage, p0: (f32, f32), p1: (f32, f32), color: (u8, u8, u8)) {
    let (x0, y0) = (p0.0.round() as i32, p0.1.round() as i32);
    let (x1, y1) = (p1.0.round() as i32, p1.1.round() as i32);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        if x >= 0 && y >= 0 && (x as usize) < canvas.width && (y as usize) < canvas.height {
            canvas.set_pixel(x as usize, y as usize, color);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn add_into(frame: &mut BgrImage, canvas: &BgrImage) {
    for (dst, src) in frame.data.iter_mut().zip(canvas.data.iter()) {
        *dst = dst.saturating_add(*src);
    }
}

/// Draw every marker's closed 4-corner polygon in white onto `frame`,
/// blended by pixel-wise saturating addition.
pub fn render_overlay(frame: &mut BgrImage, markers: &[Marker]) {
    let mut canvas = BgrImage {
        width: frame.width,
        height: frame.height,
        data: vec![0u8; frame.width * frame.height * 3],
    };

    for marker in markers {
        let corners = marker.corners;
        for i in 0..4 {
            let a = (corners[i].x, corners[i].y);
            let b = (corners[(i + 1) % 4].x, corners[(i + 1) % 4].y);
            draw_line(&mut canvas, a, b, (255, 255, 255));
        }
    }

    add_into(frame, &canvas);
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix3, Point2, Vector3};

    fn marker_with_corners(corners: [Point2<f32>; 4]) -> Marker {
        Marker {
            code: 0,
            corners,
            rotation: Matrix3::zeros(),
            translation: Vector3::zeros(),
        }
    }

    #[test]
    fn overlay_lights_up_pixels_along_the_quad_border() {
        let mut frame = BgrImage {
            width: 20,
            height: 20,
            data: vec![0u8; 20 * 20 * 3],
        };
        let marker = marker_with_corners([
            Point2::new(2.0, 2.0),
            Point2::new(17.0, 2.0),
            Point2::new(17.0, 17.0),
            Point2::new(2.0, 17.0),
        ]);
        render_overlay(&mut frame, std::slice::from_ref(&marker));
        assert_eq!(frame.pixel(2, 2), (255, 255, 255));
        assert_eq!(frame.pixel(10, 10), (0, 0, 0));
    }
}
