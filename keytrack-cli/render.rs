//! Visualisation of detected keypoints and matches.

use crate::TrackResult;
use image::{imageops, DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use keytrack_core::Keypoint;

const KEYPOINT_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

fn to_rgba(img: &GrayImage) -> RgbaImage {
    DynamicImage::ImageLuma8(img.clone()).into_rgba8()
}

fn draw_keypoint(canvas: &mut RgbaImage, kp: &Keypoint, dx: f32, color: Rgba<u8>) {
    let radius = kp.radius().round().max(1.0) as i32;
    draw_hollow_circle_mut(
        canvas,
        ((kp.x + dx).round() as i32, kp.y.round() as i32),
        radius,
        color,
    );
}

/// Deterministic, well separated line colors
fn match_color(i: usize) -> Rgba<u8> {
    let h = (i as u32).wrapping_mul(2_654_435_761);
    Rgba([(h >> 24) as u8 | 0x40, (h >> 16) as u8 | 0x40, (h >> 8) as u8 | 0x40, 255])
}

/// Grayscale image with a hollow circle of the keypoint's size at each keypoint.
pub fn draw_keypoints(img: &GrayImage, keypoints: &[Keypoint]) -> RgbaImage {
    let mut output = to_rgba(img);
    for kp in keypoints {
        draw_keypoint(&mut output, kp, 0.0, KEYPOINT_COLOR);
    }
    output
}

/// Source and reference images side by side with one line per match.
pub fn draw_matches(source: &GrayImage, reference: &GrayImage, track: &TrackResult) -> RgbaImage {
    let (sw, sh) = source.dimensions();
    let (rw, rh) = reference.dimensions();
    let mut canvas = RgbaImage::new(sw + rw, sh.max(rh));
    imageops::replace(&mut canvas, &to_rgba(source), 0, 0);
    imageops::replace(&mut canvas, &to_rgba(reference), i64::from(sw), 0);

    let offset = sw as f32;
    for kp in &track.source_keypoints {
        draw_keypoint(&mut canvas, kp, 0.0, KEYPOINT_COLOR);
    }
    for kp in &track.reference_keypoints {
        draw_keypoint(&mut canvas, kp, offset, KEYPOINT_COLOR);
    }

    for (i, m) in track.report.matches.iter().enumerate() {
        let (Some(a), Some(b)) = (
            track.source_keypoints.get(m.source_index),
            track.reference_keypoints.get(m.reference_index),
        ) else {
            continue;
        };
        draw_line_segment_mut(&mut canvas, (a.x, a.y), (b.x + offset, b.y), match_color(i));
    }
    canvas
}
