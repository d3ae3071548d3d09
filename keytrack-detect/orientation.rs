use crate::error::{DetectError, DetectResult};
use keytrack_core::{validate_image, Keypoint};
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Intensity-centroid orientation: the angle of the vector from the keypoint
/// to the centroid of the intensities in a square patch around it.
///
/// The patch is clamped to the image, and offsets are measured from the
/// keypoint's rounded pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityCentroid {
    patch_size: usize,
}

impl IntensityCentroid {
    pub const DEFAULT_PATCH_SIZE: usize = 31;

    pub fn new(patch_size: usize) -> DetectResult<Self> {
        if patch_size < 3 || patch_size % 2 == 0 {
            return Err(DetectError::InvalidPatchSize(patch_size));
        }
        Ok(Self { patch_size })
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Orientation in radians within `[0, 2π)`; 0 when both first-order
    /// moments vanish or the buffer does not hold `width * height` pixels.
    pub fn angle(&self, img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
        if width == 0 || height == 0 || img.len() != width * height {
            return 0.0;
        }
        let half = (self.patch_size / 2) as i64;
        let cx = (x.round() as i64).clamp(0, width as i64 - 1);
        let cy = (y.round() as i64).clamp(0, height as i64 - 1);
        let (x0, x1) = ((cx - half).max(0), (cx + half).min(width as i64 - 1));
        let (y0, y1) = ((cy - half).max(0), (cy + half).min(height as i64 - 1));

        let mut m10 = 0i64;
        let mut m01 = 0i64;
        for py in y0..=y1 {
            let row = &img[py as usize * width..(py as usize + 1) * width];
            for px in x0..=x1 {
                let p = i64::from(row[px as usize]);
                m10 += p * (px - cx);
                m01 += p * (py - cy);
            }
        }

        if m10 == 0 && m01 == 0 {
            return 0.0;
        }
        let angle = (m01 as f32).atan2(m10 as f32).rem_euclid(TAU);
        // rem_euclid rounds tiny negative angles up to TAU
        if angle >= TAU {
            0.0
        } else {
            angle
        }
    }

    /// Set the angle of every keypoint in place.
    pub fn orient(&self, img: &[u8], width: usize, height: usize, keypoints: &mut [Keypoint]) -> DetectResult<()> {
        validate_image(img, width, height)?;
        keypoints
            .par_iter_mut()
            .for_each(|kp| kp.angle = self.angle(img, width, height, kp.x, kp.y));
        Ok(())
    }
}

impl Default for IntensityCentroid {
    fn default() -> Self {
        Self {
            patch_size: Self::DEFAULT_PATCH_SIZE,
        }
    }
}
