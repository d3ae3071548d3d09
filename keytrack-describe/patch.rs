use crate::config::DescriptorKind;
use crate::error::{DescribeError, DescribeResult};
use crate::sampling::bilinear_sample;
use crate::DescriptorExtractor;
use keytrack_core::{validate_image, DescriptorSet, Keypoint};
use log::debug;
use rayon::prelude::*;

const FLAT_NORM: f32 = 1e-6;

/// Intensity patch descriptor: a `grid x grid` bilinear sampling of a square
/// window of side `window_scale * keypoint.size`, made zero-mean and scaled
/// to unit length. Patches without contrast become all zeros.
#[derive(Debug, Clone)]
pub struct PatchExtractor {
    grid: usize,
    window_scale: f32,
}

impl PatchExtractor {
    pub const DEFAULT_GRID: usize = 8;
    pub const DEFAULT_WINDOW_SCALE: f32 = 4.0;

    pub fn new(grid: usize, window_scale: f32) -> DescribeResult<Self> {
        if !(2..=32).contains(&grid) {
            return Err(DescribeError::InvalidGridSize(grid));
        }
        if !window_scale.is_finite() || window_scale <= 0.0 {
            return Err(DescribeError::InvalidWindowScale(window_scale));
        }
        Ok(Self { grid, window_scale })
    }

    /// Values per descriptor
    pub fn dim(&self) -> usize {
        self.grid * self.grid
    }

    fn describe_one(&self, img: &[u8], width: usize, height: usize, kp: &Keypoint) -> Vec<f32> {
        let g = self.grid;
        let step = self.window_scale * kp.size / g as f32;
        let origin = -0.5 * (g as f32 - 1.0) * step;

        let mut values = Vec::with_capacity(g * g);
        for gy in 0..g {
            let y = kp.y + origin + gy as f32 * step;
            for gx in 0..g {
                let x = kp.x + origin + gx as f32 * step;
                values.push(bilinear_sample(img, width, height, x, y));
            }
        }

        let mean = values.iter().sum::<f32>() / values.len() as f32;
        values.iter_mut().for_each(|v| *v -= mean);
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm < FLAT_NORM {
            values.iter_mut().for_each(|v| *v = 0.0);
        } else {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }
}

impl Default for PatchExtractor {
    fn default() -> Self {
        Self {
            grid: Self::DEFAULT_GRID,
            window_scale: Self::DEFAULT_WINDOW_SCALE,
        }
    }
}

impl DescriptorExtractor for PatchExtractor {
    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Patch
    }

    fn extract(
        &self,
        img: &[u8],
        width: usize,
        height: usize,
        keypoints: &[Keypoint],
    ) -> DescribeResult<DescriptorSet> {
        validate_image(img, width, height)?;
        let rows: Vec<Vec<f32>> = keypoints
            .par_iter()
            .map(|kp| self.describe_one(img, width, height, kp))
            .collect();
        debug!(
            "PatchExtractor::extract grid={} descriptors={}",
            self.grid,
            rows.len()
        );
        Ok(DescriptorSet::float(self.dim(), rows.concat())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_blob_image(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![20; width * height];
        for y in 20..30 {
            for x in 24..34 {
                img[y * width + x] = 200;
            }
        }
        img
    }

    fn norm(row: &[f32]) -> f32 {
        row.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(PatchExtractor::new(1, 4.0).unwrap_err(), DescribeError::InvalidGridSize(1));
        assert!(matches!(
            PatchExtractor::new(8, 0.0),
            Err(DescribeError::InvalidWindowScale(_))
        ));
        assert!(PatchExtractor::new(8, f32::INFINITY).is_err());
    }

    #[test]
    fn test_descriptors_are_unit_length_and_zero_mean() {
        let (w, h) = (64, 48);
        let img = create_blob_image(w, h);
        let kps = [Keypoint::new(24.0, 20.0, 6.0), Keypoint::new(33.0, 29.0, 6.0)];
        let patch = PatchExtractor::default();
        let set = patch.extract(&img, w, h, &kps).unwrap();
        assert!(!set.is_binary());
        assert_eq!(set.dim(), 64);
        assert_eq!(set.len(), 2);
        for i in 0..2 {
            let row = set.float_row(i).unwrap();
            assert!((norm(row) - 1.0).abs() < 1e-4);
            assert!(row.iter().sum::<f32>().abs() < 1e-4);
        }
    }

    #[test]
    fn test_flat_patch_is_zero() {
        let (w, h) = (64, 48);
        let img = create_blob_image(w, h);
        let set = PatchExtractor::default()
            .extract(&img, w, h, &[Keypoint::new(5.0, 40.0, 2.0)])
            .unwrap();
        assert!(set.float_row(0).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_contrast_invariance() {
        let (w, h) = (64, 48);
        let img = create_blob_image(w, h);
        let dimmer: Vec<u8> = img.iter().map(|&v| v / 2).collect();
        let kp = [Keypoint::new(24.0, 20.0, 6.0)];
        let patch = PatchExtractor::default();
        let a = patch.extract(&img, w, h, &kp).unwrap();
        let b = patch.extract(&dimmer, w, h, &kp).unwrap();
        let (a, b) = (a.float_row(0).unwrap(), b.float_row(0).unwrap());
        assert!(a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4));
    }

    #[test]
    fn test_empty_keypoints() {
        let set = PatchExtractor::default()
            .extract(&[0; 16], 4, 4, &[])
            .unwrap();
        assert!(set.is_empty());
        assert_eq!(set.dim(), 64);
    }
}
