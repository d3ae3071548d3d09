use crate::config::DescriptorKind;
use crate::error::{DescribeError, DescribeResult};
use crate::sampling::bilinear_sample;
use crate::DescriptorExtractor;
use keytrack_core::{validate_image, BinaryDescriptor, DescriptorSet, Keypoint, BINARY_DESCRIPTOR_BYTES};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

const N_TESTS: usize = BINARY_DESCRIPTOR_BYTES * 8;
const PATTERN_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// BRIEF binary descriptor: 256 intensity comparisons between point pairs
/// drawn once from an isotropic Gaussian (sigma = patch / 5) over the patch.
///
/// Keypoints carrying an orientation (`angle >= 0`) have the pattern rotated
/// by that angle before sampling.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    patch_size: usize,
    pattern: Vec<[i8; 4]>,
}

impl BriefExtractor {
    pub const DEFAULT_PATCH_SIZE: usize = 31;

    pub fn new(patch_size: usize) -> DescribeResult<Self> {
        if patch_size % 2 == 0 || !(5..=63).contains(&patch_size) {
            return Err(DescribeError::InvalidPatchSize(patch_size));
        }
        Ok(Self {
            patch_size,
            pattern: Self::generate_pattern(patch_size)?,
        })
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Test point pairs `(x1, y1, x2, y2)` relative to the keypoint.
    pub fn pattern(&self) -> &[[i8; 4]] {
        &self.pattern
    }

    fn generate_pattern(patch_size: usize) -> DescribeResult<Vec<[i8; 4]>> {
        let half = (patch_size / 2) as f32;
        let normal = Normal::new(0.0f32, patch_size as f32 / 5.0)
            .map_err(|_| DescribeError::InvalidPatchSize(patch_size))?;
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let mut point = || -> i8 { normal.sample(&mut rng).round().clamp(-half, half) as i8 };

        let mut pattern = Vec::with_capacity(N_TESTS);
        while pattern.len() < N_TESTS {
            let pair = [point(), point(), point(), point()];
            // identical points would always compare equal
            if pair[0] != pair[2] || pair[1] != pair[3] {
                pattern.push(pair);
            }
        }
        Ok(pattern)
    }

    fn describe_one(&self, img: &[u8], width: usize, height: usize, kp: &Keypoint) -> BinaryDescriptor {
        let (s, c) = if kp.has_angle() { kp.angle.sin_cos() } else { (0.0, 1.0) };
        let steer = |dx: i8, dy: i8| {
            let (dx, dy) = (f32::from(dx), f32::from(dy));
            (kp.x + c * dx - s * dy, kp.y + s * dx + c * dy)
        };

        let mut d = [0u8; BINARY_DESCRIPTOR_BYTES];
        for (i, &[x1, y1, x2, y2]) in self.pattern.iter().enumerate() {
            let (px, py) = steer(x1, y1);
            let (qx, qy) = steer(x2, y2);
            let a = bilinear_sample(img, width, height, px, py);
            let b = bilinear_sample(img, width, height, qx, qy);
            d[i / 8] |= u8::from(a < b) << (i % 8);
        }
        d
    }
}

impl DescriptorExtractor for BriefExtractor {
    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Brief
    }

    fn extract(
        &self,
        img: &[u8],
        width: usize,
        height: usize,
        keypoints: &[Keypoint],
    ) -> DescribeResult<DescriptorSet> {
        validate_image(img, width, height)?;
        let rows: Vec<BinaryDescriptor> = keypoints
            .par_iter()
            .map(|kp| self.describe_one(img, width, height, kp))
            .collect();
        debug!(
            "BriefExtractor::extract patch={} descriptors={}",
            self.patch_size,
            rows.len()
        );
        Ok(DescriptorSet::Binary(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn hamming(a: &BinaryDescriptor, b: &BinaryDescriptor) -> u32 {
        a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
    }

    fn create_textured_image(width: usize, height: usize, shift: usize) -> Vec<u8> {
        (0..width * height)
            .map(|i| {
                let (x, y) = ((i % width + shift) as u32, (i / width) as u32);
                ((x * 37 + y * 91 + x * y * 13) % 251) as u8
            })
            .collect()
    }

    fn default_brief() -> BriefExtractor {
        BriefExtractor::new(BriefExtractor::DEFAULT_PATCH_SIZE).unwrap()
    }

    #[test]
    fn test_pattern_is_deterministic_and_bounded() {
        let a = default_brief();
        let b = BriefExtractor::new(31).unwrap();
        assert_eq!(a.pattern(), b.pattern());
        assert_eq!(a.pattern().len(), 256);
        assert!(a.pattern().iter().flatten().all(|&v| (-15..=15).contains(&v)));
    }

    #[test]
    fn test_pattern_follows_gaussian_spread() {
        // sigma = 31 / 5, so E|x| is about 0.8 * 6.2
        let brief = default_brief();
        let coords: Vec<f32> = brief.pattern().iter().flatten().map(|&v| f32::from(v)).collect();
        let mean = coords.iter().sum::<f32>() / coords.len() as f32;
        let mean_abs = coords.iter().map(|v| v.abs()).sum::<f32>() / coords.len() as f32;
        assert!(mean.abs() < 1.0, "mean {mean}");
        assert!((3.5..6.5).contains(&mean_abs), "mean |x| {mean_abs}");

        let small = BriefExtractor::new(5).unwrap();
        assert!(small.pattern().iter().flatten().all(|&v| (-2..=2).contains(&v)));
    }

    #[test]
    fn test_invalid_patch_size() {
        assert_eq!(BriefExtractor::new(30).unwrap_err(), DescribeError::InvalidPatchSize(30));
        assert!(BriefExtractor::new(3).is_err());
        assert!(BriefExtractor::new(65).is_err());
    }

    #[test]
    fn test_one_descriptor_per_keypoint() {
        let (w, h) = (64, 64);
        let img = create_textured_image(w, h, 0);
        let kps = vec![
            Keypoint::new(20.0, 20.0, 6.0),
            Keypoint::new(40.0, 30.0, 6.0),
            Keypoint::new(20.0, 20.0, 6.0),
        ];
        let set = default_brief().extract(&img, w, h, &kps).unwrap();
        assert!(set.is_binary());
        assert_eq!(set.len(), 3);
        assert_eq!(set.binary_row(0), set.binary_row(2));
        assert_ne!(set.binary_row(0), set.binary_row(1));
    }

    #[test]
    fn test_flat_image_gives_zero_descriptor() {
        let img = vec![77; 48 * 48];
        let kps = [Keypoint::new(24.0, 24.0, 6.0), Keypoint::new(0.0, 47.0, 6.0)];
        let set = default_brief().extract(&img, 48, 48, &kps).unwrap();
        for i in 0..2 {
            assert_eq!(set.binary_row(i), Some(&[0u8; BINARY_DESCRIPTOR_BYTES]));
        }
    }

    #[test]
    fn test_translation_invariance() {
        let (w, h) = (64, 64);
        let img_a = create_textured_image(w, h, 0);
        let img_b = create_textured_image(w, h, 5);
        let brief = default_brief();
        let a = brief.extract(&img_a, w, h, &[Keypoint::new(30.0, 32.0, 6.0)]).unwrap();
        let b = brief.extract(&img_b, w, h, &[Keypoint::new(25.0, 32.0, 6.0)]).unwrap();
        let (a, b) = (a.binary_row(0).unwrap(), b.binary_row(0).unwrap());
        assert_eq!(hamming(a, b), 0);
    }

    #[test]
    fn test_orientation_steers_pattern() {
        let (w, h) = (64, 64);
        let ramp: Vec<u8> = (0..w * h).map(|i| ((i % w) * 3) as u8).collect();
        let brief = default_brief();
        let kp = Keypoint::new(32.0, 32.0, 6.0);
        let set = brief
            .extract(&ramp, w, h, &[kp, kp.with_angle(0.0), kp.with_angle(PI)])
            .unwrap();
        let (unset, zero, flipped) = (
            set.binary_row(0).unwrap(),
            set.binary_row(1).unwrap(),
            set.binary_row(2).unwrap(),
        );
        assert_eq!(unset, zero);
        // a half turn reverses every comparison along the ramp
        for (i, &[x1, _, x2, _]) in brief.pattern().iter().enumerate() {
            let bit = |d: &BinaryDescriptor| d[i / 8] >> (i % 8) & 1;
            if x1 != x2 {
                assert_ne!(bit(unset), bit(flipped), "test {i}");
            }
        }
    }

    #[test]
    fn test_invalid_image() {
        let result = default_brief().extract(&[0; 10], 4, 4, &[]);
        assert!(matches!(result, Err(DescribeError::Core(_))));
    }
}
