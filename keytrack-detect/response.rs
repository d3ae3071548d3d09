use crate::config::DetectorKind;
use crate::error::{DetectError, DetectResult};
use crate::gradient::Gradients;
use keytrack_core::{validate_image, ResponseSurface};
use rayon::prelude::*;

/// Upper bound of the normalized response range; the lower bound is zero.
pub const RESPONSE_MAX: f32 = 255.0;

/// Producer of a per-pixel cornerness surface.
pub trait CornerResponse: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Unnormalized response with the image's dimensions.
    fn raw_response(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface>;

    /// Response min-max normalized into `[0, RESPONSE_MAX]`.
    fn compute(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface> {
        Ok(self
            .raw_response(img, width, height)?
            .normalized(0.0, RESPONSE_MAX))
    }
}

/// Harris-Stephens corner measure `det(M) - k * trace(M)^2` over a Sobel
/// structure tensor. Negative (edge-like) responses are clamped to zero.
#[derive(Debug, Clone)]
pub struct HarrisResponse {
    block_size: usize,
    k: f32,
}

impl HarrisResponse {
    pub const SOBEL_APERTURE: usize = 3;

    pub fn new(block_size: usize, k: f32) -> DetectResult<Self> {
        if block_size == 0 {
            return Err(DetectError::InvalidBlockSize(block_size));
        }
        if !k.is_finite() || k <= 0.0 {
            return Err(DetectError::InvalidHarrisK(k));
        }
        Ok(Self { block_size, k })
    }
}

impl CornerResponse for HarrisResponse {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Harris
    }

    fn raw_response(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface> {
        validate_image(img, width, height)?;
        let tensor = Gradients::sobel(img, width, height).structure_tensor(self.block_size);
        let k = f64::from(self.k);
        let values = tensor
            .par_iter()
            .map(|&[xx, xy, yy]| {
                let (xx, xy, yy) = (f64::from(xx), f64::from(xy), f64::from(yy));
                let det = xx * yy - xy * xy;
                let trace = xx + yy;
                (det - k * trace * trace).max(0.0) as f32
            })
            .collect();
        Ok(ResponseSurface::new(width, height, values)?)
    }
}

/// Shi-Tomasi "good features to track" measure: the smaller eigenvalue of the
/// structure tensor.
#[derive(Debug, Clone)]
pub struct ShiTomasiResponse {
    block_size: usize,
}

impl ShiTomasiResponse {
    pub fn new(block_size: usize) -> DetectResult<Self> {
        if block_size == 0 {
            return Err(DetectError::InvalidBlockSize(block_size));
        }
        Ok(Self { block_size })
    }
}

impl CornerResponse for ShiTomasiResponse {
    fn kind(&self) -> DetectorKind {
        DetectorKind::ShiTomasi
    }

    fn raw_response(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface> {
        validate_image(img, width, height)?;
        let tensor = Gradients::sobel(img, width, height).structure_tensor(self.block_size);
        let values = tensor
            .par_iter()
            .map(|&[xx, xy, yy]| {
                let (xx, xy, yy) = (f64::from(xx), f64::from(xy), f64::from(yy));
                let half_trace = 0.5 * (xx + yy);
                let half_diff = 0.5 * (xx - yy);
                (half_trace - (half_diff * half_diff + xy * xy).sqrt()) as f32
            })
            .collect();
        Ok(ResponseSurface::new(width, height, values)?)
    }
}

/// FAST segment-test score: mean absolute intensity difference of the circle
/// pixels that pass the test, zero for non-corners and the 3-pixel border.
#[derive(Debug, Clone)]
pub struct FastResponse {
    threshold: u8,
}

impl FastResponse {
    /// Bresenham circle of radius 3
    pub const OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];
    pub const MIN_PASSING: usize = 9;
    const BORDER: usize = 3;

    pub fn new(threshold: u8) -> DetectResult<Self> {
        // 0 would accept every pixel, >127 overflows the u8 comparisons
        if threshold == 0 || threshold > 127 {
            return Err(DetectError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    fn score(&self, img: &[u8], width: usize, x: usize, y: usize) -> f32 {
        let p = img[y * width + x];
        let mut bri = 0usize;
        let mut drk = 0usize;
        let mut bri_sum = 0i32;
        let mut drk_sum = 0i32;

        for &(dx, dy) in &Self::OFFSETS {
            let xx = (x as i32 + dx) as usize;
            let yy = (y as i32 + dy) as usize;
            let q = img[yy * width + xx];

            if q >= p.saturating_add(self.threshold) {
                bri += 1;
                bri_sum += i32::from(q) - i32::from(p);
            } else if q.saturating_add(self.threshold) <= p {
                drk += 1;
                drk_sum += i32::from(p) - i32::from(q);
            }
        }

        if bri >= Self::MIN_PASSING {
            bri_sum as f32 / bri as f32
        } else if drk >= Self::MIN_PASSING {
            drk_sum as f32 / drk as f32
        } else {
            0.0
        }
    }
}

impl CornerResponse for FastResponse {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Fast
    }

    fn raw_response(&self, img: &[u8], width: usize, height: usize) -> DetectResult<ResponseSurface> {
        validate_image(img, width, height)?;
        let b = Self::BORDER;
        let values = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    if x < b || y < b || x + b >= width || y + b >= height {
                        0.0
                    } else {
                        self.score(img, width, x, y)
                    }
                })
            })
            .collect();
        Ok(ResponseSurface::new(width, height, values)?)
    }
}
