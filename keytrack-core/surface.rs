use crate::error::{CoreError, CoreResult};

/// Per-pixel corner response, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSurface {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl ResponseSurface {
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> CoreResult<Self> {
        let expected_len = width * height;
        if values.len() != expected_len {
            return Err(CoreError::InvalidSurfaceData {
                expected_len,
                actual_len: values.len(),
            });
        }
        Ok(Self { width, height, values })
    }

    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    /// Build a surface by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self { width, height, values }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.values[y * self.width + x])
        } else {
            None
        }
    }

    /// Yields `(x, y, value)` row by row, top to bottom, left to right.
    pub fn raster(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let width = self.width;
        self.values
            .iter()
            .enumerate()
            .map(move |(idx, &v)| (idx % width, idx / width, v))
    }

    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Min-max normalization into `[lo, hi]`. A constant surface maps to `lo`.
    pub fn normalized(&self, lo: f32, hi: f32) -> Self {
        let Some((min, max)) = self.min_max() else {
            return self.clone();
        };
        let span = f64::from(max) - f64::from(min);
        let scale = if span > f64::from(f32::EPSILON) {
            (f64::from(hi) - f64::from(lo)) / span
        } else {
            0.0
        };
        let values = self
            .values
            .iter()
            .map(|&v| ((f64::from(v) - f64::from(min)) * scale + f64::from(lo)) as f32)
            .collect();
        Self {
            width: self.width,
            height: self.height,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = ResponseSurface::new(3, 2, vec![0.0; 5]);
        assert_eq!(
            result,
            Err(CoreError::InvalidSurfaceData { expected_len: 6, actual_len: 5 })
        );
    }

    #[test]
    fn test_raster_order_is_row_major() {
        let surface = ResponseSurface::from_fn(3, 2, |x, y| (y * 10 + x) as f32);
        let order: Vec<(usize, usize)> = surface.raster().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(surface.get(2, 1), Some(12.0));
        assert_eq!(surface.get(3, 0), None);
    }

    #[test]
    fn test_normalized_spans_range() {
        let surface = ResponseSurface::new(2, 2, vec![-1.0, 0.0, 1.0, 3.0]).unwrap();
        let norm = surface.normalized(0.0, 255.0);
        assert_eq!(norm.min_max(), Some((0.0, 255.0)));
        assert!((norm.values()[2] - 127.5).abs() < 1e-4);
    }

    #[test]
    fn test_constant_surface_normalizes_to_low_bound() {
        let surface = ResponseSurface::new(2, 1, vec![7.0, 7.0]).unwrap();
        assert_eq!(surface.normalized(0.0, 255.0).values(), &[0.0, 0.0]);
    }

    #[test]
    fn test_empty_surface() {
        let surface = ResponseSurface::zeros(0, 0);
        assert!(surface.is_empty());
        assert_eq!(surface.min_max(), None);
        assert_eq!(surface.raster().count(), 0);
    }
}
