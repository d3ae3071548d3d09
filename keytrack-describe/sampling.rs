/// Bilinear interpolation for subpixel sampling. Samples whose 2x2
/// neighbourhood leaves the image fall back to the nearest clamped pixel.
pub(crate) fn bilinear_sample(img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();

    if !(x0 >= 0.0 && y0 >= 0.0 && x0 + 1.0 < width as f32 && y0 + 1.0 < height as f32) {
        let cx = x.round().clamp(0.0, (width - 1) as f32) as usize;
        let cy = y.round().clamp(0.0, (height - 1) as f32) as usize;
        return f32::from(img[cy * width + cx]);
    }

    let dx = x - x0;
    let dy = y - y0;
    let (xi, yi) = (x0 as usize, y0 as usize);

    let p00 = f32::from(img[yi * width + xi]);
    let p10 = f32::from(img[yi * width + xi + 1]);
    let p01 = f32::from(img[(yi + 1) * width + xi]);
    let p11 = f32::from(img[(yi + 1) * width + xi + 1]);

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;
    top * (1.0 - dy) + bottom * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_positions_are_exact() {
        let img: Vec<u8> = (0..16).collect();
        assert_eq!(bilinear_sample(&img, 4, 4, 1.0, 2.0), 9.0);
    }

    #[test]
    fn test_interpolates_between_pixels() {
        let img = [0, 100, 0, 100];
        assert_eq!(bilinear_sample(&img, 2, 2, 0.5, 0.0), 50.0);
        assert_eq!(bilinear_sample(&img, 2, 2, 0.25, 0.5), 25.0);
    }

    #[test]
    fn test_out_of_bounds_clamps() {
        let img: Vec<u8> = (0..16).collect();
        assert_eq!(bilinear_sample(&img, 4, 4, -10.0, -3.0), 0.0);
        assert_eq!(bilinear_sample(&img, 4, 4, 40.0, 3.0), 15.0);
        assert!(bilinear_sample(&img, 4, 4, f32::NAN, 0.0).is_finite());
    }
}
