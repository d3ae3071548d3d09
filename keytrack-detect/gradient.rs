use rayon::prelude::*;

/// Mirror an out-of-range index back into `0..n` without repeating the edge
/// pixel (`-1 -> 1`, `n -> n - 2`).
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * n - 2;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

/// Sobel 3x3 image derivatives.
pub(crate) struct Gradients {
    pub width: usize,
    pub height: usize,
    pub gx: Vec<f32>,
    pub gy: Vec<f32>,
}

impl Gradients {
    pub fn sobel(img: &[u8], width: usize, height: usize) -> Self {
        let at = |x: isize, y: isize| -> f32 {
            let xx = reflect101(x, width);
            let yy = reflect101(y, height);
            f32::from(img[yy * width + xx])
        };

        let rows: Vec<(Vec<f32>, Vec<f32>)> = (0..height)
            .into_par_iter()
            .map(|y| {
                let y = y as isize;
                let mut gx_row = Vec::with_capacity(width);
                let mut gy_row = Vec::with_capacity(width);
                for x in 0..width as isize {
                    // Sobel X kernel: [-1, 0, 1; -2, 0, 2; -1, 0, 1]
                    let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                        - at(x - 1, y - 1)
                        - 2.0 * at(x - 1, y)
                        - at(x - 1, y + 1);
                    // Sobel Y kernel: [-1, -2, -1; 0, 0, 0; 1, 2, 1]
                    let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                        - at(x - 1, y - 1)
                        - 2.0 * at(x, y - 1)
                        - at(x + 1, y - 1);
                    gx_row.push(gx);
                    gy_row.push(gy);
                }
                (gx_row, gy_row)
            })
            .collect();

        let mut gx = Vec::with_capacity(width * height);
        let mut gy = Vec::with_capacity(width * height);
        for (gx_row, gy_row) in rows {
            gx.extend(gx_row);
            gy.extend(gy_row);
        }

        Self { width, height, gx, gy }
    }

    /// Per-pixel second-moment matrix `[xx xy; xy yy]` summed over a
    /// `block_size` window. Even windows extend one pixel further up/left.
    pub fn structure_tensor(&self, block_size: usize) -> Vec<[f32; 3]> {
        let (w, h) = (self.width, self.height);
        let lo = -((block_size / 2) as isize);
        let hi = lo + block_size as isize - 1;

        (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..w).map(move |x| {
                    let mut m = [0.0f32; 3];
                    for dy in lo..=hi {
                        let yy = reflect101(y as isize + dy, h);
                        for dx in lo..=hi {
                            let xx = reflect101(x as isize + dx, w);
                            let idx = yy * w + xx;
                            let (gx, gy) = (self.gx[idx], self.gy[idx]);
                            m[0] += gx * gx;
                            m[1] += gx * gy;
                            m[2] += gy * gy;
                        }
                    }
                    m
                })
            })
            .collect()
    }
}
