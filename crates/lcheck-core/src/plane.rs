//! Single-channel `f32` planes.
//!
//! Correlation responses live here, and so do images that must be rotated
//! without re-quantizing to 8 bits.

use crate::image::GrayImageView;

/// Owned row-major `f32` plane.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_gray(src: &GrayImageView<'_>) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: src.data.iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    #[inline]
    fn get_or_zero(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    /// Bilinear sample; outside samples contribute zero.
    #[inline]
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor() as i64;
        let y0 = y.floor() as i64;
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;
        let a = self.get_or_zero(x0, y0) * (1.0 - fx) + self.get_or_zero(x0 + 1, y0) * fx;
        let b = self.get_or_zero(x0, y0 + 1) * (1.0 - fx) + self.get_or_zero(x0 + 1, y0 + 1) * fx;
        a * (1.0 - fy) + b * fy
    }

    /// Place `self` into a zero canvas with its top-left pixel at `(x0, y0)`.
    ///
    /// Offsets may be negative; parts that fall outside the canvas are dropped.
    pub fn embed(&self, canvas_width: usize, canvas_height: usize, x0: i64, y0: i64) -> FloatImage {
        let mut out = FloatImage::zeros(canvas_width, canvas_height);
        for y in 0..self.height {
            let cy = y as i64 + y0;
            if cy < 0 || cy >= canvas_height as i64 {
                continue;
            }
            for x in 0..self.width {
                let cx = x as i64 + x0;
                if cx < 0 || cx >= canvas_width as i64 {
                    continue;
                }
                out.set(cx as usize, cy as usize, self.get(x, y));
            }
        }
        out
    }

    /// Copy a `width × height` window starting at `(x0, y0)`; zero outside.
    pub fn crop(&self, x0: i64, y0: i64, width: usize, height: usize) -> FloatImage {
        let mut out = FloatImage::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                out.set(x, y, self.get_or_zero(x as i64 + x0, y as i64 + y0));
            }
        }
        out
    }

    /// Rotate by `angle_deg` about `(width/2, height/2)` keeping the size.
    ///
    /// Positive angles turn the picture counter-clockwise as displayed
    /// (y pointing down). Uncovered pixels are zero.
    pub fn rotated(&self, angle_deg: f64) -> FloatImage {
        if angle_deg == 0.0 {
            return self.clone();
        }
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (sin, cos) = (sin as f32, cos as f32);
        let cx = self.width as f32 * 0.5;
        let cy = self.height as f32 * 0.5;
        let mut out = FloatImage::zeros(self.width, self.height);
        for y in 0..self.height {
            let dy = y as f32 - cy;
            for x in 0..self.width {
                let dx = x as f32 - cx;
                let sx = cx + cos * dx - sin * dy;
                let sy = cy + sin * dx + cos * dy;
                out.set(x, y, self.sample_bilinear(sx, sy));
            }
        }
        out
    }

    /// Element-wise maximum with `other` (same dimensions).
    pub fn max_assign(&mut self, other: &FloatImage) {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            if b > *a {
                *a = b;
            }
        }
    }

    /// Set a frame of `margin` pixels along every edge to zero.
    pub fn zero_border(&mut self, margin: usize) {
        let (w, h) = (self.width, self.height);
        for y in 0..h {
            for x in 0..w {
                if x < margin || y < margin || x + margin >= w || y + margin >= h {
                    self.set(x, y, 0.0);
                }
            }
        }
    }

    /// Sum of each column.
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0f64; self.width];
        for row in self.data.chunks_exact(self.width.max(1)) {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v as f64;
            }
        }
        sums
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.data
            .chunks_exact(self.width.max(1))
            .map(|row| row.iter().map(|&v| v as f64).sum())
            .collect()
    }
}
