//! Normalized cross-correlation against saddle templates.
//!
//! The score is the plain (not mean-subtracted) normalized correlation
//! `sum(T*I) / sqrt(sum(T^2) * sum(I^2))`, mapped to `[0, 1]` via
//! `0.5 * (1 + r)` and written at the template center. Pixels closer to the
//! border than half a template stay zero.

use lcheck_core::{FloatImage, GrayImageView};

use crate::template::{CrossTemplate, TemplateBank};

/// Summed-area table of squared intensities.
struct SquareIntegral {
    stride: usize,
    data: Vec<f64>,
}

impl SquareIntegral {
    fn new(img: &FloatImage) -> Self {
        let stride = img.width + 1;
        let mut data = vec![0.0f64; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut row_sum = 0.0;
            for x in 0..img.width {
                let v = img.get(x, y) as f64;
                row_sum += v * v;
                data[(y + 1) * stride + x + 1] = data[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, data }
    }

    #[inline]
    fn window(&self, x: usize, y: usize, size: usize) -> f64 {
        let s = self.stride;
        self.data[(y + size) * s + x + size] - self.data[y * s + x + size]
            - self.data[(y + size) * s + x]
            + self.data[y * s + x]
    }
}

/// Correlation response of `image` against an unrotated `template`.
pub fn correlate(image: &FloatImage, template: &CrossTemplate) -> FloatImage {
    let size = template.size;
    let mut out = FloatImage::zeros(image.width, image.height);
    if image.width < size || image.height < size || template.norm() == 0.0 {
        return out;
    }
    let integral = SquareIntegral::new(image);
    let half = size / 2;
    for y in 0..=image.height - size {
        for x in 0..=image.width - size {
            let mut num = 0.0f64;
            for &(tx, ty, tv) in template.taps() {
                num += (tv * image.get(x + tx, y + ty)) as f64;
            }
            let den = integral.window(x, y, size).max(0.0).sqrt() * template.norm();
            let r = if den > f64::EPSILON {
                (num / den).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            out.set(x + half, y + half, (0.5 * (1.0 + r)) as f32);
        }
    }
    out
}

/// Computes correlation maps of one image for any (cross size, angle) pair.
pub struct CorrelationMapBuilder<'a> {
    image: FloatImage,
    bank: &'a TemplateBank,
}

impl<'a> CorrelationMapBuilder<'a> {
    pub fn new(image: &GrayImageView<'_>, bank: &'a TemplateBank) -> Self {
        Self {
            image: FloatImage::from_gray(image),
            bank,
        }
    }

    pub fn width(&self) -> usize {
        self.image.width
    }

    pub fn height(&self) -> usize {
        self.image.height
    }

    /// Response map aligned with the source image.
    ///
    /// For a non-zero angle the image is embedded in a square zero canvas
    /// as wide as its diagonal, rotated, correlated, rotated back by the
    /// opposite angle and cropped to the original extent.
    pub fn map(&self, cross_size: usize, angle_deg: f64) -> FloatImage {
        let template = self.bank.get(cross_size);
        if angle_deg == 0.0 {
            return correlate(&self.image, &template);
        }
        let (w, h) = (self.image.width, self.image.height);
        let side = (w as f64).hypot(h as f64) as usize;
        let x0 = (side.saturating_sub(w) / 2) as i64;
        let y0 = (side.saturating_sub(h) / 2) as i64;
        let canvas = self.image.embed(side, side, x0, y0).rotated(angle_deg);
        correlate(&canvas, &template)
            .rotated(-angle_deg)
            .crop(x0, y0, w, h)
    }
}
