//! Iterative sub-pixel saddle refinement.
//!
//! Every pixel `q` in a window around a true corner `c` satisfies
//! `grad(q) . (q - c) = 0`: on flat areas the gradient vanishes, on edges it
//! is orthogonal to the edge through `c`. Accumulating this constraint over
//! a Gaussian-weighted window gives a 2×2 normal system whose solution is the
//! next estimate of `c`.

use nalgebra::Point2;

use lcheck_core::{sample_bilinear, GrayImageView};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::params::SubpixParams;

/// Half-size of the refinement window for a candidate set.
///
/// It is `0.375 * d_min` (half of three quarters of the closest pair
/// distance), reduced so that the window around every point stays one pixel
/// inside the image. Returns `None` for fewer than two points or when no
/// window of at least one pixel fits.
pub fn window_half_size(points: &[Point2<f64>], width: usize, height: usize) -> Option<usize> {
    if points.len() < 2 {
        return None;
    }
    let mut min_d2 = f64::INFINITY;
    for (k, a) in points.iter().enumerate() {
        for b in &points[k + 1..] {
            min_d2 = min_d2.min((a - b).norm_squared());
        }
    }
    let mut half = 0.5 * 0.75 * min_d2.sqrt();
    for p in points {
        half = half
            .min(p.x - 1.0)
            .min(p.y - 1.0)
            .min(width as f64 - 2.0 - p.x)
            .min(height as f64 - 2.0 - p.y);
    }
    (half >= 1.0).then_some(half.floor() as usize)
}

/// Bilinear patch of `size × size` pixels centered on `center`, replicating
/// the image border.
fn rect_sub_pix(image: &GrayImageView<'_>, center: Point2<f64>, size: usize) -> Vec<f64> {
    let ox = center.x - (size as f64 - 1.0) * 0.5;
    let oy = center.y - (size as f64 - 1.0) * 0.5;
    let mut out = Vec::with_capacity(size * size);
    for r in 0..size {
        for c in 0..size {
            out.push(sample_bilinear(image, ox + c as f64, oy + r as f64));
        }
    }
    out
}

/// Refine a single corner inside a `(2*half + 1)²` window.
///
/// A point that wanders farther than `half` pixels along either axis from
/// its start is returned unchanged.
pub fn refine_corner(
    image: &GrayImageView<'_>,
    start: Point2<f64>,
    half: usize,
    params: &SubpixParams,
) -> Point2<f64> {
    let win = 2 * half + 1;
    let patch = win + 2;
    let hf = half as f64;
    let weights: Vec<f64> = (0..win)
        .map(|k| {
            let t = (k as f64 - hf) / hf.max(1.0);
            (-t * t).exp()
        })
        .collect();
    let eps2 = params.epsilon.max(0.0).powi(2);
    let max_iter = params.max_iterations.max(1);

    let mut c = start;
    for _ in 0..max_iter {
        let sub = rect_sub_pix(image, c, patch);
        let (mut a, mut b, mut cc, mut bb1, mut bb2) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for i in 0..win {
            let py = i as f64 - hf;
            for j in 0..win {
                let px = j as f64 - hf;
                let m = weights[i] * weights[j];
                let gx = sub[(i + 1) * patch + j + 2] - sub[(i + 1) * patch + j];
                let gy = sub[(i + 2) * patch + j + 1] - sub[i * patch + j + 1];
                let gxx = gx * gx * m;
                let gxy = gx * gy * m;
                let gyy = gy * gy * m;
                a += gxx;
                b += gxy;
                cc += gyy;
                bb1 += gxx * px + gxy * py;
                bb2 += gxy * px + gyy * py;
            }
        }
        let det = a * cc - b * b;
        if det.abs() <= f64::EPSILON * f64::EPSILON {
            break;
        }
        let next = Point2::new(
            c.x + (cc * bb1 - b * bb2) / det,
            c.y + (a * bb2 - b * bb1) / det,
        );
        let step2 = (next - c).norm_squared();
        c = next;
        if c.x < 0.0 || c.y < 0.0 || c.x >= image.width as f64 || c.y >= image.height as f64 {
            break;
        }
        if step2 <= eps2 {
            break;
        }
    }

    if (c.x - start.x).abs() > hf || (c.y - start.y).abs() > hf {
        start
    } else {
        c
    }
}

/// Refine every point independently, in input order.
///
/// With the `rayon` feature and `params.parallel`, the input is split into
/// one contiguous chunk per worker and the refined chunks are concatenated.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, points, params), fields(n = points.len()))
)]
pub fn refine_corners(
    image: &GrayImageView<'_>,
    points: &[Point2<f64>],
    half: usize,
    params: &SubpixParams,
) -> Vec<Point2<f64>> {
    let refine_chunk = |chunk: &[Point2<f64>]| -> Vec<Point2<f64>> {
        chunk
            .iter()
            .map(|&p| refine_corner(image, p, half, params))
            .collect()
    };

    #[cfg(feature = "rayon")]
    {
        if params.parallel && !points.is_empty() {
            let chunk = points.len().div_ceil(rayon::current_num_threads().max(1));
            return points
                .par_chunks(chunk)
                .map(refine_chunk)
                .collect::<Vec<_>>()
                .concat();
        }
    }

    refine_chunk(points)
}
