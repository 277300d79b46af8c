//! Laplacian-variance focus measure and the blurry-corner filter.

use log::debug;
use nalgebra::Point2;

use lcheck_core::{GrayImage, GrayImageView};

/// Mirror an index into `0..n` without repeating the edge pixel.
#[inline]
fn reflect_101(i: i64, n: usize) -> usize {
    let n = n as i64;
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut k = i.rem_euclid(period);
    if k >= n {
        k = period - k;
    }
    k as usize
}

/// Variance of the 4-neighbour Laplacian over `patch`.
///
/// The response is saturated to `[0, 255]` like an 8-bit filter output and
/// borders are mirrored without repeating the edge pixel.
pub fn laplacian_variance(patch: &GrayImageView<'_>) -> f64 {
    let (w, h) = (patch.width, patch.height);
    if w == 0 || h == 0 {
        return 0.0;
    }
    let at = |x: i64, y: i64| patch.get(reflect_101(x, w), reflect_101(y, h)) as i32;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let lap = at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4 * at(x, y);
            let v = lap.clamp(0, 255) as f64;
            sum += v;
            sum_sq += v * v;
        }
    }
    let n = (w * h) as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// The `[x0, x1) × [y0, y1)` patch of half-size `size` around `p`, if every
/// bound lies inside the image and the patch is not empty.
fn patch_bounds(image: &GrayImageView<'_>, p: Point2<f64>, size: f64) -> Option<[usize; 4]> {
    let x0 = (p.x - size).round();
    let x1 = (p.x + size).round();
    let y0 = (p.y - size).round();
    let y1 = (p.y + size).round();
    let (w, h) = (image.width as f64, image.height as f64);
    let inside = x0 >= 0.0 && x1 < w && y0 >= 0.0 && y1 < h && x0 < x1 && y0 < y1;
    inside.then_some([x0 as usize, y0 as usize, x1 as usize, y1 as usize])
}

/// Focus score of the `2*size` window around `p`, `None` if it leaves the image.
pub fn sharpness_at(image: &GrayImageView<'_>, p: Point2<f64>, size: f64) -> Option<f64> {
    let [x0, y0, x1, y1] = patch_bounds(image, p, size)?;
    let patch: GrayImage = image.crop(x0, y0, x1, y1);
    Some(laplacian_variance(&patch.view()))
}

/// Whether the corner at `p` is sharp enough. Corners whose window leaves
/// the image have unknown sharpness and count as blurry.
pub fn is_sharp(image: &GrayImageView<'_>, p: Point2<f64>, size: f64, min_sharpness: f64) -> bool {
    sharpness_at(image, p, size).is_some_and(|s| s >= min_sharpness)
}

/// Keep the items whose position passes [`is_sharp`], preserving order.
pub fn filter_blurry<T>(
    image: &GrayImageView<'_>,
    items: Vec<T>,
    position: impl Fn(&T) -> Point2<f64>,
    size: f64,
    min_sharpness: f64,
) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| is_sharp(image, position(item), size, min_sharpness))
        .collect();
    debug!(
        "removed {} blurry corners (window {:.2}, min sharpness {:.1})",
        before - kept.len(),
        size,
        min_sharpness
    );
    kept
}
