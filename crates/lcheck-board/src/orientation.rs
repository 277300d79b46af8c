//! Long-bar analysis and the final index remap.
//!
//! The marker's two dark bands differ in length. Rotating a window around
//! the zero point so that `axis2` points along `+x` leaves `axis1` vertical;
//! the bright line inside the longer band then dominates either the column
//! or the row projection.

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use lcheck_core::{FloatImage, GrayImageView, LatticeBasis, LatticeCorner, LatticeTransform};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DetectError;
use crate::marker::MarkerOrientation;

/// Half-side of the clipped window, in multiples of `|axis1|`.
const CLIP_HALF_STEPS: f64 = 4.5;
/// Half-side of the analysed window after rotation, in multiples of `|axis1|`.
const ANALYSIS_HALF_STEPS: f64 = 3.0;

/// Basis vector parallel to the marker's long bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LongBarAxis {
    Axis1,
    Axis2,
}

/// Inclusive pixel bounds `(x0, x1, y0, y1)` of the window clipped around
/// the zero point. Only the ends are rounded, not the half-length.
fn clip_bounds(zero_point: Point2<f64>, step: f64) -> (i64, i64, i64, i64) {
    let half = CLIP_HALF_STEPS * step;
    (
        (zero_point.x - half).round() as i64,
        (zero_point.x + half).round() as i64,
        (zero_point.y - half).round() as i64,
        (zero_point.y + half).round() as i64,
    )
}

/// Which axis carries the long bar, judged from image intensities.
pub fn long_bar_axis(
    image: &GrayImageView<'_>,
    zero_point: Point2<f64>,
    basis: &LatticeBasis,
) -> LongBarAxis {
    let step = basis.axis1.norm();
    let (x0, x1, y0, y1) = clip_bounds(zero_point, step);
    let (w, h) = ((x1 - x0 + 1).max(1) as usize, (y1 - y0 + 1).max(1) as usize);

    let mut clip = FloatImage::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            clip.set(x, y, image.get_or_zero(x0 + x as i64, y0 + y as i64) as f32);
        }
    }

    let side = (w as f64).hypot(h as f64).floor() as usize;
    let angle = basis.axis2.y.atan2(basis.axis2.x).to_degrees();
    let canvas = clip
        .embed(side, side, ((side - w) / 2) as i64, ((side - h) / 2) as i64)
        .rotated(angle);

    let mid = side as f64 / 2.0;
    let c0 = (mid - ANALYSIS_HALF_STEPS * step).round() as i64;
    let c1 = (mid + ANALYSIS_HALF_STEPS * step).round() as i64;
    let n = (c1 - c0 + 1).max(1) as usize;
    let window = canvas.crop(c0, c0, n, n);

    let peak = |sums: Vec<f64>| sums.into_iter().fold(f64::NEG_INFINITY, f64::max);
    let column_peak = peak(window.column_sums());
    let row_peak = peak(window.row_sums());
    debug!("long-bar projections: columns {column_peak:.0}, rows {row_peak:.0}");
    if column_peak > row_peak {
        LongBarAxis::Axis1
    } else {
        LongBarAxis::Axis2
    }
}

/// Index transform giving the oriented frame: `i` runs along the short bar,
/// `j` along the long bar, and the marker occupies the cells of
/// [`crate::MARKER_CELLS`].
pub fn remap_for(orientation: MarkerOrientation, long_bar: LongBarAxis) -> LatticeTransform {
    use LongBarAxis::*;
    use MarkerOrientation::*;
    match (long_bar, orientation) {
        (Axis1, Identity) => LatticeTransform::new(0, -1, 1, 0),
        (Axis1, FlipLr) => LatticeTransform::new(0, -1, -1, 0),
        (Axis1, FlipUd) => LatticeTransform::new(0, 1, 1, 0),
        (Axis1, FlipBoth) => LatticeTransform::new(0, 1, -1, 0),
        (Axis2, Identity) => LatticeTransform::new(1, 0, 0, -1),
        (Axis2, FlipLr) => LatticeTransform::new(-1, 0, 0, -1),
        (Axis2, FlipUd) => LatticeTransform::IDENTITY,
        (Axis2, FlipBoth) => LatticeTransform::new(-1, 0, 0, 1),
    }
}

/// Result of orienting the lattice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub long_bar: LongBarAxis,
    pub transform: LatticeTransform,
    pub basis: LatticeBasis,
}

/// Determine the long-bar axis and remap every index and the basis.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(image, corners, basis), fields(n = corners.len()))
)]
pub fn resolve_orientation(
    image: &GrayImageView<'_>,
    corners: &mut [LatticeCorner],
    zero_point: Point2<f64>,
    basis: &LatticeBasis,
    marker: MarkerOrientation,
) -> Result<Orientation, DetectError> {
    let long_bar = long_bar_axis(image, zero_point, basis);
    let transform = remap_for(marker, long_bar);
    let new_basis = transform
        .apply_to_basis(basis)
        .ok_or(DetectError::Internal("orientation remap is not invertible"))?;
    for c in corners.iter_mut() {
        if let Some(idx) = c.lattice.as_mut() {
            *idx = transform.apply(*idx);
        }
    }
    debug!("long bar along {long_bar:?}, marker {marker:?}, remap {transform:?}");
    Ok(Orientation {
        long_bar,
        transform,
        basis: new_basis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcheck_core::{GrayImage, LatticeCoords};
    use nalgebra::Vector2;

    /// Dark image with a bright vertical bar through `(50, 50)`.
    fn vertical_bar() -> GrayImage {
        let mut img = GrayImage::filled(100, 100, 0);
        for y in 20..80 {
            for x in 49..52 {
                img.set(x, y, 255);
            }
        }
        img
    }

    #[test]
    fn bar_along_axis1() {
        let img = vertical_bar();
        let basis = LatticeBasis::new(Vector2::new(0.0, 10.0), Vector2::new(-10.0, 0.0));
        assert_eq!(
            long_bar_axis(&img.view(), Point2::new(50.0, 50.0), &basis),
            LongBarAxis::Axis1
        );
    }

    #[test]
    fn bar_along_axis2() {
        let img = vertical_bar();
        let basis = LatticeBasis::new(Vector2::new(10.0, 0.0), Vector2::new(0.0, 10.0));
        assert_eq!(
            long_bar_axis(&img.view(), Point2::new(50.0, 50.0), &basis),
            LongBarAxis::Axis2
        );
    }

    #[test]
    fn clip_window_keeps_fractional_half_length() {
        // 4.5 * 15.1 = 67.95, so the ends land on -8 and 127
        assert_eq!(clip_bounds(Point2::new(59.5, 59.5), 15.1), (-8, 127, -8, 127));
        assert_eq!(clip_bounds(Point2::new(50.0, 40.0), 10.0), (5, 95, -5, 85));
    }

    #[test]
    fn every_remap_is_unimodular_and_distinct() {
        let mut seen = Vec::new();
        for bar in [LongBarAxis::Axis1, LongBarAxis::Axis2] {
            for o in MarkerOrientation::ALL {
                let t = remap_for(o, bar);
                assert_eq!(t.determinant().abs(), 1);
                assert!(!seen.contains(&t));
                seen.push(t);
            }
        }
    }

    #[test]
    fn remap_keeps_pixels_consistent() {
        let img = vertical_bar();
        let basis = LatticeBasis::new(Vector2::new(0.0, 10.0), Vector2::new(-10.0, 0.0));
        let z = Point2::new(50.0, 50.0);
        let mut corners: Vec<LatticeCorner> = [(1, 0), (0, 1), (2, -1)]
            .iter()
            .map(|&(i, j)| LatticeCorner {
                position: z + basis.displacement(i, j),
                lattice: Some(LatticeCoords::new(i, j)),
            })
            .collect();
        let out = resolve_orientation(&img.view(), &mut corners, z, &basis, MarkerOrientation::Identity)
            .expect("oriented");
        assert_eq!(out.long_bar, LongBarAxis::Axis1);
        assert_eq!(corners[0].lattice, Some(LatticeCoords::new(0, 1)));
        for c in &corners {
            let idx = c.lattice.expect("indexed");
            let p = z + out.basis.displacement(idx.i, idx.j);
            assert!((p - c.position).norm() < 1e-9);
        }
    }
}
