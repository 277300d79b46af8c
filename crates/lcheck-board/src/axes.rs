//! Discovery of the two lattice basis vectors.
//!
//! A seed corner with a near-square neighbourhood gives the first axis; the
//! second starts as its perpendicular. Both are then refit by least squares
//! from the corners at provisional indices `(k, 0)` and `(0, k)`, `k = 1..=3`.
//! A zero point whose axes cannot be refit three times each is abandoned and
//! the next corner in detection order is tried with the current axis.

use kiddo::{KdTree, SquaredEuclidean};
use log::{debug, info};
use nalgebra::{DMatrix, DVector, Point2, Vector2};

use lcheck_core::LatticeBasis;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DetectError;

/// Refits per axis (the seed counts as one) needed to accept a zero point.
const REQUIRED_FITS: usize = 3;
/// Largest accepted sum of squared least-squares residuals, in pixels².
const MAX_FIT_RESIDUAL: f64 = 1.0;
const RANK_EPS: f64 = 1e-9;
const NEIGHBOURS: usize = 4;

/// Accepted zero point and basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisSearch {
    /// Index of the zero-point corner in the input slice.
    pub zero_index: usize,
    pub zero_point: Point2<f64>,
    pub basis: LatticeBasis,
    /// Zero points tried, the accepted one included.
    pub attempts: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    First,
    Second,
}

/// `(x, y) -> (-y, x)`.
#[inline]
pub(crate) fn perpendicular(axis: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-axis.y, axis.x)
}

/// Negate `axis` if one step from `origin` would reach or cross an image edge.
fn point_inward(origin: Point2<f64>, axis: Vector2<f64>, width: usize, height: usize) -> Vector2<f64> {
    let q = origin + axis;
    if q.x <= 0.0 || q.y <= 0.0 || q.x >= width as f64 || q.y >= height as f64 {
        -axis
    } else {
        axis
    }
}

/// Rounded lattice index of every point, `None` for a singular basis.
fn provisional_indices(
    points: &[Point2<f64>],
    zero: Point2<f64>,
    basis: &LatticeBasis,
) -> Option<Vec<(i32, i32)>> {
    points
        .iter()
        .map(|p| basis.nearest_step(p - zero))
        .collect()
}

/// Least-squares axis through the corners at `(j, 0)` (or `(0, j)`),
/// `j = 1..=k`. Missing corners contribute zero rows.
fn fit_axis(
    points: &[Point2<f64>],
    indices: &[(i32, i32)],
    zero: Point2<f64>,
    k: i32,
    direction: Direction,
) -> Option<Vector2<f64>> {
    let rows = 2 * k as usize;
    let mut a = DMatrix::<f64>::zeros(rows, 2);
    let mut b = DVector::<f64>::zeros(rows);
    for j in 1..=k {
        let target = match direction {
            Direction::First => (j, 0),
            Direction::Second => (0, j),
        };
        let Some(pos) = indices.iter().position(|&idx| idx == target) else {
            continue;
        };
        let r = 2 * (j as usize - 1);
        let d = points[pos] - zero;
        a[(r, 0)] = j as f64;
        a[(r + 1, 1)] = j as f64;
        b[r] = d.x;
        b[r + 1] = d.y;
    }

    let svd = a.clone().svd(true, true);
    if svd.rank(RANK_EPS) == 0 {
        return None;
    }
    let x = svd.solve(&b, RANK_EPS).ok()?;
    let residual = (&a * &x - &b).norm_squared();
    if residual > MAX_FIT_RESIDUAL {
        debug!("rejected {direction:?} axis fit at k={k}: residual {residual:.3}");
        return None;
    }
    Some(Vector2::new(x[0], x[1]))
}

/// Outcome of refining the basis around one zero point.
struct Trial {
    basis: LatticeBasis,
    fits: (usize, usize),
}

impl Trial {
    fn accepted(&self) -> bool {
        self.fits.0 >= REQUIRED_FITS
            && self.fits.1 >= REQUIRED_FITS
            && self.basis.determinant().abs() > f64::EPSILON
    }
}

fn refine_basis(points: &[Point2<f64>], zero: Point2<f64>, mut basis: LatticeBasis) -> Trial {
    let mut fits = (1usize, 0usize);
    let Some(indices) = provisional_indices(points, zero, &basis) else {
        return Trial { basis, fits };
    };
    if let Some(pos) = indices.iter().position(|&idx| idx == (0, 1)) {
        basis.axis2 = points[pos] - zero;
        fits.1 += 1;
    }

    for k in 2..=3 {
        let mut refit = false;
        if let Some(indices) = provisional_indices(points, zero, &basis) {
            if let Some(axis) = fit_axis(points, &indices, zero, k, Direction::First) {
                basis.axis1 = axis;
                fits.0 += 1;
                refit = true;
            }
        }
        if let Some(indices) = provisional_indices(points, zero, &basis) {
            if let Some(axis) = fit_axis(points, &indices, zero, k, Direction::Second) {
                basis.axis2 = axis;
                fits.1 += 1;
                refit = true;
            }
        }
        if !refit {
            break;
        }
    }
    Trial { basis, fits }
}

/// First corner, nearest the image center first, whose four nearest
/// neighbours have squared distances within `(d/f, d*f)` of the closest one
/// `d`, for the first factor `f` where any corner qualifies.
fn seed_axis(
    points: &[Point2<f64>],
    width: usize,
    height: usize,
    factors: &[f64],
) -> Option<(usize, Vector2<f64>)> {
    let coords: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    let tree: KdTree<f64, 2> = (&coords).into();

    let center = Point2::new(width as f64 / 2.0, height as f64 / 2.0);
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        (points[a] - center)
            .norm_squared()
            .total_cmp(&(points[b] - center).norm_squared())
    });

    let neighbourhoods: Vec<Vec<(usize, f64)>> = order
        .iter()
        .map(|&idx| {
            tree.nearest_n::<SquaredEuclidean>(&coords[idx], NEIGHBOURS + 1)
                .into_iter()
                .map(|nn| (nn.item as usize, nn.distance))
                .filter(|&(other, _)| other != idx)
                .take(NEIGHBOURS)
                .collect()
        })
        .collect();

    for &f in factors {
        for (&idx, nbrs) in order.iter().zip(&neighbourhoods) {
            if nbrs.len() < NEIGHBOURS || nbrs[0].1 <= 0.0 {
                continue;
            }
            let nearest = nbrs[0].1;
            let square = nbrs[1..]
                .iter()
                .all(|&(_, d)| d / nearest > 1.0 / f && d / nearest < f);
            if square {
                let axis = points[nbrs[0].0] - points[idx];
                debug!(
                    "seed corner {idx} at ({:.2}, {:.2}) accepted with factor {f}",
                    points[idx].x, points[idx].y
                );
                return Some((idx, point_inward(points[idx], axis, width, height)));
            }
        }
    }
    None
}

/// Find the zero point and lattice basis of a refined corner set.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(points, factors), fields(n = points.len()))
)]
pub fn discover_axes(
    points: &[Point2<f64>],
    width: usize,
    height: usize,
    factors: &[f64],
) -> Result<AxisSearch, DetectError> {
    let (seed, mut axis1) = seed_axis(points, width, height, factors).ok_or(DetectError::NoAxis)?;

    let mut tried = vec![false; points.len()];
    let mut zero_index = seed;
    let mut attempts = 0usize;
    loop {
        tried[zero_index] = true;
        attempts += 1;
        let zero = points[zero_index];
        let trial = refine_basis(points, zero, LatticeBasis::new(axis1, perpendicular(axis1)));
        if trial.accepted() {
            info!(
                "lattice axes ({:.2}, {:.2}) / ({:.2}, {:.2}) after {attempts} zero point(s)",
                trial.basis.axis1.x, trial.basis.axis1.y, trial.basis.axis2.x, trial.basis.axis2.y
            );
            return Ok(AxisSearch {
                zero_index,
                zero_point: zero,
                basis: trial.basis,
                attempts,
            });
        }
        debug!(
            "zero point {zero_index} rejected with {}/{} axis fits",
            trial.fits.0, trial.fits.1
        );

        let Some(next) = tried.iter().position(|&t| !t) else {
            return Err(DetectError::NoGoodAxis { tried: attempts });
        };
        zero_index = next;
        axis1 = point_inward(points[next], trial.basis.axis1, width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn lattice(origin: Point2<f64>, u: Vector2<f64>, v: Vector2<f64>, n: i32) -> Vec<Point2<f64>> {
        let mut pts = Vec::new();
        for j in -n..=n {
            for i in -n..=n {
                pts.push(origin + u * i as f64 + v * j as f64);
            }
        }
        pts
    }

    #[test]
    fn square_lattice_axes() {
        let pts = lattice(
            Point2::new(100.0, 100.0),
            Vector2::new(12.0, 0.0),
            Vector2::new(0.0, 12.0),
            4,
        );
        let found = discover_axes(&pts, 200, 200, &[1.1]).expect("axes");
        assert_eq!(found.attempts, 1);
        assert_eq!(found.zero_point, Point2::new(100.0, 100.0));
        let a1 = found.basis.axis1;
        let a2 = found.basis.axis2;
        assert_abs_diff_eq!(a1.norm(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a2.norm(), 12.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a1.dot(&a2), 0.0, epsilon = 1e-9);
        // axis2 keeps the perpendicular's handedness
        assert!(found.basis.determinant() > 0.0);
    }

    #[test]
    fn sheared_lattice_needs_a_wider_factor() {
        let u = Vector2::new(20.0, 0.0);
        let v = Vector2::new(3.0, 26.0);
        let pts = lattice(Point2::new(150.0, 150.0), u, v, 4);
        // 4-neighbour squared-distance ratio is 685 / 400 = 1.71
        assert_eq!(discover_axes(&pts, 300, 300, &[1.5]), Err(DetectError::NoAxis));

        let found = discover_axes(&pts, 300, 300, &[1.5, 1.8]).expect("axes");
        let (a1, a2) = (found.basis.axis1, found.basis.axis2);
        assert_abs_diff_eq!(a1.x.abs(), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a1.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a2.x.abs(), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a2.y.abs(), 26.0, epsilon = 1e-9);
        assert!(a2.x * a2.y > 0.0);
    }

    #[test]
    fn too_few_points_have_no_axis() {
        let pts = vec![
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 10.0),
            Point2::new(10.0, 20.0),
        ];
        assert_eq!(discover_axes(&pts, 50, 50, &[2.0]), Err(DetectError::NoAxis));
    }

    #[test]
    fn irregular_star_exhausts_zero_points() {
        let c = Point2::new(50.0, 50.0);
        let ray = |deg: f64, r: f64| {
            let (s, co) = deg.to_radians().sin_cos();
            c + Vector2::new(co, s) * r
        };
        let pts = vec![c, ray(0.0, 10.0), ray(50.0, 10.1), ray(180.0, 10.2), ray(230.0, 10.3)];
        assert_eq!(
            discover_axes(&pts, 100, 100, &[1.1]),
            Err(DetectError::NoGoodAxis { tried: 5 })
        );
    }

    #[test]
    fn fit_rejects_large_residual() {
        let zero = Point2::new(0.0, 0.0);
        let pts = vec![zero, Point2::new(10.0, 0.0), Point2::new(23.0, 0.0)];
        let idx = vec![(0, 0), (1, 0), (2, 0)];
        // residual = 3² / 5
        assert!(fit_axis(&pts, &idx, zero, 2, Direction::First).is_none());
        let pts = vec![zero, Point2::new(10.0, 0.0), Point2::new(21.0, 0.0)];
        let axis = fit_axis(&pts, &idx, zero, 2, Direction::First).expect("fit");
        assert_abs_diff_eq!(axis.x, 10.4, epsilon = 1e-9);
        assert!(fit_axis(&pts, &idx, zero, 2, Direction::Second).is_none());
    }

    #[test]
    fn axis_points_away_from_the_edge() {
        let p = Point2::new(5.0, 40.0);
        assert_eq!(
            point_inward(p, Vector2::new(-6.0, 0.0), 80, 80),
            Vector2::new(6.0, 0.0)
        );
        assert_eq!(
            point_inward(p, Vector2::new(0.0, 6.0), 80, 80),
            Vector2::new(0.0, 6.0)
        );
    }
}
