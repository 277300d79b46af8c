use nalgebra::{Matrix2, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Integer lattice index of a checkerboard inner corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LatticeCoords {
    pub i: i32,
    pub j: i32,
}

impl LatticeCoords {
    pub const ORIGIN: LatticeCoords = LatticeCoords { i: 0, j: 0 };

    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    #[inline]
    pub fn offset(self, di: i32, dj: i32) -> Self {
        Self {
            i: self.i + di,
            j: self.j + dj,
        }
    }
}

/// A detected corner: pixel position plus its lattice index once assigned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeCorner {
    pub position: Point2<f64>,
    pub lattice: Option<LatticeCoords>,
}

impl LatticeCorner {
    pub fn unindexed(position: Point2<f64>) -> Self {
        Self {
            position,
            lattice: None,
        }
    }
}

/// Two pixel-space vectors spanning one lattice step each.
///
/// A pixel position maps to lattice space through
/// `position = zero_point + i * axis1 + j * axis2`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeBasis {
    pub axis1: Vector2<f64>,
    pub axis2: Vector2<f64>,
}

impl LatticeBasis {
    pub fn new(axis1: Vector2<f64>, axis2: Vector2<f64>) -> Self {
        Self { axis1, axis2 }
    }

    /// Column matrix `[axis1 axis2]`.
    pub fn matrix(&self) -> Matrix2<f64> {
        Matrix2::from_columns(&[self.axis1, self.axis2])
    }

    pub fn determinant(&self) -> f64 {
        self.axis1.x * self.axis2.y - self.axis1.y * self.axis2.x
    }

    /// Continuous lattice offset for a pixel displacement, `None` if singular.
    pub fn solve(&self, delta: Vector2<f64>) -> Option<Vector2<f64>> {
        let inv = self.matrix().try_inverse()?;
        Some(inv * delta)
    }

    /// Lattice step nearest to `delta`, rounding halves away from zero.
    pub fn nearest_step(&self, delta: Vector2<f64>) -> Option<(i32, i32)> {
        let v = self.solve(delta)?;
        Some((v.x.round() as i32, v.y.round() as i32))
    }

    /// Pixel displacement of an integer lattice step.
    pub fn displacement(&self, di: i32, dj: i32) -> Vector2<f64> {
        self.axis1 * di as f64 + self.axis2 * dj as f64
    }
}
