use serde::{Deserialize, Serialize};

use crate::lattice::{LatticeBasis, LatticeCoords};

/// Integer linear map on lattice indices: `(i', j') = (a*i + b*j, c*i + d*j)`.
///
/// Re-orienting a lattice applies one of these to every corner index and the
/// matching inverse to the basis, so pixel positions stay consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeTransform {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
}

impl LatticeTransform {
    pub const IDENTITY: LatticeTransform = LatticeTransform::new(1, 0, 0, 1);

    pub const fn new(a: i32, b: i32, c: i32, d: i32) -> Self {
        Self { a, b, c, d }
    }

    pub fn determinant(&self) -> i32 {
        self.a * self.d - self.b * self.c
    }

    #[inline]
    pub fn apply(&self, coords: LatticeCoords) -> LatticeCoords {
        LatticeCoords {
            i: self.a * coords.i + self.b * coords.j,
            j: self.c * coords.i + self.d * coords.j,
        }
    }

    /// Inverse transform; only unimodular maps (det = ±1) are invertible here.
    pub fn inverse(&self) -> Option<LatticeTransform> {
        let det = self.determinant();
        if det != 1 && det != -1 {
            return None;
        }
        Some(LatticeTransform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
        })
    }

    /// Basis matching indices produced by `apply`.
    ///
    /// With `p = z + A * idx` and `idx' = T * idx`, the new axes are the
    /// columns of `A * T^-1`.
    pub fn apply_to_basis(&self, basis: &LatticeBasis) -> Option<LatticeBasis> {
        let inv = self.inverse()?;
        let axis1 = basis.axis1 * inv.a as f64 + basis.axis2 * inv.c as f64;
        let axis2 = basis.axis1 * inv.b as f64 + basis.axis2 * inv.d as f64;
        Some(LatticeBasis::new(axis1, axis2))
    }
}
