use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use lcheck_core::{LatticeBasis, LatticeCoords, LatticeCorner};

use crate::marker::MarkerOrientation;
use crate::orientation::LongBarAxis;

/// One output row: pixel position and lattice index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerRecord {
    pub x: f64,
    pub y: f64,
    pub i: i32,
    pub j: i32,
}

/// Oriented lattice of a detected L-marker checkerboard.
///
/// Every corner satisfies `position ≈ zero_point + i * basis.axis1 + j * basis.axis2`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystem {
    pub corners: Vec<LatticeCorner>,
    pub zero_point: Point2<f64>,
    pub basis: LatticeBasis,
    /// Marker mirror matched in the raw lattice bitmap.
    pub marker_orientation: MarkerOrientation,
    /// Raw axis that carried the long bar before the remap.
    pub long_bar: LongBarAxis,
}

impl CoordinateSystem {
    /// Indexed corners as flat records.
    pub fn records(&self) -> Vec<CornerRecord> {
        self.corners
            .iter()
            .filter_map(|c| {
                c.lattice.map(|idx| CornerRecord {
                    x: c.position.x,
                    y: c.position.y,
                    i: idx.i,
                    j: idx.j,
                })
            })
            .collect()
    }

    /// Corner with lattice index `coords`, if detected.
    pub fn corner_at(&self, coords: LatticeCoords) -> Option<&LatticeCorner> {
        self.corners.iter().find(|c| c.lattice == Some(coords))
    }

    /// Pixel position predicted by the basis for `coords`.
    pub fn predict(&self, coords: LatticeCoords) -> Point2<f64> {
        self.zero_point + self.basis.displacement(coords.i, coords.j)
    }

    /// Sign of `det[axis1 axis2]`: negative when the board is seen mirrored.
    pub fn handedness(&self) -> f64 {
        self.basis.determinant().signum()
    }
}
