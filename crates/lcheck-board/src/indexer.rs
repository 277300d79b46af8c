//! Greedy propagation of integer lattice indices.
//!
//! Starting from the zero point, the unindexed corner closest to any indexed
//! corner is indexed next, relative to that neighbour. This is a Prim-style
//! spanning tree over pixel distances, so errors along long chains are not
//! corrected afterwards.

use log::debug;
use nalgebra::Point2;

use lcheck_core::{LatticeBasis, LatticeCoords, LatticeCorner};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DetectError;

/// Index every point, the one at `zero_index` becoming `(0, 0)`.
///
/// Ties in distance go to the lowest unassigned index. A singular basis is
/// reported as [`DetectError::NoGoodAxis`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(points, basis), fields(n = points.len()))
)]
pub fn assign_indices(
    points: &[Point2<f64>],
    zero_index: usize,
    basis: &LatticeBasis,
) -> Result<Vec<LatticeCorner>, DetectError> {
    let n = points.len();
    if zero_index >= n {
        return Err(DetectError::Internal("zero point outside the corner set"));
    }
    let mut corners: Vec<LatticeCorner> = points.iter().copied().map(LatticeCorner::unindexed).collect();
    corners[zero_index].lattice = Some(LatticeCoords::ORIGIN);

    // Closest assigned corner and its squared distance, per unassigned corner.
    let mut best: Vec<(f64, usize)> = points
        .iter()
        .map(|p| ((p - points[zero_index]).norm_squared(), zero_index))
        .collect();
    let mut assigned = vec![false; n];
    assigned[zero_index] = true;

    for _ in 1..n {
        let mut pick: Option<usize> = None;
        for k in (0..n).filter(|&k| !assigned[k]) {
            if pick.is_none_or(|p| best[k].0 < best[p].0) {
                pick = Some(k);
            }
        }
        let Some(k) = pick else { break };
        let source = best[k].1;
        let (di, dj) = basis
            .nearest_step(points[k] - points[source])
            .ok_or(DetectError::NoGoodAxis { tried: 1 })?;
        let base = corners[source]
            .lattice
            .ok_or(DetectError::Internal("propagation source has no index"))?;
        corners[k].lattice = Some(base.offset(di, dj));
        assigned[k] = true;

        for (m, entry) in best.iter_mut().enumerate() {
            if assigned[m] {
                continue;
            }
            let d = (points[m] - points[k]).norm_squared();
            if d < entry.0 {
                *entry = (d, k);
            }
        }
    }

    debug!("indexed {n} corners from zero point {zero_index}");
    Ok(corners)
}
