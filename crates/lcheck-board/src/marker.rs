//! L-marker search in the lattice occupancy bitmap.
//!
//! The marker removes twelve inner corners from the board. In the bitmap of
//! detected indices (rows = `j`, columns = `i`) it shows up as the
//! [`MARKER_TEMPLATE`] footprint in one of four mirror orientations.

use log::debug;
use serde::{Deserialize, Serialize};

use lcheck_core::{LatticeCoords, LatticeCorner};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::DetectError;

pub const MARKER_SIZE: usize = 6;

/// Corner occupancy around the marker, `1` = corner present.
pub const MARKER_TEMPLATE: [[u8; MARKER_SIZE]; MARKER_SIZE] = [
    [1, 1, 1, 1, 1, 1],
    [1, 0, 0, 1, 1, 1],
    [1, 0, 0, 1, 1, 1],
    [1, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1],
];

/// Lattice cells the marker occupies in the final, oriented frame.
pub const MARKER_CELLS: [LatticeCoords; 12] = [
    LatticeCoords::new(-2, -2),
    LatticeCoords::new(-1, -2),
    LatticeCoords::new(0, -2),
    LatticeCoords::new(1, -2),
    LatticeCoords::new(-2, -1),
    LatticeCoords::new(-1, -1),
    LatticeCoords::new(0, -1),
    LatticeCoords::new(1, -1),
    LatticeCoords::new(-2, 0),
    LatticeCoords::new(-1, 0),
    LatticeCoords::new(-2, 1),
    LatticeCoords::new(-1, 1),
];

/// Mirror of [`MARKER_TEMPLATE`] found in the bitmap, in search order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerOrientation {
    /// Template as stored.
    Identity,
    /// Columns reversed.
    FlipLr,
    /// Rows reversed.
    FlipUd,
    /// Rows and columns reversed.
    FlipBoth,
}

impl MarkerOrientation {
    pub const ALL: [MarkerOrientation; 4] = [
        MarkerOrientation::Identity,
        MarkerOrientation::FlipLr,
        MarkerOrientation::FlipUd,
        MarkerOrientation::FlipBoth,
    ];

    /// Template cell at `(row, col)` seen through this orientation.
    #[inline]
    pub fn cell(self, row: usize, col: usize) -> u8 {
        let last = MARKER_SIZE - 1;
        let (r, c) = match self {
            MarkerOrientation::Identity => (row, col),
            MarkerOrientation::FlipLr => (row, last - col),
            MarkerOrientation::FlipUd => (last - row, col),
            MarkerOrientation::FlipBoth => (last - row, last - col),
        };
        MARKER_TEMPLATE[r][c]
    }

    /// `(row, col)` of the anchor corner inside the matched window.
    pub fn anchor_offset(self) -> (usize, usize) {
        match self {
            MarkerOrientation::Identity => (2, 3),
            MarkerOrientation::FlipLr => (2, 2),
            MarkerOrientation::FlipUd => (3, 3),
            MarkerOrientation::FlipBoth => (3, 2),
        }
    }
}

/// Occupancy of lattice indices over their bounding box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatticeBitmap {
    /// Index of the top-left cell.
    pub origin: LatticeCoords,
    pub width: usize,
    pub height: usize,
    cells: Vec<u8>,
}

impl LatticeBitmap {
    /// Bitmap of every indexed corner; `None` when nothing is indexed.
    pub fn from_corners(corners: &[LatticeCorner]) -> Option<Self> {
        let indices: Vec<LatticeCoords> = corners.iter().filter_map(|c| c.lattice).collect();
        let min_i = indices.iter().map(|c| c.i).min()?;
        let max_i = indices.iter().map(|c| c.i).max()?;
        let min_j = indices.iter().map(|c| c.j).min()?;
        let max_j = indices.iter().map(|c| c.j).max()?;
        let width = (max_i - min_i + 1) as usize;
        let height = (max_j - min_j + 1) as usize;
        let mut cells = vec![0u8; width * height];
        for c in &indices {
            cells[(c.j - min_j) as usize * width + (c.i - min_i) as usize] = 1;
        }
        Some(Self {
            origin: LatticeCoords::new(min_i, min_j),
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    fn matches_at(&self, top: usize, left: usize, orientation: MarkerOrientation) -> bool {
        (0..MARKER_SIZE).all(|r| {
            (0..MARKER_SIZE).all(|c| self.get(top + r, left + c) == orientation.cell(r, c))
        })
    }

    /// First window, in row-major order, equal to the oriented template.
    pub fn find(&self, orientation: MarkerOrientation) -> Option<(usize, usize)> {
        if self.width < MARKER_SIZE || self.height < MARKER_SIZE {
            return None;
        }
        (0..=self.height - MARKER_SIZE)
            .flat_map(|top| (0..=self.width - MARKER_SIZE).map(move |left| (top, left)))
            .find(|&(top, left)| self.matches_at(top, left, orientation))
    }
}

/// Matched marker and the corner it anchors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerMatch {
    pub orientation: MarkerOrientation,
    /// Pre-shift lattice index of the anchor corner.
    pub anchor: LatticeCoords,
}

/// Find the marker and shift all indices so its anchor becomes `(0, 0)`.
///
/// Returns the match and the position in `corners` of the anchor corner.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(corners), fields(n = corners.len()))
)]
pub fn locate_marker(corners: &mut [LatticeCorner]) -> Result<(MarkerMatch, usize), DetectError> {
    let bitmap =
        LatticeBitmap::from_corners(corners).ok_or(DetectError::Internal("no indexed corners"))?;
    if bitmap.width < MARKER_SIZE || bitmap.height < MARKER_SIZE {
        return Err(DetectError::BitmapTooSmall {
            width: bitmap.width,
            height: bitmap.height,
        });
    }

    let (orientation, top, left) = MarkerOrientation::ALL
        .iter()
        .find_map(|&o| bitmap.find(o).map(|(top, left)| (o, top, left)))
        .ok_or(DetectError::NoMarker)?;
    let (row_off, col_off) = orientation.anchor_offset();
    let anchor = LatticeCoords::new(
        bitmap.origin.i + (left + col_off) as i32,
        bitmap.origin.j + (top + row_off) as i32,
    );
    let anchor_pos = corners
        .iter()
        .position(|c| c.lattice == Some(anchor))
        .ok_or(DetectError::Internal("marker anchor has no corner"))?;

    for c in corners.iter_mut() {
        if let Some(idx) = c.lattice.as_mut() {
            *idx = idx.offset(-anchor.i, -anchor.j);
        }
    }
    debug!(
        "marker {orientation:?} in {}x{} bitmap, anchor ({}, {})",
        bitmap.width, bitmap.height, anchor.i, anchor.j
    );
    Ok((MarkerMatch { orientation, anchor }, anchor_pos))
}
