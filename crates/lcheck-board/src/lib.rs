//! Lattice localization of L-marker checkerboards.
//!
//! Given the sub-pixel corners from `lcheck-corners`, this crate:
//! 1. finds a zero point and two lattice axes ([`discover_axes`]),
//! 2. propagates integer indices to every corner ([`assign_indices`]),
//! 3. finds the L marker in the index bitmap and re-origins the lattice on
//!    its anchor ([`locate_marker`]),
//! 4. tells the long marker bar from the short one and remaps indices to a
//!    fixed orientation ([`resolve_orientation`]).
//!
//! [`LCheckDetector`] runs the whole pipeline on a grayscale image.
//!
//! ```
//! use lcheck_board::{render_board, BoardRenderSpec, LCheckDetector, LCheckParams};
//!
//! let spec = BoardRenderSpec::default();
//! let image = render_board(&spec);
//! let detector = LCheckDetector::new(LCheckParams::default());
//! match detector.detect(&image.view()) {
//!     Ok(cs) => println!("{} corners, zero point {:?}", cs.corners.len(), cs.zero_point),
//!     Err(e) => println!("failed with code {}: {e}", e.code()),
//! }
//! ```

mod axes;
mod detector;
mod error;
mod indexer;
mod marker;
mod orientation;
mod params;
mod result;
mod synth;

pub use axes::{discover_axes, AxisSearch};
pub use detector::LCheckDetector;
pub use error::DetectError;
pub use indexer::assign_indices;
pub use marker::{
    locate_marker, LatticeBitmap, MarkerMatch, MarkerOrientation, MARKER_CELLS, MARKER_SIZE,
    MARKER_TEMPLATE,
};
pub use orientation::{long_bar_axis, remap_for, resolve_orientation, LongBarAxis, Orientation};
pub use params::{LCheckParams, SharpnessThresholds};
pub use result::{CoordinateSystem, CornerRecord};
pub use synth::{render_board, BoardRenderSpec, Mirror, PixelSampling};
