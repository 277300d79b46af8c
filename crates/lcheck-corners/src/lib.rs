//! Saddle-corner candidates for L-marker checkerboards.
//!
//! The stages here turn a grayscale image into a list of sub-pixel inner
//! corner positions without any notion of a lattice:
//!
//! - [`TemplateBank`] renders and caches hourglass "saddle cross" templates.
//! - [`CorrelationMapBuilder`] correlates the image with a template at a
//!   given rotation.
//! - [`extract_candidates`] combines all maps and picks peaks greedily.
//! - [`filter_blurry`] drops corners whose Laplacian variance is too low.
//! - [`refine_corners`] moves corners to sub-pixel saddle positions.
//!
//! ```no_run
//! use lcheck_core::GrayImage;
//! use lcheck_corners::{extract_candidates, CornerDetectParams, TemplateBank};
//!
//! # fn main() -> Result<(), lcheck_corners::CornerError> {
//! let img = GrayImage::filled(320, 240, 0);
//! let bank = TemplateBank::new();
//! let candidates = extract_candidates(&img.view(), &CornerDetectParams::default(), &bank)?;
//! println!("{} candidates", candidates.len());
//! # Ok(())
//! # }
//! ```

mod candidates;
mod correlation;
mod error;
mod params;
mod sharpness;
mod subpix;
mod template;

pub use candidates::{combined_response, extract_candidates, pick_peaks, CornerCandidate};
pub use correlation::{correlate, CorrelationMapBuilder};
pub use error::CornerError;
pub use params::{CornerDetectParams, SubpixParams};
pub use sharpness::{filter_blurry, is_sharp, laplacian_variance, sharpness_at};
pub use subpix::{refine_corner, refine_corners, window_half_size};
pub use template::{CrossTemplate, TemplateBank, DIAGONAL_VALUE, WEDGE_VALUE};
