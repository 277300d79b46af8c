//! Detection and lattice localization of L-marker checkerboards.
//!
//! This crate provides:
//! - re-exports of the pipeline crates (`core`, `corners`, `board`)
//! - JSON configuration and report types ([`io`])
//! - (feature `image`) helpers that run the detector on `image::GrayImage`
//!   values or raw 8-bit buffers ([`detect`])
//! - (feature `cli`) the `lcheck` binary with `detect` and `render` commands.
//!
//! ## Quickstart
//!
//! ```no_run
//! use lcheck::detect;
//! use lcheck::LCheckParams;
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = ImageReader::open("board.png")?.decode()?.to_luma8();
//! let cs = detect::detect_image(&img, LCheckParams::default())?;
//! for r in cs.records() {
//!     println!("{:.3} {:.3} {} {}", r.x, r.y, r.i, r.j);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `lcheck::core`: images, float planes, lattice coordinates and bases.
//! - `lcheck::corners`: saddle templates, correlation, sharpness, sub-pixel refinement.
//! - `lcheck::board`: axis discovery, indexing, marker search, orientation.
//! - `lcheck::io`: `DetectConfig` / `DetectReport` JSON files.
//! - `lcheck::detect` (feature `image`): end-to-end helpers from `image::GrayImage`.

pub use lcheck_board as board;
pub use lcheck_core as core;
pub use lcheck_corners as corners;

pub use lcheck_board::{
    render_board, BoardRenderSpec, CoordinateSystem, CornerRecord, DetectError, LCheckDetector,
    LCheckParams, MarkerOrientation,
};
pub use lcheck_core::{GrayImage, GrayImageView, LatticeBasis, LatticeCoords};

#[cfg(feature = "image")]
pub mod detect;
pub mod io;
