//! Core types shared by the L-marker checkerboard pipeline.
//!
//! This crate holds the plain data the detector stages pass around:
//! grayscale buffers, float planes for correlation responses, lattice
//! coordinates and bases, and the integer transforms used to re-orient a
//! lattice. It does not know anything about templates or markers.

mod image;
mod lattice;
mod logger;
mod plane;
mod transform;

pub use image::{sample_bilinear, GrayImage, GrayImageView};
pub use lattice::{LatticeBasis, LatticeCoords, LatticeCorner};
pub use plane::FloatImage;
pub use transform::LatticeTransform;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
