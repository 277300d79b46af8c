use serde::{Deserialize, Serialize};

use crate::error::CornerError;

/// Settings for saddle-template candidate extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerDetectParams {
    /// Odd template side lengths in pixels. The first entry also sets the
    /// sharpness window of the early filter passes.
    pub cross_sizes: Vec<usize>,
    /// Image rotations (degrees) at which every template is correlated.
    pub angles_deg: Vec<f64>,
    /// Minimum combined response, in `[0, 1]`, for a peak to become a candidate.
    pub hit_bound: f32,
    /// Compute correlation maps on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for CornerDetectParams {
    fn default() -> Self {
        Self {
            cross_sizes: vec![5, 11, 23],
            angles_deg: vec![0.0, 45.0, 90.0, 135.0],
            hit_bound: 0.93,
            parallel: false,
        }
    }
}

impl CornerDetectParams {
    pub fn validate(&self) -> Result<(), CornerError> {
        if self.cross_sizes.is_empty() {
            return Err(CornerError::NoCrossSizes);
        }
        if let Some(&bad) = self
            .cross_sizes
            .iter()
            .find(|&&s| s < 3 || s % 2 == 0)
        {
            return Err(CornerError::InvalidCrossSize(bad));
        }
        if self.angles_deg.is_empty() {
            return Err(CornerError::NoAngles);
        }
        if !(0.0..=1.0).contains(&self.hit_bound) {
            return Err(CornerError::InvalidHitBound(self.hit_bound));
        }
        Ok(())
    }

    /// Largest configured cross size (0 if none are configured).
    pub fn max_cross_size(&self) -> usize {
        self.cross_sizes.iter().copied().max().unwrap_or(0)
    }

    /// Cross size used by the first two sharpness passes.
    pub fn primary_cross_size(&self) -> usize {
        self.cross_sizes.first().copied().unwrap_or(0)
    }
}

/// Termination criteria of the iterative sub-pixel refinement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubpixParams {
    pub max_iterations: usize,
    /// Stop once a step moves the corner by at most this many pixels.
    pub epsilon: f64,
    /// Refine chunks of corners on the rayon pool (needs the `rayon` feature).
    pub parallel: bool,
}

impl Default for SubpixParams {
    fn default() -> Self {
        Self {
            max_iterations: 42,
            epsilon: 0.001,
            parallel: false,
        }
    }
}
