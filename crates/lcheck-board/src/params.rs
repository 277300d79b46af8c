use serde::{Deserialize, Serialize};

use lcheck_corners::{CornerDetectParams, SubpixParams};

use crate::error::DetectError;

/// Minimum sharpness of each filtering stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharpnessThresholds {
    /// Applied to raw candidates, window = first cross size.
    pub candidates: f64,
    /// Applied after sub-pixel refinement, window = first cross size.
    pub refined: f64,
    /// Applied to the finished lattice, window = `0.4 * (|axis1| + |axis2|)`.
    pub lattice: f64,
}

impl Default for SharpnessThresholds {
    fn default() -> Self {
        Self {
            candidates: 100.0,
            refined: 500.0,
            lattice: 1000.0,
        }
    }
}

/// Parameters of the full L-marker checkerboard pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LCheckParams {
    pub corners: CornerDetectParams,
    pub subpix: SubpixParams,
    pub sharpness: SharpnessThresholds,
    /// Near-square tolerances for the seed axis search, tried in order.
    pub max_distance_factors: Vec<f64>,
    /// Fewer refined corners than this abort the detection.
    pub min_corners: usize,
}

impl Default for LCheckParams {
    fn default() -> Self {
        Self {
            corners: CornerDetectParams::default(),
            subpix: SubpixParams::default(),
            sharpness: SharpnessThresholds::default(),
            max_distance_factors: (11..=20).map(|k| k as f64 / 10.0).collect(),
            min_corners: 24,
        }
    }
}

impl LCheckParams {
    /// Toggle the parallel correlation and refinement stages together.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.corners.parallel = parallel;
        self.subpix.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), DetectError> {
        self.corners.validate()?;
        if self.max_distance_factors.is_empty() {
            return Err(DetectError::InvalidParams(
                "at least one max distance factor is required".to_string(),
            ));
        }
        if let Some(f) = self.max_distance_factors.iter().find(|&&f| f <= 1.0 || f.is_nan()) {
            return Err(DetectError::InvalidParams(format!(
                "max distance factor {f} must be greater than 1"
            )));
        }
        if self.subpix.max_iterations == 0 || self.subpix.epsilon < 0.0 || self.subpix.epsilon.is_nan() {
            return Err(DetectError::InvalidParams(
                "sub-pixel refinement needs at least one iteration and a non-negative epsilon"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
