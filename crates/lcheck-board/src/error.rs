use lcheck_corners::CornerError;

/// Terminal failure of a detection. No partial result accompanies it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("no correlation peak reached the hit bound")]
    NoCandidates,

    #[error("image {width}x{height} is smaller than the required {required}x{required}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        required: usize,
    },

    #[error("no sub-pixel refinement window fits the {corners} sharp candidates")]
    NoRefinementWindow { corners: usize },

    #[error("only {found} corners survived filtering, {required} required")]
    TooFewCorners { found: usize, required: usize },

    #[error("no near-square neighbourhood found for any distance factor")]
    NoAxis,

    #[error("lattice axes could not be refined from any of {tried} zero points")]
    NoGoodAxis { tried: usize },

    #[error("lattice bitmap {width}x{height} is smaller than the marker template")]
    BitmapTooSmall { width: usize, height: usize },

    #[error("marker footprint not found in any orientation")]
    NoMarker,

    #[error("internal error: {0}")]
    Internal(&'static str),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl DetectError {
    /// Stable numeric code for batch callers and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            DetectError::NoCandidates
            | DetectError::ImageTooSmall { .. }
            | DetectError::NoRefinementWindow { .. }
            | DetectError::TooFewCorners { .. } => 1,
            DetectError::NoAxis => 2,
            DetectError::NoGoodAxis { .. } => 3,
            DetectError::Internal(_) => 4,
            DetectError::NoMarker => 5,
            DetectError::BitmapTooSmall { .. } => 6,
            DetectError::InvalidParams(_) => 7,
        }
    }
}

impl From<CornerError> for DetectError {
    fn from(err: CornerError) -> Self {
        match err {
            CornerError::NoCandidates => DetectError::NoCandidates,
            CornerError::ImageTooSmall {
                width,
                height,
                required,
            } => DetectError::ImageTooSmall {
                width,
                height,
                required,
            },
            other => DetectError::InvalidParams(other.to_string()),
        }
    }
}
