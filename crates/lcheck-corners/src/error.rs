/// Failures of the corner-extraction stages.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CornerError {
    #[error("cross size {0} must be odd and at least 3")]
    InvalidCrossSize(usize),

    #[error("at least one cross size is required")]
    NoCrossSizes,

    #[error("at least one rotation angle is required")]
    NoAngles,

    #[error("hit bound {0} must lie in [0, 1]")]
    InvalidHitBound(f32),

    #[error("image {width}x{height} is smaller than the required {required}x{required}")]
    ImageTooSmall {
        width: usize,
        height: usize,
        required: usize,
    },

    #[error("no correlation peak reached the hit bound")]
    NoCandidates,
}
