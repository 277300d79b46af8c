use crate::board::{CoordinateSystem, DetectError, LCheckDetector, LCheckParams};
use crate::core;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the buffer-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum BufferError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidGrayDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Detect(#[from] DetectError),
}

impl BufferError {
    /// Numeric status: the detector's code, or 7 for a malformed buffer.
    pub fn code(&self) -> i32 {
        match self {
            BufferError::Detect(e) => e.code(),
            _ => 7,
        }
    }
}

/// Borrow an `image::GrayImage` as a pipeline view.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a pipeline image into an `image::GrayImage`, e.g. for saving.
pub fn to_image(img: &core::GrayImage) -> Result<::image::GrayImage, BufferError> {
    let width = u32::try_from(img.width).unwrap_or(u32::MAX);
    let height = u32::try_from(img.height).unwrap_or(u32::MAX);
    ::image::GrayImage::from_raw(width, height, img.data.clone())
        .ok_or(BufferError::InvalidGrayDimensions { width, height })
}

/// Run the full pipeline on a decoded grayscale image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    img: &::image::GrayImage,
    params: LCheckParams,
) -> Result<CoordinateSystem, DetectError> {
    LCheckDetector::new(params).detect(&gray_view(img))
}

/// Convenience overload using [`LCheckParams::default`].
pub fn detect_image_default(img: &::image::GrayImage) -> Result<CoordinateSystem, DetectError> {
    detect_image(img, LCheckParams::default())
}

/// Run the full pipeline on a raw row-major 8-bit buffer.
pub fn detect_from_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: LCheckParams,
) -> Result<CoordinateSystem, BufferError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(BufferError::InvalidGrayDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(BufferError::InvalidGrayDimensions { width, height });
    };
    let Some(view) = core::GrayImageView::new(w, h, pixels) else {
        return Err(BufferError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    };
    Ok(LCheckDetector::new(params).detect(&view)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{render_board, BoardRenderSpec};

    #[test]
    fn short_buffer_is_rejected() {
        let err = detect_from_gray_u8(10, 10, &[0u8; 99], LCheckParams::default()).unwrap_err();
        assert!(matches!(
            err,
            BufferError::InvalidGrayBuffer {
                expected: 100,
                got: 99
            }
        ));
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn image_round_trip_keeps_pixels() {
        let board = render_board(&BoardRenderSpec::default());
        let img = to_image(&board).expect("convert");
        assert_eq!(img.dimensions(), (120, 120));
        let view = gray_view(&img);
        assert_eq!(view.data, board.data.as_slice());
    }

    #[test]
    fn rendered_board_is_detected_through_image_crate() {
        let board = render_board(&BoardRenderSpec::default());
        let img = to_image(&board).expect("convert");
        let cs = detect_image_default(&img).expect("detected");
        assert_eq!(cs.records().len(), 37);
    }

    #[test]
    fn raw_buffer_errors_carry_detector_codes() {
        let err =
            detect_from_gray_u8(64, 64, &[90u8; 64 * 64], LCheckParams::default()).unwrap_err();
        assert_eq!(err.code(), 1);
    }
}
