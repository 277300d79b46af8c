use std::sync::Arc;

use log::{debug, info, warn};
use nalgebra::Point2;

use lcheck_core::GrayImageView;
use lcheck_corners::{
    extract_candidates, filter_blurry, refine_corners, window_half_size, TemplateBank,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::axes::discover_axes;
use crate::error::DetectError;
use crate::indexer::assign_indices;
use crate::marker::locate_marker;
use crate::orientation::resolve_orientation;
use crate::params::LCheckParams;
use crate::result::CoordinateSystem;

/// Final sharpness window, as a fraction of `|axis1| + |axis2|`.
const LATTICE_SHARPNESS_WINDOW: f64 = 0.4;

/// Half-size of the sub-pixel window for `points`, or the code-1 failure
/// when no window fits.
fn refinement_window(
    points: &[Point2<f64>],
    width: usize,
    height: usize,
) -> Result<usize, DetectError> {
    window_half_size(points, width, height).ok_or_else(|| {
        warn!("no refinement window fits {} corners", points.len());
        DetectError::NoRefinementWindow {
            corners: points.len(),
        }
    })
}

/// End-to-end L-marker checkerboard detector.
///
/// Clones share one template bank, so templates are rendered once per
/// cross size for all of them.
#[derive(Clone, Debug, Default)]
pub struct LCheckDetector {
    params: LCheckParams,
    templates: Arc<TemplateBank>,
}

impl LCheckDetector {
    pub fn new(params: LCheckParams) -> Self {
        Self {
            params,
            templates: Arc::new(TemplateBank::new()),
        }
    }

    /// Templates rendered so far by this detector and its clones.
    pub fn templates(&self) -> &TemplateBank {
        &self.templates
    }

    pub fn params(&self) -> &LCheckParams {
        &self.params
    }

    /// Sub-pixel corners that survive both early sharpness passes, in
    /// detection order.
    pub fn refined_corners(&self, image: &GrayImageView<'_>) -> Result<Vec<Point2<f64>>, DetectError> {
        let p = &self.params;
        let candidates = extract_candidates(image, &p.corners, &self.templates)?;
        let window = p.corners.primary_cross_size() as f64;

        let sharp = filter_blurry(
            image,
            candidates,
            |c| c.position,
            window,
            p.sharpness.candidates,
        );
        let points: Vec<Point2<f64>> = sharp.iter().map(|c| c.position).collect();

        let half = refinement_window(&points, image.width, image.height)?;
        debug!("refining {} corners with half window {half}", points.len());
        let refined = refine_corners(image, &points, half, &p.subpix);
        Ok(filter_blurry(
            image,
            refined,
            |p| *p,
            window,
            p.sharpness.refined,
        ))
    }

    /// Detect the board and return its oriented lattice.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> Result<CoordinateSystem, DetectError> {
        let p = &self.params;
        p.validate()?;

        let points = self.refined_corners(image)?;
        if points.len() < p.min_corners {
            warn!(
                "only {} corners after filtering, {} required",
                points.len(),
                p.min_corners
            );
            return Err(DetectError::TooFewCorners {
                found: points.len(),
                required: p.min_corners,
            });
        }

        let axes = discover_axes(&points, image.width, image.height, &p.max_distance_factors)?;
        let mut corners = assign_indices(&points, axes.zero_index, &axes.basis)?;
        let (marker, anchor) = locate_marker(&mut corners)?;
        let zero_point = corners[anchor].position;
        let oriented = resolve_orientation(image, &mut corners, zero_point, &axes.basis, marker.orientation)?;

        let window =
            LATTICE_SHARPNESS_WINDOW * (oriented.basis.axis1.norm() + oriented.basis.axis2.norm());
        let corners = filter_blurry(
            image,
            corners,
            |c| c.position,
            window,
            p.sharpness.lattice,
        );

        info!(
            "detected {} corners, zero point ({:.3}, {:.3}), marker {:?}",
            corners.len(),
            zero_point.x,
            zero_point.y,
            marker.orientation
        );
        Ok(CoordinateSystem {
            corners,
            zero_point,
            basis: oriented.basis,
            marker_orientation: marker.orientation,
            long_bar: oriented.long_bar,
        })
    }
}
