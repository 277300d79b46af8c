//! Peak picking on the combined multi-scale, multi-angle response.

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use lcheck_core::{FloatImage, GrayImageView};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::correlation::CorrelationMapBuilder;
use crate::error::CornerError;
use crate::params::CornerDetectParams;
use crate::template::TemplateBank;

/// Approximate pixel position of a saddle, as found by peak picking.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerCandidate {
    pub position: Point2<f64>,
    /// Combined correlation response at the peak.
    pub score: f32,
}

/// Element-wise maximum over every (cross size, angle) response map.
///
/// Each map loses a border of `max_cross_size / 2` pixels first.
pub fn combined_response(
    image: &GrayImageView<'_>,
    params: &CornerDetectParams,
    bank: &TemplateBank,
) -> FloatImage {
    let builder = CorrelationMapBuilder::new(image, bank);
    let jobs: Vec<(usize, f64)> = params
        .cross_sizes
        .iter()
        .flat_map(|&s| params.angles_deg.iter().map(move |&a| (s, a)))
        .collect();
    let margin = params.max_cross_size() / 2;
    let build = |&(size, angle): &(usize, f64)| {
        let mut map = builder.map(size, angle);
        map.zero_border(margin);
        map
    };

    #[cfg(feature = "rayon")]
    let maps: Vec<FloatImage> = if params.parallel {
        jobs.par_iter().map(build).collect()
    } else {
        jobs.iter().map(build).collect()
    };
    #[cfg(not(feature = "rayon"))]
    let maps: Vec<FloatImage> = jobs.iter().map(build).collect();

    let mut combined = FloatImage::zeros(image.width, image.height);
    for map in &maps {
        combined.max_assign(map);
    }
    combined
}

/// Greedy non-maximum suppression.
///
/// Repeatedly takes the strongest remaining pixel (ties resolved by
/// row-major order) while it reaches `hit_bound`, then blocks the square
/// window of half-size `half` around it. Rows and columns within
/// `half + 1` of the top/left edge and `half + 2` of the bottom/right edge
/// are never picked.
pub fn pick_peaks(response: &FloatImage, half: usize, hit_bound: f32) -> Vec<CornerCandidate> {
    let (w, h) = (response.width, response.height);
    let lo = half + 1;
    let (x_hi, y_hi) = (w.saturating_sub(half + 2), h.saturating_sub(half + 2));
    if lo >= x_hi || lo >= y_hi {
        return Vec::new();
    }

    let mut peaks: Vec<(f32, usize)> = Vec::new();
    for y in lo..y_hi {
        for x in lo..x_hi {
            let v = response.get(x, y);
            if v >= hit_bound {
                peaks.push((v, y * w + x));
            }
        }
    }
    peaks.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut blocked = vec![false; w * h];
    let mut out = Vec::new();
    for (score, idx) in peaks {
        if blocked[idx] {
            continue;
        }
        let (x, y) = (idx % w, idx / w);
        out.push(CornerCandidate {
            position: Point2::new(x as f64, y as f64),
            score,
        });
        for by in y.saturating_sub(half)..=(y + half).min(h - 1) {
            blocked[by * w + x.saturating_sub(half)..=by * w + (x + half).min(w - 1)].fill(true);
        }
    }
    out
}

/// Correlate, combine and pick saddle candidates in detection order.
///
/// Templates come from `bank`, so repeated calls with the same bank render
/// each cross size once.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(image, params, bank),
        fields(width = image.width, height = image.height, maps = params.cross_sizes.len() * params.angles_deg.len())
    )
)]
pub fn extract_candidates(
    image: &GrayImageView<'_>,
    params: &CornerDetectParams,
    bank: &TemplateBank,
) -> Result<Vec<CornerCandidate>, CornerError> {
    params.validate()?;
    let required = params.max_cross_size();
    if image.width < required || image.height < required {
        return Err(CornerError::ImageTooSmall {
            width: image.width,
            height: image.height,
            required,
        });
    }

    let response = combined_response(image, params, bank);
    let candidates = pick_peaks(&response, required / 2, params.hit_bound);
    debug!(
        "picked {} candidates above {:.3} from {} response maps",
        candidates.len(),
        params.hit_bound,
        params.cross_sizes.len() * params.angles_deg.len()
    );
    if candidates.is_empty() {
        return Err(CornerError::NoCandidates);
    }
    Ok(candidates)
}
