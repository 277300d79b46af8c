//! Synthetic L-marker checkerboards with known ground truth.
//!
//! Field `(r, c)` (relative to the zero point, in field units) is white when
//! `r + c` is even. The marker is a long dark band over fields `c = -2`,
//! `r = -3..=1` and a short dark band over `r = -2`, `c = -1..=1`, each with
//! a thin bright line inside. The twelve inner corners covered by the bands
//! disappear, which is what the detector's marker search keys on.
//!
//! The field grid may be rotated about the zero point, and each output pixel
//! may average `scale × scale` sub-pixels (the same as rendering a larger
//! image and area-downscaling it).

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use lcheck_core::{GrayImage, LatticeCoords};

use crate::marker::MARKER_CELLS;

/// Board mirroring applied before rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mirror {
    #[default]
    None,
    /// Upside down.
    Rows,
    /// Left to right.
    Cols,
    Both,
}

impl Mirror {
    pub const ALL: [Mirror; 4] = [Mirror::None, Mirror::Rows, Mirror::Cols, Mirror::Both];

    /// `(column sign, row sign)` applied to field coordinates.
    pub fn signs(self) -> (f64, f64) {
        match self {
            Mirror::None => (1.0, 1.0),
            Mirror::Rows => (1.0, -1.0),
            Mirror::Cols => (-1.0, 1.0),
            Mirror::Both => (-1.0, -1.0),
        }
    }
}

/// How a pixel value is obtained from the continuous pattern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelSampling {
    /// Pattern value at the pixel center.
    #[default]
    Center,
    /// Simpson's rule over the unit pixel square.
    Simpson,
}

/// Description of a synthetic board image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardRenderSpec {
    /// Number of fields vertically.
    pub rows: usize,
    /// Number of fields horizontally.
    pub cols: usize,
    /// Field side in pixels.
    pub field_size: f64,
    /// Pixel position of lattice corner `(0, 0)`; centered when `None`.
    pub zero_point: Option<Point2<f64>>,
    pub mirror: Mirror,
    /// Rotation of the field grid about the zero point, in degrees from `+x`
    /// towards `+y`.
    pub rotation_deg: f64,
    /// Value of pixels lying exactly on a field boundary.
    pub transition_value: u8,
    pub sampling: PixelSampling,
    /// Sub-pixels per output pixel along each axis; `1` samples once.
    pub scale: usize,
    /// Draw the L marker; `false` renders a plain checkerboard.
    pub marker: bool,
}

impl Default for BoardRenderSpec {
    fn default() -> Self {
        Self {
            rows: 8,
            cols: 8,
            field_size: 15.0,
            zero_point: None,
            mirror: Mirror::None,
            rotation_deg: 0.0,
            transition_value: 128,
            sampling: PixelSampling::Center,
            scale: 1,
            marker: true,
        }
    }
}

impl BoardRenderSpec {
    /// Image `(width, height)` in pixels.
    pub fn dimensions(&self) -> (usize, usize) {
        (
            (self.cols as f64 * self.field_size).ceil() as usize,
            (self.rows as f64 * self.field_size).ceil() as usize,
        )
    }

    pub fn zero_point(&self) -> Point2<f64> {
        self.zero_point.unwrap_or_else(|| {
            let (w, h) = self.dimensions();
            Point2::new(w as f64 / 2.0 - 0.5, h as f64 / 2.0 - 0.5)
        })
    }

    /// Image directions of the field columns and rows, before mirroring.
    fn field_axes(&self) -> (Vector2<f64>, Vector2<f64>) {
        let (sin, cos) = self.rotation_deg.to_radians().sin_cos();
        (Vector2::new(cos, sin), Vector2::new(-sin, cos))
    }

    /// Pattern intensity at pixel coordinates `(x, y)`.
    pub fn intensity(&self, x: f64, y: f64) -> f64 {
        let d = Point2::new(x, y) - self.zero_point();
        let (u, v) = self.field_axes();
        let (sc, sr) = self.mirror.signs();
        let c = sc * d.dot(&u) / self.field_size;
        let r = sr * d.dot(&v) / self.field_size;
        pattern(r, c, self.transition_value, self.marker)
    }

    /// Lattice corners visible in the rendered image, as
    /// `(canonical index, pixel position)`.
    ///
    /// The canonical index has `i` along the (rotated) field columns and `j`
    /// along the field rows, negated when the respective mirror is applied,
    /// so the marker always occupies [`MARKER_CELLS`]. With the marker off,
    /// those cells are listed too.
    pub fn expected_corners(&self) -> Vec<(LatticeCoords, Point2<f64>)> {
        let (w, h) = self.dimensions();
        let z = self.zero_point();
        let (sc, sr) = self.mirror.signs();
        let (u, v) = self.field_axes();
        let s = self.field_size;
        let (du, dv) = (u * (sc * s), v * (sr * s));
        let reach = ((w as f64).hypot(h as f64) / s).ceil() as i32 + 1;
        let (lo, hi_x, hi_y) = (-0.5, w as f64 - 0.5, h as f64 - 0.5);
        let inside = |p: Point2<f64>| p.x >= lo && p.y >= lo && p.x <= hi_x && p.y <= hi_y;
        let mut out = Vec::new();
        for j in -reach..=reach {
            for i in -reach..=reach {
                let coords = LatticeCoords::new(i, j);
                if self.marker && MARKER_CELLS.contains(&coords) {
                    continue;
                }
                let p = z + du * i as f64 + dv * j as f64;
                // a corner needs a full field on every side
                let full = [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
                    .iter()
                    .all(|&(a, b)| inside(p + du * a + dv * b));
                if full {
                    out.push((coords, p));
                }
            }
        }
        out
    }
}

fn within(v: f64, lo: f64, hi: f64) -> bool {
    lo <= v && v <= hi
}

/// Pattern value at field coordinates `(r, c)`.
fn pattern(r: f64, c: f64, transition: u8, marker: bool) -> f64 {
    if marker {
        if let Some(v) = marker_value(r, c) {
            return v;
        }
    }
    if r.floor() == r || c.floor() == c {
        return transition as f64;
    }
    if (r.floor() as i64 + c.floor() as i64).rem_euclid(2) == 0 {
        255.0
    } else {
        0.0
    }
}

/// Marker band value at `(r, c)`, `None` outside both bands.
fn marker_value(r: f64, c: f64) -> Option<f64> {
    let in_long_band = within(c, -2.0, -1.0) && within(r, -3.0, 2.0);
    let in_short_band = within(c, -1.0, 2.0) && within(r, -2.0, -1.0);
    if in_long_band {
        let line = within(c, -5.0 / 3.0, -4.0 / 3.0) && within(r, -8.0 / 3.0, 5.0 / 3.0);
        return Some(if line { 255.0 } else { 0.0 });
    }
    if in_short_band {
        let line = within(r, -5.0 / 3.0, -4.0 / 3.0) && within(c, -2.0 / 3.0, 5.0 / 3.0);
        return Some(if line { 255.0 } else { 0.0 });
    }
    None
}

/// Simpson's rule over the square of side `extent` centered on `(x, y)`.
fn simpson(spec: &BoardRenderSpec, x: f64, y: f64, extent: f64) -> f64 {
    const W: [f64; 3] = [1.0, 4.0, 1.0];
    let mut acc = 0.0;
    for (a, wy) in W.iter().enumerate() {
        for (b, wx) in W.iter().enumerate() {
            let sx = x + extent * (0.5 * b as f64 - 0.5);
            let sy = y + extent * (0.5 * a as f64 - 0.5);
            acc += wx * wy * spec.intensity(sx, sy);
        }
    }
    acc / 36.0
}

/// Mean over the `scale × scale` sub-pixels of output pixel `(x, y)`.
fn pixel_value(spec: &BoardRenderSpec, x: f64, y: f64) -> f64 {
    let n = spec.scale.max(1);
    let step = 1.0 / n as f64;
    let mut acc = 0.0;
    for a in 0..n {
        for b in 0..n {
            let sx = x - 0.5 + (b as f64 + 0.5) * step;
            let sy = y - 0.5 + (a as f64 + 0.5) * step;
            acc += match spec.sampling {
                PixelSampling::Center => spec.intensity(sx, sy),
                PixelSampling::Simpson => simpson(spec, sx, sy, step),
            };
        }
    }
    acc / (n * n) as f64
}

/// Render the board described by `spec`.
pub fn render_board(spec: &BoardRenderSpec) -> GrayImage {
    let (w, h) = spec.dimensions();
    let mut img = GrayImage::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let v = pixel_value(spec, x as f64, y as f64);
            img.set(x, y, v.round().clamp(0.0, 255.0) as u8);
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_board_geometry() {
        let spec = BoardRenderSpec::default();
        assert_eq!(spec.dimensions(), (120, 120));
        assert_eq!(spec.zero_point(), Point2::new(59.5, 59.5));
        // 7×7 inner corners minus the twelve marker cells
        assert_eq!(spec.expected_corners().len(), 37);
    }

    #[test]
    fn checker_parity_and_bands() {
        let spec = BoardRenderSpec::default();
        let img = render_board(&spec);
        let z = spec.zero_point();
        let at = |r: f64, c: f64| {
            img.view()
                .get((z.x + c * 15.0).round() as usize, (z.y + r * 15.0).round() as usize)
        };
        // field (0, 0) is white, field (0, 1) black
        assert_eq!(at(0.5, 0.5), 255);
        assert_eq!(at(0.5, 1.5), 0);
        // long band is dark next to its line, bright on it
        assert_eq!(at(0.5, -1.9), 0);
        assert_eq!(at(0.5, -1.5), 255);
        // short band line
        assert_eq!(at(-1.5, 1.0), 255);
        assert_eq!(at(-1.1, 1.0), 0);
    }

    #[test]
    fn transition_value_marks_exact_boundaries() {
        let spec = BoardRenderSpec {
            zero_point: Some(Point2::new(60.0, 60.0)),
            transition_value: 77,
            ..BoardRenderSpec::default()
        };
        let img = render_board(&spec);
        assert_eq!(img.view().get(75, 100), 77);
        assert_eq!(img.view().get(100, 90), 77);
        assert_ne!(img.view().get(100, 100), 77);
    }

    #[test]
    fn mirrored_board_is_a_flipped_image() {
        let plain = render_board(&BoardRenderSpec::default());
        let flipped = render_board(&BoardRenderSpec {
            mirror: Mirror::Cols,
            ..BoardRenderSpec::default()
        });
        // zero point 59.5 maps column x to 119 - x
        for y in 0..120 {
            for x in 0..120 {
                assert_eq!(plain.view().get(x, y), flipped.view().get(119 - x, y));
            }
        }
    }

    #[test]
    fn simpson_blurs_edges_only() {
        let spec = BoardRenderSpec {
            sampling: PixelSampling::Simpson,
            zero_point: Some(Point2::new(60.0, 60.0)),
            ..BoardRenderSpec::default()
        };
        let img = render_board(&spec);
        // interior of a white field
        assert_eq!(img.view().get(67, 67), 255);
        // pixel centered on a vertical edge averages both sides
        let edge = img.view().get(75, 67);
        assert!(edge > 100 && edge < 160, "edge = {edge}");
    }

    #[test]
    fn supersampling_averages_sub_pixels() {
        let spec = BoardRenderSpec {
            scale: 4,
            zero_point: Some(Point2::new(60.0, 60.0)),
            ..BoardRenderSpec::default()
        };
        let img = render_board(&spec);
        assert_eq!((img.width, img.height), (120, 120));
        assert_eq!(img.view().get(67, 67), 255);
        assert_eq!(img.view().get(82, 67), 0);
        // half of the sub-pixels fall on either side of the edge at x = 75
        assert_eq!(img.view().get(75, 67), 128);
    }

    #[test]
    fn rotation_turns_fields_about_the_zero_point() {
        let spec = BoardRenderSpec {
            rotation_deg: 30.0,
            ..BoardRenderSpec::default()
        };
        let z = spec.zero_point();
        let (sin, cos) = 30f64.to_radians().sin_cos();
        let field_center = |r: f64, c: f64| {
            let (x, y) = (15.0 * c, 15.0 * r);
            (z.x + x * cos - y * sin, z.y + x * sin + y * cos)
        };
        let (x, y) = field_center(0.5, 0.5);
        assert_eq!(spec.intensity(x, y), 255.0);
        let (x, y) = field_center(0.5, 1.5);
        assert_eq!(spec.intensity(x, y), 0.0);
        let (x, y) = field_center(0.5, -1.9);
        assert_eq!(spec.intensity(x, y), 0.0);

        for (idx, p) in spec.expected_corners() {
            let d = p - z;
            assert!((d.norm() - 15.0 * f64::from(idx.i).hypot(f64::from(idx.j))).abs() < 1e-9);
        }
    }

    #[test]
    fn plain_board_without_marker() {
        let spec = BoardRenderSpec {
            marker: false,
            ..BoardRenderSpec::default()
        };
        assert_eq!(spec.expected_corners().len(), 49);
        let img = render_board(&spec);
        let z = spec.zero_point();
        // inside the would-be long band the checker continues
        let x = (z.x - 1.9 * 15.0).round() as usize;
        let y = (z.y + 0.5 * 15.0).round() as usize;
        assert_eq!(img.view().get(x, y), 255);
    }

    #[test]
    fn spec_round_trips_partial_json() {
        let spec: BoardRenderSpec =
            serde_json::from_str(r#"{ "field_size": 20.0, "mirror": "Rows" }"#).expect("parse");
        assert_eq!(spec.dimensions(), (160, 160));
        assert_eq!(spec.mirror, Mirror::Rows);
        assert_eq!(spec.scale, 1);
        assert!(spec.marker);
    }
}
