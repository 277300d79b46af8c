//! JSON configuration and report files for L-marker checkerboard detection.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::board::{
    CoordinateSystem, CornerRecord, DetectError, LCheckDetector, LCheckParams, LongBarAxis,
    MarkerOrientation,
};

#[derive(thiserror::Error, Debug)]
pub enum LCheckIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "image")]
    #[error(transparent)]
    Image(#[from] ::image::ImageError),
}

/// Input of a detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectConfig {
    pub image_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    /// Detector parameters; missing fields take their defaults.
    #[serde(default)]
    pub params: Option<LCheckParams>,
}

impl DetectConfig {
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: None,
            params: None,
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LCheckIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LCheckIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("lcheck_report.json"))
    }

    pub fn build_params(&self) -> LCheckParams {
        self.params.clone().unwrap_or_default()
    }

    /// Build a detector, rejecting invalid parameters up front.
    pub fn build_detector(&self) -> Result<LCheckDetector, DetectError> {
        let params = self.build_params();
        params.validate()?;
        Ok(LCheckDetector::new(params))
    }
}

/// Outcome of a detection run, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub width: usize,
    pub height: usize,
    /// `0` on success, otherwise [`DetectError::code`].
    pub code: i32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub corners: Vec<CornerRecord>,
    #[serde(default)]
    pub zero_point: Option<Point2<f64>>,
    #[serde(default)]
    pub axis1: Option<Vector2<f64>>,
    #[serde(default)]
    pub axis2: Option<Vector2<f64>>,
    #[serde(default)]
    pub marker_orientation: Option<MarkerOrientation>,
    #[serde(default)]
    pub long_bar: Option<LongBarAxis>,
}

impl DetectReport {
    pub fn new(image_path: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            image_path: image_path.into(),
            width,
            height,
            code: 0,
            error: None,
            corners: Vec::new(),
            zero_point: None,
            axis1: None,
            axis2: None,
            marker_orientation: None,
            long_bar: None,
        }
    }

    /// Populate report fields from a successful detection.
    pub fn set_detection(&mut self, cs: &CoordinateSystem) {
        self.code = 0;
        self.error = None;
        self.corners = cs.records();
        self.zero_point = Some(cs.zero_point);
        self.axis1 = Some(cs.basis.axis1);
        self.axis2 = Some(cs.basis.axis2);
        self.marker_orientation = Some(cs.marker_orientation);
        self.long_bar = Some(cs.long_bar);
    }

    /// Record a detection error; any previous detection is cleared.
    pub fn set_error(&mut self, err: &DetectError) {
        self.corners.clear();
        self.zero_point = None;
        self.axis1 = None;
        self.axis2 = None;
        self.marker_orientation = None;
        self.long_bar = None;
        self.code = err.code();
        self.error = Some(err.to_string());
    }

    /// Fill the report from a detector result.
    pub fn set_result(&mut self, result: &Result<CoordinateSystem, DetectError>) {
        match result {
            Ok(cs) => self.set_detection(cs),
            Err(e) => self.set_error(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, LCheckIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn to_json(&self) -> Result<String, LCheckIoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), LCheckIoError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Decode an image file and convert it to 8-bit grayscale.
#[cfg(feature = "image")]
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, LCheckIoError> {
    Ok(::image::ImageReader::open(path)?.decode()?.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{render_board, BoardRenderSpec};

    #[test]
    fn config_defaults_apply_to_missing_fields() {
        let cfg: DetectConfig = serde_json::from_str(
            r#"{ "image_path": "board.png", "params": { "min_corners": 10 } }"#,
        )
        .expect("parse");
        assert_eq!(cfg.output_path(), PathBuf::from("lcheck_report.json"));
        let params = cfg.build_params();
        assert_eq!(params.min_corners, 10);
        assert_eq!(params.sharpness, LCheckParams::default().sharpness);
    }

    #[test]
    fn invalid_params_fail_when_building_the_detector() {
        let mut params = LCheckParams::default();
        params.max_distance_factors.clear();
        let cfg = DetectConfig {
            params: Some(params),
            ..DetectConfig::new("x.png")
        };
        assert_eq!(cfg.build_detector().unwrap_err().code(), 7);
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        let cfg = DetectConfig {
            output_path: Some("out.json".into()),
            ..DetectConfig::new("board.png")
        };
        cfg.write_json(&path).expect("write");
        let back = DetectConfig::load_json(&path).expect("load");
        assert_eq!(back.image_path, "board.png");
        assert_eq!(back.output_path(), PathBuf::from("out.json"));
        assert!(back.params.is_none());
    }

    #[test]
    fn error_replaces_previous_detection() {
        let board = render_board(&BoardRenderSpec::default());
        let result = LCheckDetector::default().detect(&board.view());
        let mut report = DetectReport::new("board.png", board.width, board.height);
        report.set_result(&result);
        assert!(report.is_success());
        assert_eq!(report.corners.len(), 37);
        assert!(report.zero_point.is_some());

        report.set_error(&DetectError::NoMarker);
        assert_eq!(report.code, 5);
        assert!(report.corners.is_empty());
        assert!(report.zero_point.is_none());
        assert_eq!(report.image_path, "board.png");
        assert_eq!(report.width, 120);
    }

    #[test]
    fn report_json_lists_flat_records() {
        let mut report = DetectReport::new("a.png", 4, 4);
        report.corners.push(CornerRecord {
            x: 1.5,
            y: 2.5,
            i: -1,
            j: 3,
        });
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().expect("json")).expect("parse");
        assert_eq!(json["code"], 0);
        assert_eq!(json["corners"][0]["i"], -1);
        assert_eq!(json["corners"][0]["y"], 2.5);
        assert!(json["error"].is_null());
    }
}
