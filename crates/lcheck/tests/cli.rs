#![cfg(feature = "cli")]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use lcheck::io::DetectReport;
use lcheck::CornerRecord;

fn lcheck() -> Command {
    Command::cargo_bin("lcheck").expect("lcheck binary")
}

fn render(dir: &TempDir, name: &str, extra: &[&str]) -> std::path::PathBuf {
    let out = dir.path().join(name);
    lcheck()
        .arg("render")
        .arg("--out")
        .arg(&out)
        .args(extra)
        .assert()
        .success();
    assert!(out.exists());
    out
}

fn read_report(path: &Path) -> DetectReport {
    DetectReport::load_json(path).expect("report")
}

#[test]
fn help_lists_both_commands() {
    lcheck()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("detect").and(predicate::str::contains("render")));
}

#[test]
fn rendered_board_is_detected() {
    let dir = TempDir::new().expect("tempdir");
    let image = render(&dir, "board.png", &[]);
    let report_path = dir.path().join("report.json");

    lcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .arg("--out")
        .arg(&report_path)
        .assert()
        .code(0);

    let report = read_report(&report_path);
    assert!(report.is_success());
    assert_eq!((report.width, report.height), (120, 120));
    assert_eq!(report.corners.len(), 37);
    let zero = report.zero_point.expect("zero point");
    assert!((zero.x - 59.5).abs() < 1e-3 && (zero.y - 59.5).abs() < 1e-3);
    assert!(report.corners.iter().any(|r| r.i == 0 && r.j == 0));
}

#[test]
fn mirrored_board_matches_ground_truth() {
    let dir = TempDir::new().expect("tempdir");
    let truth_path = dir.path().join("truth.json");
    let image = render(
        &dir,
        "mirrored.png",
        &["--mirror", "cols", "--truth", truth_path.to_str().expect("utf-8 path")],
    );
    let truth: Vec<CornerRecord> =
        serde_json::from_str(&std::fs::read_to_string(&truth_path).expect("truth")).expect("json");

    let output = lcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(0));
    let report: DetectReport = serde_json::from_slice(&output.stdout).expect("stdout report");

    let axis1 = report.axis1.expect("axis1");
    assert!(axis1.x < 0.0, "mirrored columns flip axis1: {axis1:?}");
    for r in &report.corners {
        let t = truth
            .iter()
            .find(|t| t.i == r.i && t.j == r.j)
            .unwrap_or_else(|| panic!("({}, {}) not in ground truth", r.i, r.j));
        assert!((t.x - r.x).abs() < 0.05 && (t.y - r.y).abs() < 0.05);
    }
}

#[test]
fn blank_image_exits_with_code_one() {
    let dir = TempDir::new().expect("tempdir");
    let image = dir.path().join("blank.png");
    ::image::GrayImage::from_pixel(120, 120, ::image::Luma([128u8]))
        .save(&image)
        .expect("save");
    let report_path = dir.path().join("report.json");

    lcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .arg("--out")
        .arg(&report_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("code 1"));

    let report = read_report(&report_path);
    assert_eq!(report.code, 1);
    assert!(report.error.is_some());
    assert!(report.corners.is_empty());
}

#[test]
fn board_without_marker_exits_with_code_five() {
    let dir = TempDir::new().expect("tempdir");
    let image = render(&dir, "plain.png", &["--no-marker", "--scale", "2"]);
    let report_path = dir.path().join("report.json");

    lcheck()
        .arg("detect")
        .arg("--image")
        .arg(&image)
        .arg("--out")
        .arg(&report_path)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("code 5"));

    let report = read_report(&report_path);
    assert_eq!(report.code, 5);
    assert!(report.corners.is_empty());
    assert!(report.marker_orientation.is_none());
}

#[test]
fn render_rejects_zero_scale() {
    let dir = TempDir::new().expect("tempdir");
    lcheck()
        .arg("render")
        .arg("--out")
        .arg(dir.path().join("x.png"))
        .arg("--scale")
        .arg("0")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("scale"));
}

#[test]
fn config_file_supplies_image_output_and_params() {
    let dir = TempDir::new().expect("tempdir");
    let image = render(&dir, "board.png", &[]);
    let report_path = dir.path().join("from_config.json");
    let config_path = dir.path().join("config.json");
    let config = serde_json::json!({
        "image_path": image,
        "output_path": report_path,
        "params": { "min_corners": 100 }
    });
    std::fs::write(&config_path, config.to_string()).expect("write config");

    lcheck()
        .arg("detect")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .code(1);

    let report = read_report(&report_path);
    assert_eq!(report.code, 1);
    assert!(report
        .error
        .as_deref()
        .is_some_and(|e| e.contains("100")));
}

#[test]
fn detect_without_input_is_a_usage_error() {
    lcheck()
        .arg("detect")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--image"));
}

#[test]
fn render_rejects_half_a_zero_point() {
    let dir = TempDir::new().expect("tempdir");
    lcheck()
        .arg("render")
        .arg("--out")
        .arg(dir.path().join("x.png"))
        .arg("--zero-x")
        .arg("40")
        .assert()
        .failure();
}
