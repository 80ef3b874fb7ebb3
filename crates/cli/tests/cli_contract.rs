use assert_cmd::cargo::cargo_bin_cmd;
use pdf_engine::blank_document;
use pdfshow_core::PageSize;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let path = dir.join(name);
    let bytes =
        blank_document(&vec![PageSize::new(612.0, 792.0); pages]).expect("fixture should build");
    fs::write(&path, bytes).expect("fixture should be written");
    path
}

fn write_script(dir: &Path, actions: Value) -> PathBuf {
    let path = dir.join("script.json");
    fs::write(&path, actions.to_string()).expect("script should be written");
    path
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should contain valid json")
}

#[test]
fn info_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "small.pdf", 2);

    let output = cargo_bin_cmd!("pdfshow-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["first_page_size_pt"], json!({ "width": 612.0, "height": 792.0 }));
    assert_eq!(value["path"], pdf.display().to_string());
}

#[test]
fn annotate_replays_script_and_writes_png() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 3);
    let png = temp.path().join("out/page.png");
    let script = write_script(
        temp.path(),
        json!([
            { "action": "line", "x": 10, "y": 10, "end_x": 100, "end_y": 10 },
            { "action": "next" },
            { "action": "text", "x": 20, "y": 40, "text": "note" },
            { "action": "marker", "x": 20, "y": 60, "end_x": 200, "end_y": 60 },
            { "action": "drag", "kind": "rectangle", "x": 50, "y": 50, "path": [[60, 60], [80, 90]] },
            { "action": "polyline", "x": 0, "y": 0, "points": [[1, 1], [2, 3], [5, 8]] },
            { "action": "remove_last" }
        ]),
    );

    let output = cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--width")
        .arg("1224")
        .arg("--height")
        .arg("792")
        .arg("--output")
        .arg(&png)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["page_count"], 3);
    assert_eq!(value["current_page"], 1);
    assert_eq!(value["shapes_per_page"], json!([1, 3, 0]));
    assert_eq!(value["scale"], json!({ "x": 2.0, "y": 1.0 }));

    let image = image::open(&png).expect("output should be readable image");
    assert_eq!((image.width(), image.height()), (1224, 792));
}

#[test]
fn annotate_insert_page_grows_document_in_memory() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 2);
    let script = write_script(
        temp.path(),
        json!([
            { "action": "rectangle", "x": 1, "y": 1, "corner_x": 9, "corner_y": 9 },
            { "action": "insert_page" },
            { "action": "text", "x": 5, "y": 30, "text": "new" }
        ]),
    );

    let output = cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["page_count"], 3);
    assert_eq!(value["current_page"], 1);
    assert_eq!(value["shapes_per_page"], json!([1, 1, 0]));

    // The source document on disk is left as it was
    cargo_bin_cmd!("pdfshow-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"page_count\": 2"));
}

#[test]
fn annotate_has_no_save_back_option() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 1);
    let script = write_script(temp.path(), json!([]));

    cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--save-pdf")
        .arg(temp.path().join("out.pdf"))
        .assert()
        .failure();
    assert!(!temp.path().join("out.pdf").exists());
}

#[test]
fn annotate_handles_extreme_coordinates() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 1);
    let png = temp.path().join("page.png");
    let script = write_script(
        temp.path(),
        json!([
            { "action": "line", "x": 0, "y": 0, "end_x": i32::MAX, "end_y": 0 },
            { "action": "marker", "x": -2_000_000_000, "y": 50,
              "end_x": 2_000_000_000, "end_y": 50 },
            { "action": "rectangle", "x": -2_000_000_000, "y": 0,
              "corner_x": 2_000_000_000, "corner_y": 10 }
        ]),
    );

    let output = cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--width")
        .arg("100")
        .arg("--height")
        .arg("100")
        .arg("--output")
        .arg(&png)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(stdout_json(&output)["shapes_per_page"], json!([3]));
    assert!(png.exists());
}

#[test]
fn annotate_navigation_saturates_at_last_page() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 3);
    let script = write_script(
        temp.path(),
        json!([{ "action": "next" }, { "action": "next" }, { "action": "next" }]),
    );

    let output = cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(stdout_json(&output)["current_page"], 2);
}

#[test]
fn annotate_uses_config_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 1);
    let config = temp.path().join("pdfshow.conf");
    fs::write(&config, "polyline_capacity = 2\n").expect("config should be written");
    let script = write_script(
        temp.path(),
        json!([{ "action": "polyline", "x": 0, "y": 0, "points": [[1, 1], [2, 2], [3, 3]] }]),
    );

    cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("polyline capacity of 2 points exceeded"));
}

#[test]
fn annotate_fails_for_bad_index() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 1);
    let script = write_script(temp.path(), json!([{ "action": "remove_at", "index": 3 }]));

    cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("script step 0 failed"))
        .stderr(predicate::str::contains("no shape at index 3"));
}

#[test]
fn annotate_rejects_invalid_script() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "deck.pdf", 1);
    let script = write_script(temp.path(), json!([{ "action": "erase" }]));

    cargo_bin_cmd!("pdfshow-cli")
        .arg("annotate")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid annotation script"));
}

#[test]
fn info_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cargo_bin_cmd!("pdfshow-cli")
        .arg("info")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("invalid.pdf");
    fs::write(&path, b"this is not a pdf").expect("fixture should be written");

    cargo_bin_cmd!("pdfshow-cli")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn info_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("encrypted-marker.pdf");
    fs::write(&path, b"%PDF-1.4\n1 0 obj << /Encrypt 2 0 R >> endobj\n%%EOF\n")
        .expect("fixture should be written");

    cargo_bin_cmd!("pdfshow-cli")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("pdfshow-cli")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
