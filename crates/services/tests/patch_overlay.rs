use std::io::Write;

use services::services::patches::{PatchError, PatchOverlayService};
use zip::write::SimpleFileOptions;

fn build_patch_zip(metadata: Option<&str>, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    if let Some(metadata) = metadata {
        writer.start_file("patch.json", options).unwrap();
        writer.write_all(metadata.as_bytes()).unwrap();
    }
    for (name, body) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn service() -> (tempfile::TempDir, PatchOverlayService) {
    let tmp = tempfile::tempdir().unwrap();
    let service = PatchOverlayService::new(tmp.path().join("patches"));
    (tmp, service)
}

#[test]
fn import_then_status_round_trip() {
    let (_tmp, service) = service();
    let archive = build_patch_zip(
        Some(r#"{"version": "1.2.0", "description": "fix OCR rounding"}"#),
        &[
            ("scripts/extract_grades.py", "print('patched')"),
            ("scripts/ocr/reader.py", "print('helper')"),
        ],
    );

    let summary = service.import(&archive).unwrap();
    assert_eq!(summary.version, "1.2.0");
    assert_eq!(summary.description, "fix OCR rounding");
    assert_eq!(summary.file_count, 2);

    let status = service.status();
    assert!(status.active);
    let manifest = status.manifest.unwrap();
    assert_eq!(manifest.version, "1.2.0");
    assert_eq!(manifest.description, "fix OCR rounding");
    assert_eq!(manifest.files.len(), 2);
    assert!(manifest.files.contains(&"extract_grades.py".to_string()));
    assert!(manifest.files.contains(&"ocr/reader.py".to_string()));

    // The extracted tree mirrors the archive's scripts/ layout.
    assert!(service.overlay_root().join("scripts/extract_grades.py").is_file());
    assert!(service.overlay_root().join("scripts/ocr/reader.py").is_file());
}

#[test]
fn reimport_fully_replaces_previous_overlay() {
    let (_tmp, service) = service();
    let first = build_patch_zip(
        Some(r#"{"version": "1.0.0", "description": "first"}"#),
        &[("scripts/a.py", "a")],
    );
    let second = build_patch_zip(
        Some(r#"{"version": "2.0.0", "description": "second"}"#),
        &[("scripts/b.py", "b")],
    );

    service.import(&first).unwrap();
    service.import(&second).unwrap();

    let manifest = service.status().manifest.unwrap();
    assert_eq!(manifest.version, "2.0.0");
    assert_eq!(manifest.files, vec!["b.py".to_string()]);
    // no field-by-field merge: the old file is gone
    assert!(!service.overlay_root().join("scripts/a.py").exists());
    assert!(service.overlay_root().join("scripts/b.py").is_file());
}

#[test]
fn missing_manifest_is_rejected_and_previous_overlay_survives() {
    let (_tmp, service) = service();
    let good = build_patch_zip(
        Some(r#"{"version": "1.0.0", "description": "good"}"#),
        &[("scripts/keep.py", "keep")],
    );
    service.import(&good).unwrap();

    let bad = build_patch_zip(None, &[("scripts/evil.py", "evil")]);
    assert!(matches!(
        service.import(&bad),
        Err(PatchError::MissingManifest)
    ));

    let manifest = service.status().manifest.unwrap();
    assert_eq!(manifest.version, "1.0.0");
    assert!(service.overlay_root().join("scripts/keep.py").is_file());
    assert!(!service.overlay_root().join("scripts/evil.py").exists());
}

#[test]
fn malformed_metadata_is_rejected() {
    let (_tmp, service) = service();
    let archive = build_patch_zip(Some("not json"), &[("scripts/x.py", "x")]);
    assert!(matches!(
        service.import(&archive),
        Err(PatchError::Metadata(_))
    ));
    assert!(!service.status().active);
}

#[test]
fn corrupt_archive_is_rejected() {
    let (_tmp, service) = service();
    assert!(matches!(
        service.import(b"definitely not a zip"),
        Err(PatchError::Archive(_))
    ));
    assert!(!service.status().active);
}

#[test]
fn clear_is_idempotent() {
    let (_tmp, service) = service();
    let archive = build_patch_zip(
        Some(r#"{"version": "1.0.0", "description": "d"}"#),
        &[("scripts/a.py", "a")],
    );
    service.import(&archive).unwrap();

    assert!(service.clear().unwrap());
    assert!(!service.status().active);
    // second clear reports nothing-to-clear, never an error
    assert!(!service.clear().unwrap());
}

#[test]
fn status_without_any_import_is_inactive() {
    let (_tmp, service) = service();
    let status = service.status();
    assert!(!status.active);
    assert!(status.manifest.is_none());
}
