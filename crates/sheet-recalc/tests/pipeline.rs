//! End-to-end runs of the recalculation pipeline with a stand-in engine.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use sheet_recalc::{
    EngineConfig, ErrorKind, ExecutionMode, ModePreference, Recalculator, Report, ScanStatus,
    StrategyConfig, DualModeRunner,
};
use sheet_recalc_xlsx::fixture::{CachedValue, XlsxFixture};

const TIMEOUT: Duration = Duration::from_secs(10);

fn fake_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-soffice");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn recalculator(dir: &Path, engine: PathBuf) -> Recalculator {
    Recalculator::new(EngineConfig {
        soffice_path: Some(engine),
        profile_dir: Some(dir.join("profile")),
        ..EngineConfig::default()
    })
}

fn uncalculated() -> XlsxFixture {
    XlsxFixture::new().sheet("Sheet1", |s| {
        s.number("A2", 0.0).formula("B2", "=1/A2");
    })
}

fn calculated() -> XlsxFixture {
    XlsxFixture::new().sheet("Sheet1", |s| {
        s.number("A2", 0.0)
            .formula_with("B2", "=1/A2", Some(CachedValue::Error("#DIV/0!".into())));
    })
}

#[tokio::test]
async fn test_scans_the_document_the_engine_saved() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    let saved = dir.path().join("saved.xlsx");
    uncalculated().write_to(&document).unwrap();
    calculated().write_to(&saved).unwrap();

    // $4 is the document; "saving" replaces it with the calculated copy.
    let engine = fake_engine(dir.path(), &format!("cp '{}' \"$4\"", saved.display()));
    let recalc = recalculator(dir.path(), engine);

    let report = recalc.try_recalc(&document, TIMEOUT).await.unwrap();
    assert_eq!(report.status, ScanStatus::ErrorsFound);
    assert_eq!(report.total_errors, 1);
    assert_eq!(report.total_formulas, 1);
    assert_eq!(
        report.error_summary[&ErrorKind::DivZero].locations[0].to_string(),
        "Sheet1!B2"
    );
    assert!(dir.path().join("profile").join("Module1.xba").is_file());
}

#[tokio::test]
async fn test_missing_engine_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();

    let recalc = recalculator(dir.path(), dir.path().join("no-soffice-here"));
    let report = recalc.recalc(&document, TIMEOUT).await;
    assert_eq!(
        report,
        Report::Error(sheet_recalc::ErrorReport {
            error: "LibreOffice not found. Please install LibreOffice from https://www.libreoffice.org/"
                .into()
        })
    );
}

#[tokio::test]
async fn test_engine_failure_is_not_scanned() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();

    let engine = fake_engine(
        dir.path(),
        "echo 'RecalculateAndSave: document locked' >&2; exit 1",
    );
    let report = recalculator(dir.path(), engine)
        .recalc(&document, TIMEOUT)
        .await;
    assert_eq!(
        report.error_message(),
        Some("RecalculateAndSave: document locked\n")
    );
}

#[tokio::test]
async fn test_engine_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();

    let engine = fake_engine(dir.path(), "exec sleep 60");
    let report = recalculator(dir.path(), engine)
        .recalc(&document, Duration::from_secs(1))
        .await;
    assert_eq!(
        report.error_message(),
        Some("Recalculation timed out after 1 seconds")
    );
}

#[tokio::test]
async fn test_unwritable_profile() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();
    std::fs::write(dir.path().join("profile"), b"file, not a directory").unwrap();

    let engine = fake_engine(dir.path(), "exit 0");
    let report = recalculator(dir.path(), engine)
        .recalc(&document, TIMEOUT)
        .await;
    assert_eq!(
        report.error_message(),
        Some("Failed to setup LibreOffice macro")
    );
}

#[tokio::test]
async fn test_dual_mode_embedded_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();

    let engine = fake_engine(dir.path(), "exit 0");
    let runner = DualModeRunner::new(
        recalculator(dir.path(), engine),
        StrategyConfig {
            preference: ModePreference::Auto,
            ..StrategyConfig::default()
        },
    );
    let outcome = runner.run(&document, TIMEOUT).await;
    assert_eq!(outcome.mode, ExecutionMode::Embedded);
    assert!(outcome.is_scan());
}

#[tokio::test]
async fn test_unbounded_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let document = dir.path().join("book.xlsx");
    calculated().write_to(&document).unwrap();

    let engine = fake_engine(dir.path(), "exit 0");
    let report = recalculator(dir.path(), engine)
        .try_recalc(&document, Duration::from_secs(u64::MAX))
        .await
        .unwrap();
    assert_eq!(report.total_errors, 1);
}
