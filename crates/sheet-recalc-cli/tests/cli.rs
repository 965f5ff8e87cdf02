//! Running the `sheet-recalc` binary.

use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;
use sheet_recalc_xlsx::fixture::{CachedValue, XlsxFixture};

fn sheet_recalc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sheet-recalc"))
        .args(args)
        .output()
        .expect("run sheet-recalc")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn write_book(dir: &Path) -> String {
    let path = dir.join("book.xlsx");
    XlsxFixture::new()
        .sheet("Data", |s| {
            s.number("A1", 1.0)
                .formula_with("B1", "=A1/0", Some(CachedValue::Error("#DIV/0!".into())));
        })
        .sheet("Notes", |s| {
            s.text("A1", "ok");
        })
        .write_to(&path)
        .unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let book = write_book(dir.path());

    let output = sheet_recalc(&["inspect", &book]);
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"sheets": ["Data", "Notes"], "total_formulas": 1})
    );
}

#[test]
fn test_recalc_missing_file_prints_error_report() {
    let output = sheet_recalc(&["recalc", "definitely-missing.xlsx", "5"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"error": "File definitely-missing.xlsx does not exist"})
    );
}

#[test]
fn test_usage_error_exits_two() {
    let output = sheet_recalc(&["recalc"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[cfg(unix)]
mod with_fake_engine {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::PermissionsExt;

    fn fake_engine(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-soffice");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_recalc_reports_errors_found() {
        let dir = tempfile::tempdir().unwrap();
        let book = write_book(dir.path());
        let engine = fake_engine(dir.path(), "exit 0");
        let profile = dir.path().join("profile");

        let output = sheet_recalc(&[
            "--soffice",
            &engine,
            "--profile-dir",
            &profile.to_string_lossy(),
            "recalc",
            &book,
        ]);
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(
            stdout_json(&output),
            serde_json::json!({
                "status": "errors_found",
                "total_errors": 1,
                "error_summary": {"#DIV/0!": {"count": 1, "locations": ["Data!B1"]}},
                "total_formulas": 1
            })
        );
    }

    #[test]
    fn test_diagnose_external_mode() {
        let dir = tempfile::tempdir().unwrap();
        let book = write_book(dir.path());
        let engine = fake_engine(dir.path(), "exit 0");
        let profile = dir.path().join("profile");

        let output = sheet_recalc(&[
            "--soffice",
            &engine,
            "--profile-dir",
            &profile.to_string_lossy(),
            "diagnose",
            &book,
            "--mode",
            "external",
            "--timeout",
            "10",
        ]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

        let report = stdout_json(&output);
        assert_eq!(report["document"]["exists"], true);
        assert_eq!(report["engine"]["resolved"], engine.as_str());
        assert_eq!(report["workbook"]["sheets"], serde_json::json!(["Data", "Notes"]));
        assert_eq!(report["recalc"]["mode"], "external");
        assert_eq!(report["recalc"]["inprocess_error"], "embedded execution disabled");
        assert_eq!(report["recalc"]["result"]["total_errors"], 1);
        assert_eq!(report["recalc"]["run"]["returncode"], 0);
    }

    #[test]
    fn test_macro_failure_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let book = write_book(dir.path());
        let engine = fake_engine(dir.path(), "echo 'BASIC runtime error: Module1' >&2; exit 1");
        let profile = dir.path().join("profile");

        let output = sheet_recalc(&[
            "--soffice",
            &engine,
            "--profile-dir",
            &profile.to_string_lossy(),
            "recalc",
            &book,
        ]);
        assert_eq!(output.status.code(), Some(1));
        assert_eq!(
            stdout_json(&output),
            serde_json::json!({"error": "LibreOffice macro not configured properly"})
        );
    }
}
