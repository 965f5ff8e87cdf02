//! Shared helpers for the LibreOffice integration tests.

use std::path::{Path, PathBuf};

/// Write an executable shell script standing in for `soffice`.
///
/// `body` runs with the same arguments soffice would receive.
#[cfg(unix)]
#[allow(dead_code)]
pub fn fake_engine(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-soffice");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake engine");
    path
}

/// Check whether a real `soffice` can be launched.
#[allow(dead_code)]
pub fn soffice_available() -> bool {
    std::process::Command::new("soffice")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Skip this test if LibreOffice is not installed.
#[macro_export]
macro_rules! skip_if_no_soffice {
    () => {
        if !common::soffice_available() {
            eprintln!(
                "SKIP: LibreOffice not available.\n\
                 Install LibreOffice and ensure 'soffice' is in PATH."
            );
            return;
        }
    };
}
