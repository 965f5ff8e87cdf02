//! Tests against a real LibreOffice installation.
//!
//! Skipped unless `soffice --version` succeeds. The macro is installed into
//! the real user profile, since that is where the macro URL resolves.

mod common;

use std::time::Duration;

use sheet_recalc_libreoffice::{EngineConfig, EntryPointState, LibreOfficeEngine};

#[tokio::test]
async fn test_provision_real_profile() {
    skip_if_no_soffice!();

    let engine = LibreOfficeEngine::new(EngineConfig::default());
    let soffice = engine.locate();
    let provisioned = engine.provision(&soffice).await.expect("provision");
    assert_eq!(
        provisioned.profile.entry_point_state(),
        EntryPointState::Installed
    );
}

#[tokio::test]
async fn test_missing_document_is_reported_by_engine() {
    skip_if_no_soffice!();

    let dir = tempfile::tempdir().unwrap();
    let engine = LibreOfficeEngine::new(EngineConfig::default());
    // LibreOffice reports unopenable documents in various ways; the call must
    // still come back within the timeout.
    let started = std::time::Instant::now();
    let _ = engine
        .recalculate(&dir.path().join("missing.xlsx"), Duration::from_secs(60))
        .await;
    assert!(started.elapsed() < Duration::from_secs(70));
}
