//! Launching the recalculation macro against a document.

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{EngineError, Result};
use crate::process::{run_bounded, Invocation, ProcessOutput};
use crate::profile::MacroLocator;

const UNKNOWN_FAILURE: &str = "Unknown error during recalculation";

/// `soffice --headless --norestore <macro-url> <document>`
pub fn recalc_command(engine: &Path, document: &Path) -> Command {
    let mut cmd = Command::new(engine);
    cmd.arg("--headless")
        .arg("--norestore")
        .arg(MacroLocator::RECALCULATE.to_string())
        .arg(document);
    cmd
}

/// Run the macro on `document` (which should be absolute), waiting at most `timeout`.
pub async fn invoke(engine: &Path, document: &Path, timeout: Duration) -> Result<Invocation> {
    tracing::info!(
        "Recalculating {} with {}",
        document.display(),
        engine.display()
    );
    run_bounded(recalc_command(engine, document), timeout)
        .await
        .map_err(EngineError::SpawnFailed)
}

/// Turn an invocation into success or the matching failure.
pub fn classify(invocation: Invocation, timeout: Duration) -> Result<ProcessOutput> {
    match invocation {
        Invocation::NotFound => Err(EngineError::NotFound),
        Invocation::TimedOut => Err(EngineError::Timeout(timeout.as_secs())),
        Invocation::Completed(output) if output.success() => Ok(output),
        Invocation::Completed(output) => {
            let message = if output.stderr.is_empty() {
                UNKNOWN_FAILURE.to_string()
            } else {
                output.stderr
            };
            if stderr_indicates_missing_macro(&message) {
                Err(EngineError::MacroNotConfigured)
            } else {
                Err(EngineError::ExecutionFailed(message))
            }
        }
    }
}

/// Guess from a failed run's stderr whether the macro could not be resolved.
///
/// Plain substring matching: any message that mentions `Module1`, or that
/// does not mention the routine at all, counts as a missing macro. That
/// sweeps in unrelated failures whose text omits the routine name. Replace
/// this with a structured status if the engine ever reports one.
pub fn stderr_indicates_missing_macro(message: &str) -> bool {
    message.contains(MacroLocator::RECALCULATE.module)
        || !message.contains(MacroLocator::RECALCULATE.routine)
}
