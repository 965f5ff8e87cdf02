//! Engine configuration and the handle tying lookup, profile and launch together.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::invoker;
use crate::locator::EngineLocator;
use crate::process::{Invocation, ProcessOutput};
use crate::profile::{EngineProfile, Provisioned, DEFAULT_BOOTSTRAP_TIMEOUT};

/// Configuration for driving LibreOffice.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the `soffice` executable. If None, searches install locations, then PATH.
    pub soffice_path: Option<PathBuf>,
    /// Directory holding the `Standard` macro library. If None, uses the
    /// current user's LibreOffice profile.
    pub profile_dir: Option<PathBuf>,
    /// Bound for the one-off launch that scaffolds a fresh profile. Default: 10 seconds.
    pub bootstrap_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            soffice_path: None,
            profile_dir: None,
            bootstrap_timeout: DEFAULT_BOOTSTRAP_TIMEOUT,
        }
    }
}

/// Handle for recalculating documents with one LibreOffice installation.
#[derive(Debug, Clone)]
pub struct LibreOfficeEngine {
    config: EngineConfig,
    locator: EngineLocator,
}

impl LibreOfficeEngine {
    pub fn new(config: EngineConfig) -> Self {
        let locator = EngineLocator::new(config.soffice_path.clone());
        Self { config, locator }
    }

    pub fn locator(&self) -> &EngineLocator {
        &self.locator
    }

    /// The executable to launch.
    pub fn locate(&self) -> PathBuf {
        self.locator.locate()
    }

    /// The profile the macro is installed into.
    pub fn profile(&self) -> Result<EngineProfile> {
        match &self.config.profile_dir {
            Some(dir) => Ok(EngineProfile::rooted_at(dir.clone())),
            None => EngineProfile::for_current_user(),
        }
    }

    /// Install the macro if needed.
    pub async fn provision(&self, engine: &Path) -> Result<Provisioned> {
        self.profile()?
            .ensure(engine, self.config.bootstrap_timeout)
            .await
    }

    /// Launch the macro on `document` without interpreting the result.
    pub async fn invoke(
        &self,
        engine: &Path,
        document: &Path,
        timeout: Duration,
    ) -> Result<Invocation> {
        invoker::invoke(engine, document, timeout).await
    }

    /// Provision, launch and classify in one go.
    pub async fn recalculate(&self, document: &Path, timeout: Duration) -> Result<ProcessOutput> {
        let engine = self.locate();
        self.provision(&engine).await?;
        let invocation = self.invoke(&engine, document, timeout).await?;
        invoker::classify(invocation, timeout)
    }
}

impl Default for LibreOfficeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
