//! The LibreOffice user profile and the recalculation macro installed into it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::error::{EngineError, Result};
use crate::locator::Platform;
use crate::process::{run_bounded, Invocation};

/// Name of the installed routine; its presence marks the module as installed.
pub const MACRO_ROUTINE: &str = "RecalculateAndSave";

/// File the macro module is written to, inside the `Standard` library.
pub const MACRO_MODULE_FILE: &str = "Module1.xba";

/// Upper bound for the profile-scaffolding launch.
pub const DEFAULT_BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(10);

/// StarBasic module: recalculate everything, save in place, close.
pub const MACRO_MODULE_XBA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE script:module PUBLIC "-//OpenOffice.org//DTD OfficeDocument 1.0//EN" "module.dtd">
<script:module xmlns:script="http://openoffice.org/2000/script" script:name="Module1" script:language="StarBasic">
    Sub RecalculateAndSave()
      ThisComponent.calculateAll()
      ThisComponent.store()
      ThisComponent.close(True)
    End Sub
</script:module>"#;

/// Address of a macro in LibreOffice's `vnd.sun.star.script` scheme.
///
/// The rendered URL must stay stable: it is how the engine resolves the
/// module written by [`EngineProfile::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroLocator {
    pub library: &'static str,
    pub module: &'static str,
    pub routine: &'static str,
    pub language: &'static str,
    pub location: &'static str,
}

impl MacroLocator {
    pub const RECALCULATE: MacroLocator = MacroLocator {
        library: "Standard",
        module: "Module1",
        routine: MACRO_ROUTINE,
        language: "Basic",
        location: "application",
    };
}

impl fmt::Display for MacroLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vnd.sun.star.script:{}.{}.{}?language={}&location={}",
            self.library, self.module, self.routine, self.language, self.location
        )
    }
}

/// Whether the macro module is present on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointState {
    Missing,
    /// The file exists but does not define the routine.
    Stale,
    Installed,
}

/// What [`EngineProfile::ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    AlreadyInstalled,
    /// The module was written. `bootstrapped` is set when a scaffolding
    /// launch of the engine ran to completion first.
    Installed { bootstrapped: bool },
}

#[derive(Debug, Clone)]
pub struct Provisioned {
    pub profile: EngineProfile,
    pub action: ProvisionAction,
}

/// Location of the macro library inside a LibreOffice user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineProfile {
    platform: Platform,
    config_dir: PathBuf,
    entry_point: PathBuf,
}

impl EngineProfile {
    /// Profile of the current user, under the OS configuration directory.
    pub fn for_current_user() -> Result<Self> {
        let base = directories::BaseDirs::new().ok_or(EngineError::NoConfigDir)?;
        Ok(Self::for_platform(Platform::current(), base.config_dir()))
    }

    /// Profile below `user_config_root` (`%APPDATA%`, `~/Library/Application Support`, `~/.config`).
    pub fn for_platform(platform: Platform, user_config_root: &Path) -> Self {
        let vendor = match platform {
            Platform::Windows | Platform::MacOs => "LibreOffice",
            Platform::Other => "libreoffice",
        };
        let config_dir = user_config_root
            .join(vendor)
            .join("4")
            .join("user")
            .join("basic")
            .join("Standard");
        Self::with_platform(platform, config_dir)
    }

    /// Profile whose `Standard` library lives at `config_dir`.
    pub fn rooted_at(config_dir: impl Into<PathBuf>) -> Self {
        Self::with_platform(Platform::current(), config_dir.into())
    }

    fn with_platform(platform: Platform, config_dir: PathBuf) -> Self {
        let entry_point = config_dir.join(MACRO_MODULE_FILE);
        Self {
            platform,
            config_dir,
            entry_point,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn entry_point(&self) -> &Path {
        &self.entry_point
    }

    pub fn entry_point_state(&self) -> EntryPointState {
        match std::fs::read(&self.entry_point) {
            Ok(bytes) => Self::state_of(&bytes),
            Err(_) => EntryPointState::Missing,
        }
    }

    fn state_of(bytes: &[u8]) -> EntryPointState {
        if String::from_utf8_lossy(bytes).contains(MACRO_ROUTINE) {
            EntryPointState::Installed
        } else {
            EntryPointState::Stale
        }
    }

    /// Make sure the macro module is installed, writing it if needed.
    ///
    /// An installed module is left untouched. When the config directory does
    /// not exist yet it is created and `engine` is launched once with
    /// `--terminate_after_init` so LibreOffice lays out the rest of the
    /// profile; that launch may fail without affecting the result.
    pub async fn ensure(self, engine: &Path, bootstrap_timeout: Duration) -> Result<Provisioned> {
        let state = match tokio::fs::read(&self.entry_point).await {
            Ok(bytes) => Self::state_of(&bytes),
            Err(_) => EntryPointState::Missing,
        };
        if state == EntryPointState::Installed {
            tracing::debug!("Macro already installed at {}", self.entry_point.display());
            return Ok(Provisioned {
                profile: self,
                action: ProvisionAction::AlreadyInstalled,
            });
        }

        let mut bootstrapped = false;
        if !tokio::fs::try_exists(&self.config_dir).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.config_dir)
                .await
                .map_err(EngineError::Provisioning)?;
            bootstrapped = bootstrap_profile(engine, bootstrap_timeout).await;
        }

        tokio::fs::write(&self.entry_point, MACRO_MODULE_XBA)
            .await
            .map_err(EngineError::Provisioning)?;
        tracing::info!(
            ?state,
            bootstrapped,
            "Installed recalculation macro at {}",
            self.entry_point.display()
        );

        Ok(Provisioned {
            profile: self,
            action: ProvisionAction::Installed { bootstrapped },
        })
    }
}

async fn bootstrap_profile(engine: &Path, timeout: Duration) -> bool {
    let mut cmd = Command::new(engine);
    cmd.arg("--headless").arg("--terminate_after_init");

    match run_bounded(cmd, timeout).await {
        Ok(Invocation::Completed(_)) => true,
        Ok(other) => {
            tracing::debug!("Profile bootstrap launch did not complete: {other:?}");
            false
        }
        Err(e) => {
            tracing::debug!("Profile bootstrap launch failed: {e}");
            false
        }
    }
}
