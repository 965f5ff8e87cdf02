//! Finding the `soffice` executable.

use std::path::{Path, PathBuf};

/// Bare executable name resolved through `PATH`.
pub const SOFFICE: &str = "soffice";

const WINDOWS_CANDIDATES: &[&str] = &[
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
];

const MACOS_CANDIDATES: &[&str] = &["/Applications/LibreOffice.app/Contents/MacOS/soffice"];

/// Operating system family, as far as LibreOffice's layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Other
        }
    }

    /// Well-known install locations, checked in order.
    pub fn install_candidates(self) -> &'static [&'static str] {
        match self {
            Platform::Windows => WINDOWS_CANDIDATES,
            Platform::MacOs => MACOS_CANDIDATES,
            Platform::Other => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Other => "other",
        }
    }
}

/// A checked install location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub exists: bool,
}

/// Resolves the engine executable. Never fails: a missing engine only shows
/// up when it is launched.
#[derive(Debug, Clone)]
pub struct EngineLocator {
    explicit: Option<PathBuf>,
    candidates: Vec<PathBuf>,
}

impl EngineLocator {
    /// Locator for the current platform. An explicit path bypasses the search.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        let candidates = Platform::current()
            .install_candidates()
            .iter()
            .map(PathBuf::from)
            .collect();
        Self {
            explicit,
            candidates,
        }
    }

    /// Locator searching a custom candidate list.
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            explicit: None,
            candidates,
        }
    }

    pub fn explicit(&self) -> Option<&Path> {
        self.explicit.as_deref()
    }

    /// The first existing candidate, else the bare `soffice` name.
    pub fn locate(&self) -> PathBuf {
        if let Some(path) = &self.explicit {
            return path.clone();
        }
        self.candidates
            .iter()
            .find(|p| p.exists())
            .cloned()
            .unwrap_or_else(|| PathBuf::from(SOFFICE))
    }

    /// Every candidate with whether it exists right now.
    pub fn survey(&self) -> Vec<Candidate> {
        self.candidates
            .iter()
            .map(|path| Candidate {
                path: path.clone(),
                exists: path.exists(),
            })
            .collect()
    }
}

impl Default for EngineLocator {
    fn default() -> Self {
        Self::new(None)
    }
}
