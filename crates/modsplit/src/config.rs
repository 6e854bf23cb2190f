//! Configuration management for modsplit.
//!
//! Settings live in an optional `.modsplit.yaml` at the repository root.
//! Every field has a default, so an absent file and an empty file behave the
//! same. Command-line flags override file values.

use std::path::{Path, PathBuf};

use modsplit_graph::ScanOptions;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the settings file at the repository root
pub const SETTINGS_FILE_NAME: &str = ".modsplit.yaml";

/// Default staging prefix stripped from package identifiers
pub const DEFAULT_STAGING_PREFIX: &str = "k8s.io/kubernetes/staging/src/";

/// Default vendored-code directory
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Default tools file
pub const DEFAULT_TOOLS_FILE: &str = "tools.go";

/// Settings for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Prefix stripped from every identifier before closure queries.
    /// Empty disables normalization.
    pub staging_prefix: String,

    /// Vendored-code directory excluded from every scan, relative to each root
    pub vendor_dir: PathBuf,

    /// File listing tool imports, relative to the repository root
    pub tools_file: PathBuf,

    /// Concurrent scans; unset uses one per CPU
    pub workers: Option<usize>,

    /// Drop standard-library imports while scanning
    pub skip_standard_library: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            staging_prefix: DEFAULT_STAGING_PREFIX.to_string(),
            vendor_dir: PathBuf::from(DEFAULT_VENDOR_DIR),
            tools_file: PathBuf::from(DEFAULT_TOOLS_FILE),
            workers: None,
            skip_standard_library: true,
        }
    }
}

impl Settings {
    /// Load settings for the repository at `root`, falling back to defaults
    /// when no settings file exists.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file exists but cannot be read, [`Error::Config`]
    /// if it is not valid YAML or fails validation.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SETTINGS_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let settings = Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from YAML text.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on malformed YAML or invalid values.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check invariants not expressed by the types.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if !self.staging_prefix.is_empty() && !self.staging_prefix.ends_with('/') {
            return Err(Error::Config(format!(
                "staging_prefix must end with '/': {:?}",
                self.staging_prefix
            )));
        }
        for (name, path) in [("vendor_dir", &self.vendor_dir), ("tools_file", &self.tools_file)] {
            if path.is_absolute() || path.as_os_str().is_empty() {
                return Err(Error::Config(format!(
                    "{name} must be a non-empty relative path: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// Scanner options derived from these settings.
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            skip_standard_library: self.skip_standard_library,
        }
    }
}
