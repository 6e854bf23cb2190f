//! Module records from the toolchain's module listing.
//!
//! The listing is the stream of JSON objects printed by
//! `go list -json -m all`, one object per module:
//!
//! ```json
//! {"Path": "k8s.io/kubernetes", "Main": true, "Dir": "/src/k8s", "GoMod": "/src/k8s/go.mod"}
//! {"Path": "k8s.io/api", "Version": "v0.0.0",
//!  "Replace": {"Path": "./staging/src/k8s.io/api", "Dir": "/src/k8s/staging/src/k8s.io/api"}}
//! ```
//!
//! Obtaining the listing (running the toolchain) is the caller's concern;
//! [`JsonListing`] only decodes it.

use std::io::Read;
use std::path::{Path, PathBuf};

use modsplit_graph::PackageId;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Revision recorded for modules that live in the repository itself.
pub const LOCAL_REVISION: &str = "xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

/// One module as reported by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Module {
    /// Module path
    pub path: PackageId,
    /// Selected version (absent for the main module)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Whether this is the main module
    #[serde(default)]
    pub main: bool,
    /// Version timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Replacement, if the module is replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<Replacement>,
    /// Directory holding the module's files, if downloaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Path to the module's `go.mod` (or cached `.mod` file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_mod: Option<PathBuf>,
}

/// The target of a `replace` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Replacement {
    /// Replacement path: a module path, or a filesystem path for local replacements
    pub path: String,
    /// Replacement version (absent for filesystem replacements)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Version timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Directory holding the replacement's files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// Path to the replacement's `go.mod`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go_mod: Option<PathBuf>,
}

/// Contents of a cached `<version>.info` file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ModInfo {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl Module {
    /// Whether the module is replaced by a directory on the local filesystem.
    ///
    /// These are the sub-modules embedded in the repository.
    #[must_use]
    pub fn is_local_replacement(&self) -> bool {
        self.replace.as_ref().is_some_and(|r| {
            r.path.starts_with('.') || Path::new(&r.path).is_absolute()
        })
    }

    /// Directory whose sources make up this module: the replacement's
    /// directory when replaced, the module's own otherwise.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        self.replace
            .as_ref()
            .and_then(|r| r.dir.as_deref())
            .or(self.dir.as_deref())
    }

    /// The commit this module resolves to.
    ///
    /// Read from the `.info` file cached next to the module's `.mod` file.
    /// Local replacements have no commit and get [`LOCAL_REVISION`].
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] when the module has no `.mod` file or the info
    /// file records neither a revision nor a version, [`Error::Io`] when the
    /// info file cannot be read, [`Error::Toolchain`] when it is malformed.
    pub fn revision(&self) -> Result<String> {
        if self.is_local_replacement() {
            return Ok(LOCAL_REVISION.to_string());
        }

        let mod_file = self
            .replace
            .as_ref()
            .and_then(|r| r.go_mod.as_deref())
            .or(self.go_mod.as_deref())
            .ok_or_else(|| {
                Error::Resolution(format!("module {} has no cached .mod file", self.path))
            })?;
        let info_file = mod_file.with_extension("info");

        let content =
            std::fs::read_to_string(&info_file).map_err(|e| Error::io(&info_file, e))?;
        let info: ModInfo = serde_json::from_str(&content).map_err(|e| {
            Error::Toolchain(format!("malformed {}: {e}", info_file.display()))
        })?;

        // Proxy-era info files carry only the version.
        info.name
            .filter(|name| !name.is_empty())
            .or(info.version)
            .ok_or_else(|| {
                Error::Resolution(format!("no revision recorded in {}", info_file.display()))
            })
    }
}

/// Source of module records.
pub trait ModuleSource {
    /// All modules of the build, main module included.
    ///
    /// # Errors
    ///
    /// [`Error::Toolchain`] when the listing cannot be produced or decoded.
    fn list_modules(&self) -> Result<Vec<Module>>;
}

/// A module listing already captured as text.
#[derive(Debug, Clone)]
pub struct JsonListing {
    text: String,
}

impl JsonListing {
    /// Wrap listing output.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Capture a listing from a reader, e.g. a file or stdin.
    ///
    /// # Errors
    ///
    /// [`Error::Toolchain`] when the reader fails.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|e| Error::Toolchain(format!("cannot read module listing: {e}")))?;
        Ok(Self { text })
    }
}

impl ModuleSource for JsonListing {
    fn list_modules(&self) -> Result<Vec<Module>> {
        serde_json::Deserializer::from_str(&self.text)
            .into_iter::<Module>()
            .map(|record| {
                record.map_err(|e| Error::Toolchain(format!("malformed module listing: {e}")))
            })
            .collect()
    }
}

impl ModuleSource for Vec<Module> {
    fn list_modules(&self) -> Result<Vec<Module>> {
        Ok(self.clone())
    }
}
