//! CLI command implementations.

mod display;

pub mod cycles;
pub mod deps;
pub mod lock;
pub mod manifest;
pub mod submodules;

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context as _, bail};
use modsplit::{Inventory, JsonListing, PackageId, Settings};

/// Options shared by every command.
pub struct Context {
    /// Repository root
    pub root: PathBuf,
    /// Module listing file, `-` for stdin
    pub modules: Option<PathBuf>,
    /// Print JSON instead of text
    pub json: bool,
    /// Scan worker override
    pub workers: Option<usize>,
    /// Staging prefix override, empty to disable normalization
    pub staging_prefix: Option<String>,
    /// Record standard-library imports instead of dropping them
    pub keep_std: bool,
}

impl Context {
    /// Settings from the repository's settings file with flag overrides applied.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load(&self.root)
            .with_context(|| format!("failed to load settings for {}", self.root.display()))?;
        if let Some(workers) = self.workers {
            settings.workers = Some(workers);
        }
        if let Some(prefix) = &self.staging_prefix {
            settings.staging_prefix.clone_from(prefix);
        }
        if self.keep_std {
            settings.skip_standard_library = false;
        }
        settings.validate().context("invalid command-line override")?;
        Ok(settings)
    }

    fn listing(&self) -> anyhow::Result<JsonListing> {
        let Some(path) = &self.modules else {
            bail!(
                "no module listing given: pass --modules FILE, or pipe `go list -json -m all` into --modules -"
            );
        };
        if path.as_os_str() == "-" {
            return Ok(JsonListing::from_reader(std::io::stdin().lock())?);
        }
        let file = File::open(path)
            .with_context(|| format!("failed to open module listing {}", path.display()))?;
        Ok(JsonListing::from_reader(file)?)
    }

    /// Load the inventory described by these options.
    pub fn inventory(&self) -> anyhow::Result<Inventory> {
        let settings = self.settings()?;
        let listing = self.listing()?;
        Inventory::load(&self.root, &listing, settings)
            .with_context(|| format!("failed to load modules of {}", self.root.display()))
    }
}

/// Parse a module path given on the command line.
fn parse_module(path: &str) -> anyhow::Result<PackageId> {
    PackageId::new(path).with_context(|| format!("invalid module path {path:?}"))
}
