//! Manifest records derived from the inventory.
//!
//! Two records are produced:
//!
//! - [`ModuleManifest`]: what a split-out submodule's `go.mod` must declare.
//!   Sibling submodules it imports from are required and replaced by their
//!   relative directory. External modules are required at the main
//!   module's versions.
//! - [`PackageLock`]: a `Godeps.json`-shaped lock for the main module,
//!   listing only the sub-packages the main module actually uses.
//!
//! Rendering these to files is left to the caller. Both serialize with serde.

use std::path::{Component, Path, PathBuf};

use modsplit_graph::PackageId;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::inventory::Inventory;
use crate::module::Module;

/// A module requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    /// Module path
    pub path: PackageId,
    /// Version, absent when the listing carries none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A `replace` pointing a sibling module at its directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replace {
    /// Module path
    pub path: PackageId,
    /// Version being replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Directory relative to the manifest's module, always starting with `.`
    pub target: PathBuf,
}

/// Requirements of one submodule once split from the main module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleManifest {
    /// The submodule
    pub module: PackageId,
    /// The main module's manifest, relative to the submodule's directory
    pub generated_from: PathBuf,
    /// Sibling submodules imported from, sorted by path
    pub requires: Vec<Requirement>,
    /// Local replacements for `requires`, same order
    pub replaces: Vec<Replace>,
    /// External dependencies the module transitively imports from, sorted by path
    pub external: Vec<Requirement>,
}

impl ModuleManifest {
    /// Compute the manifest for `target`.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] if `target` is unknown or a needed directory is
    /// missing from the listing, otherwise as [`Inventory::graph`].
    pub fn for_module(inventory: &Inventory, target: &PackageId) -> Result<Self> {
        let this = inventory
            .module(target.as_str())
            .ok_or_else(|| Error::Resolution(format!("unknown module {target}")))?;
        let this_dir = module_dir(this)?;

        let main_go_mod = inventory.main_module().go_mod.as_deref().ok_or_else(|| {
            Error::Resolution(format!(
                "main module {} has no go.mod",
                inventory.main_module().path
            ))
        })?;
        let generated_from = relative_path(this_dir, main_go_mod)?;

        // submodules_for yields modules in path order.
        let siblings = inventory.submodules_for(target)?;
        let mut requires = Vec::with_capacity(siblings.len());
        let mut replaces = Vec::with_capacity(siblings.len());
        for sibling in siblings {
            let target_dir = relative_path(this_dir, module_dir(sibling)?)?;
            requires.push(Requirement::of(sibling));
            replaces.push(Replace {
                path: sibling.path.clone(),
                version: sibling.version.clone(),
                target: dot_prefixed(target_dir),
            });
        }

        let external = inventory
            .external_dependencies_for(target)?
            .into_iter()
            .map(Requirement::of)
            .collect();

        debug!(module = %target, requires = requires.len(), "Computed module manifest");

        Ok(Self {
            module: target.clone(),
            generated_from,
            requires,
            replaces,
            external,
        })
    }
}

impl Requirement {
    fn of(module: &Module) -> Self {
        Self {
            path: module.path.clone(),
            version: module.version.clone(),
        }
    }
}

/// One locked package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LockedPackage {
    /// Full import path of the package
    pub import_path: String,
    /// Module version, when the revision does not already spell it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Commit the package is locked at
    pub rev: String,
}

/// Lock of the packages the main module uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageLock {
    /// Main module path
    pub import_path: PackageId,
    /// Tool packages built alongside the module
    pub packages: Vec<String>,
    /// Locked packages, sorted by import path
    pub deps: Vec<LockedPackage>,
}

impl PackageLock {
    /// Compute the lock for the main module.
    ///
    /// Every non-main module contributes only the sub-packages found in the
    /// main module's closure. Submodules are locked at
    /// [`LOCAL_REVISION`](crate::module::LOCAL_REVISION).
    ///
    /// # Errors
    ///
    /// As [`Inventory::graph`], [`Inventory::tools`] and [`Module::revision`].
    pub fn for_main_module(inventory: &Inventory) -> Result<Self> {
        let packages = inventory.tools()?;
        let used = inventory.locked_sub_packages()?;

        let mut deps = Vec::new();
        for (path, subs) in &used {
            let Some(module) = inventory.module(path.as_str()) else {
                continue;
            };
            let rev = module.revision()?;
            let comment = version_comment(module.version.as_deref(), &rev);
            for sub in subs {
                deps.push(LockedPackage {
                    import_path: path.join(sub)?.to_string(),
                    comment: comment.clone(),
                    rev: rev.clone(),
                });
            }
        }
        deps.sort_by(|a, b| a.import_path.cmp(&b.import_path));

        Ok(Self {
            import_path: inventory.main_module().path.clone(),
            packages,
            deps,
        })
    }
}

/// The version, unless it already ends with the revision's short hash.
fn version_comment(version: Option<&str>, rev: &str) -> Option<String> {
    let short = rev.get(..12).unwrap_or(rev);
    version
        .filter(|v| !v.ends_with(short))
        .map(str::to_string)
}

fn module_dir(module: &Module) -> Result<&Path> {
    module
        .source_dir()
        .ok_or_else(|| Error::Resolution(format!("module {} has no directory", module.path)))
}

/// Lexical path from directory `from` to `to`.
///
/// Both must be absolute, or both relative to the same base.
///
/// # Errors
///
/// [`Error::Resolution`] when one path is absolute and the other is not, or
/// `from` contains `..` (which cannot be resolved lexically).
pub fn relative_path(from: &Path, to: &Path) -> Result<PathBuf> {
    if from.is_absolute() != to.is_absolute()
        || from.components().any(|c| c == Component::ParentDir)
    {
        return Err(Error::Resolution(format!(
            "cannot express {} relative to {}",
            to.display(),
            from.display()
        )));
    }

    let from: Vec<Component<'_>> = from.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component<'_>> = to.components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push(Component::ParentDir);
    }
    for component in &to[common..] {
        rel.push(component);
    }
    if rel.as_os_str().is_empty() {
        rel.push(Component::CurDir);
    }
    Ok(rel)
}

/// Prefix `./` unless the path already starts with `.`.
fn dot_prefixed(rel: PathBuf) -> PathBuf {
    if rel.to_string_lossy().starts_with('.') {
        rel
    } else {
        Path::new(".").join(rel)
    }
}
