//! Source scanning: one root directory in, one partial [`Graph`] out.
//!
//! The scanner walks a root recursively and treats every directory holding
//! Go compilation units as one package. Its identifier is the request's
//! package identity joined with the directory's path relative to the root.
//!
//! ## Directory rules
//!
//! | Skipped | Why |
//! |---------|-----|
//! | `skip_subdirs` entries (and everything below them) | scanned by another request, or vendored copies |
//! | `testdata`, names starting with `.` or `_` | ignored by the Go tool |
//! | symlinked directories | cycle safety; the root itself is canonicalized |
//!
//! Files named `*_test.go` are test units; their imports land in
//! [`Node::test_imports`]. Directories without any unit produce no node.

mod go;

pub use go::{GoParser, Preamble};

use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::types::{Node, PackageId};

/// One root to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Directory to walk
    pub root: PathBuf,
    /// Package identifier the root presents itself as
    pub package: PackageId,
    /// Sub-directories (relative to `root`) that are not scanned
    pub skip_subdirs: Vec<PathBuf>,
    /// Packages known to belong to this repository
    pub local_packages: Vec<PackageId>,
}

impl ScanRequest {
    /// Create a request with no exclusions and no local packages.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, package: PackageId) -> Self {
        Self {
            root: root.into(),
            package,
            skip_subdirs: Vec::new(),
            local_packages: Vec::new(),
        }
    }

    /// Exclude a sub-directory, given relative to the root.
    #[must_use]
    pub fn skip_subdir(mut self, rel: impl Into<PathBuf>) -> Self {
        self.skip_subdirs.push(rel.into());
        self
    }

    /// Declare packages that belong to this repository.
    #[must_use]
    pub fn with_local_packages(mut self, local: impl IntoIterator<Item = PackageId>) -> Self {
        self.local_packages.extend(local);
        self
    }

    /// Whether a path relative to the root falls under an excluded sub-directory.
    fn is_excluded(&self, rel: &Path) -> bool {
        self.skip_subdirs.iter().any(|skip| {
            let skip: PathBuf = skip
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect();
            // An empty entry would exclude the whole root.
            !skip.as_os_str().is_empty() && rel.starts_with(&skip)
        })
    }

    /// Whether an import names a standard-library package from this root's point of view.
    ///
    /// Remote import paths carry a dot in their first segment. Dotless paths
    /// are standard library unless they belong to this root or to one of its
    /// local packages.
    fn is_standard_library(&self, import: &PackageId) -> bool {
        !import.first_segment().contains('.')
            && !import.is_within(&self.package)
            && !self.local_packages.iter().any(|local| import.is_within(local))
    }
}

/// Scanner behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Drop standard-library imports instead of recording them as leaves
    pub skip_standard_library: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            skip_standard_library: true,
        }
    }
}

/// Extracts import edges from the Go packages under a root.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner {
    options: ScanOptions,
}

/// Mutable state threaded through one scan.
struct ScanState<'r> {
    request: &'r ScanRequest,
    root: PathBuf,
    parser: GoParser,
    graph: Graph,
    units: usize,
}

impl Scanner {
    /// Create a scanner with the given options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// The scanner's options.
    #[must_use]
    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Scan one root into a partial graph.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the root or any directory below it cannot be read,
    /// [`Error::Parse`] when any compilation unit's preamble is malformed.
    /// Either aborts the whole scan.
    pub fn scan(&self, request: &ScanRequest) -> Result<Graph> {
        let start = Instant::now();
        let root = request
            .root
            .canonicalize()
            .map_err(|e| Error::io(&request.root, e))?;

        let mut state = ScanState {
            request,
            root: root.clone(),
            parser: GoParser::new()?,
            graph: Graph::new(),
            units: 0,
        };
        self.walk_dir(&mut state, &root)?;

        debug!(
            root = %root.display(),
            package = %request.package,
            packages = state.graph.len(),
            units = state.units,
            elapsed = ?start.elapsed(),
            "Scanned root"
        );

        Ok(state.graph)
    }

    /// Record the package in `dir`, then recurse into its sub-directories.
    fn walk_dir(&self, state: &mut ScanState<'_>, dir: &Path) -> Result<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

        let mut subdirs = Vec::new();
        let mut files = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir, e))?;
            let path = entry.path();

            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "Skipping entry with non-UTF-8 name");
                continue;
            };
            let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;

            if file_type.is_dir() {
                if is_ignored_dir_name(name) {
                    trace!(directory = %path.display(), "Skipping ignored directory");
                    continue;
                }
                if state.request.is_excluded(relative_to(&state.root, &path)) {
                    trace!(directory = %path.display(), "Skipping excluded directory");
                    continue;
                }
                subdirs.push(path);
            } else if is_go_source(name) && (file_type.is_file() || path.is_file()) {
                files.push(path);
            }
        }

        files.sort();
        subdirs.sort();

        if !files.is_empty() {
            self.record_package(state, dir, &files)?;
        }

        for sub in subdirs {
            self.walk_dir(state, &sub)?;
        }

        Ok(())
    }

    /// Parse every unit in one directory and record the package node.
    fn record_package(&self, state: &mut ScanState<'_>, dir: &Path, files: &[PathBuf]) -> Result<()> {
        let mut node = Node::new();
        let mut has_units = false;

        for file in files {
            let preamble = state.parser.parse_file(file)?;
            if preamble.ignored {
                trace!(file = %file.display(), "Skipping file excluded by build constraint");
                continue;
            }
            has_units = true;
            state.units += 1;

            let is_test = file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_test_file);

            for raw in &preamble.imports {
                let import = PackageId::new(raw.as_str())
                    .map_err(|_| Error::parse(file, format!("invalid import path {raw:?}")))?;
                if self.options.skip_standard_library && state.request.is_standard_library(&import)
                {
                    continue;
                }
                if is_test {
                    node.test_imports.insert(import);
                } else {
                    node.imports.insert(import);
                }
            }
        }

        if has_units {
            let id = package_id_for(&state.request.package, relative_to(&state.root, dir))?;
            state.graph.insert(id, node);
        }
        Ok(())
    }
}

/// Derive a package identifier from the root identity and a relative directory.
fn package_id_for(package: &PackageId, rel: &Path) -> Result<PackageId> {
    let segments: Vec<&str> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    package.join(&segments.join("/"))
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn is_ignored_dir_name(name: &str) -> bool {
    name == "testdata" || name.starts_with('.') || name.starts_with('_')
}

fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.starts_with('.') && !name.starts_with('_')
}

fn is_test_file(name: &str) -> bool {
    name.ends_with("_test.go")
}
