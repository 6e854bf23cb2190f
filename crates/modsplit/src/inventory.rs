//! The module inventory: known modules plus the dependency graph built over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  module listing ──► Inventory ──► scan requests              │
//! │                                        │                     │
//! │                     MultiRootBuilder ◄─┘                     │
//! │                            │                                 │
//! │                 normalize staging prefix                     │
//! │                            │                                 │
//! │               cached Graph ──► closure queries               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scan requests are ingested in a fixed order: submodules first, then the
//! main module (which supersedes them for any identifier they share), then
//! external modules that have an on-disk directory.
//!
//! The graph is built on the first query that needs it and cached for the
//! lifetime of the inventory. There is no invalidation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use modsplit_graph::{GoParser, Graph, MultiRootBuilder, PackageId, ScanRequest};
use once_cell::sync::OnceCell;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, info, trace, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::module::{Module, ModuleSource};

/// Known modules of one repository and the queries over their import graph.
#[derive(Debug)]
pub struct Inventory {
    root: PathBuf,
    modules: BTreeMap<PackageId, Module>,
    main: PackageId,
    settings: Settings,
    graph: OnceCell<Graph>,
}

impl Inventory {
    /// Build an inventory for the repository at `root`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if `root` cannot be resolved, [`Error::Toolchain`] if the
    /// modules contain no main module or more than one, [`Error::Config`] for
    /// invalid settings.
    pub fn new(
        root: impl AsRef<Path>,
        modules: impl IntoIterator<Item = Module>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| Error::io(root, e))?;

        let mut by_path = BTreeMap::new();
        let mut main: Option<PackageId> = None;
        for module in modules {
            if module.main {
                if let Some(existing) = main.as_ref().filter(|m| **m != module.path) {
                    return Err(Error::Toolchain(format!(
                        "module listing has more than one main module: {existing}, {}",
                        module.path
                    )));
                }
                main = Some(module.path.clone());
            }
            if let Some(previous) = by_path.insert(module.path.clone(), module) {
                warn!(module = %previous.path, "Module listed twice; keeping the last record");
            }
        }
        let main =
            main.ok_or_else(|| Error::Toolchain("module listing has no main module".to_string()))?;

        info!(modules = by_path.len(), main = %main, "Loaded module inventory");

        Ok(Self {
            root,
            modules: by_path,
            main,
            settings,
            graph: OnceCell::new(),
        })
    }

    /// Build an inventory from a module source.
    ///
    /// # Errors
    ///
    /// Propagates the source's error, then as [`Inventory::new`].
    pub fn load(
        root: impl AsRef<Path>,
        source: &impl ModuleSource,
        settings: Settings,
    ) -> Result<Self> {
        Self::new(root, source.list_modules()?, settings)
    }

    /// Canonical repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// All modules, sorted by path.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Look up a module by path.
    #[must_use]
    pub fn module(&self, path: &str) -> Option<&Module> {
        PackageId::new(path)
            .ok()
            .and_then(|id| self.modules.get(&id))
    }

    /// The main module.
    #[must_use]
    pub fn main_module(&self) -> &Module {
        &self.modules[&self.main]
    }

    /// Third-party modules: not the main module and not replaced locally.
    #[must_use]
    pub fn external_dependencies(&self) -> Vec<&Module> {
        self.modules
            .values()
            .filter(|m| !m.main && !m.is_local_replacement())
            .collect()
    }

    /// Modules embedded in the repository (replaced by a local directory).
    #[must_use]
    pub fn submodules(&self) -> Vec<&Module> {
        self.modules
            .values()
            .filter(|m| m.is_local_replacement())
            .collect()
    }

    /// Scan requests in ingestion order.
    ///
    /// Every request knows the in-repository module paths, so imports between
    /// modules with dotless paths are never mistaken for standard library.
    #[must_use]
    pub fn scan_requests(&self) -> Vec<ScanRequest> {
        let vendor = &self.settings.vendor_dir;
        let submodules = self.submodules();
        let local_packages: Vec<PackageId> = submodules
            .iter()
            .map(|m| m.path.clone())
            .chain(std::iter::once(self.main.clone()))
            .collect();
        let request = |dir: &Path, package: &PackageId| {
            ScanRequest::new(dir, package.clone())
                .with_local_packages(local_packages.iter().cloned())
        };

        let mut requests = Vec::new();
        let mut nested_dirs = Vec::new();

        for module in submodules {
            let Some(dir) = module.source_dir() else {
                warn!(module = %module.path, "Submodule has no directory; not scanned");
                continue;
            };
            if let Some(rel) = self.relative_to_root(dir) {
                nested_dirs.push(rel);
            }
            requests.push(request(dir, &module.path).skip_subdir(vendor));
        }

        let mut main = request(&self.root, &self.main);
        for rel in nested_dirs {
            main = main.skip_subdir(rel);
        }
        requests.push(main.skip_subdir(vendor));

        for module in self.external_dependencies() {
            match module.source_dir() {
                Some(dir) => requests.push(request(dir, &module.path).skip_subdir(vendor)),
                None => debug!(module = %module.path, "External module not downloaded; treated as a leaf"),
            }
        }

        requests
    }

    /// The merged, normalized dependency graph. Built on first call.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] if any scan fails. A failed build is not cached.
    pub fn graph(&self) -> Result<&Graph> {
        self.graph.get_or_try_init(|| self.build_graph())
    }

    fn build_graph(&self) -> Result<Graph> {
        let mut builder = MultiRootBuilder::new()
            .with_options(self.settings.scan_options())
            .with_workers(self.settings.workers);
        for request in self.scan_requests() {
            builder.ingest(request);
        }

        let merged = builder.full_dependency_graph()?;
        let graph = self.normalize(&merged);

        info!(
            roots = builder.requests().len(),
            packages = graph.len(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );
        Ok(graph)
    }

    /// Strip the staging prefix from every identifier.
    fn normalize(&self, graph: &Graph) -> Graph {
        let prefix = self.settings.staging_prefix.as_str();
        if prefix.is_empty() {
            return graph.clone();
        }
        graph.normalize(|id| id.strip_prefix(prefix).unwrap_or_else(|| id.clone()))
    }

    /// Packages reachable from any package of the main module.
    ///
    /// # Errors
    ///
    /// As [`Inventory::graph`].
    pub fn dependencies(&self) -> Result<BTreeSet<PackageId>> {
        debug!(module = %self.main, "Computing dependencies");
        self.module_closure(&self.main)
    }

    /// Sub-packages of each external module that the main module actually uses.
    ///
    /// Keys are module paths; values are paths relative to the module, with
    /// `""` standing for the module's root package. Modules with no used
    /// package are absent.
    ///
    /// # Errors
    ///
    /// As [`Inventory::graph`].
    pub fn sub_packages(&self) -> Result<BTreeMap<PackageId, BTreeSet<String>>> {
        self.prune(|m| !m.main && !m.is_local_replacement())
    }

    /// As [`Inventory::sub_packages`], but over every non-main module,
    /// submodules included.
    pub(crate) fn locked_sub_packages(&self) -> Result<BTreeMap<PackageId, BTreeSet<String>>> {
        self.prune(|m| !m.main)
    }

    fn prune(
        &self,
        include: impl Fn(&Module) -> bool,
    ) -> Result<BTreeMap<PackageId, BTreeSet<String>>> {
        let deps = self.dependencies()?;
        let mut pruned: BTreeMap<PackageId, BTreeSet<String>> = BTreeMap::new();
        let mut unresolved = 0_usize;

        for dep in &deps {
            match self.owning_module(dep) {
                Some(owner) if include(owner) => {
                    let sub = dep.strip_module(&owner.path).unwrap_or_default();
                    pruned
                        .entry(owner.path.clone())
                        .or_default()
                        .insert(sub.to_string());
                }
                Some(_) => {}
                None => {
                    unresolved += 1;
                    trace!(package = %dep, "No known module provides package");
                }
            }
        }

        if unresolved > 0 {
            debug!(unresolved, "Dependencies outside every known module were omitted");
        }
        Ok(pruned)
    }

    /// Submodules, other than `target`, that `target` transitively imports from.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] if `target` is not a known module, otherwise as
    /// [`Inventory::graph`].
    pub fn submodules_for(&self, target: &PackageId) -> Result<Vec<&Module>> {
        if !self.modules.contains_key(target) {
            return Err(Error::Resolution(format!("unknown module {target}")));
        }
        let closure = self.module_closure(target)?;

        Ok(self
            .submodules()
            .into_iter()
            .filter(|m| m.path != *target)
            .filter(|m| closure.iter().any(|c| c.is_within(&m.path)))
            .collect())
    }

    /// External modules providing at least one package `target` transitively
    /// imports, in path order.
    ///
    /// # Errors
    ///
    /// [`Error::Resolution`] if `target` is not a known module, otherwise as
    /// [`Inventory::graph`].
    pub fn external_dependencies_for(&self, target: &PackageId) -> Result<Vec<&Module>> {
        if !self.modules.contains_key(target) {
            return Err(Error::Resolution(format!("unknown module {target}")));
        }
        let closure = self.module_closure(target)?;
        let used: BTreeSet<&PackageId> = closure
            .iter()
            .filter_map(|dep| self.owning_module(dep))
            .map(|owner| &owner.path)
            .collect();

        Ok(self
            .external_dependencies()
            .into_iter()
            .filter(|m| used.contains(&m.path))
            .collect())
    }

    /// Imports of the repository's tools file, empty when there is none.
    ///
    /// # Errors
    ///
    /// [`Error::Graph`] if the file's preamble cannot be parsed.
    pub fn tools(&self) -> Result<Vec<String>> {
        let path = self.root.join(&self.settings.tools_file);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let mut parser = GoParser::new()?;
        Ok(parser.parse_file(&path)?.imports)
    }

    /// Groups of submodules that import from each other in a cycle.
    ///
    /// Submodules in one group cannot be split into independent modules.
    /// Each group is sorted, and groups are sorted by their first member.
    ///
    /// # Errors
    ///
    /// As [`Inventory::graph`].
    pub fn submodule_cycles(&self) -> Result<Vec<Vec<PackageId>>> {
        let submodules = self.submodules();
        let mut requires: DiGraph<PackageId, ()> = DiGraph::new();
        let index: BTreeMap<PackageId, NodeIndex> = submodules
            .iter()
            .map(|m| (m.path.clone(), requires.add_node(m.path.clone())))
            .collect();

        for module in &submodules {
            for dep in self.submodules_for(&module.path)? {
                if let (Some(&from), Some(&to)) = (index.get(&module.path), index.get(&dep.path)) {
                    requires.add_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<Vec<PackageId>> = tarjan_scc(&requires)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<PackageId> =
                    scc.into_iter().map(|i| requires[i].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();

        debug!(cycles = cycles.len(), "Checked submodules for cycles");
        Ok(cycles)
    }

    /// Closure of every graph package owned by `module`, plus its root package.
    fn module_closure(&self, module: &PackageId) -> Result<BTreeSet<PackageId>> {
        let graph = self.graph()?;
        let owned: Vec<&PackageId> = graph
            .packages()
            .filter(|p| self.owning_module(p).is_some_and(|m| m.path == *module))
            .collect();

        Ok(graph.closure_of_all(std::iter::once(module).chain(owned)))
    }

    /// The most specific known module containing `id`.
    fn owning_module(&self, id: &PackageId) -> Option<&Module> {
        self.modules
            .values()
            .filter(|m| id.is_within(&m.path))
            .max_by_key(|m| m.path.as_str().len())
    }

    fn relative_to_root(&self, dir: &Path) -> Option<PathBuf> {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        dir.strip_prefix(&self.root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}
