//! Multi-root graph construction.
//!
//! A [`MultiRootBuilder`] accumulates [`ScanRequest`]s and turns them into
//! one merged [`Graph`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   full_dependency_graph                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Phase 1 (Parallel):    rayon pool, one scan per request     │
//! │  Phase 2 (Sequential):  merge_partials in ingestion order    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Merge policy
//!
//! When several requests produce the same package identifier, the node from
//! the **last-ingested** request wins outright. There is no per-field union.
//! The main repository scan is ingested after the sub-module scans so that it
//! supersedes them. Because the winner is decided by ingestion order, never
//! by completion order, scanning can run concurrently.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::scanner::{ScanOptions, ScanRequest, Scanner};

/// Merge an ordered list of partial graphs, later entries replacing earlier ones.
///
/// Replacement is per package and total: a node from a later partial
/// replaces the earlier node entirely, edges and test edges alike. This is
/// the opposite of [`Graph::normalize`], which unions colliding nodes.
#[must_use]
pub fn merge_partials<I>(partials: I) -> Graph
where
    I: IntoIterator<Item = Graph>,
{
    let mut merged = Graph::new();
    for partial in partials {
        for (id, node) in partial.into_nodes() {
            if merged.insert(id.clone(), node).is_some() {
                debug!(package = %id, "Later scan superseded package");
            }
        }
    }
    merged
}

/// Accumulates scan requests and builds the merged graph.
#[derive(Debug, Clone, Default)]
pub struct MultiRootBuilder {
    scanner: Scanner,
    requests: Vec<ScanRequest>,
    workers: Option<usize>,
}

impl MultiRootBuilder {
    /// Create a builder with default scan options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given scan options for every request.
    #[must_use]
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.scanner = Scanner::new(options);
        self
    }

    /// Bound the number of concurrent scans. `None` uses rayon's default.
    #[must_use]
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Append a request. Later requests win identifier collisions.
    pub fn ingest(&mut self, request: ScanRequest) {
        self.requests.push(request);
    }

    /// Requests in ingestion order.
    #[must_use]
    pub fn requests(&self) -> &[ScanRequest] {
        &self.requests
    }

    /// Scan every request and merge the results.
    ///
    /// Scans run on a bounded worker pool; every scan completes before the
    /// merge starts.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing request in ingestion order. No
    /// partial graph is returned. [`Error::Config`] if the worker pool cannot
    /// be created.
    pub fn full_dependency_graph(&self) -> Result<Graph> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.unwrap_or(0))
            .thread_name(|i| format!("modsplit-scan-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("cannot build scan worker pool: {e}")))?;

        let results: Vec<Result<Graph>> = pool.install(|| {
            self.requests
                .par_iter()
                .map(|request| self.scanner.scan(request))
                .collect()
        });

        let partials = results.into_iter().collect::<Result<Vec<_>>>()?;
        let merged = merge_partials(partials);

        debug!(
            roots = self.requests.len(),
            packages = merged.len(),
            edges = merged.edge_count(),
            "Built merged dependency graph"
        );

        Ok(merged)
    }
}
