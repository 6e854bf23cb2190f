//! # modsplit-graph: cross-root Go import graphs
//!
//! Scans several independent source trees (a main project plus sub-projects
//! sharing one repository), extracts every package's import edges, merges
//! them into one graph spanning module boundaries, and answers transitive
//! reachability queries over it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use modsplit_graph::{MultiRootBuilder, PackageId, ScanRequest};
//!
//! let main = PackageId::new("k8s.io/kubernetes")?;
//! let api = PackageId::new("k8s.io/api")?;
//!
//! let mut builder = MultiRootBuilder::new();
//! builder.ingest(ScanRequest::new("staging/src/k8s.io/api", api.clone()).skip_subdir("vendor"));
//! builder.ingest(
//!     ScanRequest::new(".", main.clone())
//!         .skip_subdir("staging/src/k8s.io/api")
//!         .skip_subdir("vendor")
//!         .with_local_packages([api]),
//! );
//!
//! let graph = builder.full_dependency_graph()?;
//! let closure = graph.recursive_transitive_closure(&main.join("cmd/kubelet")?);
//! println!("kubelet reaches {} packages", closure.len());
//! # Ok::<(), modsplit_graph::Error>(())
//! ```

mod builder;
mod error;
mod graph;
mod scanner;
mod types;

pub use builder::{MultiRootBuilder, merge_partials};
pub use error::{Error, Result};
pub use graph::Graph;
pub use scanner::{GoParser, Preamble, ScanOptions, ScanRequest, Scanner};
pub use types::{Node, PackageId};
