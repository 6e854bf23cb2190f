//! # modsplit: split a monolithic Go module into submodules
//!
//! Given the module listing of a repository that embeds several sub-projects
//! (replaced by local directories), modsplit builds one import graph across
//! every module root and answers:
//!
//! - which sub-packages of each external module the main module really uses
//!   ([`Inventory::sub_packages`], [`PackageLock`]);
//! - which sibling submodules a submodule imports from, so its own manifest
//!   can require and replace them ([`Inventory::submodules_for`],
//!   [`ModuleManifest`]);
//! - whether submodules import from each other in a cycle
//!   ([`Inventory::submodule_cycles`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use modsplit::{Inventory, JsonListing, Settings};
//!
//! // Output of `go list -json -m all`, captured by the caller.
//! let listing = JsonListing::from_reader(std::io::stdin())?;
//! let settings = Settings::load(".".as_ref())?;
//! let inventory = Inventory::load(".", &listing, settings)?;
//!
//! for (module, subs) in inventory.sub_packages()? {
//!     println!("{module}: {} packages used", subs.len());
//! }
//! # Ok::<(), modsplit::Error>(())
//! ```

pub mod config;
mod error;
pub mod inventory;
pub mod manifest;
pub mod module;

pub use config::Settings;
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use manifest::{LockedPackage, ModuleManifest, PackageLock, Replace, Requirement};
pub use module::{JsonListing, Module, ModuleSource, Replacement};
pub use modsplit_graph::PackageId;
