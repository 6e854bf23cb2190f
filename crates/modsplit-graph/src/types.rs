//! Core value types: package identifiers and graph nodes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// A validated, slash-separated package identifier (e.g. `k8s.io/api/core/v1`).
///
/// Invariants: non-empty, no leading or trailing `/`, no empty segments.
/// Construction goes through [`PackageId::new`], so a `PackageId` can never
/// be confused with an arbitrary string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PackageId(String);

impl PackageId {
    /// Create a package identifier, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPackageId`] for the empty string, a leading or
    /// trailing `/`, or an empty path segment.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.split('/').any(str::is_empty) {
            return Err(Error::InvalidPackageId(id));
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a relative slash path. An empty `rel` returns the identifier unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPackageId`] if the joined identifier is malformed.
    pub fn join(&self, rel: &str) -> Result<Self> {
        if rel.is_empty() {
            return Ok(self.clone());
        }
        Self::new(format!("{}/{rel}", self.0))
    }

    /// Whether `self` is `other` or a package nested below it.
    ///
    /// The match is segment-aware: `lib/sub` is within `lib`, `library` is not.
    #[must_use]
    pub fn is_within(&self, other: &PackageId) -> bool {
        self.0 == other.0
            || self
                .0
                .strip_prefix(other.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The path of `self` below `module`: `""` for the module root itself,
    /// `None` when `self` is not within `module`.
    #[must_use]
    pub fn strip_module(&self, module: &PackageId) -> Option<&str> {
        if !self.is_within(module) {
            return None;
        }
        let rest = &self.0[module.0.len()..];
        Some(rest.strip_prefix('/').unwrap_or(rest))
    }

    /// Remove a raw string prefix, yielding a new identifier if what remains is valid.
    ///
    /// Used for collapsing staging layouts (`k8s.io/kubernetes/staging/src/k8s.io/api`
    /// becomes `k8s.io/api`).
    #[must_use]
    pub fn strip_prefix(&self, prefix: &str) -> Option<PackageId> {
        self.0
            .strip_prefix(prefix)
            .and_then(|rest| PackageId::new(rest).ok())
    }

    /// The first path segment (the host part for remote import paths).
    #[must_use]
    pub fn first_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PackageId {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for PackageId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for PackageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PackageId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Import edges of one package.
///
/// The two sets may overlap: a package imported by both regular and test
/// code appears in both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Packages imported by non-test code
    pub imports: BTreeSet<PackageId>,
    /// Packages imported by test code
    pub test_imports: BTreeSet<PackageId>,
}

impl Node {
    /// Create a node with no edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node from regular and test imports.
    #[must_use]
    pub fn with_edges(
        imports: impl IntoIterator<Item = PackageId>,
        test_imports: impl IntoIterator<Item = PackageId>,
    ) -> Self {
        Self {
            imports: imports.into_iter().collect(),
            test_imports: test_imports.into_iter().collect(),
        }
    }

    /// Union another node's edges into this one.
    pub fn absorb(&mut self, other: Node) {
        self.imports.extend(other.imports);
        self.test_imports.extend(other.test_imports);
    }
}
