//! Integration tests for the module inventory and the records built from it.
//!
//! Fixture layout:
//!
//! ```text
//! repo/                                   example.com/mono (main)
//!   go.mod, tools.go
//!   cmd/app/main.go                       -> example.com/api/types, github.com/lib/sub1
//!   cmd/legacy/main.go                    -> example.com/mono/staging/src/example.com/apimachinery/meta
//!   staging/src/example.com/api/          example.com/api (submodule)
//!     types/types.go                      -> example.com/api/types/v1, example.com/apimachinery/meta
//!     types/v1/v1.go
//!   staging/src/example.com/apimachinery/ example.com/apimachinery (submodule)
//!     meta/meta.go
//!   staging/src/example.com/client/       example.com/client (submodule)
//!     rest/rest.go                        -> example.com/api/types
//!   vendor/...                            (never scanned)
//! modcache/
//!   github.com/lib@v1.0.0/{sub1,sub2}     sub1 -> github.com/other/x
//!   github.com/other@v0.1.0/x
//!   github.com/unused@v1.0.0/a
//!   cache/download/<module>/@v/<version>.{mod,info}
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use modsplit::module::LOCAL_REVISION;
use modsplit::{
    Error, Inventory, JsonListing, ModuleManifest, PackageId, PackageLock, Settings,
};
use serde_json::json;
use tempfile::TempDir;

const LIB_REV: &str = "1111111111111111111111111111111111111111";
const OTHER_REV: &str = "2222222222222222222222222222222222222222";

fn id(s: &str) -> PackageId {
    PackageId::new(s).expect("valid package id")
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("should create dirs");
    fs::write(path, content).expect("should write file");
}

fn go(package: &str, imports: &[&str]) -> String {
    let mut source = format!("package {package}\n");
    if !imports.is_empty() {
        source.push_str("\nimport (\n");
        for import in imports {
            source.push_str(&format!("\t\"{import}\"\n"));
        }
        source.push_str(")\n");
    }
    source
}

struct Fixture {
    repo: TempDir,
    cache: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let repo = tempfile::tempdir().expect("should create repo dir");
        let cache = tempfile::tempdir().expect("should create cache dir");
        let r = repo.path();
        let c = cache.path();

        write(r, "go.mod", "module example.com/mono\n");
        write(
            r,
            "tools.go",
            "//go:build tools\n\npackage tools\n\nimport _ \"github.com/tools/gen\"\n",
        );
        write(
            r,
            "cmd/app/main.go",
            &go("main", &["fmt", "example.com/api/types", "github.com/lib/sub1"]),
        );
        write(
            r,
            "cmd/legacy/main.go",
            &go(
                "main",
                &["example.com/mono/staging/src/example.com/apimachinery/meta"],
            ),
        );
        write(
            r,
            "staging/src/example.com/api/types/types.go",
            &go(
                "types",
                &["example.com/api/types/v1", "example.com/apimachinery/meta"],
            ),
        );
        write(r, "staging/src/example.com/api/types/v1/v1.go", &go("v1", &[]));
        write(
            r,
            "staging/src/example.com/apimachinery/meta/meta.go",
            &go("meta", &["strings"]),
        );
        write(
            r,
            "staging/src/example.com/client/rest/rest.go",
            &go("rest", &["example.com/api/types"]),
        );
        write(r, "vendor/github.com/lib/sub1/sub1.go", "not go source");

        write(c, "github.com/lib@v1.0.0/sub1/sub1.go", &go("sub1", &["github.com/other/x"]));
        write(c, "github.com/lib@v1.0.0/sub2/sub2.go", &go("sub2", &[]));
        write(c, "github.com/other@v0.1.0/x/x.go", &go("x", &[]));
        write(c, "github.com/unused@v1.0.0/a/a.go", &go("a", &[]));
        write(c, "cache/download/github.com/lib/@v/v1.0.0.mod", "module github.com/lib\n");
        write(
            c,
            "cache/download/github.com/lib/@v/v1.0.0.info",
            &json!({"Version": "v1.0.0", "Name": LIB_REV}).to_string(),
        );
        write(
            c,
            "cache/download/github.com/other/@v/v0.1.0.mod",
            "module github.com/other\n",
        );
        write(
            c,
            "cache/download/github.com/other/@v/v0.1.0.info",
            &json!({"Version": "v0.1.0", "Name": OTHER_REV}).to_string(),
        );

        Self { repo, cache }
    }

    fn staged(&self, name: &str) -> PathBuf {
        self.repo.path().join("staging/src/example.com").join(name)
    }

    fn listing(&self) -> JsonListing {
        let repo = self.repo.path();
        let cache = self.cache.path();
        let submodule = |name: &str| {
            let dir = self.staged(name);
            json!({
                "Path": format!("example.com/{name}"),
                "Version": "v0.0.0",
                "Replace": {
                    "Path": format!("./staging/src/example.com/{name}"),
                    "Dir": dir,
                    "GoMod": dir.join("go.mod"),
                },
                "Dir": dir,
                "GoMod": dir.join("go.mod"),
            })
        };
        let external = |path: &str, version: &str| {
            let name = path.trim_start_matches("github.com/");
            json!({
                "Path": path,
                "Version": version,
                "Dir": cache.join(format!("github.com/{name}@{version}")),
                "GoMod": cache.join(format!("cache/download/{path}/@v/{version}.mod")),
            })
        };

        let records = [
            json!({
                "Path": "example.com/mono",
                "Main": true,
                "Dir": repo,
                "GoMod": repo.join("go.mod"),
            }),
            submodule("api"),
            submodule("apimachinery"),
            submodule("client"),
            external("github.com/lib", "v1.0.0"),
            external("github.com/other", "v0.1.0"),
            external("github.com/unused", "v1.0.0"),
            json!({"Path": "github.com/not-downloaded", "Version": "v0.0.1"}),
        ];

        JsonListing::new(
            records
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    fn inventory_with(&self, settings: Settings) -> Inventory {
        Inventory::load(self.repo.path(), &self.listing(), settings).expect("inventory should load")
    }

    fn inventory(&self) -> Inventory {
        self.inventory_with(Settings {
            staging_prefix: "example.com/mono/staging/src/".to_string(),
            workers: Some(2),
            ..Settings::default()
        })
    }
}

fn paths<'a>(modules: impl IntoIterator<Item = &'a modsplit::Module>) -> Vec<&'a str> {
    modules.into_iter().map(|m| m.path.as_str()).collect()
}

#[test]
fn modules_are_split_into_submodules_and_external_dependencies() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    assert_eq!(inventory.main_module().path, id("example.com/mono"));
    assert_eq!(
        paths(inventory.submodules()),
        vec!["example.com/api", "example.com/apimachinery", "example.com/client"]
    );
    assert_eq!(
        paths(inventory.external_dependencies()),
        vec![
            "github.com/lib",
            "github.com/not-downloaded",
            "github.com/other",
            "github.com/unused",
        ]
    );
}

#[test]
fn external_dependencies_are_pruned_to_used_sub_packages() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let used = inventory.sub_packages().expect("graph should build");

    let expected = BTreeMap::from([
        (id("github.com/lib"), BTreeSet::from(["sub1".to_string()])),
        (id("github.com/other"), BTreeSet::from(["x".to_string()])),
    ]);
    assert_eq!(used, expected);
}

#[test]
fn main_module_dependencies_cross_module_boundaries() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let deps = inventory.dependencies().expect("graph should build");

    for reached in [
        "example.com/api/types",
        "example.com/api/types/v1",
        "example.com/apimachinery/meta",
        "github.com/lib/sub1",
        "github.com/other/x",
    ] {
        assert!(deps.contains(&id(reached)), "{reached} should be reached");
    }
    assert!(!deps.contains(&id("github.com/lib/sub2")));
    assert!(!deps.contains(&id("example.com/client/rest")));
    assert!(!deps.contains(&id("fmt")), "standard library is dropped");
}

#[test]
fn submodules_for_lists_transitively_imported_siblings() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let client = inventory
        .submodules_for(&id("example.com/client"))
        .expect("graph should build");
    assert_eq!(paths(client), vec!["example.com/api", "example.com/apimachinery"]);

    let main = inventory
        .submodules_for(&id("example.com/mono"))
        .expect("graph should build");
    assert_eq!(paths(main), vec!["example.com/api", "example.com/apimachinery"]);

    let machinery = inventory
        .submodules_for(&id("example.com/apimachinery"))
        .expect("graph should build");
    assert!(machinery.is_empty());
}

#[test]
fn submodules_for_never_includes_the_target() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    // api/types reaches api/types/v1, which lies within api itself.
    let api = inventory
        .submodules_for(&id("example.com/api"))
        .expect("graph should build");

    assert_eq!(paths(api), vec!["example.com/apimachinery"]);
}

#[test]
fn staging_paths_are_normalized() {
    let fixture = Fixture::new();

    let normalized = fixture.inventory();
    let graph = normalized.graph().expect("graph should build");
    let legacy = graph
        .get(&id("example.com/mono/cmd/legacy"))
        .expect("legacy command is scanned");
    assert_eq!(
        legacy.imports,
        BTreeSet::from([id("example.com/apimachinery/meta")])
    );
    assert!(
        graph
            .iter()
            .flat_map(|(k, n)| std::iter::once(k).chain(&n.imports))
            .all(|p| !p.as_str().starts_with("example.com/mono/staging/src/"))
    );

    let raw = fixture.inventory_with(Settings {
        staging_prefix: String::new(),
        ..Settings::default()
    });
    let graph = raw.graph().expect("graph should build");
    assert!(
        graph
            .get(&id("example.com/mono/cmd/legacy"))
            .expect("legacy command is scanned")
            .imports
            .contains(&id("example.com/mono/staging/src/example.com/apimachinery/meta"))
    );
}

#[test]
fn graph_is_built_once_and_cached() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let first: *const _ = inventory.graph().expect("graph should build");
    // Later edits on disk are not observed.
    write(
        &fixture.staged("apimachinery"),
        "meta/meta.go",
        &go("meta", &["example.com/client/rest"]),
    );
    let second: *const _ = inventory.graph().expect("graph should build");

    assert_eq!(first, second);
    assert!(inventory.submodule_cycles().expect("cached graph").is_empty());
}

#[test]
fn mutually_importing_submodules_form_a_cycle() {
    let fixture = Fixture::new();
    write(
        &fixture.staged("apimachinery"),
        "meta/meta.go",
        &go("meta", &["example.com/client/rest"]),
    );
    let inventory = fixture.inventory();

    let cycles = inventory.submodule_cycles().expect("graph should build");

    assert_eq!(
        cycles,
        vec![vec![
            id("example.com/api"),
            id("example.com/apimachinery"),
            id("example.com/client"),
        ]]
    );
}

#[test]
fn scan_failure_is_reported_and_not_cached() {
    let fixture = Fixture::new();
    write(&fixture.staged("client"), "broken/broken.go", "func nope() {}\n");
    let inventory = fixture.inventory();

    let err = inventory.sub_packages().expect_err("scan should fail");
    assert!(matches!(err, Error::Graph(ref e) if e.is_parse()), "got {err}");
    assert!(err.to_string().contains("broken.go"));

    assert!(inventory.graph().is_err(), "a failed build is retried, not cached");
}

#[test]
fn manifest_requires_and_replaces_siblings_by_relative_path() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let manifest =
        ModuleManifest::for_module(&inventory, &id("example.com/client")).expect("manifest");

    assert_eq!(manifest.module, id("example.com/client"));
    assert_eq!(manifest.generated_from, PathBuf::from("../../../../go.mod"));
    assert_eq!(
        manifest.requires.iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
        vec!["example.com/api", "example.com/apimachinery"]
    );
    assert_eq!(
        manifest.replaces.iter().map(|r| r.target.clone()).collect::<Vec<_>>(),
        vec![PathBuf::from("../api"), PathBuf::from("../apimachinery")]
    );
    assert!(manifest.replaces.iter().all(|r| r.version.as_deref() == Some("v0.0.0")));
    assert!(manifest.external.is_empty(), "client imports no external package");
}

#[test]
fn manifest_external_requirements_follow_the_module_closure() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let manifest =
        ModuleManifest::for_module(&inventory, &id("example.com/mono")).expect("manifest");

    assert_eq!(
        manifest
            .external
            .iter()
            .map(|r| (r.path.as_str(), r.version.as_deref()))
            .collect::<Vec<_>>(),
        vec![
            ("github.com/lib", Some("v1.0.0")),
            ("github.com/other", Some("v0.1.0")),
        ]
    );
    assert!(
        inventory
            .external_dependencies_for(&id("example.com/apimachinery"))
            .expect("graph should build")
            .is_empty()
    );
}

#[test]
fn manifest_for_unknown_module_is_a_resolution_error() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let err = ModuleManifest::for_module(&inventory, &id("example.com/ghost")).unwrap_err();

    assert!(matches!(err, Error::Resolution(_)));
}

#[test]
fn lock_lists_used_packages_with_revisions() {
    let fixture = Fixture::new();
    let inventory = fixture.inventory();

    let lock = PackageLock::for_main_module(&inventory).expect("lock");

    assert_eq!(lock.import_path, id("example.com/mono"));
    assert_eq!(lock.packages, vec!["github.com/tools/gen"]);

    let deps: Vec<_> = lock
        .deps
        .iter()
        .map(|d| (d.import_path.as_str(), d.rev.as_str(), d.comment.as_deref()))
        .collect();
    assert_eq!(
        deps,
        vec![
            ("example.com/api/types", LOCAL_REVISION, Some("v0.0.0")),
            ("example.com/api/types/v1", LOCAL_REVISION, Some("v0.0.0")),
            ("example.com/apimachinery/meta", LOCAL_REVISION, Some("v0.0.0")),
            ("github.com/lib/sub1", LIB_REV, Some("v1.0.0")),
            ("github.com/other/x", OTHER_REV, Some("v0.1.0")),
        ]
    );
}

/// A repository whose module paths carry no dot in their first segment.
///
/// ```text
/// repo/                      mono (main)
///   cmd/app/main.go          -> mono/api/types
///   api/types/types.go       mono/api (submodule) -> fmt, mono/lib/util
///   lib/util/util.go         mono/lib (submodule)
/// ```
fn dotless_inventory(repo: &Path) -> Inventory {
    write(repo, "go.mod", "module mono\n");
    write(repo, "cmd/app/main.go", &go("main", &["mono/api/types"]));
    write(repo, "api/types/types.go", &go("types", &["fmt", "mono/lib/util"]));
    write(repo, "lib/util/util.go", &go("util", &[]));

    let submodule = |name: &str| {
        let dir = repo.join(name);
        json!({
            "Path": format!("mono/{name}"),
            "Version": "v0.0.0",
            "Replace": {"Path": format!("./{name}"), "Dir": dir},
            "Dir": dir,
        })
    };
    let listing = [
        json!({"Path": "mono", "Main": true, "Dir": repo, "GoMod": repo.join("go.mod")}),
        submodule("api"),
        submodule("lib"),
    ]
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    Inventory::load(repo, &JsonListing::new(listing), Settings::default())
        .expect("inventory should load")
}

#[test]
fn dotless_sibling_imports_are_not_standard_library() {
    let repo = tempfile::tempdir().expect("should create repo dir");
    let inventory = dotless_inventory(repo.path());

    let graph = inventory.graph().expect("graph should build");
    assert_eq!(
        graph
            .get(&id("mono/api/types"))
            .expect("api types are scanned")
            .imports,
        BTreeSet::from([id("mono/lib/util")])
    );

    let api = inventory
        .submodules_for(&id("mono/api"))
        .expect("graph should build");
    assert_eq!(paths(api), vec!["mono/lib"]);

    let main = inventory
        .submodules_for(&id("mono"))
        .expect("graph should build");
    assert_eq!(paths(main), vec!["mono/api", "mono/lib"]);
}
