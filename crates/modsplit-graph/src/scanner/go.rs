//! Go import preamble extraction.
//!
//! Only the top of each file is examined: the `package` clause, `import`
//! declarations, and the comments around them. Everything after the first
//! other top-level declaration is ignored, so syntax errors in function
//! bodies never fail a scan.

use std::path::Path;

use tracing::trace;

use crate::error::{Error, Result};

/// Tree-sitter node kind constants for the Go grammar.
mod node_kinds {
    pub const PACKAGE_CLAUSE: &str = "package_clause";
    pub const IMPORT_DECLARATION: &str = "import_declaration";
    pub const IMPORT_SPEC: &str = "import_spec";
    pub const IMPORT_SPEC_LIST: &str = "import_spec_list";
    pub const COMMENT: &str = "comment";
    pub const PACKAGE_IDENTIFIER: &str = "package_identifier";
}

/// The cgo pseudo-package. It names no real package.
const CGO_PSEUDO_PACKAGE: &str = "C";

/// Import preamble of one Go file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    /// Name from the `package` clause
    pub package_name: String,
    /// Import paths in declaration order, without quotes
    pub imports: Vec<String>,
    /// Whether a build constraint excludes the file from every build
    pub ignored: bool,
}

/// Reusable tree-sitter parser for Go sources.
///
/// Tree-sitter parsers are not `Sync`; each scan owns one.
pub struct GoParser {
    parser: tree_sitter::Parser,
}

impl GoParser {
    /// Create a parser configured for Go.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parser`] if the grammar cannot be loaded.
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::Parser(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Read and parse the preamble of a file on disk.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Parse`] if it is
    /// not UTF-8 or its preamble is malformed.
    pub fn parse_file(&mut self, path: &Path) -> Result<Preamble> {
        let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let source = std::str::from_utf8(&content)
            .map_err(|_| Error::parse(path, "file is not valid UTF-8"))?;
        self.parse_source(path, source)
    }

    /// Parse the preamble of in-memory source. `path` is used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the package clause is missing or the
    /// import block contains a syntax error.
    pub fn parse_source(&mut self, path: &Path, source: &str) -> Result<Preamble> {
        use node_kinds::{COMMENT, IMPORT_DECLARATION, PACKAGE_CLAUSE};

        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::Parser("tree-sitter returned no tree".to_string()))?;
        let bytes = source.as_bytes();
        let root = tree.root_node();

        let mut package_name = None;
        let mut leading_comments = Vec::new();
        let mut imports = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                COMMENT => {
                    if package_name.is_none() {
                        leading_comments.push(text(&child, bytes, path)?);
                    }
                }
                PACKAGE_CLAUSE => {
                    if package_name.is_some() {
                        return Err(Error::parse(path, "duplicate package clause"));
                    }
                    if child.has_error() {
                        return Err(Error::parse(
                            path,
                            format!("malformed package clause at line {}", line_of(&child)),
                        ));
                    }
                    package_name = Some(package_clause_name(&child, bytes, path)?);
                }
                IMPORT_DECLARATION => {
                    if package_name.is_none() {
                        return Err(Error::parse(path, "expected 'package', found 'import'"));
                    }
                    if child.has_error() {
                        return Err(Error::parse(
                            path,
                            format!("malformed import declaration at line {}", line_of(&child)),
                        ));
                    }
                    collect_import_paths(&child, bytes, path, &mut imports)?;
                }
                _ if child.is_error() => {
                    // Garbage before the package clause, or a broken import
                    // block the grammar could not attach to a declaration.
                    let snippet = text(&child, bytes, path)?;
                    if package_name.is_none() || snippet.trim_start().starts_with("import") {
                        return Err(Error::parse(
                            path,
                            format!("syntax error at line {}", line_of(&child)),
                        ));
                    }
                    break;
                }
                _ => break,
            }
        }

        let Some(package_name) = package_name else {
            return Err(Error::parse(path, "expected 'package' clause"));
        };

        let ignored = leading_comments.iter().any(|c| is_ignore_constraint(c));

        trace!(
            file = %path.display(),
            package = %package_name,
            imports = imports.len(),
            ignored,
            "Parsed import preamble"
        );

        Ok(Preamble {
            package_name,
            imports,
            ignored,
        })
    }
}

fn package_clause_name(node: &tree_sitter::Node, bytes: &[u8], path: &Path) -> Result<String> {
    let mut cursor = node.walk();
    let name = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == node_kinds::PACKAGE_IDENTIFIER);
    match name {
        Some(n) => text(&n, bytes, path),
        None => Err(Error::parse(path, "package clause has no name")),
    }
}

fn collect_import_paths(
    node: &tree_sitter::Node,
    bytes: &[u8],
    path: &Path,
    imports: &mut Vec<String>,
) -> Result<()> {
    use node_kinds::{IMPORT_SPEC, IMPORT_SPEC_LIST};

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            IMPORT_SPEC => {
                let Some(literal) = child.child_by_field_name("path") else {
                    return Err(Error::parse(
                        path,
                        format!("import without path at line {}", line_of(&child)),
                    ));
                };
                let raw = text(&literal, bytes, path)?;
                let unquoted = raw.trim_matches(|c| c == '"' || c == '`');
                if unquoted.is_empty() {
                    return Err(Error::parse(
                        path,
                        format!("empty import path at line {}", line_of(&child)),
                    ));
                }
                if unquoted != CGO_PSEUDO_PACKAGE {
                    imports.push(unquoted.to_string());
                }
            }
            IMPORT_SPEC_LIST => collect_import_paths(&child, bytes, path, imports)?,
            _ => {}
        }
    }
    Ok(())
}

/// Whether a comment is a build constraint that is exactly `ignore`.
///
/// Accepts both `//go:build ignore` and the legacy `// +build ignore`.
fn is_ignore_constraint(comment: &str) -> bool {
    let expr = comment
        .strip_prefix("//go:build")
        .or_else(|| comment.strip_prefix("// +build"));
    expr.is_some_and(|e| e.trim() == "ignore")
}

fn text(node: &tree_sitter::Node, bytes: &[u8], path: &Path) -> Result<String> {
    node.utf8_text(bytes)
        .map(str::to_string)
        .map_err(|_| Error::parse(path, "node text is not valid UTF-8"))
}

// Tree-sitter rows are 0-indexed; messages use 1-indexed lines.
fn line_of(node: &tree_sitter::Node) -> usize {
    node.start_position().row + 1
}
