//! Common display utilities for CLI commands.

use colored::Colorize;
use modsplit::Module;
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Display a list of items with bullet points, or `empty_message` when empty.
pub fn print_bullets<I, S>(items: I, empty_message: &str)
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    let mut any = false;
    for item in items {
        any = true;
        println!("    {} {item}", "•".dimmed());
    }
    if !any {
        println!("    {}", empty_message.dimmed());
    }
}

/// Module path with its version, if any.
pub fn module_label(module: &Module) -> String {
    match &module.version {
        Some(version) => format!("{} {}", module.path, version.dimmed()),
        None => module.path.to_string(),
    }
}

/// A sub-package path, with the module root shown explicitly.
pub fn sub_package_label(sub: &str) -> String {
    if sub.is_empty() {
        "(module root)".to_string()
    } else {
        sub.to_string()
    }
}
