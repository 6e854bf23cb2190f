//! `modsplit manifest` command implementation.

use colored::Colorize;
use modsplit::ModuleManifest;

use super::display::{print_bullets, print_json};
use super::{Context, parse_module};

/// Run the manifest command.
pub fn run(ctx: &Context, module: &str) -> anyhow::Result<()> {
    let inventory = ctx.inventory()?;
    let target = parse_module(module)?;
    let manifest = ModuleManifest::for_module(&inventory, &target)?;

    if ctx.json {
        return print_json(&manifest);
    }

    println!(
        "{} {}",
        manifest.module.to_string().white().bold(),
        format!("(generated from {})", manifest.generated_from.display()).dimmed()
    );

    println!();
    println!("  {}:", "Requires".yellow().bold());
    print_bullets(
        manifest.replaces.iter().map(|r| {
            format!(
                "{} {} => {}",
                r.path,
                r.version.as_deref().unwrap_or(""),
                r.target.display()
            )
        }),
        "(no sibling submodules)",
    );

    println!();
    println!(
        "  {} ({}):",
        "External".yellow().bold(),
        manifest.external.len()
    );
    print_bullets(
        manifest
            .external
            .iter()
            .map(|r| format!("{} {}", r.path, r.version.as_deref().unwrap_or(""))),
        "(none)",
    );

    Ok(())
}
