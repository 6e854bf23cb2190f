//! `modsplit submodules` command implementation.

use colored::Colorize;

use super::display::{module_label, print_bullets, print_json};
use super::{Context, parse_module};

/// Run the submodules command.
pub fn run(ctx: &Context, module: Option<&str>) -> anyhow::Result<()> {
    let inventory = ctx.inventory()?;

    let Some(module) = module else {
        let submodules = inventory.submodules();
        if ctx.json {
            return print_json(&submodules);
        }
        println!(
            "{} submodules:",
            submodules.len().to_string().bold()
        );
        print_bullets(submodules.iter().map(|m| module_label(m)), "(none)");
        return Ok(());
    };

    let target = parse_module(module)?;
    let needed = inventory.submodules_for(&target)?;

    if ctx.json {
        return print_json(&needed);
    }

    println!(
        "{} imports from {} submodules:",
        target.to_string().white().bold(),
        needed.len().to_string().bold()
    );
    print_bullets(needed.iter().map(|m| module_label(m)), "(none)");

    Ok(())
}
