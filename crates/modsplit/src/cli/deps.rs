//! `modsplit deps` command implementation.

use colored::Colorize;

use super::Context;
use super::display::{module_label, print_bullets, print_json, sub_package_label};

/// Run the deps command.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let inventory = ctx.inventory()?;
    let used = inventory.sub_packages()?;

    if ctx.json {
        return print_json(&used);
    }

    let external = inventory.external_dependencies();
    let unused = external.len().saturating_sub(used.len());
    println!(
        "{} of {} external modules used by {}:",
        used.len().to_string().bold(),
        external.len(),
        inventory.main_module().path.to_string().white().bold()
    );

    for module in external {
        let Some(subs) = used.get(&module.path) else {
            continue;
        };
        println!();
        println!("  {}", module_label(module));
        print_bullets(subs.iter().map(|s| sub_package_label(s)), "");
    }

    if unused > 0 {
        println!();
        println!(
            "{}",
            format!("{unused} external modules contribute no used package.").dimmed()
        );
    }

    Ok(())
}
