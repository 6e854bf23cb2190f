//! `modsplit cycles` command implementation.

use colored::Colorize;

use super::Context;
use super::display::print_json;

/// Run the cycles command.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let inventory = ctx.inventory()?;
    let cycles = inventory.submodule_cycles()?;

    if ctx.json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("{}", "No submodule cycles detected.".green());
        return Ok(());
    }

    println!(
        "Found {} submodule cycles:",
        cycles.len().to_string().red().bold()
    );
    println!();

    for (i, cycle) in cycles.iter().enumerate() {
        println!("  {} {}:", "Cycle".yellow().bold(), i + 1);

        let members = cycle
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ↔ ");
        println!("    {}", members.dimmed());
    }

    Ok(())
}
