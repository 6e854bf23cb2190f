//! `modsplit lock` command implementation.

use colored::Colorize;
use modsplit::PackageLock;

use super::Context;
use super::display::{print_bullets, print_json};

/// Short revision width shown in text output
const SHORT_REV: usize = 12;

/// Run the lock command.
pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let inventory = ctx.inventory()?;
    let lock = PackageLock::for_main_module(&inventory)?;

    if ctx.json {
        return print_json(&lock);
    }

    println!(
        "{}: {} locked packages",
        lock.import_path.to_string().white().bold(),
        lock.deps.len().to_string().bold()
    );

    if !lock.packages.is_empty() {
        println!();
        println!("  {}:", "Tools".yellow().bold());
        print_bullets(&lock.packages, "");
    }

    println!();
    println!("  {}:", "Packages".yellow().bold());
    print_bullets(
        lock.deps.iter().map(|d| {
            let rev = d.rev.get(..SHORT_REV).unwrap_or(d.rev.as_str());
            match &d.comment {
                Some(comment) => format!("{} {} {}", d.import_path, rev.dimmed(), comment),
                None => format!("{} {}", d.import_path, rev.dimmed()),
            }
        }),
        "(none)",
    );

    Ok(())
}
