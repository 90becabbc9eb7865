//! `meridian deps` command implementation.

use std::path::Path;

use colored::Colorize;

use super::display::print_paths;

/// Run the deps command.
pub fn run(workspace: &Path, file: &Path, no_cache: bool) -> Result<(), meridian::Error> {
    let (indexer, _) = super::load_project(workspace, no_cache)?;
    let graph = indexer.project_graph();

    let target = if file.is_relative() {
        std::env::current_dir()?.join(file)
    } else {
        file.to_path_buf()
    };
    let target = target.canonicalize().unwrap_or(target);

    let Some(record) = graph.file(&target).or_else(|| graph.file(file)) else {
        println!("{} is not an indexed file", file.display().to_string().cyan());
        return Ok(());
    };
    let path = record.path.clone();

    println!("Dependencies of {}:", path.display().to_string().cyan().bold());
    println!();

    let dependencies = graph.dependencies(&path);
    println!(
        "  {} ({} files):",
        "Imports".white().bold(),
        dependencies.len().to_string().green()
    );
    print_paths(&dependencies, "(none)");
    println!();

    let impact = graph.impact(&path);
    println!(
        "  {} ({} files):",
        "Direct dependents".white().bold(),
        impact.direct_dependents.len().to_string().green()
    );
    print_paths(&impact.direct_dependents, "(none)");
    println!();

    println!(
        "  {} ({} files):",
        "Transitive dependents".white().bold(),
        impact.transitive_dependents.len().to_string().yellow()
    );
    print_paths(&impact.transitive_dependents, "(none beyond direct)");

    Ok(())
}
