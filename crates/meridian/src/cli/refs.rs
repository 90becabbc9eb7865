//! `meridian refs` command implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use colored::Colorize;

/// Run the refs command.
pub fn run(workspace: &Path, name: &str, no_cache: bool) -> Result<(), meridian::Error> {
    let (indexer, _) = super::load_project(workspace, no_cache)?;

    let locations = indexer.find_references(name);
    if locations.is_empty() {
        println!("No references to \"{name}\"");
        return Ok(());
    }

    let mut by_file: BTreeMap<&PathBuf, Vec<u32>> = BTreeMap::new();
    for location in &locations {
        by_file.entry(&location.path).or_default().push(location.line);
    }

    println!(
        "Found {} references to \"{}\" in {} files:",
        locations.len().to_string().green().bold(),
        name.cyan(),
        by_file.len()
    );
    println!();

    for (file, lines) in by_file {
        let lines = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  {} {}",
            file.display().to_string().white().bold(),
            format!("(lines {lines})").dimmed()
        );
    }

    Ok(())
}
