use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use watchsync_core::config::Config;

pub fn init(path: &Path) -> Result<()> {
    Config::create_default(path)?;

    println!("Created {}", path.display().green());
    println!("Fill in the [graph] section, then run `watchsync ingest` and `watchsync sync`.");
    Ok(())
}

pub fn path(path: &Path) -> Result<()> {
    let note = if path.exists() { "" } else { " (missing)" };
    println!("{}{}", path.display(), note.yellow());
    Ok(())
}
