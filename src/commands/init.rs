use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::MURMUR_DIR;
use crate::config::Config;
use crate::db::Database;

pub fn run(stealth: bool) -> Result<()> {
    let murmur_dir = PathBuf::from(MURMUR_DIR);

    if murmur_dir.exists() {
        println!("Murmur already initialized in {}", murmur_dir.display());
        return Ok(());
    }

    fs::create_dir_all(&murmur_dir).context("Failed to create .murmur directory")?;
    Config::default().write_file(&murmur_dir)?;

    // Opening validates the layout before we report success.
    Database::open(&murmur_dir)?;

    if stealth {
        add_to_git_exclude()?;
    }

    println!("Initialized murmur in {}", murmur_dir.display());
    Ok(())
}

/// Adds `.murmur` to git exclusions.
/// Prefers `.git/info/exclude` if it exists (truly local), otherwise uses `.gitignore`.
fn add_to_git_exclude() -> Result<()> {
    let exclude_path = Path::new(".git/info/exclude");
    let gitignore_path = Path::new(".gitignore");

    let target_path = if exclude_path.exists() {
        exclude_path
    } else if gitignore_path.exists() || Path::new(".git").is_dir() {
        gitignore_path
    } else {
        // Not a git repo
        return Ok(());
    };

    let existing = if target_path.exists() {
        fs::read_to_string(target_path).unwrap_or_default()
    } else {
        String::new()
    };

    if existing
        .lines()
        .any(|line| line.trim() == MURMUR_DIR || line.trim() == ".murmur/")
    {
        return Ok(());
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target_path)
        .context("Failed to open git exclusion file")?;

    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "{MURMUR_DIR}")?;

    println!("Added {MURMUR_DIR} to {}", target_path.display());
    Ok(())
}
