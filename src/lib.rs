#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod helpers;
pub mod id;
pub mod models;
pub mod moderation;
pub mod output;
pub mod rate_limit;
pub mod service;
pub mod thread;
pub mod votes;

use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

use cli::{Cli, Commands, ModCommands};
use config::Config;
use db::Database;
use output::Output;

pub use error::Error;

pub const MURMUR_DIR: &str = ".murmur";
pub const REDIRECT_FILE: &str = "redirect";

/// Finds the `.murmur/` directory by walking up from the current directory.
/// Returns `None` if no `.murmur/` directory is found.
pub fn find_murmur_dir() -> Option<PathBuf> {
    let current_dir = std::env::current_dir().ok()?;
    let mut dir = current_dir.as_path();

    loop {
        let murmur_path = dir.join(MURMUR_DIR);
        if murmur_path.is_dir() {
            return Some(murmur_path);
        }

        dir = dir.parent()?;
    }
}

/// Resolves the final data directory, following any redirect file.
/// A redirect file contains a path (absolute or relative) to another `.murmur/` directory.
pub fn resolve_murmur_dir() -> Option<PathBuf> {
    let murmur_dir = find_murmur_dir()?;
    let redirect_path = murmur_dir.join(REDIRECT_FILE);

    if redirect_path.is_file() {
        let target = std::fs::read_to_string(&redirect_path).ok()?;
        let target = target.trim();

        let target_path = if PathBuf::from(target).is_absolute() {
            PathBuf::from(target)
        } else {
            murmur_dir.parent()?.join(target)
        };

        if target_path.is_dir() {
            return Some(target_path);
        }
    }

    Some(murmur_dir)
}

fn ensure_initialized() -> Result<(Database, Config)> {
    let murmur_dir = resolve_murmur_dir()
        .ok_or_else(|| anyhow!("Murmur not initialized. Run 'mm init' first."))?;

    let config = Config::load(&murmur_dir)?;
    let db = Database::open(&murmur_dir).context("Failed to open comment store")?;
    Ok((db, config))
}

fn run_mod(mod_cmd: ModCommands, db: &mut Database) -> Result<()> {
    match mod_cmd {
        ModCommands::Reports { comment, json } => {
            let reports = commands::moderate::reports(comment.as_deref(), db);
            Output::new(json).report_list(&reports)
        }
        other => {
            let (action, comment_id) = other
                .into_action()
                .ok_or_else(|| anyhow!("Not a moderation action"))?;
            let comment = commands::moderate::apply(&comment_id, action, db)?;
            Output::new(false).moderation_applied(&comment, action)
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { stealth } => commands::init::run(stealth),
        Commands::List {
            post_id,
            page,
            limit,
            sort,
            identity,
            json,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let listing =
                commands::comment::list(&post_id, page, limit, sort, identity, &mut db, &config)?;
            Output::new(json).comment_page(&post_id, sort, &listing)
        }
        Commands::Post {
            post_id,
            content,
            reply_to,
            identity,
            closed,
            json,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let comment = commands::comment::post(
                &post_id,
                &content,
                reply_to.as_deref(),
                identity,
                closed,
                &mut db,
                &config,
            )?;
            Output::new(json).comment_posted(&comment)
        }
        Commands::Edit {
            comment_id,
            content,
            identity,
            closed,
            json,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let comment =
                commands::comment::edit(&comment_id, &content, identity, closed, &mut db, &config)?;
            Output::new(json).comment_edited(&comment)
        }
        Commands::Delete {
            comment_id,
            identity,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let comment = commands::comment::delete(&comment_id, identity, &mut db, &config)?;
            Output::new(false).comment_deleted(&comment)
        }
        Commands::Vote {
            comment_id,
            vote_type,
            identity,
            closed,
            json,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let tally =
                commands::vote::run(&comment_id, vote_type, identity, closed, &mut db, &config)?;
            Output::new(json).vote_cast(&comment_id, &tally)
        }
        Commands::Report {
            comment_id,
            reason,
            details,
            identity,
            json,
        } => {
            let (mut db, config) = ensure_initialized()?;
            let receipt = commands::report::run(
                &comment_id,
                reason,
                details,
                identity.as_deref(),
                &mut db,
                &config,
            )?;
            Output::new(json).report_filed(&receipt)
        }
        Commands::Mod(mod_cmd) => {
            let (mut db, _config) = ensure_initialized()?;
            run_mod(mod_cmd, &mut db)
        }
    }
}
