//! Smart Bookmark CLI - save and browse bookmarks from the terminal
//!
//! Bookmarks live in a Supabase project; the CLI signs in per profile and
//! keeps its session in the OS keychain.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::list::run_list;
use crate::commands::search::run_search;
use crate::commands::watch::run_watch;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "marks=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Add { title, url }) => run_add(&title, &url, profile).await?,
        Some(Commands::List { limit, json }) => run_list(limit, json, profile).await?,
        Some(Commands::Search { term, limit, json }) => {
            run_search(&term, limit, json, profile).await?;
        }
        Some(Commands::Delete { id }) => run_delete(&id, profile).await?,
        Some(Commands::Watch { search }) => run_watch(search, profile).await?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
