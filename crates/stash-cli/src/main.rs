//! Stash CLI - Personal finance and savings tracker
//!
//! Usage:
//!   stash init                 Initialize database
//!   stash users add alice      Create a user account
//!   stash serve --port 3000    Start web server
//!   stash rules run            Execute due auto-save rules (cron entry point)

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => commands::cmd_serve(&db_path, &host, port, no_auth).await,
        Commands::Status => commands::cmd_status(&db_path),
        Commands::Dashboard => {
            let db = commands::open_db(&db_path)?;
            let user = commands::resolve_user(&db, cli.user.as_deref())?;
            commands::cmd_dashboard(&db, &user)
        }
        Commands::Users { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                Some(UsersAction::Add {
                    username,
                    email,
                    password,
                }) => commands::cmd_users_add(
                    &db,
                    &username,
                    email.as_deref(),
                    password.as_deref(),
                ),
                None | Some(UsersAction::List) => commands::cmd_users_list(&db),
            }
        }
        Commands::Goals { json } => {
            let db = commands::open_db(&db_path)?;
            let user = commands::resolve_user(&db, cli.user.as_deref())?;
            commands::cmd_goals_list(&db, &user, json)
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                None | Some(RulesAction::List) => {
                    let user = commands::resolve_user(&db, cli.user.as_deref())?;
                    commands::cmd_rules_list(&db, &user)
                }
                Some(RulesAction::Run) => commands::cmd_rules_run(&db, cli.user.as_deref()),
            }
        }
    }
}
