//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default database location (~/.local/share/stash/stash.db on Linux),
/// falling back to the working directory when no data dir is available
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("stash").join("stash.db"))
        .unwrap_or_else(|| PathBuf::from("stash.db"))
}

/// Stash - Track spending and hit your savings goals
#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "Self-hosted personal finance and savings tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to the platform data directory)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Account to operate on (defaults to the only account, if there is one)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// Requests without a valid session token run as a shared local account.
        #[arg(long)]
        no_auth: bool,
    },

    /// Show database status (path, size, counts)
    Status,

    /// Show the savings dashboard for a user
    Dashboard,

    /// Manage user accounts
    Users {
        #[command(subcommand)]
        action: Option<UsersAction>,
    },

    /// List savings goals with derived metrics
    Goals {
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Manage auto-save rules (list, run)
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Create a user account
    Add {
        /// Username for login
        username: String,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Password (a random one is generated and printed if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List user accounts
    List,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List auto-save rules
    List,

    /// Execute all due auto-save rules
    ///
    /// Intended to be run from cron or a systemd timer. Sweeps every account
    /// unless --user narrows it to one.
    Run,
}
