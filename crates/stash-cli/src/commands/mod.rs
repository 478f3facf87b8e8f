//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, status) and shared utilities (open_db, resolve_user)
//! - `goals` - Savings goal and dashboard commands
//! - `rules` - Auto-save rule commands (list, run)
//! - `serve` - Web server command
//! - `users` - User account management commands

pub mod core;
pub mod goals;
pub mod rules;
pub mod serve;
pub mod users;

// Re-export command functions for main.rs
pub use core::*;
pub use goals::*;
pub use rules::*;
pub use serve::*;
pub use users::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
