//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_auth: bool) -> Result<()> {
    println!("🚀 Starting Stash web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Allowed CORS origins (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("STASH_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!("   🔒 Authentication: session tokens (register via the API)");
    }
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (STASH_ALLOWED_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    let config = stash_server::ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        ..Default::default()
    };

    stash_server::serve_with_config(db, host, port, config).await?;

    Ok(())
}
