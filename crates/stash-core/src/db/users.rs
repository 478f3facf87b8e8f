//! User accounts and session tokens
//!
//! Passwords are hashed with Argon2id. Session tokens are opaque UUIDs
//! handed to the client once; only their SHA-256 digest is stored.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::{Duration, Utc};
use rusqlite::params;
use sha2::{Digest, Sha256};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

/// The authenticated principal attached to a request after token lookup
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl Database {
    /// A throwaway password for accounts nobody logs into directly
    pub fn random_password() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Create a user with a hashed password
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(Error::Validation("Username must not be empty".to_string()));
        }
        if password.len() < 8 {
            return Err(Error::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)",
            params![username, email, password_hash],
        )?;

        self.get_user(conn.last_insert_rowid())
    }

    /// Get a user by id
    pub fn get_user(&self, id: i64) -> Result<User> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, username, email, created_at FROM users WHERE id = ?",
            params![id],
            |row| {
                let created_at: String = row.get(3)?;
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_datetime(&created_at),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("User {}", id)),
            e => e.into(),
        })
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, username, email, created_at FROM users ORDER BY username")?;

        let users = stmt
            .query_map([], |row| {
                let created_at: String = row.get(3)?;
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Verify credentials and mint a session token
    ///
    /// Returns the raw token; the database only keeps its digest.
    pub fn login(&self, username: &str, password: &str, ttl_days: i64) -> Result<(User, String)> {
        let conn = self.conn()?;

        let (id, password_hash): (i64, String) = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Error::InvalidCredentials,
                e => Error::from(e),
            })?;

        if !verify_password(password, &password_hash)? {
            return Err(Error::InvalidCredentials);
        }

        let token = uuid::Uuid::new_v4().to_string();
        let expires_at = (Utc::now() + Duration::days(ttl_days)).format("%Y-%m-%d %H:%M:%S");

        conn.execute(
            "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)",
            params![hash_token(&token), id, expires_at.to_string()],
        )?;

        Ok((self.get_user(id)?, token))
    }

    /// Resolve a bearer token to its user, if the session is still valid
    pub fn authenticate(&self, token: &str) -> Result<Option<AuthUser>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                r#"
                SELECT u.id, u.username
                FROM sessions s
                JOIN users u ON u.id = s.user_id
                WHERE s.token_hash = ? AND s.expires_at > datetime('now')
                "#,
                params![hash_token(token)],
                |row| {
                    Ok(AuthUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .ok();

        Ok(user)
    }

    /// Revoke the session behind a token
    pub fn logout(&self, token: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM sessions WHERE token_hash = ?",
            params![hash_token(token)],
        )?;
        Ok(())
    }

    /// Remove sessions past their expiry
    pub fn prune_sessions(&self) -> Result<usize> {
        let conn = self.conn()?;
        let pruned = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= datetime('now')",
            [],
        )?;
        Ok(pruned)
    }
}
