//! Account storage over the shared music-store connection.

use super::password;
use super::user_models::{NewUser, UserAccount, UserRole};
use super::user_store::UserStore;
use crate::validation;
use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        SqliteUserStore { conn }
    }

    fn parse_account_row(row: &rusqlite::Row) -> rusqlite::Result<UserAccount> {
        let role_str: String = row.get(2)?;
        Ok(UserAccount {
            id: row.get(0)?,
            email: row.get(1)?,
            role: UserRole::from_db_str(&role_str).unwrap_or(UserRole::User),
            full_name: row.get(3)?,
            phone: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            created: row.get(5)?,
        })
    }
}

impl UserStore for SqliteUserStore {
    fn register(&self, new_user: &NewUser) -> Result<bool> {
        validation::require("email", &new_user.email)?;
        validation::require("password", &new_user.password)?;
        validation::require("full_name", &new_user.full_name)?;
        if !validation::valid_email(&new_user.email) {
            bail!("malformed email: {}", new_user.email);
        }

        let conn = self.conn.lock().unwrap();
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM users WHERE email = ?1",
                params![new_user.email],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            warn!("registration rejected, email already taken: {}", new_user.email);
            return Ok(false);
        }

        let salt = password::generate_b64_salt();
        let hash = password::hash(&new_user.password, &salt)?;
        conn.execute(
            "INSERT INTO users (email, password_hash, salt, hasher, role, full_name, phone) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new_user.email,
                hash,
                salt,
                password::HASHER_NAME,
                new_user.role.to_db_str(),
                new_user.full_name,
                new_user.phone,
            ],
        )?;
        info!("registered {} account: {}", new_user.role.to_db_str(), new_user.email);
        Ok(true)
    }

    fn authenticate(&self, email: &str, password_plain: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_hash FROM users WHERE email = ?1",
                params![email],
                |r| r.get(0),
            )
            .optional()?;
        match stored {
            Some(hash) => password::verify(password_plain, &hash),
            None => Ok(false),
        }
    }

    fn get_user(&self, email: &str) -> Result<Option<UserAccount>> {
        let conn = self.conn.lock().unwrap();
        let account = conn
            .query_row(
                "SELECT id, email, role, full_name, phone, created FROM users WHERE email = ?1",
                params![email],
                Self::parse_account_row,
            )
            .optional()?;
        Ok(account)
    }

    fn list_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached("SELECT email FROM users ORDER BY email")?;
        let emails = stmt
            .query_map([], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(emails)
    }
}
