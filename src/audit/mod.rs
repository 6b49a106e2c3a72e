//! Per-user action trail.
//!
//! Every mutation in the catalog appends one row here, inside the same
//! transaction as the mutation itself, so the trail and the data cannot
//! drift apart. Session events (login/logout) use the standalone
//! fire-and-forget append: a trail write that fails must never block the
//! action it describes.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Client address capture is not implemented; every row records this
/// placeholder.
pub const PLACEHOLDER_ADDR: &str = "127.0.0.1";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The fixed action vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ActionKind {
    Add,
    Edit,
    Delete,
    Login,
    Logout,
}

impl ActionKind {
    pub fn to_db_str(self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Edit => "edit",
            ActionKind::Delete => "delete",
            ActionKind::Login => "login",
            ActionKind::Logout => "logout",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "add" => Some(ActionKind::Add),
            "edit" => Some(ActionKind::Edit),
            "delete" => Some(ActionKind::Delete),
            "login" => Some(ActionKind::Login),
            "logout" => Some(ActionKind::Logout),
            _ => None,
        }
    }
}

/// An action about to be appended to the trail.
#[derive(Clone, Debug)]
pub struct AuditEntry {
    pub user_email: String,
    pub kind: ActionKind,
    pub entity_type: String,
    pub details: String,
}

impl AuditEntry {
    pub fn new(
        user_email: impl Into<String>,
        kind: ActionKind,
        entity_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        AuditEntry {
            user_email: user_email.into(),
            kind,
            entity_type: entity_type.into(),
            details: details.into(),
        }
    }
}

/// A stored trail row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_email: String,
    pub action_date: String,
    pub kind: ActionKind,
    pub entity_type: String,
    pub details: String,
    pub ip_address: String,
}

/// Filter for the per-user trail view. Dates are inclusive and compared on
/// the calendar-day part of the stored timestamp.
#[derive(Clone, Debug, Default)]
pub struct AuditLogFilter {
    pub kind: Option<ActionKind>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl AuditLogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ActionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_from_date(mut self, date: NaiveDate) -> Self {
        self.from_date = Some(date);
        self
    }

    pub fn with_to_date(mut self, date: NaiveDate) -> Self {
        self.to_date = Some(date);
        self
    }
}

/// Appends one trail row using the caller's connection, so a repository
/// mutation can put the append inside its own transaction.
pub(crate) fn append_within(conn: &Connection, entry: &AuditEntry) -> Result<()> {
    let timestamp = Local::now().format(DATE_FORMAT).to_string();
    conn.execute(
        "INSERT INTO user_actions \
             (user_email, action_date, action_type, entity_type, action_details, ip_address) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.user_email,
            timestamp,
            entry.kind.to_db_str(),
            entry.entity_type,
            entry.details,
            PLACEHOLDER_ADDR,
        ],
    )?;
    Ok(())
}

/// Query/maintenance surface over the trail, sharing the store connection.
#[derive(Clone)]
pub struct AuditLogger {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogger {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        AuditLogger { conn }
    }

    /// Standalone fire-and-forget append, used for session events. A
    /// failure is logged and swallowed.
    pub fn log(
        &self,
        user_email: &str,
        kind: ActionKind,
        entity_type: &str,
        details: &str,
    ) {
        let entry = AuditEntry::new(user_email, kind, entity_type, details);
        let conn = self.conn.lock().unwrap();
        if let Err(e) = append_within(&conn, &entry) {
            warn!("failed to append audit entry for {user_email}: {e}");
        }
    }

    /// The trail for one user, newest first, optionally narrowed by action
    /// kind and an inclusive date range.
    pub fn entries_for_user(
        &self,
        user_email: &str,
        filter: &AuditLogFilter,
    ) -> Result<Vec<AuditLogEntry>> {
        let mut sql = String::from(
            "SELECT id, user_email, action_date, action_type, entity_type, action_details, ip_address \
             FROM user_actions WHERE user_email = ?1",
        );
        let mut params: Vec<String> = vec![user_email.to_string()];

        if let Some(kind) = filter.kind {
            params.push(kind.to_db_str().to_string());
            sql.push_str(&format!(" AND action_type = ?{}", params.len()));
        }
        if let Some(from) = filter.from_date {
            params.push(from.format("%Y-%m-%d").to_string());
            sql.push_str(&format!(" AND date(action_date) >= ?{}", params.len()));
        }
        if let Some(to) = filter.to_date {
            params.push(to.format("%Y-%m-%d").to_string());
            sql.push_str(&format!(" AND date(action_date) <= ?{}", params.len()));
        }
        sql.push_str(" ORDER BY action_date DESC, id DESC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let kind_str: String = row.get(3)?;
                Ok(AuditLogEntry {
                    id: row.get(0)?,
                    user_email: row.get(1)?,
                    action_date: row.get(2)?,
                    kind: ActionKind::from_db_str(&kind_str).unwrap_or(ActionKind::Edit),
                    entity_type: row.get(4)?,
                    details: row.get(5)?,
                    ip_address: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Deletes a user's whole trail. Returns the number of rows removed.
    pub fn clear_for_user(&self, user_email: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM user_actions WHERE user_email = ?1",
            params![user_email],
        )?;
        Ok(deleted)
    }

    /// Deletes trail rows older than the given number of days. Returns the
    /// number of rows removed.
    pub fn prune_older_than(&self, days: u32) -> Result<usize> {
        let cutoff = (Local::now() - chrono::Duration::days(days as i64))
            .format(DATE_FORMAT)
            .to_string();
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM user_actions WHERE action_date < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}
