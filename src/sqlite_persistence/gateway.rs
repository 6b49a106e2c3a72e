//! Generic statement execution against the music-store database.
//!
//! The gateway is the loosest surface over the store: results come back as
//! ordered column-label/value pairs with NULLs normalized to empty strings,
//! and failures never reach the caller as errors. A failed query yields an
//! empty result set, a failed command yields `false`; both log the failing
//! statement. The analytics views and the table-shaped CLI output run
//! through here; the typed repository does not.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ToSql};
use std::sync::{Arc, Mutex};
use tracing::error;

/// One result row: column labels paired with rendered values, in
/// projection order. SQL NULL renders as `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, String)>,
}

impl Row {
    /// The value under a column label, or `""` when the label is absent.
    pub fn get(&self, column: &str) -> &str {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.columns
                .iter()
                .map(|(name, value)| (name.clone(), serde_json::Value::String(value.clone())))
                .collect(),
        )
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(r) => r.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => String::from_utf8_lossy(b).into_owned(),
    }
}

#[derive(Clone)]
pub struct Gateway {
    conn: Arc<Mutex<Connection>>,
}

impl Gateway {
    pub(crate) fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Gateway { conn }
    }

    /// Runs a read statement and returns its rows. Failures are logged
    /// together with the statement and degrade to an empty result.
    pub fn run_query(&self, sql: &str, params: &[&dyn ToSql]) -> Vec<Row> {
        let conn = self.conn.lock().unwrap();
        match query_rows(&conn, sql, params) {
            Ok(rows) => rows,
            Err(e) => {
                error!("query failed: {e}; statement: {sql}");
                Vec::new()
            }
        }
    }

    /// Runs a write statement. Returns true iff at least one row was
    /// affected; failures are logged and reported as `false`.
    pub fn run_command(&self, sql: &str, params: &[&dyn ToSql]) -> bool {
        let conn = self.conn.lock().unwrap();
        match conn.execute(sql, params) {
            Ok(affected) => affected > 0,
            Err(e) => {
                error!("command failed: {e}; statement: {sql}");
                false
            }
        }
    }
}

fn query_rows(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut columns = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            columns.push((name.clone(), render_value(row.get_ref(i)?)));
        }
        out.push(Row { columns });
    }
    Ok(out)
}
