//! Display-string to identifier resolution.
//!
//! The UI hands the store display strings (ensemble names, musician names,
//! titles), sometimes decorated as "id: Name". Resolution strips the
//! decoration, tries an exact match, and under lenient mode falls back to
//! a substring match, taking the first hit. The fallback tolerates display
//! drift (trailing whitespace, truncation) but can pick the wrong row when
//! names collide, so every fuzzy hit is logged with its match count and a
//! strict mode disables the fallback entirely.

use anyhow::Result;
use clap::ValueEnum;
use rusqlite::{params, Connection};
use thiserror::Error;
use tracing::warn;

/// Sentinel identifier: no matching entity found.
pub const NO_MATCH: i64 = 0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ResolveMode {
    /// Exact display-string match only.
    Exact,
    /// Exact match first, then substring fallback taking the first hit.
    #[default]
    Lenient,
}

/// A natural key failed to resolve; the write depending on it must abort.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no {entity} found matching '{value}'")]
    NotFound { entity: &'static str, value: String },
}

/// Strips the "id: " decoration from a display string: everything after
/// the first colon, trimmed. A plain name passes through trimmed, so the
/// function is idempotent.
pub fn extract_display_name(display: &str) -> String {
    match display.find(':') {
        Some(idx) => display[idx + 1..].trim().to_string(),
        None => display.trim().to_string(),
    }
}

/// Resolves a display value to an entity id by exact match on
/// `name_column`, with a substring fallback under lenient mode. Returns
/// [`NO_MATCH`] when nothing matches. Table and column names are
/// compile-time constants supplied by the store; only the value is bound.
pub(crate) fn resolve_entity_id(
    conn: &Connection,
    table: &'static str,
    id_column: &'static str,
    name_column: &'static str,
    mode: ResolveMode,
    display: &str,
) -> Result<i64> {
    let value = extract_display_name(display);
    if value.is_empty() {
        return Ok(NO_MATCH);
    }

    let exact_sql = format!(
        "SELECT {id_column} FROM {table} WHERE {name_column} = ?1 LIMIT 1"
    );
    if let Some(id) = query_first_id(conn, &exact_sql, &value)? {
        return Ok(id);
    }

    if mode == ResolveMode::Exact {
        return Ok(NO_MATCH);
    }

    let like_sql = format!(
        "SELECT {id_column} FROM {table} WHERE {name_column} LIKE '%' || ?1 || '%'"
    );
    let mut stmt = conn.prepare(&like_sql)?;
    let ids: Vec<i64> = stmt
        .query_map(params![value], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    match ids.first() {
        Some(&id) => {
            warn!(
                "fuzzy resolution: '{}' matched {} row(s) in {}, using id {}",
                value,
                ids.len(),
                table,
                id
            );
            Ok(id)
        }
        None => Ok(NO_MATCH),
    }
}

/// Resolves a musician display name. Tries, in order: exact match on the
/// full display form (first [middle] last), exact match on "first last",
/// then a split at the first space matching first/last name separately.
pub(crate) fn resolve_musician_id(
    conn: &Connection,
    mode: ResolveMode,
    display: &str,
) -> Result<i64> {
    let value = extract_display_name(display);
    if value.is_empty() {
        return Ok(NO_MATCH);
    }

    const FULL_DISPLAY_SQL: &str = "SELECT musician_id FROM musicians \
         WHERE first_name \
               || CASE WHEN middle_name IS NOT NULL AND middle_name != '' \
                       THEN ' ' || middle_name ELSE '' END \
               || ' ' || last_name = ?1 \
         LIMIT 1";
    if let Some(id) = query_first_id(conn, FULL_DISPLAY_SQL, &value)? {
        return Ok(id);
    }

    const SHORT_DISPLAY_SQL: &str = "SELECT musician_id FROM musicians \
         WHERE first_name || ' ' || last_name = ?1 LIMIT 1";
    if let Some(id) = query_first_id(conn, SHORT_DISPLAY_SQL, &value)? {
        return Ok(id);
    }

    if mode == ResolveMode::Exact {
        return Ok(NO_MATCH);
    }

    if let Some((first, last)) = value.split_once(' ') {
        let mut stmt = conn.prepare(
            "SELECT musician_id FROM musicians WHERE first_name = ?1 AND last_name = ?2",
        )?;
        let ids: Vec<i64> = stmt
            .query_map(params![first.trim(), last.trim()], |r| r.get(0))?
            .collect::<rusqlite::Result<_>>()?;
        if let Some(&id) = ids.first() {
            warn!(
                "fuzzy resolution: musician '{}' matched {} row(s) by split name, using id {}",
                value,
                ids.len(),
                id
            );
            return Ok(id);
        }
    }

    Ok(NO_MATCH)
}

fn query_first_id(conn: &Connection, sql: &str, value: &str) -> Result<Option<i64>> {
    match conn.query_row(sql, params![value], |r| r.get(0)) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
