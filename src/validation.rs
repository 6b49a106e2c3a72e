//! Defensive input checks.
//!
//! The UI layer validates before calling in; the store re-checks the
//! cheap invariants anyway so a bad caller cannot corrupt the catalog.

use anyhow::{bail, Result};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+_.-]+@.+$").unwrap());

/// Fails when a required text field is empty or whitespace.
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{field} is required");
    }
    Ok(())
}

pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Creation years are plain 4-digit years.
pub fn valid_creation_year(year: i64) -> bool {
    (1000..=9999).contains(&year)
}

/// Track numbers are positive and capped at 100.
pub fn valid_track_number(track_number: i64) -> bool {
    (1..=100).contains(&track_number)
}
