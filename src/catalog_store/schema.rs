//! SQLite schema for the music-store database.
//!
//! One database file holds the whole store: the catalog entities, their
//! junction tables, the user accounts and the action trail. Primary keys
//! are integer rowids; natural keys used by the UI (ensemble names,
//! relation pairs) carry UNIQUE constraints. Junction tables cascade on
//! delete so removing an entity removes its relations with it.

use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

// =============================================================================
// Catalog Entities
// =============================================================================

const ENSEMBLES_TABLE: Table = Table {
    name: "ensembles",
    columns: &[
        Column::new("ensemble_id", SqlType::Integer).primary_key(),
        // Ensembles are addressed by name everywhere the UI hands us a
        // display string.
        Column::new("name", SqlType::Text).non_null().unique(),
        Column::new("type", SqlType::Text).non_null(),
        Column::new("description", SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const MUSICIANS_TABLE: Table = Table {
    name: "musicians",
    columns: &[
        Column::new("musician_id", SqlType::Integer).primary_key(),
        Column::new("first_name", SqlType::Text).non_null(),
        Column::new("middle_name", SqlType::Text),
        Column::new("last_name", SqlType::Text).non_null(),
        Column::new("bio", SqlType::Text),
    ],
    indices: &[("idx_musicians_last_name", "last_name")],
    unique_constraints: &[],
};

const COMPOSITIONS_TABLE: Table = Table {
    name: "compositions",
    columns: &[
        Column::new("composition_id", SqlType::Integer).primary_key(),
        Column::new("title", SqlType::Text).non_null(),
        Column::new("creation_year", SqlType::Integer),
    ],
    indices: &[("idx_compositions_title", "title")],
    unique_constraints: &[],
};

const RECORDS_TABLE: Table = Table {
    name: "records",
    columns: &[
        Column::new("record_id", SqlType::Integer).primary_key(),
        Column::new("title", SqlType::Text).non_null(),
        Column::new("wholesale_price", SqlType::Real).non_null().default("0"),
        Column::new("retail_price", SqlType::Real).non_null().default("0"),
        Column::new("disc_count", SqlType::Integer).non_null().default("1"),
        Column::new("current_year_sales", SqlType::Integer)
            .non_null()
            .default("0"),
        Column::new("remaining_stock", SqlType::Integer)
            .non_null()
            .default("0"),
    ],
    indices: &[("idx_records_title", "title")],
    unique_constraints: &[],
};

// =============================================================================
// Junction Tables
// =============================================================================

const ENSEMBLE_MEMBERS_TABLE: Table = Table {
    name: "ensemble_members",
    columns: &[
        Column::new("ensemble_id", SqlType::Integer)
            .non_null()
            .references("ensembles", "ensemble_id"),
        Column::new("musician_id", SqlType::Integer)
            .non_null()
            .references("musicians", "musician_id"),
        Column::new("role", SqlType::Text).non_null(),
    ],
    indices: &[("idx_ensemble_members_musician", "musician_id")],
    // One role per musician per ensemble; an update overwrites.
    unique_constraints: &[&["ensemble_id", "musician_id"]],
};

const PERFORMANCES_TABLE: Table = Table {
    name: "performances",
    columns: &[
        Column::new("ensemble_id", SqlType::Integer)
            .non_null()
            .references("ensembles", "ensemble_id"),
        Column::new("composition_id", SqlType::Integer)
            .non_null()
            .references("compositions", "composition_id"),
        Column::new("arrangement", SqlType::Text),
    ],
    indices: &[("idx_performances_composition", "composition_id")],
    unique_constraints: &[&["ensemble_id", "composition_id"]],
};

const RECORD_TRACKS_TABLE: Table = Table {
    name: "record_tracks",
    columns: &[
        Column::new("record_id", SqlType::Integer)
            .non_null()
            .references("records", "record_id"),
        Column::new("composition_id", SqlType::Integer)
            .non_null()
            .references("compositions", "composition_id"),
        Column::new("track_number", SqlType::Integer).non_null(),
    ],
    indices: &[("idx_record_tracks_composition", "composition_id")],
    // A composition appears at most once per record; track_number is only
    // range-checked, not unique within a record.
    unique_constraints: &[&["record_id", "composition_id"]],
};

// =============================================================================
// Accounts & Action Trail
// =============================================================================

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("email", SqlType::Text).non_null().unique(),
        Column::new("password_hash", SqlType::Text).non_null(),
        Column::new("salt", SqlType::Text).non_null(),
        Column::new("hasher", SqlType::Text).non_null(),
        Column::new("role", SqlType::Text).non_null(),
        Column::new("full_name", SqlType::Text).non_null(),
        Column::new("phone", SqlType::Text),
        Column::new("created", SqlType::Integer).default(DEFAULT_TIMESTAMP),
    ],
    indices: &[],
    unique_constraints: &[],
};

const USER_ACTIONS_TABLE: Table = Table {
    name: "user_actions",
    columns: &[
        Column::new("id", SqlType::Integer).primary_key(),
        Column::new("user_email", SqlType::Text).non_null(),
        // "YYYY-MM-DD HH:MM:SS", local time; lexicographic order is
        // chronological order.
        Column::new("action_date", SqlType::Text).non_null(),
        Column::new("action_type", SqlType::Text).non_null(),
        Column::new("entity_type", SqlType::Text).non_null(),
        Column::new("action_details", SqlType::Text).non_null(),
        Column::new("ip_address", SqlType::Text).non_null(),
    ],
    indices: &[("idx_user_actions_email", "user_email")],
    unique_constraints: &[],
};

// =============================================================================
// Versioned Schema Definition
// =============================================================================

pub const MUSIC_STORE_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        ENSEMBLES_TABLE,
        MUSICIANS_TABLE,
        COMPOSITIONS_TABLE,
        RECORDS_TABLE,
        ENSEMBLE_MEMBERS_TABLE,
        PERFORMANCES_TABLE,
        RECORD_TRACKS_TABLE,
        USERS_TABLE,
        USER_ACTIONS_TABLE,
    ],
    migration: None,
}];
