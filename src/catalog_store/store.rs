//! SQLite-backed music-store repository.
//!
//! `SqliteCatalogStore` owns the single shared connection to the store
//! database and exposes typed CRUD over the catalog entities, the
//! name-keyed relation operations, and the sales counter. Every mutation
//! carries the acting user's email and commits its audit row in the same
//! transaction as the write itself; a rolled-back mutation leaves no trail
//! entry behind.
//!
//! All access is serialized through one connection. Fine for the
//! single-session desktop client this backs; it is the scaling limit to
//! revisit before anything multi-user.

use super::models::*;
use super::resolve::{
    resolve_entity_id, resolve_musician_id, ResolveError, ResolveMode, NO_MATCH,
};
use super::schema::MUSIC_STORE_SCHEMAS;
use crate::audit::{self, ActionKind, AuditEntry, AuditLogger};
use crate::sqlite_persistence::{Gateway, BASE_DB_VERSION};
use crate::user::SqliteUserStore;
use crate::validation;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
    resolve_mode: ResolveMode,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    let latest_version = MUSIC_STORE_SCHEMAS.len() - 1;
    let latest_schema = &MUSIC_STORE_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating music-store db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    if db_version < BASE_DB_VERSION as i64 {
        bail!("database is not a music-store database (user_version {db_version})");
    }
    let mut current_version = (db_version - BASE_DB_VERSION as i64) as usize;
    if current_version >= latest_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in MUSIC_STORE_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating music-store db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteCatalogStore {
    pub fn open<P: AsRef<Path>>(db_path: P, resolve_mode: ResolveMode) -> Result<Self> {
        let mut conn = Connection::open_with_flags(
            db_path.as_ref(),
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE,
        )
        .context("Failed to open music-store database")?;

        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        // Per-connection pragma; the cascade rules depend on it.
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            resolve_mode,
        };

        let counts = store.counts()?;
        info!(
            "Opened music store: {} ensembles, {} musicians, {} compositions, {} records",
            counts.ensembles, counts.musicians, counts.compositions, counts.records
        );
        Ok(store)
    }

    pub fn in_memory(resolve_mode: ResolveMode) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            resolve_mode,
        })
    }

    /// Generic statement surface sharing this store's connection.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.conn.clone())
    }

    /// Action-trail query surface sharing this store's connection.
    pub fn audit_logger(&self) -> AuditLogger {
        AuditLogger::new(self.conn.clone())
    }

    /// Account store sharing this store's connection.
    pub fn user_store(&self) -> SqliteUserStore {
        SqliteUserStore::new(self.conn.clone())
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        let conn = self.conn.lock().unwrap();
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
        };
        Ok(StoreCounts {
            ensembles: count("ensembles")?,
            musicians: count("musicians")?,
            compositions: count("compositions")?,
            records: count("records")?,
        })
    }

    // =========================================================================
    // Ensembles
    // =========================================================================

    pub fn list_ensembles(&self) -> Result<Vec<Ensemble>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT ensemble_id, name, type, description FROM ensembles ORDER BY name",
        )?;
        let ensembles = stmt
            .query_map([], |r| {
                Ok(Ensemble {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    kind: r.get(2)?,
                    description: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(ensembles)
    }

    pub fn insert_ensemble(&self, actor: &str, fields: &EnsembleFields) -> Result<i64> {
        validation::require("name", &fields.name)?;
        validation::require("type", &fields.kind)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO ensembles (name, type, description) VALUES (?1, ?2, ?3)",
            params![fields.name, fields.kind, fields.description],
        )?;
        let id = tx.last_insert_rowid();
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "ensemble",
                format!("added ensemble: {}", fields.name),
            ),
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_ensemble(&self, actor: &str, id: i64, fields: &EnsembleFields) -> Result<()> {
        validation::require("name", &fields.name)?;
        validation::require("type", &fields.kind)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE ensembles SET name = ?1, type = ?2, description = ?3 WHERE ensemble_id = ?4",
            params![fields.name, fields.kind, fields.description, id],
        )?;
        if changed == 0 {
            bail!("ensemble {} not found", id);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "ensemble",
                format!("updated ensemble: {}", fields.name),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Deletes an ensemble; its memberships and performances go with it
    /// (cascade rules in the schema).
    pub fn delete_ensemble(&self, actor: &str, id: i64) -> Result<()> {
        self.delete_entity(actor, "ensembles", "ensemble_id", "ensemble", id)
    }

    // =========================================================================
    // Musicians
    // =========================================================================

    pub fn list_musicians(&self) -> Result<Vec<Musician>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT musician_id, first_name, middle_name, last_name, bio FROM musicians \
             ORDER BY last_name, first_name",
        )?;
        let musicians = stmt
            .query_map([], |r| {
                Ok(Musician {
                    id: r.get(0)?,
                    first_name: r.get(1)?,
                    middle_name: r.get(2)?,
                    last_name: r.get(3)?,
                    bio: r.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(musicians)
    }

    pub fn insert_musician(&self, actor: &str, fields: &MusicianFields) -> Result<i64> {
        validation::require("first_name", &fields.first_name)?;
        validation::require("last_name", &fields.last_name)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO musicians (first_name, middle_name, last_name, bio) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.first_name,
                fields.middle_name,
                fields.last_name,
                fields.bio
            ],
        )?;
        let id = tx.last_insert_rowid();
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "musician",
                format!("added musician: {} {}", fields.first_name, fields.last_name),
            ),
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_musician(&self, actor: &str, id: i64, fields: &MusicianFields) -> Result<()> {
        validation::require("first_name", &fields.first_name)?;
        validation::require("last_name", &fields.last_name)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE musicians SET first_name = ?1, middle_name = ?2, last_name = ?3, bio = ?4 \
             WHERE musician_id = ?5",
            params![
                fields.first_name,
                fields.middle_name,
                fields.last_name,
                fields.bio,
                id
            ],
        )?;
        if changed == 0 {
            bail!("musician {} not found", id);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "musician",
                format!("updated musician: {} {}", fields.first_name, fields.last_name),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_musician(&self, actor: &str, id: i64) -> Result<()> {
        self.delete_entity(actor, "musicians", "musician_id", "musician", id)
    }

    // =========================================================================
    // Compositions
    // =========================================================================

    pub fn list_compositions(&self) -> Result<Vec<Composition>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT composition_id, title, creation_year FROM compositions ORDER BY title",
        )?;
        let compositions = stmt
            .query_map([], |r| {
                Ok(Composition {
                    id: r.get(0)?,
                    title: r.get(1)?,
                    creation_year: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(compositions)
    }

    pub fn insert_composition(&self, actor: &str, fields: &CompositionFields) -> Result<i64> {
        validation::require("title", &fields.title)?;
        if let Some(year) = fields.creation_year {
            if !validation::valid_creation_year(year) {
                bail!("creation_year must be a 4-digit year, got {}", year);
            }
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO compositions (title, creation_year) VALUES (?1, ?2)",
            params![fields.title, fields.creation_year],
        )?;
        let id = tx.last_insert_rowid();
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "composition",
                format!("added composition: {}", fields.title),
            ),
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_composition(
        &self,
        actor: &str,
        id: i64,
        fields: &CompositionFields,
    ) -> Result<()> {
        validation::require("title", &fields.title)?;
        if let Some(year) = fields.creation_year {
            if !validation::valid_creation_year(year) {
                bail!("creation_year must be a 4-digit year, got {}", year);
            }
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE compositions SET title = ?1, creation_year = ?2 WHERE composition_id = ?3",
            params![fields.title, fields.creation_year, id],
        )?;
        if changed == 0 {
            bail!("composition {} not found", id);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "composition",
                format!("updated composition: {}", fields.title),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_composition(&self, actor: &str, id: i64) -> Result<()> {
        self.delete_entity(actor, "compositions", "composition_id", "composition", id)
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub fn list_records(&self) -> Result<Vec<Record>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT record_id, title, wholesale_price, retail_price, disc_count, \
                    current_year_sales, remaining_stock \
             FROM records ORDER BY title",
        )?;
        let records = stmt
            .query_map([], Self::parse_record_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(records)
    }

    fn parse_record_row(r: &rusqlite::Row) -> rusqlite::Result<Record> {
        Ok(Record {
            id: r.get(0)?,
            title: r.get(1)?,
            wholesale_price: r.get(2)?,
            retail_price: r.get(3)?,
            disc_count: r.get(4)?,
            current_year_sales: r.get(5)?,
            remaining_stock: r.get(6)?,
        })
    }

    fn check_record_fields(fields: &RecordFields) -> Result<()> {
        validation::require("title", &fields.title)?;
        if fields.wholesale_price < 0.0 || fields.retail_price < 0.0 {
            bail!("record prices cannot be negative");
        }
        if fields.disc_count < 1 {
            bail!("disc_count must be at least 1");
        }
        if fields.remaining_stock < 0 {
            bail!("remaining_stock cannot be negative");
        }
        Ok(())
    }

    pub fn insert_record(&self, actor: &str, fields: &RecordFields) -> Result<i64> {
        Self::check_record_fields(fields)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO records (title, wholesale_price, retail_price, disc_count, remaining_stock) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.title,
                fields.wholesale_price,
                fields.retail_price,
                fields.disc_count,
                fields.remaining_stock
            ],
        )?;
        let id = tx.last_insert_rowid();
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "record",
                format!("added record: {}", fields.title),
            ),
        )?;
        tx.commit()?;
        Ok(id)
    }

    pub fn update_record(&self, actor: &str, id: i64, fields: &RecordFields) -> Result<()> {
        Self::check_record_fields(fields)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE records SET title = ?1, wholesale_price = ?2, retail_price = ?3, \
                    disc_count = ?4, remaining_stock = ?5 \
             WHERE record_id = ?6",
            params![
                fields.title,
                fields.wholesale_price,
                fields.retail_price,
                fields.disc_count,
                fields.remaining_stock,
                id
            ],
        )?;
        if changed == 0 {
            bail!("record {} not found", id);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "record",
                format!("updated record: {}", fields.title),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_record(&self, actor: &str, id: i64) -> Result<()> {
        self.delete_entity(actor, "records", "record_id", "record", id)
    }

    /// Adds to the current-year sales counter. The counter only moves
    /// through this operation, and only upward.
    pub fn update_record_sales(&self, actor: &str, record_id: i64, additional: i64) -> Result<()> {
        if additional <= 0 {
            bail!("sales increment must be positive, got {}", additional);
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let title: String = match tx.query_row(
            "SELECT title FROM records WHERE record_id = ?1",
            params![record_id],
            |r| r.get(0),
        ) {
            Ok(title) => title,
            Err(rusqlite::Error::QueryReturnedNoRows) => bail!("record {} not found", record_id),
            Err(e) => return Err(e.into()),
        };
        tx.execute(
            "UPDATE records SET current_year_sales = current_year_sales + ?1 WHERE record_id = ?2",
            params![additional, record_id],
        )?;
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "record",
                format!("sales +{} for record: {}", additional, title),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Ensemble membership
    // =========================================================================

    pub fn list_memberships(&self) -> Result<Vec<MembershipRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT e.name, \
                    m.first_name \
                    || CASE WHEN m.middle_name IS NOT NULL AND m.middle_name != '' \
                            THEN ' ' || m.middle_name ELSE '' END \
                    || ' ' || m.last_name, \
                    em.role \
             FROM ensemble_members em \
             JOIN ensembles e ON em.ensemble_id = e.ensemble_id \
             JOIN musicians m ON em.musician_id = m.musician_id \
             ORDER BY e.name, em.role",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(MembershipRow {
                    ensemble_name: r.get(0)?,
                    musician_name: r.get(1)?,
                    role: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    pub fn add_membership(
        &self,
        actor: &str,
        ensemble: &str,
        musician: &str,
        role: &str,
    ) -> Result<()> {
        validation::require("role", role)?;

        let mut conn = self.conn.lock().unwrap();
        let ensemble_id = self.ensemble_id(&conn, ensemble)?;
        let musician_id = self.musician_id(&conn, musician)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO ensemble_members (ensemble_id, musician_id, role) VALUES (?1, ?2, ?3)",
            params![ensemble_id, musician_id, role],
        )?;
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "membership",
                format!("added musician {} to ensemble {} as {}", musician, ensemble, role),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Rewrites a membership row addressed by its old natural key. All
    /// four names must resolve before anything is written; a single
    /// failure aborts the whole update.
    #[allow(clippy::too_many_arguments)]
    pub fn update_membership(
        &self,
        actor: &str,
        old_ensemble: &str,
        old_musician: &str,
        new_ensemble: &str,
        new_musician: &str,
        new_role: &str,
    ) -> Result<()> {
        validation::require("role", new_role)?;

        let mut conn = self.conn.lock().unwrap();
        let old_ensemble_id = self.ensemble_id(&conn, old_ensemble)?;
        let old_musician_id = self.musician_id(&conn, old_musician)?;
        let new_ensemble_id = self.ensemble_id(&conn, new_ensemble)?;
        let new_musician_id = self.musician_id(&conn, new_musician)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE ensemble_members SET ensemble_id = ?1, musician_id = ?2, role = ?3 \
             WHERE ensemble_id = ?4 AND musician_id = ?5",
            params![
                new_ensemble_id,
                new_musician_id,
                new_role,
                old_ensemble_id,
                old_musician_id
            ],
        )?;
        if changed == 0 {
            bail!("no membership of {} in {}", old_musician, old_ensemble);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "membership",
                format!(
                    "updated membership: {} in {} -> {} in {} as {}",
                    old_musician, old_ensemble, new_musician, new_ensemble, new_role
                ),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn remove_membership(&self, actor: &str, ensemble: &str, musician: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let ensemble_id = self.ensemble_id(&conn, ensemble)?;
        let musician_id = self.musician_id(&conn, musician)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "DELETE FROM ensemble_members WHERE ensemble_id = ?1 AND musician_id = ?2",
            params![ensemble_id, musician_id],
        )?;
        if changed == 0 {
            bail!("no membership of {} in {}", musician, ensemble);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Delete,
                "membership",
                format!("removed musician {} from ensemble {}", musician, ensemble),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Performances
    // =========================================================================

    pub fn list_performances(&self) -> Result<Vec<PerformanceRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT e.name, c.title, p.arrangement \
             FROM performances p \
             JOIN ensembles e ON p.ensemble_id = e.ensemble_id \
             JOIN compositions c ON p.composition_id = c.composition_id \
             ORDER BY e.name, c.title",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(PerformanceRow {
                    ensemble_name: r.get(0)?,
                    composition_title: r.get(1)?,
                    arrangement: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    pub fn add_performance(
        &self,
        actor: &str,
        ensemble: &str,
        composition: &str,
        arrangement: &str,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let ensemble_id = self.ensemble_id(&conn, ensemble)?;
        let composition_id = self.composition_id(&conn, composition)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO performances (ensemble_id, composition_id, arrangement) \
             VALUES (?1, ?2, ?3)",
            params![ensemble_id, composition_id, arrangement],
        )?;
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "performance",
                format!("added performance of {} by ensemble {}", composition, ensemble),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_performance(
        &self,
        actor: &str,
        old_ensemble: &str,
        old_composition: &str,
        new_ensemble: &str,
        new_composition: &str,
        new_arrangement: &str,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let old_ensemble_id = self.ensemble_id(&conn, old_ensemble)?;
        let old_composition_id = self.composition_id(&conn, old_composition)?;
        let new_ensemble_id = self.ensemble_id(&conn, new_ensemble)?;
        let new_composition_id = self.composition_id(&conn, new_composition)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE performances SET ensemble_id = ?1, composition_id = ?2, arrangement = ?3 \
             WHERE ensemble_id = ?4 AND composition_id = ?5",
            params![
                new_ensemble_id,
                new_composition_id,
                new_arrangement,
                old_ensemble_id,
                old_composition_id
            ],
        )?;
        if changed == 0 {
            bail!("no performance of {} by {}", old_composition, old_ensemble);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "performance",
                format!(
                    "updated performance: {} by {} -> {} by {}",
                    old_composition, old_ensemble, new_composition, new_ensemble
                ),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn remove_performance(
        &self,
        actor: &str,
        ensemble: &str,
        composition: &str,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let ensemble_id = self.ensemble_id(&conn, ensemble)?;
        let composition_id = self.composition_id(&conn, composition)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "DELETE FROM performances WHERE ensemble_id = ?1 AND composition_id = ?2",
            params![ensemble_id, composition_id],
        )?;
        if changed == 0 {
            bail!("no performance of {} by {}", composition, ensemble);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Delete,
                "performance",
                format!("removed performance of {} by ensemble {}", composition, ensemble),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Record tracks
    // =========================================================================

    pub fn list_record_tracks(&self) -> Result<Vec<TrackRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT r.title, c.title, rt.track_number \
             FROM record_tracks rt \
             JOIN records r ON rt.record_id = r.record_id \
             JOIN compositions c ON rt.composition_id = c.composition_id \
             ORDER BY r.title, rt.track_number",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(TrackRow {
                    record_title: r.get(0)?,
                    composition_title: r.get(1)?,
                    track_number: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(rows)
    }

    pub fn add_record_track(
        &self,
        actor: &str,
        record: &str,
        composition: &str,
        track_number: i64,
    ) -> Result<()> {
        if !validation::valid_track_number(track_number) {
            bail!("track_number must be between 1 and 100, got {}", track_number);
        }

        let mut conn = self.conn.lock().unwrap();
        let record_id = self.record_id(&conn, record)?;
        let composition_id = self.composition_id(&conn, composition)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO record_tracks (record_id, composition_id, track_number) \
             VALUES (?1, ?2, ?3)",
            params![record_id, composition_id, track_number],
        )?;
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Add,
                "record track",
                format!("added track {} on record {}: {}", track_number, record, composition),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_record_track(
        &self,
        actor: &str,
        old_record: &str,
        old_composition: &str,
        new_record: &str,
        new_composition: &str,
        new_track_number: i64,
    ) -> Result<()> {
        if !validation::valid_track_number(new_track_number) {
            bail!(
                "track_number must be between 1 and 100, got {}",
                new_track_number
            );
        }

        let mut conn = self.conn.lock().unwrap();
        let old_record_id = self.record_id(&conn, old_record)?;
        let old_composition_id = self.composition_id(&conn, old_composition)?;
        let new_record_id = self.record_id(&conn, new_record)?;
        let new_composition_id = self.composition_id(&conn, new_composition)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE record_tracks SET record_id = ?1, composition_id = ?2, track_number = ?3 \
             WHERE record_id = ?4 AND composition_id = ?5",
            params![
                new_record_id,
                new_composition_id,
                new_track_number,
                old_record_id,
                old_composition_id
            ],
        )?;
        if changed == 0 {
            bail!("no track {} on record {}", old_composition, old_record);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Edit,
                "record track",
                format!(
                    "updated track: {} on {} -> {} on {} (no. {})",
                    old_composition, old_record, new_composition, new_record, new_track_number
                ),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn remove_record_track(
        &self,
        actor: &str,
        record: &str,
        composition: &str,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let record_id = self.record_id(&conn, record)?;
        let composition_id = self.composition_id(&conn, composition)?;

        let tx = conn.transaction()?;
        let changed = tx.execute(
            "DELETE FROM record_tracks WHERE record_id = ?1 AND composition_id = ?2",
            params![record_id, composition_id],
        )?;
        if changed == 0 {
            bail!("no track {} on record {}", composition, record);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Delete,
                "record track",
                format!("removed track {} from record {}", composition, record),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    // =========================================================================
    // Repertoire queries
    // =========================================================================

    /// Number of distinct compositions an ensemble performs.
    pub fn ensemble_repertoire_size(&self, ensemble_name: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row(
            "SELECT COUNT(DISTINCT p.composition_id) \
             FROM ensembles e \
             JOIN performances p ON e.ensemble_id = p.ensemble_id \
             WHERE e.name = ?1",
            params![ensemble_name],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Records carrying at least one composition the ensemble performs.
    pub fn ensemble_records(&self, ensemble_name: &str) -> Result<Vec<Record>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT DISTINCT r.record_id, r.title, r.wholesale_price, r.retail_price, \
                    r.disc_count, r.current_year_sales, r.remaining_stock \
             FROM records r \
             JOIN record_tracks rt ON r.record_id = rt.record_id \
             JOIN performances p ON rt.composition_id = p.composition_id \
             JOIN ensembles e ON p.ensemble_id = e.ensemble_id \
             WHERE e.name = ?1 \
             ORDER BY r.title",
        )?;
        let records = stmt
            .query_map(params![ensemble_name], Self::parse_record_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(records)
    }

    /// Top records by current-year sales.
    pub fn sales_leaders(&self, limit: usize) -> Result<Vec<Record>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT record_id, title, wholesale_price, retail_price, disc_count, \
                    current_year_sales, remaining_stock \
             FROM records ORDER BY current_year_sales DESC LIMIT ?1",
        )?;
        let records = stmt
            .query_map(params![limit as i64], Self::parse_record_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(records)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn delete_entity(
        &self,
        actor: &str,
        table: &'static str,
        id_column: &'static str,
        entity_type: &'static str,
        id: i64,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            &format!("DELETE FROM {table} WHERE {id_column} = ?1"),
            params![id],
        )?;
        if changed == 0 {
            bail!("{} {} not found", entity_type, id);
        }
        audit::append_within(
            &tx,
            &AuditEntry::new(
                actor,
                ActionKind::Delete,
                entity_type,
                format!("removed {} id {}", entity_type, id),
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn ensemble_id(&self, conn: &Connection, display: &str) -> Result<i64> {
        let id = resolve_entity_id(
            conn,
            "ensembles",
            "ensemble_id",
            "name",
            self.resolve_mode,
            display,
        )?;
        Self::checked(id, "ensemble", display)
    }

    fn musician_id(&self, conn: &Connection, display: &str) -> Result<i64> {
        let id = resolve_musician_id(conn, self.resolve_mode, display)?;
        Self::checked(id, "musician", display)
    }

    fn composition_id(&self, conn: &Connection, display: &str) -> Result<i64> {
        let id = resolve_entity_id(
            conn,
            "compositions",
            "composition_id",
            "title",
            self.resolve_mode,
            display,
        )?;
        Self::checked(id, "composition", display)
    }

    fn record_id(&self, conn: &Connection, display: &str) -> Result<i64> {
        let id = resolve_entity_id(
            conn,
            "records",
            "record_id",
            "title",
            self.resolve_mode,
            display,
        )?;
        Self::checked(id, "record", display)
    }

    fn checked(id: i64, entity: &'static str, display: &str) -> Result<i64> {
        if id == NO_MATCH {
            return Err(ResolveError::NotFound {
                entity,
                value: display.to_string(),
            }
            .into());
        }
        Ok(id)
    }
}
