//! Shared fixtures for the integration tests.

use tempfile::TempDir;
use vinyl_catalog::catalog_store::{
    CompositionFields, EnsembleFields, MusicianFields, RecordFields, ResolveMode,
    SqliteCatalogStore,
};

pub const ACTOR: &str = "clerk@example.com";

/// Opens a store backed by a fresh database file in a temp directory. The
/// TempDir must stay alive for as long as the store is used.
pub fn open_temp_store(resolve_mode: ResolveMode) -> (TempDir, SqliteCatalogStore) {
    let dir = TempDir::new().unwrap();
    let store = SqliteCatalogStore::open(dir.path().join("music_store.db"), resolve_mode).unwrap();
    (dir, store)
}

pub fn ensemble(name: &str, kind: &str) -> EnsembleFields {
    EnsembleFields {
        name: name.to_string(),
        kind: kind.to_string(),
        description: String::new(),
    }
}

pub fn musician(first: &str, middle: &str, last: &str) -> MusicianFields {
    MusicianFields {
        first_name: first.to_string(),
        middle_name: if middle.is_empty() {
            None
        } else {
            Some(middle.to_string())
        },
        last_name: last.to_string(),
        bio: String::new(),
    }
}

pub fn composition(title: &str, year: Option<i64>) -> CompositionFields {
    CompositionFields {
        title: title.to_string(),
        creation_year: year,
    }
}

pub fn record(title: &str, wholesale: f64, retail: f64, stock: i64) -> RecordFields {
    RecordFields {
        title: title.to_string(),
        wholesale_price: wholesale,
        retail_price: retail,
        disc_count: 1,
        remaining_stock: stock,
    }
}

/// A small catalog: two ensembles, two musicians, two compositions and a
/// record, wired together with one membership, two performances and one
/// track listing.
pub fn seed_catalog(store: &SqliteCatalogStore) {
    store.insert_ensemble(ACTOR, &ensemble("Quartet A", "jazz")).unwrap();
    store
        .insert_ensemble(ACTOR, &ensemble("Northern Lights", "classical"))
        .unwrap();
    store.insert_musician(ACTOR, &musician("Ann", "", "Lee")).unwrap();
    store
        .insert_musician(ACTOR, &musician("Omar", "K.", "Said"))
        .unwrap();
    store
        .insert_composition(ACTOR, &composition("Nocturne", Some(2021)))
        .unwrap();
    store
        .insert_composition(ACTOR, &composition("Aurora Suite", None))
        .unwrap();
    store
        .insert_record(ACTOR, &record("First Light", 5.0, 12.0, 50))
        .unwrap();

    store
        .add_membership(ACTOR, "Quartet A", "Ann Lee", "violin")
        .unwrap();
    store
        .add_performance(ACTOR, "Quartet A", "Nocturne", "")
        .unwrap();
    store
        .add_performance(ACTOR, "Northern Lights", "Aurora Suite", "string arrangement")
        .unwrap();
    store
        .add_record_track(ACTOR, "First Light", "Nocturne", 1)
        .unwrap();
}
