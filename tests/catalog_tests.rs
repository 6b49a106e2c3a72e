mod common;

use common::*;
use vinyl_catalog::audit::{ActionKind, AuditLogFilter};
use vinyl_catalog::catalog_store::ResolveMode;

#[test]
fn membership_lists_join_display_names() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    store.insert_ensemble(ACTOR, &ensemble("Quartet A", "jazz")).unwrap();
    store.insert_musician(ACTOR, &musician("Ann", "", "Lee")).unwrap();
    store
        .add_membership(ACTOR, "Quartet A", "Ann Lee", "violin")
        .unwrap();

    let memberships = store.list_memberships().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].ensemble_name, "Quartet A");
    assert_eq!(memberships[0].musician_name, "Ann Lee");
    assert_eq!(memberships[0].role, "violin");
}

#[test]
fn relation_listings_include_middle_names() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);
    store
        .add_membership(ACTOR, "Northern Lights", "Omar K. Said", "cello")
        .unwrap();

    let memberships = store.list_memberships().unwrap();
    let omar = memberships
        .iter()
        .find(|m| m.ensemble_name == "Northern Lights")
        .unwrap();
    assert_eq!(omar.musician_name, "Omar K. Said");
}

#[test]
fn adding_a_relation_with_unknown_name_fails_and_writes_nothing() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    let err = store
        .add_membership(ACTOR, "No Such Band", "Ann Lee", "violin")
        .unwrap_err();
    assert!(err.to_string().contains("No Such Band"));

    // Only the seeded membership remains
    assert_eq!(store.list_memberships().unwrap().len(), 1);
}

#[test]
fn relation_update_is_atomic_or_nothing() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    // The new musician does not resolve: nothing may change.
    let result = store.update_membership(
        ACTOR,
        "Quartet A",
        "Ann Lee",
        "Quartet A",
        "Nobody Atall",
        "viola",
    );
    assert!(result.is_err());

    let memberships = store.list_memberships().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].musician_name, "Ann Lee");
    assert_eq!(memberships[0].role, "violin");
}

#[test]
fn relation_update_rewrites_the_row() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    store
        .update_membership(
            ACTOR,
            "Quartet A",
            "Ann Lee",
            "Northern Lights",
            "Omar K. Said",
            "cello",
        )
        .unwrap();

    let memberships = store.list_memberships().unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].ensemble_name, "Northern Lights");
    assert_eq!(memberships[0].musician_name, "Omar K. Said");
    assert_eq!(memberships[0].role, "cello");
}

#[test]
fn failed_relation_update_leaves_no_audit_entry() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);
    let logger = store.audit_logger();
    let before = logger
        .entries_for_user(ACTOR, &AuditLogFilter::new())
        .unwrap()
        .len();

    let _ = store.update_membership(
        ACTOR,
        "Quartet A",
        "Ann Lee",
        "No Such Band",
        "Ann Lee",
        "viola",
    );

    let after = logger
        .entries_for_user(ACTOR, &AuditLogFilter::new())
        .unwrap()
        .len();
    assert_eq!(before, after);
}

#[test]
fn every_mutation_appends_exactly_one_audit_entry() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    let logger = store.audit_logger();

    store.insert_ensemble(ACTOR, &ensemble("Quartet A", "jazz")).unwrap();
    let entries = logger
        .entries_for_user(ACTOR, &AuditLogFilter::new())
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, ActionKind::Add);
    assert_eq!(entries[0].entity_type, "ensemble");

    store.insert_musician(ACTOR, &musician("Ann", "", "Lee")).unwrap();
    store
        .add_membership(ACTOR, "Quartet A", "Ann Lee", "violin")
        .unwrap();
    store.remove_membership(ACTOR, "Quartet A", "Ann Lee").unwrap();

    let entries = logger
        .entries_for_user(ACTOR, &AuditLogFilter::new())
        .unwrap();
    assert_eq!(entries.len(), 4);
    // Newest first
    assert_eq!(entries[0].kind, ActionKind::Delete);
}

#[test]
fn deleting_an_ensemble_cascades_to_its_relations() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    let quartet = store
        .list_ensembles()
        .unwrap()
        .into_iter()
        .find(|e| e.name == "Quartet A")
        .unwrap();
    store.delete_ensemble(ACTOR, quartet.id).unwrap();

    assert!(store.list_memberships().unwrap().is_empty());
    let performances = store.list_performances().unwrap();
    assert_eq!(performances.len(), 1);
    assert_eq!(performances[0].ensemble_name, "Northern Lights");
    // Track listings reference records and compositions, not ensembles
    assert_eq!(store.list_record_tracks().unwrap().len(), 1);
}

#[test]
fn deleting_a_composition_cascades_to_performances_and_tracks() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    let nocturne = store
        .list_compositions()
        .unwrap()
        .into_iter()
        .find(|c| c.title == "Nocturne")
        .unwrap();
    store.delete_composition(ACTOR, nocturne.id).unwrap();

    assert!(store.list_record_tracks().unwrap().is_empty());
    let performances = store.list_performances().unwrap();
    assert_eq!(performances.len(), 1);
    assert_eq!(performances[0].composition_title, "Aurora Suite");
}

#[test]
fn sales_update_is_additive() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    let id = store
        .insert_record(ACTOR, &record("First Light", 5.0, 12.0, 50))
        .unwrap();

    store.update_record_sales(ACTOR, id, 100).unwrap();
    store.update_record_sales(ACTOR, id, 50).unwrap();

    let records = store.list_records().unwrap();
    assert_eq!(records[0].current_year_sales, 150);
}

#[test]
fn sales_update_rejects_non_positive_increments() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    let id = store
        .insert_record(ACTOR, &record("First Light", 5.0, 12.0, 50))
        .unwrap();

    assert!(store.update_record_sales(ACTOR, id, 0).is_err());
    assert!(store.update_record_sales(ACTOR, id, -10).is_err());
    assert_eq!(store.list_records().unwrap()[0].current_year_sales, 0);
}

#[test]
fn sales_update_on_missing_record_fails() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    assert!(store.update_record_sales(ACTOR, 42, 10).is_err());
}

#[test]
fn entity_updates_overwrite_fields() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    let id = store
        .insert_composition(ACTOR, &composition("Noctrune", Some(2021)))
        .unwrap();

    store
        .update_composition(ACTOR, id, &composition("Nocturne", Some(2022)))
        .unwrap();

    let compositions = store.list_compositions().unwrap();
    assert_eq!(compositions[0].title, "Nocturne");
    assert_eq!(compositions[0].creation_year, Some(2022));
}

#[test]
fn validation_rejects_bad_fields() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);

    assert!(store.insert_ensemble(ACTOR, &ensemble("", "jazz")).is_err());
    assert!(store
        .insert_composition(ACTOR, &composition("Nocturne", Some(42)))
        .is_err());
    assert!(store
        .insert_record(ACTOR, &record("Bad", -1.0, 12.0, 0))
        .is_err());

    seed_catalog(&store);
    assert!(store
        .add_record_track(ACTOR, "First Light", "Aurora Suite", 0)
        .is_err());
    assert!(store
        .add_record_track(ACTOR, "First Light", "Aurora Suite", 101)
        .is_err());
}

#[test]
fn duplicate_composition_per_record_is_rejected() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    // "Nocturne" is already track 1 on "First Light"
    assert!(store
        .add_record_track(ACTOR, "First Light", "Nocturne", 7)
        .is_err());
}

#[test]
fn lenient_mode_resolves_substrings_where_exact_mode_refuses() {
    let (_dir, lenient) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&lenient);
    lenient
        .add_performance(ACTOR, "Northern", "Nocturne", "")
        .unwrap();

    let (_dir2, exact) = open_temp_store(ResolveMode::Exact);
    seed_catalog(&exact);
    let err = exact
        .add_performance(ACTOR, "Northern", "Nocturne", "")
        .unwrap_err();
    assert!(err.to_string().contains("Northern"));
}

#[test]
fn decorated_display_strings_resolve() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    store
        .remove_membership(ACTOR, "1: Quartet A", "1: Ann Lee")
        .unwrap();
    assert!(store.list_memberships().unwrap().is_empty());
}

#[test]
fn repertoire_queries_follow_the_entity_graph() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    assert_eq!(store.ensemble_repertoire_size("Quartet A").unwrap(), 1);
    assert_eq!(store.ensemble_repertoire_size("No Such Band").unwrap(), 0);

    let records = store.ensemble_records("Quartet A").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "First Light");
    assert!(store.ensemble_records("Northern Lights").unwrap().is_empty());
}

#[test]
fn sales_leaders_are_ordered_and_limited() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    for (title, sales) in [("A", 10), ("B", 30), ("C", 20)] {
        let id = store
            .insert_record(ACTOR, &record(title, 1.0, 2.0, 5))
            .unwrap();
        store.update_record_sales(ACTOR, id, sales).unwrap();
    }

    let leaders = store.sales_leaders(2).unwrap();
    assert_eq!(leaders.len(), 2);
    assert_eq!(leaders[0].title, "B");
    assert_eq!(leaders[1].title, "C");
}

#[test]
fn counts_reflect_seeded_entities() {
    let (_dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);

    let counts = store.counts().unwrap();
    assert_eq!(counts.ensembles, 2);
    assert_eq!(counts.musicians, 2);
    assert_eq!(counts.compositions, 2);
    assert_eq!(counts.records, 1);
}

#[test]
fn store_reopens_against_an_existing_database() {
    let (dir, store) = open_temp_store(ResolveMode::Lenient);
    seed_catalog(&store);
    drop(store);

    let reopened = vinyl_catalog::SqliteCatalogStore::open(
        dir.path().join("music_store.db"),
        ResolveMode::Lenient,
    )
    .unwrap();
    assert_eq!(reopened.counts().unwrap().ensembles, 2);
    assert_eq!(reopened.list_memberships().unwrap().len(), 1);
}
