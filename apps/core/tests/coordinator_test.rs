mod common;

use clipfind_core::catalog::{CatalogError, CatalogSource};
use clipfind_core::catalog_store::SqliteConnector;
use clipfind_core::config::ReconnectPolicy;
use clipfind_core::coordinator::{QueryCoordinator, RoundOutcome};

use common::{sunset_rows, write_catalog};

fn coordinator(sources: Vec<CatalogSource>) -> QueryCoordinator {
    QueryCoordinator::new(sources, Box::new(SqliteConnector))
}

#[test]
fn missing_catalog_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let present = write_catalog(dir.path(), "present.db", &sunset_rows());
    let missing = dir.path().join("missing.db");

    let mut coordinator = coordinator(vec![CatalogSource::new(&present), CatalogSource::new(&missing)]);
    let failures = coordinator.connect_missing();

    assert_eq!(failures.len(), 1);
    assert!(matches!(&failures[0], CatalogError::Connection { catalog, .. } if catalog == "missing.db"));
    assert_eq!(coordinator.active_count(), 1);

    let results = coordinator.run("sunset");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].catalog_name, "present.db");
    assert_eq!(results[0].original_token.as_str(), "sunset");
    assert_eq!(results[0].count, 2);
}

#[test]
fn results_follow_declaration_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_catalog(dir.path(), "zeta.db", &sunset_rows());
    let second = write_catalog(dir.path(), "alpha.db", &[("old sunset.tif", 1, 1)]);

    let mut coordinator = coordinator(vec![CatalogSource::new(&first), CatalogSource::new(&second)]);
    assert!(coordinator.connect_missing().is_empty());

    let names: Vec<String> = coordinator
        .run("sunset")
        .into_iter()
        .map(|result| result.catalog_name)
        .collect();
    assert_eq!(names, vec!["zeta.db", "alpha.db"]);
}

#[test]
fn entries_are_collated_and_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path)]);
    coordinator.connect_missing();
    let results = coordinator.run("https://example.org/pics/Sunset.jpeg");

    let rows: Vec<(&str, u64, &str)> = results[0]
        .entries
        .iter()
        .map(|e| (e.file_name.as_str(), e.file_size, e.directory.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("sunset_beach.jpg", 2048, "photos/holiday"),
            ("Sunset.png", 1_572_864, "photos"),
        ]
    );
}

#[test]
fn unresolved_directories_show_raw_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path).with_parent_directories(false)]);
    coordinator.connect_missing();
    let results = coordinator.run("moonrise");

    assert_eq!(results[0].entries[0].directory, "5");
}

#[test]
fn max_results_limits_rows_per_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path).with_max_results(1)]);
    coordinator.connect_missing();
    let results = coordinator.run("sunset");

    assert_eq!(results[0].count, 1);
}

#[test]
fn rejected_input_queries_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path)]);
    coordinator.connect_missing();

    assert!(matches!(coordinator.run_round("abc"), RoundOutcome::Rejected));
    assert!(matches!(
        coordinator.run_round("https://mega.nz/file/sunset"),
        RoundOutcome::Rejected
    ));
}

#[test]
fn disabled_coordinator_skips_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path)]);
    coordinator.connect_missing();
    coordinator.set_enabled(false);

    assert!(matches!(coordinator.run_round("sunset"), RoundOutcome::Disabled));
}

#[test]
fn failed_query_disconnects_catalog_until_reactivation() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_catalog(dir.path(), "broken.db", &sunset_rows());
    let healthy = write_catalog(dir.path(), "healthy.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&broken), CatalogSource::new(&healthy)]);
    coordinator.connect_missing();
    rusqlite::Connection::open(&broken)
        .unwrap()
        .execute_batch("DROP TABLE FILES;")
        .unwrap();

    match coordinator.run_round("sunset") {
        RoundOutcome::Completed {
            results, failures, ..
        } => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].catalog_name, "healthy.db");
            assert!(matches!(&failures[0], CatalogError::Query { catalog, .. } if catalog == "broken.db"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(coordinator.active_count(), 1);

    assert_eq!(coordinator.run("sunset").len(), 1);

    coordinator.toggle();
    let activation = coordinator.toggle();
    assert!(activation.enabled);
    assert_eq!(activation.reconnect_failures.len(), 1);
    assert_eq!(coordinator.active_count(), 1);
}

#[test]
fn reactivation_connects_catalogs_that_appeared() {
    let dir = tempfile::tempdir().unwrap();
    let late = dir.path().join("late.db");

    let mut coordinator = coordinator(vec![CatalogSource::new(&late)]);
    assert_eq!(coordinator.connect_missing().len(), 1);
    assert!(coordinator.run("sunset").is_empty());

    write_catalog(dir.path(), "late.db", &sunset_rows());
    assert!(coordinator.run("sunset").is_empty());

    coordinator.set_enabled(false);
    let activation = coordinator.set_enabled(true);
    assert!(activation.reconnect_failures.is_empty());
    assert_eq!(coordinator.run("sunset").len(), 1);
}

#[test]
fn on_query_policy_reconnects_each_round() {
    let dir = tempfile::tempdir().unwrap();
    let late = dir.path().join("late.db");

    let mut coordinator =
        coordinator(vec![CatalogSource::new(&late)]).with_policy(ReconnectPolicy::OnQuery);
    coordinator.connect_missing();
    assert!(coordinator.run("sunset").is_empty());

    write_catalog(dir.path(), "late.db", &sunset_rows());
    assert_eq!(coordinator.run("sunset").len(), 1);
}

#[test]
fn shutdown_drops_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(dir.path(), "media.db", &sunset_rows());

    let mut coordinator = coordinator(vec![CatalogSource::new(&path)]);
    coordinator.connect_missing();
    coordinator.shutdown();

    assert_eq!(coordinator.active_count(), 0);
    assert!(coordinator.run("sunset").is_empty());
}

#[test]
fn accented_names_match_regardless_of_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_catalog(
        dir.path(),
        "media.db",
        &[("CRÈME BRÛLÉE.jpg", 77, 5), ("ÉCOLE_photo.png", 88, 7)],
    );

    let mut coordinator = coordinator(vec![CatalogSource::new(&path)]);
    coordinator.connect_missing();

    let dessert = coordinator.run("crème brûlée");
    assert_eq!(dessert[0].count, 1);
    assert_eq!(dessert[0].entries[0].file_name, "CRÈME BRÛLÉE.jpg");

    let school = coordinator.run("école_photo");
    assert_eq!(school[0].count, 1);
    assert_eq!(school[0].entries[0].directory, "photos/holiday");
}
