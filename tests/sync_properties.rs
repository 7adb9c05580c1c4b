//! End-to-end sync behaviour through the public facade
mod common;

use common::Mirror;
use ipdb_mirror::test_utils::fixtures::{FixtureRow, extended_page, standard_page};
use ipdb_mirror::{Record, ServerCategory, SyncError};

const PUBLIC: usize = 0;
const PRIVATE: usize = 1;
const SECRET: usize = 2;

async fn snapshot(mirror: &Mirror) -> Vec<Record> {
    let mut records = Vec::new();
    for ip in mirror.database.list_all_identifiers().await.unwrap() {
        records.push(mirror.database.fetch_record(&ip).await.unwrap());
    }
    records
}

fn script_listing(mirror: &Mirror) {
    mirror.serve(
        PUBLIC,
        0,
        standard_page(&[
            FixtureRow::new("10.0.0.1", "Alpha").admin(),
            FixtureRow::new("10.0.0.2", "Bravo  Relay"),
        ]),
    );
    mirror.serve(PUBLIC, 1, extended_page(&[FixtureRow::new("10.0.0.3", "Charlie")]));
    mirror.serve(PRIVATE, 0, standard_page(&[FixtureRow::new("10.1.0.1", "Home").gateway()]));
}

#[tokio::test]
async fn sync_twice_is_idempotent() {
    let mirror = Mirror::new();
    script_listing(&mirror);

    let first = mirror.database.sync_all(None).await.unwrap();
    assert_eq!(first.total_inserted(), 4);
    let after_first = snapshot(&mirror).await;

    let second = mirror.database.sync_all(None).await.unwrap();
    assert_eq!(second.total_inserted(), 0);
    assert_eq!(second.total_updated(), 4);
    assert_eq!(snapshot(&mirror).await, after_first);
}

#[tokio::test]
async fn records_carry_category_page_and_flags() {
    let mirror = Mirror::new();
    script_listing(&mirror);
    mirror.database.sync_all(None).await.unwrap();

    let alpha = mirror.database.fetch_record("10.0.0.1").await.unwrap();
    assert_eq!(alpha.category, ServerCategory::Public);
    assert_eq!(alpha.source_page, 0);
    assert!(alpha.admin);
    assert!(alpha.is_never_updated());

    let bravo = mirror.database.fetch_record("10.0.0.2").await.unwrap();
    assert_eq!(bravo.name, "Bravo Relay");

    let charlie = mirror.database.fetch_record("10.0.0.3").await.unwrap();
    assert_eq!(charlie.source_page, 1);

    let home = mirror.database.fetch_record("10.1.0.1").await.unwrap();
    assert_eq!(home.category, ServerCategory::Private);
    assert!(home.owned);
}

#[tokio::test]
async fn identifier_seen_twice_is_stored_once() {
    let mirror = Mirror::new();
    mirror.serve(PUBLIC, 0, standard_page(&[FixtureRow::new("10.0.0.9", "Listed publicly")]));
    mirror.serve(SECRET, 0, standard_page(&[FixtureRow::new("10.0.0.9", "Listed secretly")]));

    mirror.database.sync_all(None).await.unwrap();
    mirror.database.sync_all(None).await.unwrap();

    assert_eq!(mirror.database.list_all_identifiers().await.unwrap(), vec!["10.0.0.9"]);
    let record = mirror.database.fetch_record("10.0.0.9").await.unwrap();
    assert_eq!(record.category, ServerCategory::Secret);
    assert_eq!(record.name, "Listed secretly");
}

#[tokio::test]
async fn pagination_performs_n_plus_one_fetches() {
    let mirror = Mirror::new();
    for page in 0..3 {
        let ip = format!("10.0.2.{page}");
        mirror.serve(PUBLIC, page, standard_page(&[FixtureRow::new(&ip, "node")]));
    }

    let report = mirror.database.sync_all(None).await.unwrap();

    assert_eq!(mirror.fetches_for("pub"), 4);
    assert_eq!(mirror.fetches_for("priv"), 1);
    assert_eq!(mirror.fetches_for("sec"), 1);
    assert_eq!(report.category(ServerCategory::Public).unwrap().pages_fetched, 4);
    assert!(mirror.source.fetched().contains(&"index.php?action=ip_db&a2=pub&_o=60".to_string()));
}

#[tokio::test]
async fn both_layouts_produce_the_same_record() {
    let standard = Mirror::new();
    let row = FixtureRow::new("10.0.0.5", "Echo").admin().gateway();
    standard.serve(PUBLIC, 0, standard_page(&[row.clone()]));
    standard.database.sync_all(None).await.unwrap();

    let extended = Mirror::new();
    extended.serve(PUBLIC, 0, extended_page(&[row]));
    extended.database.sync_all(None).await.unwrap();

    assert_eq!(
        standard.database.fetch_record("10.0.0.5").await.unwrap(),
        extended.database.fetch_record("10.0.0.5").await.unwrap()
    );
}

#[tokio::test]
async fn filtered_sync_touches_only_the_target() {
    let mirror = Mirror::new();
    script_listing(&mirror);
    mirror.database.sync_all(None).await.unwrap();

    // Remote names change everywhere, and a new record appears
    mirror.serve(
        PUBLIC,
        0,
        standard_page(&[
            FixtureRow::new("10.0.0.1", "Alpha renamed"),
            FixtureRow::new("10.0.0.2", "Bravo renamed"),
        ]),
    );
    mirror.serve(SECRET, 0, standard_page(&[FixtureRow::new("10.2.0.1", "Newcomer")]));
    mirror.source.clear_fetched();

    let report = mirror.database.sync_all(Some("10.0.0.2")).await.unwrap();

    assert_eq!(report.total_updated(), 1);
    assert_eq!(report.total_inserted(), 0);
    assert_eq!(mirror.database.fetch_record("10.0.0.2").await.unwrap().name, "Bravo renamed");
    let alpha = mirror.database.fetch_record("10.0.0.1").await.unwrap();
    assert_eq!(alpha.name, "Alpha");
    assert!(alpha.admin);
    assert!(matches!(
        mirror.database.fetch_record("10.2.0.1").await,
        Err(SyncError::NotFound(_))
    ));
    // The whole listing is still walked
    assert!(mirror.fetches_for("sec") >= 1);
}

#[tokio::test]
async fn sync_preserves_caller_owned_fields() {
    let mirror = Mirror::new();
    script_listing(&mirror);
    mirror.database.sync_all(None).await.unwrap();

    mirror
        .database
        .set_fields("10.0.0.1", &["cpu", "lastupdated"], &["3.2 GHz", "2024-06-01"])
        .await
        .unwrap();
    mirror.database.sync_all(None).await.unwrap();

    let record = mirror.database.fetch_record("10.0.0.1").await.unwrap();
    assert_eq!(record.operational.cpu, "3.2 GHz");
    assert_eq!(record.operational.last_updated, "2024-06-01");
}

#[tokio::test]
async fn fetch_failure_keeps_committed_pages() {
    let mirror = Mirror::new();
    mirror.serve(PUBLIC, 0, standard_page(&[FixtureRow::new("10.0.0.1", "Alpha")]));
    mirror.fail(PUBLIC, 1);

    let err = mirror.database.sync_all(None).await.unwrap_err();

    assert!(matches!(err, SyncError::Fetch { .. }));
    assert_eq!(mirror.database.list_all_identifiers().await.unwrap(), vec!["10.0.0.1"]);
    // Later categories were never reached
    assert_eq!(mirror.fetches_for("priv"), 0);
}

#[tokio::test]
async fn unexpected_markup_aborts_with_structure_error() {
    let mirror = Mirror::new();
    mirror.serve(PRIVATE, 0, "<html><body><h1>Login required</h1></body></html>".to_string());

    let err = mirror.database.sync_all(None).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::ExtractionStructure {
            category: ServerCategory::Private,
            page: 0,
            ..
        }
    ));
}
