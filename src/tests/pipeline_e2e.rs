//! Pipeline tests against a mock collection API.
//!
//! The harness mounts a small two-destination inventory: destination 4 is a
//! PROVIDER (string-encoded cold bytes) with two pages of archives covering
//! the later/equal/earlier/malformed cases, destination 9 is a CLUSTER
//! reporting zero cold bytes with a single archive whose PUT fails in the
//! live test. Baseline 2016-05-12 + 30 days gives the target 2016-06-11.

use chrono::NaiveDate;
use rstest::rstest;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, path_regex, query_param},
};

use crate::{
    api_types::ColdStoragePage,
    client::ApiClient,
    config::{Baseline, HostInfo, RunParameters},
    pager::Pager,
    run::{RunError, run},
};

fn hostinfo(server: &MockServer) -> HostInfo {
    HostInfo {
        base_url: server.uri(),
        username: "admin".to_string(),
        password: "secret".to_string(),
    }
}

fn params(dry_run: bool, select_all: bool, skip_zero: bool, limit: Option<u64>) -> RunParameters {
    RunParameters::new(
        Baseline::Date(NaiveDate::from_ymd_opt(2016, 5, 12).unwrap()),
        30,
        dry_run,
        select_all,
        skip_zero,
        limit,
    )
}

fn archive(guid: &str, expire: &str) -> serde_json::Value {
    json!({
        "archiveGuid": guid,
        "archiveBytes": 1000,
        "archiveHoldExpireDate": expire,
    })
}

fn page(rows: &[serde_json::Value]) -> serde_json::Value {
    json!({"data": {"coldStorageRows": rows}})
}

async fn mount_page(
    server: &MockServer,
    destination_id: &str,
    pg_num: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path("/api/ColdStorage"))
        .and(query_param("destinationId", destination_id))
        .and(query_param("pgNum", pg_num))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_destinations(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/Destination"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"destinations": [
                {
                    "destinationId": 4,
                    "guid": "d-4",
                    "destinationName": "offsite",
                    "type": "PROVIDER",
                    "coldBytes": "123456",
                },
                {
                    "destinationId": 9,
                    "guid": "d-9",
                    "destinationName": "local",
                    "type": "CLUSTER",
                    "coldBytes": 0,
                },
            ]}
        })))
        .mount(server)
        .await;
}

/// Mounts the destination list and every archive page for both destinations.
async fn mount_inventory(server: &MockServer) {
    mount_destinations(server).await;

    mount_page(
        server,
        "4",
        "1",
        page(&[
            archive("arch-later", "2016-07-01T00:00:00.000-07:00"),
            archive("arch-equal", "2016-06-11T00:00:00.000+00:00"),
        ]),
    )
    .await;
    mount_page(
        server,
        "4",
        "2",
        page(&[
            archive("arch-bad", ""),
            archive("arch-early", "2016-01-05T00:00:00.000-07:00"),
        ]),
    )
    .await;
    mount_page(server, "4", "3", page(&[])).await;

    mount_page(
        server,
        "9",
        "1",
        page(&[archive("arch-fail", "2016-08-01T00:00:00.000+00:00")]),
    )
    .await;
    mount_page(server, "9", "2", page(&[])).await;
}

// =========================================================================
// Pager
// =========================================================================

#[tokio::test]
async fn pager_returns_n_pages_and_stops_on_the_empty_one() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let client = ApiClient::new(&server.uri(), "admin", "secret").unwrap();

    let mut pager: Pager<'_, ColdStoragePage> = Pager::new(
        &client,
        "/api/ColdStorage",
        vec![("destinationId", "4".to_string())],
    );

    let first = pager.next().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].archive_guid, "arch-later");

    let second = pager.next().await.unwrap().unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].archive_guid, "arch-bad");

    assert!(pager.next().await.unwrap().is_none());

    // Two full pages plus the terminating empty page: exactly three calls.
    let calls = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/ColdStorage")
        .count();
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn pager_is_fused_after_exhaustion() {
    let server = MockServer::start().await;
    mount_page(&server, "4", "1", page(&[])).await;
    let client = ApiClient::new(&server.uri(), "admin", "secret").unwrap();

    let mut pager: Pager<'_, ColdStoragePage> = Pager::new(
        &client,
        "/api/ColdStorage",
        vec![("destinationId", "4".to_string())],
    );
    assert!(pager.next().await.unwrap().is_none());
    assert!(pager.next().await.unwrap().is_none());

    let calls = server.received_requests().await.unwrap().len();
    assert_eq!(calls, 1);
}

// =========================================================================
// Full pipeline
// =========================================================================

#[tokio::test]
async fn live_run_changes_candidates_and_tolerates_a_failed_put() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    Mock::given(method("PUT"))
        .and(path("/api/ColdStorage/arch-later"))
        .and(query_param("idType", "guid"))
        .and(body_json(json!({"archiveHoldExpireDate": "2016-06-11"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/ColdStorage/arch-fail"))
        .and(query_param("idType", "guid"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let summary = run(
        &hostinfo(&server),
        &params(false, false, false, None),
        out_dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.destinations, 2);
    assert_eq!(summary.examined, 5);
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.changed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.malformed, 1);
    assert!(!summary.dry_run);

    // The failed archive still appears in the audit with its attempted value.
    let audit = std::fs::read_to_string(&summary.audit_path).unwrap();
    let lines: Vec<&str> = audit.lines().collect();
    assert_eq!(
        lines[0],
        "Archive GUID,Old Purge Date,New Purge Date,DestinationId"
    );
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "arch-later,2016-07-01T00:00:00.000-07:00,2016-06-11T00:00:00.000+00:00,4"
    );
    assert_eq!(
        lines[2],
        "arch-fail,2016-08-01T00:00:00.000+00:00,2016-06-11T00:00:00.000+00:00,9"
    );
}

#[tokio::test]
async fn dry_run_selects_the_same_candidates_but_issues_no_writes() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/api/ColdStorage/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let summary = run(
        &hostinfo(&server),
        &params(true, false, false, None),
        out_dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.changed, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.malformed, 1);
    assert!(summary.dry_run);

    let file_name = summary
        .audit_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(file_name.starts_with("test_results_"));

    // Same row count as the live run over the same inventory.
    let audit = std::fs::read_to_string(&summary.audit_path).unwrap();
    assert_eq!(audit.lines().count(), 3);
}

#[rstest]
#[case::keep_all(false, 2)]
#[case::skip_zero(true, 1)]
#[tokio::test]
async fn zero_size_destinations_are_dropped_only_when_asked(
    #[case] skip_zero: bool,
    #[case] expected_destinations: usize,
) {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let out_dir = tempfile::tempdir().unwrap();
    let summary = run(
        &hostinfo(&server),
        &params(true, false, skip_zero, None),
        out_dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.destinations, expected_destinations);
    let scanned_nine = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .any(|r| {
            r.url.path() == "/api/ColdStorage"
                && r.url.query_pairs().any(|(k, v)| k == "destinationId" && v == "9")
        });
    assert_eq!(scanned_nine, !skip_zero);
}

#[tokio::test]
async fn select_all_takes_every_archive_exactly_once() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let out_dir = tempfile::tempdir().unwrap();
    let summary = run(
        &hostinfo(&server),
        &params(true, true, false, None),
        out_dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.candidates, 5);
    assert_eq!(summary.malformed, 0);

    let audit = std::fs::read_to_string(&summary.audit_path).unwrap();
    assert_eq!(audit.lines().count(), 6);
    for guid in ["arch-later", "arch-equal", "arch-bad", "arch-early", "arch-fail"] {
        assert_eq!(
            audit.lines().filter(|l| l.starts_with(&format!("{guid},"))).count(),
            1,
            "{guid} should appear exactly once"
        );
    }
}

#[tokio::test]
async fn archive_limit_caps_items_examined() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;

    let out_dir = tempfile::tempdir().unwrap();
    let summary = run(
        &hostinfo(&server),
        &params(true, true, false, Some(2)),
        out_dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.examined, 2);
    assert_eq!(summary.candidates, 2);
}

#[tokio::test]
async fn a_failed_destination_read_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/Destination"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let err = run(
        &hostinfo(&server),
        &params(false, false, false, None),
        out_dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RunError::Read(_)));
    assert!(out_dir.path().read_dir().unwrap().next().is_none());
}

#[tokio::test]
async fn a_failed_archive_page_read_aborts_the_run() {
    let server = MockServer::start().await;
    mount_destinations(&server).await;
    mount_page(
        &server,
        "4",
        "1",
        page(&[archive("arch-later", "2016-07-01T00:00:00.000-07:00")]),
    )
    .await;
    // Second page of destination 4 decodes to garbage.
    Mock::given(method("GET"))
        .and(path("/api/ColdStorage"))
        .and(query_param("destinationId", "4"))
        .and(query_param("pgNum", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let err = run(
        &hostinfo(&server),
        &params(false, false, false, None),
        out_dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RunError::Read(_)));
}
