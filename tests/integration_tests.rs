//! Integration tests using a mock HTTP server
//!
//! Exercises the full end-to-end flow: OAuth2 token → paginated extraction →
//! bronze merge → silver rebuild.

use centrepoint_pipeline::auth::TokenProvider;
use centrepoint_pipeline::config::{Credentials, SourceConfig, REQUIRED_SCOPE};
use centrepoint_pipeline::fetch::DailyStatisticsFetcher;
use centrepoint_pipeline::http::{HttpClient, HttpClientConfig};
use centrepoint_pipeline::pipeline::{run_extract, run_full};
use centrepoint_pipeline::state::StateStore;
use centrepoint_pipeline::store::Warehouse;
use centrepoint_pipeline::transform::{run_transform, PlaceholderResolver};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESOURCE_PATH: &str = "/analytics/v3/Studies/2775/Subjects/22518/DailyStatistics";

fn source() -> SourceConfig {
    SourceConfig {
        study_id: Some(2775),
        subject_id: Some(22518),
        from_date: Some("2024-03-01".to_string()),
        to_date: Some("2024-03-31".to_string()),
        daily_statistics_setting_id: None,
        page_limit: 2,
    }
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "integration-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

fn authenticated_fetcher(server: &MockServer) -> DailyStatisticsFetcher {
    let credentials = Credentials {
        client_id: "integration-client".to_string(),
        client_secret: "integration-secret".to_string(),
    };
    let provider = TokenProvider::new(
        format!("{}/connect/token", server.uri()),
        credentials,
        REQUIRED_SCOPE,
    );
    let client = HttpClient::with_config(HttpClientConfig::with_base_url(server.uri()))
        .with_token_provider(Arc::new(provider));
    DailyStatisticsFetcher::new(client, 2)
}

fn item(id: i64, date: &str, steps: i64) -> Value {
    json!({
        "id": id,
        "studyId": 2775,
        "subjectId": 22518,
        "siteId": 9,
        "date": date,
        "lastEpochDateTimeUtc": format!("{date}T23:45:00Z"),
        "epochAggregation": {"steps": steps}
    })
}

#[tokio::test]
async fn test_end_to_end_extract_and_transform() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    // Two pages; record 2 appears on both, the later page wins
    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .and(header("authorization", "Bearer integration-token"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 4,
            "items": [item(1, "2024-03-15", 1000), item(2, "2024-03-16", 2000)]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .and(header("authorization", "Bearer integration-token"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 4,
            "items": [item(2, "2024-03-16", 2500), item(3, "2024-03-17", 3000)]
        })))
        .mount(&server)
        .await;

    let warehouse = Warehouse::open_in_memory().unwrap();
    let fetcher = authenticated_fetcher(&server);
    let state_store = StateStore::in_memory();

    let report = run_extract(
        &fetcher,
        &source(),
        &warehouse,
        "daily_statistics",
        &state_store,
        false,
    )
    .await
    .unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_fetched, 4);
    assert_eq!(report.cursor.as_deref(), Some("2024-03-17T23:45:00Z"));

    // Merge by primary key: three distinct ids, row 2 from the later page
    assert_eq!(warehouse.count("daily_statistics").unwrap(), 3);
    let bronze = warehouse.bronze_rows("daily_statistics").unwrap();
    let row2 = bronze.iter().find(|r| r.id == 2).unwrap();
    let payload = row2.payload_value().unwrap();
    assert_eq!(payload["epochAggregation"]["steps"], 2500);

    let transform = run_transform(
        &warehouse,
        "daily_statistics",
        "observations",
        &PlaceholderResolver,
    )
    .unwrap();
    assert_eq!(transform.rows_read, 3);
    assert_eq!(transform.rows_written, 3);

    let observations = warehouse.observation_rows("observations").unwrap();
    assert_eq!(observations.len(), 3);
    for obs in &observations {
        assert_eq!(obs.observation_id.len(), 64);
        assert_eq!(obs.status, "final");
        let subject: Value = serde_json::from_str(&obs.subject).unwrap();
        assert_eq!(subject["reference"], "Patient/placeholder-patient-uuid");
    }
    let first = observations.iter().find(|o| o.bronze_id == 1).unwrap();
    assert_eq!(
        first.effective_datetime.as_deref(),
        Some("2024-03-15T00:00:00.000")
    );
    assert_eq!(
        first.effective_period_end.as_deref(),
        Some("2024-03-15T23:59:59.999")
    );
}

#[tokio::test]
async fn test_run_full_with_persistent_warehouse_and_state() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path(RESOURCE_PATH))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalCount": 1,
            "items": [item(1, "2024-03-15", 1000)]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pipeline.duckdb");
    let state_path = dir.path().join("state.json");

    {
        let warehouse = Warehouse::open(&db_path).unwrap();
        let fetcher = authenticated_fetcher(&server);
        let state_store = StateStore::at(&state_path);
        let report = run_full(
            &fetcher,
            &source(),
            &warehouse,
            "daily_statistics",
            "observations",
            &state_store,
            &PlaceholderResolver,
            false,
        )
        .await
        .unwrap();
        assert_eq!(report.extract.records_written, 1);
        assert_eq!(report.transform.rows_written, 1);
    }

    // Both tables and the cursor survive process restarts
    assert!(state_path.exists());
    let warehouse = Warehouse::open(&db_path).unwrap();
    assert_eq!(warehouse.count("daily_statistics").unwrap(), 1);
    assert_eq!(warehouse.count("observations").unwrap(), 1);

    // A second incremental run fetches the same page but keeps nothing new
    let fetcher = authenticated_fetcher(&server);
    let state_store = StateStore::at(&state_path);
    let report = run_extract(
        &fetcher,
        &source(),
        &warehouse,
        "daily_statistics",
        &state_store,
        false,
    )
    .await
    .unwrap();
    assert_eq!(report.records_fetched, 1);
    assert_eq!(report.records_written, 0);
    assert_eq!(warehouse.count("daily_statistics").unwrap(), 1);
}
