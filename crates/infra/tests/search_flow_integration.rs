//! Integration tests for search submission and tracking over HTTP
//!
//! **Coverage:**
//! - Happy path: login → create list → create job → poll to completion
//! - Invalid parameters: rejected before any request is sent
//! - Job creation failure: list id reported, list kept
//! - Expired access token during polling: one refresh, polling continues
//! - Refresh rejected: credential cleared, caller must log in again
//!
//! **Infrastructure:**
//! - WireMock HTTP server (simulates the Risma API)
//! - `ClientContext` with in-memory credential storage

#[path = "support.rs"]
mod support;

use std::time::Duration;

use futures::StreamExt;
use risma_domain::{
    ClientError, IndustryLocationParameters, JobId, JobKind, JobStatus, KeywordParameters,
    ListId, ListMeta, RequestStep, SearchParameters,
};
use serde_json::json;
use support::{client_for, job_json, list_json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REFRESH_PATH: &str = "/api/auth/refresh-token";

async fn mount_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": access, "refresh_token": refresh })),
        )
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "tanaka@example.co.jp",
            "full_name": "Tanaka Taro",
            "is_active": true,
            "is_superuser": false
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_keyword_search_runs_to_completion() {
    let server = MockServer::start().await;
    mount_login(&server, "access-1", "refresh-1").await;

    Mock::given(method("POST"))
        .and(path("/api/lists"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(10, "Cloud vendors")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search/keyword"))
        .and(query_param("list_id", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(99, 10, "keyword", "pending")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search/jobs/99"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json(99, 10, "keyword", "processing")),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search/jobs/99"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json(99, 10, "keyword", "completed")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.auth.login("tanaka", "secret").await.unwrap();

    let params = SearchParameters::from(KeywordParameters::new(["cloud", "saas"]));
    let submitted = client
        .submitter
        .submit(JobKind::Keyword, params, ListMeta::named("Cloud vendors"))
        .await
        .unwrap();
    assert_eq!(submitted.list_id, ListId(10));
    assert_eq!(submitted.job_id, JobId(99));

    let statuses: Vec<JobStatus> = client
        .tracker
        .poll(submitted.job_id, Duration::from_millis(10), Duration::from_secs(5))
        .map(|snapshot| snapshot.unwrap().status)
        .collect()
        .await;
    assert_eq!(
        statuses,
        vec![JobStatus::Processing, JobStatus::Processing, JobStatus::Completed]
    );

    let job = client.tracker.fetch(submitted.job_id).await.unwrap();
    assert_eq!(job.result_count, Some(128));
}

#[tokio::test]
async fn test_invalid_parameters_send_nothing() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    client.credentials.set("access", Some("refresh".into()));

    let empty = SearchParameters::from(KeywordParameters::new(Vec::<String>::new()));
    let err = client
        .submitter
        .submit(JobKind::Keyword, empty, ListMeta::named("Empty"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation { ref field, .. } if field == "keywords"));

    let no_prefecture =
        SearchParameters::from(IndustryLocationParameters::new(["E"], Vec::<String>::new()));
    let err = client
        .submitter
        .submit(JobKind::IndustryLocation, no_prefecture, ListMeta::named("Makers"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation { .. }));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_job_creation_failure_reports_orphaned_list() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_json(12, "Makers")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/search/industry-location"))
        .and(body_json(json!({
            "industry_codes": ["E"],
            "prefectures": ["13"],
            "cities": [],
            "max_results": 1000
        })))
        .respond_with(ResponseTemplate::new(503).set_body_string("search backend unavailable"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.credentials.set("access", Some("refresh".into()));

    let params = SearchParameters::from(IndustryLocationParameters::new(["E"], ["13"]));
    let err = client
        .submitter
        .submit(JobKind::IndustryLocation, params, ListMeta::named("Makers"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(err.step(), Some(RequestStep::JobCreate { list_id: ListId(12) }));
}

#[tokio::test]
async fn test_expired_token_during_polling_is_refreshed_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/jobs/5"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search/jobs/5"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json(5, 3, "industry_location", "failed")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.credentials.set("stale", Some("refresh-1".into()));

    let job = client.tracker.wait_for_completion(JobId(5)).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("upstream search failed"));
    assert_eq!(client.credentials.current().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_rejected_refresh_requires_login() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search/jobs/5"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.credentials.set("stale", Some("revoked".into()));

    let mut polls =
        client.tracker.poll(JobId(5), Duration::from_millis(10), Duration::from_secs(5));
    let first = polls.next().await.unwrap().unwrap_err();
    assert!(first.requires_login());
    assert!(polls.next().await.is_none());

    assert!(!client.auth.is_authenticated());
}
