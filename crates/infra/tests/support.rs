use std::sync::Arc;

use risma_core::InMemoryCredentialStorage;
use risma_domain::{ApiConfig, ClientConfig, PollingConfig};
use risma_infra::ClientContext;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Client wired against `server` with in-memory credentials and fast polling.
pub fn client_for(server: &MockServer) -> ClientContext {
    let config = ClientConfig {
        api: ApiConfig { base_url: server.uri(), timeout_secs: 5, user_agent: None },
        polling: PollingConfig { interval_ms: 10, timeout_secs: 5 },
        ..ClientConfig::default()
    };
    ClientContext::with_storage(config, Arc::new(InMemoryCredentialStorage::new()))
        .expect("client context should build")
}

pub fn list_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
        "total_records": 0,
        "status": "active",
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

pub fn job_json(id: i64, list_id: i64, job_type: &str, status: &str) -> Value {
    let result_count = if status == "completed" { json!(128) } else { Value::Null };
    let error_message =
        if status == "failed" { json!("upstream search failed") } else { Value::Null };
    let completed_at = if matches!(status, "completed" | "failed") {
        json!("2024-05-01T10:05:00Z")
    } else {
        Value::Null
    };

    json!({
        "id": id,
        "job_type": job_type,
        "status": status,
        "list_id": list_id,
        "result_count": result_count,
        "error_message": error_message,
        "created_at": "2024-05-01T10:00:00Z",
        "completed_at": completed_at
    })
}
