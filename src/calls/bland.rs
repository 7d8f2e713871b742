//! Bland AI voice-call client.
//!
//! Two endpoints are used: `POST /v1/calls` to dial and
//! `GET /v1/calls/{id}` to read back status and transcript.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::provider::{CallDetails, CallProvider, CallRequest, CallStatus};
use crate::error::CallError;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.bland.ai";

const PROVIDER: &str = "bland";

/// Upper bound on any single API request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Bland calls API.
pub struct BlandClient {
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl BlandClient {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    fn request_failed(e: reqwest::Error) -> CallError {
        CallError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        }
    }

    /// Turn a non-2xx response into `CallError::Status`.
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CallError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(CallError::Status {
            provider: PROVIDER.into(),
            status,
            body,
        })
    }
}

#[derive(Debug, Deserialize)]
struct PlaceCallResponse {
    call_id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallDetailsResponse {
    #[serde(default)]
    call_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    concatenated_transcript: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Map Bland's free-form status string onto our lifecycle.
pub(crate) fn map_status(status: Option<&str>, completed: bool, has_error: bool) -> CallStatus {
    let status = status.unwrap_or_default().to_ascii_lowercase();
    match status.as_str() {
        "failed" | "error" | "no-answer" | "busy" | "canceled" | "cancelled" => CallStatus::Failed,
        _ if has_error => CallStatus::Failed,
        "completed" | "complete" => CallStatus::Completed,
        _ if completed => CallStatus::Completed,
        "queued" | "new" | "allocated" => CallStatus::Queued,
        _ => CallStatus::InProgress,
    }
}

#[async_trait]
impl CallProvider for BlandClient {
    async fn place_call(&self, request: &CallRequest) -> Result<String, CallError> {
        tracing::debug!(phone = %request.phone_number, "Placing call via Bland");

        let resp = self
            .client
            .post(self.api_url("calls"))
            .bearer_auth(self.api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(request)
            .send()
            .await
            .map_err(Self::request_failed)?;

        let body: PlaceCallResponse = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| CallError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        match body.call_id.filter(|id| !id.is_empty()) {
            Some(call_id) => Ok(call_id),
            None => Err(CallError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: body
                    .message
                    .unwrap_or_else(|| "response carried no call_id".to_string()),
            }),
        }
    }

    async fn get_call(&self, call_id: &str) -> Result<CallDetails, CallError> {
        let resp = self
            .client
            .get(self.api_url(&format!("calls/{call_id}")))
            .bearer_auth(self.api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(Self::request_failed)?;

        let body: CallDetailsResponse = Self::check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| CallError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            })?;

        let error_message = body.error_message.filter(|m| !m.trim().is_empty());
        Ok(CallDetails {
            call_id: body.call_id.unwrap_or_else(|| call_id.to_string()),
            status: map_status(body.status.as_deref(), body.completed, error_message.is_some()),
            transcript: body
                .concatenated_transcript
                .filter(|t| !t.trim().is_empty()),
            error_message,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;
    use crate::calls::CallOptions;

    #[derive(Clone, Default)]
    struct Captured {
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
        auth: Arc<Mutex<Vec<String>>>,
    }

    async fn place(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        captured.auth.lock().await.push(auth);
        let phone = body["phone_number"].as_str().unwrap_or_default().to_string();
        captured.bodies.lock().await.push(body);

        if phone == "+10000000000" {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"status": "error", "message": "invalid number"})),
            );
        }
        if phone == "+19999999999" {
            return (
                StatusCode::OK,
                Json(serde_json::json!({"status": "error", "message": "no balance"})),
            );
        }
        (
            StatusCode::OK,
            Json(serde_json::json!({"status": "success", "call_id": "call-123"})),
        )
    }

    async fn details(Path(id): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
        match id.as_str() {
            "done" => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "call_id": "done",
                    "status": "completed",
                    "completed": true,
                    "concatenated_transcript": "agent: Hi Alice\nuser: Hello"
                })),
            ),
            "live" => (
                StatusCode::OK,
                Json(serde_json::json!({
                    "call_id": "live",
                    "status": "in-progress",
                    "completed": false,
                    "concatenated_transcript": ""
                })),
            ),
            _ => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"message": "not found"})),
            ),
        }
    }

    async fn start_stub() -> (String, Captured) {
        let captured = Captured::default();
        let app = Router::new()
            .route("/v1/calls", post(place))
            .route("/v1/calls/{id}", get(details))
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://127.0.0.1:{port}"), captured)
    }

    fn request(phone: &str) -> CallRequest {
        CallRequest {
            phone_number: phone.into(),
            task: "Introduce yourself to Alice".into(),
            options: CallOptions::default(),
        }
    }

    #[tokio::test]
    async fn place_call_sends_task_and_options() {
        let (base, captured) = start_stub().await;
        let client = BlandClient::new(SecretString::from("secret-key"), base);

        let call_id = client.place_call(&request("+919876543210")).await.unwrap();
        assert_eq!(call_id, "call-123");

        let bodies = captured.bodies.lock().await;
        assert_eq!(bodies[0]["task"], "Introduce yourself to Alice");
        assert_eq!(bodies[0]["record"], true);
        assert_eq!(bodies[0]["max_duration"], 12);
        assert_eq!(bodies[0]["voicemail_action"], "hangup");
        assert_eq!(bodies[0]["endpoint"], "https://api.bland.ai");
        assert_eq!(captured.auth.lock().await[0], "Bearer secret-key");
    }

    #[tokio::test]
    async fn place_call_non_success_status() {
        let (base, _captured) = start_stub().await;
        let client = BlandClient::new(SecretString::from("k"), base);

        let err = client.place_call(&request("+10000000000")).await.unwrap_err();
        assert!(matches!(err, CallError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn place_call_without_call_id_is_invalid() {
        let (base, _captured) = start_stub().await;
        let client = BlandClient::new(SecretString::from("k"), base);

        let err = client.place_call(&request("+19999999999")).await.unwrap_err();
        match err {
            CallError::InvalidResponse { reason, .. } => assert_eq!(reason, "no balance"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn place_call_transport_failure() {
        let client = BlandClient::new(SecretString::from("k"), "http://127.0.0.1:1");
        let err = client.place_call(&request("+919876543210")).await.unwrap_err();
        assert!(matches!(err, CallError::RequestFailed { .. }));
    }

    #[tokio::test]
    async fn get_call_reads_transcript() {
        let (base, _captured) = start_stub().await;
        let client = BlandClient::new(SecretString::from("k"), format!("{base}/"));

        let done = client.get_call("done").await.unwrap();
        assert_eq!(done.status, CallStatus::Completed);
        assert_eq!(done.transcript.as_deref(), Some("agent: Hi Alice\nuser: Hello"));

        let live = client.get_call("live").await.unwrap();
        assert_eq!(live.status, CallStatus::InProgress);
        assert_eq!(live.transcript, None);

        let missing = client.get_call("nope").await.unwrap_err();
        assert!(matches!(missing, CallError::Status { status: 404, .. }));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(map_status(Some("queued"), false, false), CallStatus::Queued);
        assert_eq!(map_status(Some("in-progress"), false, false), CallStatus::InProgress);
        assert_eq!(map_status(Some("completed"), true, false), CallStatus::Completed);
        assert_eq!(map_status(None, true, false), CallStatus::Completed);
        assert_eq!(map_status(Some("busy"), false, false), CallStatus::Failed);
        assert_eq!(map_status(Some("in-progress"), false, true), CallStatus::Failed);
    }
}
