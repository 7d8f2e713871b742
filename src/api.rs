//! REST endpoints for the call wizard.
//!
//! Every route is served both at the root and under `/api`. Failures are
//! `{"error": "<message>"}` with a fixed message per endpoint; provider and
//! database detail only goes to the log.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::customer::CustomerForm;
use crate::error::WorkflowError;
use crate::workflow::Workflow;

const CUSTOMER_NOT_FOUND: &str = "Customer not found";

/// Shared state for the wizard routes.
#[derive(Clone)]
pub struct ApiState {
    pub workflow: Arc<Workflow>,
}

/// Body of the script and call endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CustomerRef {
    customer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptQuery {
    customer_id: Option<String>,
}

/// A workflow error rendered for one endpoint.
struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    /// `fallback` is the message shown for any server-side failure.
    fn from_workflow(err: WorkflowError, fallback: &'static str) -> Self {
        match err {
            WorkflowError::Validation(fields) => Self {
                status: StatusCode::BAD_REQUEST,
                body: json!({"error": "Invalid customer data", "fields": fields}),
            },
            WorkflowError::NotFound(_) => Self::not_found(),
            WorkflowError::PreconditionFailed(message) => Self {
                status: StatusCode::BAD_REQUEST,
                body: json!({"error": message}),
            },
            other => {
                error!(error = %other, "{}", fallback);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: json!({"error": fallback}),
                }
            }
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({"error": CUSTOMER_NOT_FOUND}),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// A body that is not JSON, or not the expected shape, cannot name a stored
/// customer either.
fn customer_ref(payload: Result<Json<CustomerRef>, JsonRejection>) -> Result<Uuid, ApiError> {
    match payload {
        Ok(Json(body)) => parse_customer_id(body.customer_id.as_deref()),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Unreadable customer reference");
            Err(ApiError::not_found())
        }
    }
}

/// An id that is absent or not a UUID cannot name a stored customer.
fn parse_customer_id(raw: Option<&str>) -> Result<Uuid, ApiError> {
    raw.and_then(|id| Uuid::parse_str(id.trim()).ok())
        .ok_or_else(ApiError::not_found)
}

/// POST /customer
async fn create_customer(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerForm>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(form) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Unreadable customer body");
        ApiError {
            status: StatusCode::BAD_REQUEST,
            body: json!({"error": "Invalid customer data"}),
        }
    })?;
    let customer = state
        .workflow
        .create_customer(form)
        .await
        .map_err(|e| ApiError::from_workflow(e, "Failed to create customer"))?;
    Ok(Json(customer))
}

/// GET /customer/{id}
async fn get_customer(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_customer_id(Some(&id))?;
    let customer = state
        .workflow
        .find_customer(id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "Failed to fetch customer"))?;
    Ok(Json(customer))
}

/// POST /generate-script
async fn generate_script(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerRef>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = customer_ref(payload)?;
    let script = state
        .workflow
        .generate_script(id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "Failed to generate script"))?;
    Ok(Json(json!({"script": script})))
}

/// POST /initiate-call
async fn initiate_call(
    State(state): State<ApiState>,
    payload: Result<Json<CustomerRef>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = customer_ref(payload)?;
    let call_id = state
        .workflow
        .initiate_call(id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "Failed to initiate call"))?;
    Ok(Json(json!({
        "message": "Call initiated successfully",
        "callId": call_id,
    })))
}

/// GET /transcript?customerId=
async fn get_transcript(
    State(state): State<ApiState>,
    Query(query): Query<TranscriptQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_customer_id(query.customer_id.as_deref())?;
    let snapshot = state
        .workflow
        .fetch_transcript(id)
        .await
        .map_err(|e| ApiError::from_workflow(e, "Failed to fetch transcript"))?;
    Ok(Json(snapshot))
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok", "service": env!("CARGO_PKG_NAME")}))
}

fn wizard_routes() -> Router<ApiState> {
    Router::new()
        .route("/customer", post(create_customer))
        .route("/customer/{id}", get(get_customer))
        .route("/generate-script", post(generate_script))
        .route("/initiate-call", post(initiate_call))
        .route("/transcript", get(get_transcript))
        .route("/health", get(health))
}

/// Build the wizard REST routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .merge(wizard_routes())
        .nest("/api", wizard_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
