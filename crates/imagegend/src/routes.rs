//! API routes for imagegend

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use imagegen_core::{
    logs_report, AuditQuery, GenerationError, GenerationRequest, RequesterIdentity,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::auth::require_bearer;
use crate::server::AppState;

type AppStateArc = Arc<AppState>;

pub fn router(state: AppStateArc) -> Router {
    let mut api = Router::new().route("/api/generate", post(generate));
    if state.logs_enabled {
        api = api.route("/api/logs", get(logs));
    }

    api.route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

// ============================================================================
// Generate
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub image_url: String,
    pub generation_time_seconds: f64,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Only a JSON string counts as a prompt; anything else is treated as absent.
fn prompt_from_body(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(body).ok()?.get("prompt")? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

async fn generate(
    State(state): State<AppStateArc>,
    Extension(requester): Extension<RequesterIdentity>,
    body: Bytes,
) -> Response {
    let request = GenerationRequest {
        requester,
        prompt: prompt_from_body(&body),
    };

    // Detached so a client disconnect cannot drop the invocation before its audit write.
    let orchestrator = state.orchestrator.clone();
    let cancel = state.shutdown.clone();
    let task =
        tokio::spawn(async move { orchestrator.generate_with_cancel(request, &cancel).await });

    match task.await {
        Ok(Ok(success)) => Json(GenerateResponse {
            image_url: success.image_url,
            generation_time_seconds: success.generation_time_seconds,
        })
        .into_response(),
        Ok(Err(e)) => {
            let status =
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.to_string())
        }
        Err(join_error) => {
            error!(error = %join_error, "generation task aborted");
            let e = GenerationError::Internal {
                detail: join_error.to_string(),
            };
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Logs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsParams {
    pub limit: Option<usize>,
    pub user_email: Option<String>,
}

async fn logs(State(state): State<AppStateArc>, Query(params): Query<LogsParams>) -> Response {
    let mut query = AuditQuery::default();
    if let Some(limit) = params.limit {
        query = query.with_limit(limit);
    }
    if let Some(user) = params.user_email.filter(|u| !u.trim().is_empty()) {
        query = query.for_requester(user);
    }

    match logs_report(state.audit_log.as_ref(), &query).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "failed to read audit trail");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch logs")
        }
    }
}
