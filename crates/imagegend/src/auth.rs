//! Bearer-token gate.
//!
//! Resolves `Authorization: Bearer <token>` to a [`RequesterIdentity`] and
//! stores it in request extensions. Anything else is answered with
//! `401 {"error":"Unauthorized"}` before a handler runs.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use imagegen_core::RequesterIdentity;
use serde_json::json;
use tracing::debug;

use crate::server::AppState;

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity: Option<RequesterIdentity> =
        bearer_token(&req).and_then(|token| state.identities.resolve(token));

    match identity {
        Some(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        None => {
            debug!(path = %req.uri().path(), "rejected request without valid bearer token");
            unauthorized()
        }
    }
}
