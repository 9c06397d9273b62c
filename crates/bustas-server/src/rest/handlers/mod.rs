//! Per-entity handlers. Every mutating handler follows the same order:
//! existence of the path resource, then the access decision, then
//! payload validation, then the store write, with storage conflicts
//! mapped by `ApiError`'s conversions.

pub mod administrators;
pub mod apartments;
pub mod auth;
pub mod availabilities;
pub mod brokers;
pub mod buildings;
pub mod buyers;
pub mod confirmations;
pub mod listings;
pub mod pictures;
pub mod sessions;
pub mod users;
pub mod viewings;

use axum::Json;

use bustas_core::{Actor, Decision, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub(super) async fn ensure_allowed<S: Store>(
    state: &AppState<S>,
    actor: &Actor,
    op: Operation,
    resource: &Resource,
) -> Result<(), ApiError> {
    match state.policy.decide(actor, op, resource).await? {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ApiError::Forbidden),
    }
}

pub(super) fn found<T>(row: Option<T>) -> Result<T, ApiError> {
    row.ok_or(ApiError::NotFound)
}
