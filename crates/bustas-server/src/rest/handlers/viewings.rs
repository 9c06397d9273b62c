use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::{ReferenceKind, Viewing};
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{ViewingPayload, ViewingStatusPatch};

use super::{ensure_allowed, found};

async fn check_status<S: Store>(state: &AppState<S>, status: i32) -> Result<(), ApiError> {
    if !state
        .store
        .reference_exists(ReferenceKind::ViewingStatus, status)
        .await?
    {
        return Err(ApiError::UnprocessableEntity(format!(
            "unknown viewing status {status}"
        )));
    }
    Ok(())
}

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Viewing>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Viewings) {
        ListScope::All => state.store.list_viewings().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_viewings_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Viewing>, ApiError> {
    let viewing = found(state.store.find_viewing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Viewing { id }).await?;
    Ok(Json(viewing))
}

/// Booking a viewing pairs a slot with a listing; the caller must hold
/// both halves (or be an administrator).
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ViewingPayload>,
) -> Result<(StatusCode, Json<Viewing>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::ViewingPair {
            availability_id: payload.fk_availability,
            listing_id: payload.fk_listing,
        },
    )
    .await?;
    let id = payload.require_id()?;
    check_status(&state, payload.status).await?;
    let viewing = payload.into_viewing(id)?;
    state.store.insert_viewing(&viewing).await?;
    Ok((StatusCode::CREATED, Json(viewing)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<ViewingPayload>,
) -> Result<Json<Viewing>, ApiError> {
    found(state.store.find_viewing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::Viewing { id }).await?;
    // The rewritten pair needs the same dual proof as a fresh booking.
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::ViewingPair {
            availability_id: payload.fk_availability,
            listing_id: payload.fk_listing,
        },
    )
    .await?;
    check_status(&state, payload.status).await?;
    let viewing = payload.into_viewing(id)?;
    state.store.update_viewing(&viewing).await?;
    Ok(Json(viewing))
}

pub async fn patch_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Viewing>, ApiError> {
    let mut viewing = found(state.store.find_viewing(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::PatchStatus,
        &Resource::Viewing { id },
    )
    .await?;
    let patch: ViewingStatusPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::MalformedInput(format!("invalid status patch: {e}")))?;
    check_status(&state, patch.status).await?;
    viewing.status = patch.status;
    state.store.update_viewing(&viewing).await?;
    Ok(Json(viewing))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_viewing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::Viewing { id }).await?;
    state.store.delete_viewing(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
