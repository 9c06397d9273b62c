use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Buyer;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{AccountStatusPatch, RolePayload};

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Buyer>>, ApiError> {
    match state.policy.list_scope(&actor, Collection::Buyers) {
        ListScope::All => Ok(Json(state.store.list_buyers().await?)),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Buyer>, ApiError> {
    let buyer = found(state.store.find_buyer(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::BuyerSelf { user_id: id },
    )
    .await?;
    Ok(Json(buyer))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<RolePayload>,
) -> Result<(StatusCode, Json<Buyer>), ApiError> {
    ensure_allowed(&state, &actor, Operation::Create, &Resource::AdminOnly).await?;
    let buyer = Buyer {
        id_user: payload.require_id()?,
        confirmed: payload.confirmed,
        blocked: payload.blocked,
    };
    state.store.insert_buyer(&buyer).await?;
    Ok((StatusCode::CREATED, Json(buyer)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<Buyer>, ApiError> {
    found(state.store.find_buyer(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::AdminOnly).await?;
    let buyer = Buyer {
        id_user: id,
        confirmed: payload.confirmed,
        blocked: payload.blocked,
    };
    state.store.update_buyer(&buyer).await?;
    Ok(Json(buyer))
}

pub async fn patch_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Buyer>, ApiError> {
    let mut buyer = found(state.store.find_buyer(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::PatchStatus,
        &Resource::BuyerSelf { user_id: id },
    )
    .await?;

    let patch: AccountStatusPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::MalformedInput(format!("invalid status patch: {e}")))?;
    patch.validate()?;
    if let Some(confirmed) = patch.confirmed {
        buyer.confirmed = confirmed;
    }
    if let Some(blocked) = patch.blocked {
        buyer.blocked = blocked;
    }
    state.store.update_buyer(&buyer).await?;
    Ok(Json(buyer))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_buyer(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::AdminOnly).await?;
    state.store.delete_buyer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
