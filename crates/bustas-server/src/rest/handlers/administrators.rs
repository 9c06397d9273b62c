use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Administrator;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Administrator>>, ApiError> {
    match state.policy.list_scope(&actor, Collection::Administrators) {
        ListScope::All => Ok(Json(state.store.list_administrators().await?)),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Administrator>, ApiError> {
    let administrator = found(state.store.find_administrator(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::AdminOnly).await?;
    Ok(Json(administrator))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<Administrator>,
) -> Result<(StatusCode, Json<Administrator>), ApiError> {
    ensure_allowed(&state, &actor, Operation::Create, &Resource::AdminOnly).await?;
    state.store.insert_administrator(payload.id_user).await?;
    Ok((StatusCode::CREATED, Json(payload)))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_administrator(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::AdminOnly).await?;
    state.store.delete_administrator(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
