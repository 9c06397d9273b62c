use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Availability;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::AvailabilityPayload;

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Availability>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Availabilities) {
        ListScope::All => state.store.list_availabilities().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_availabilities_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Availability>, ApiError> {
    let availability = found(state.store.find_availability(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::Availability { id },
    )
    .await?;
    Ok(Json(availability))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<AvailabilityPayload>,
) -> Result<(StatusCode, Json<Availability>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::NewAvailability {
            broker_id: payload.fk_broker,
        },
    )
    .await?;
    let id = payload.require_id()?;
    let availability = payload.into_availability(id)?;
    state.store.insert_availability(&availability).await?;
    Ok((StatusCode::CREATED, Json(availability)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<AvailabilityPayload>,
) -> Result<Json<Availability>, ApiError> {
    found(state.store.find_availability(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::Availability { id },
    )
    .await?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::NewAvailability {
            broker_id: payload.fk_broker,
        },
    )
    .await?;
    let availability = payload.into_availability(id)?;
    state.store.update_availability(&availability).await?;
    Ok(Json(availability))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_availability(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Delete,
        &Resource::Availability { id },
    )
    .await?;
    state.store.delete_availability(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
