//! Broker accounts plus the nested reads a broker uses to manage their
//! own portfolio.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::{Apartment, Broker, Listing, Viewing};
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{AccountStatusPatch, RolePayload};

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Broker>>, ApiError> {
    match state.policy.list_scope(&actor, Collection::Brokers) {
        ListScope::All => Ok(Json(state.store.list_brokers().await?)),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Broker>, ApiError> {
    let broker = found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    Ok(Json(broker))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<RolePayload>,
) -> Result<(StatusCode, Json<Broker>), ApiError> {
    ensure_allowed(&state, &actor, Operation::Create, &Resource::AdminOnly).await?;
    let broker = Broker {
        id_user: payload.require_id()?,
        confirmed: payload.confirmed,
        blocked: payload.blocked,
    };
    state.store.insert_broker(&broker).await?;
    Ok((StatusCode::CREATED, Json(broker)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<RolePayload>,
) -> Result<Json<Broker>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::AdminOnly).await?;
    let broker = Broker {
        id_user: id,
        confirmed: payload.confirmed,
        blocked: payload.blocked,
    };
    state.store.update_broker(&broker).await?;
    Ok(Json(broker))
}

/// Flips exactly one of `confirmed`/`blocked`. Never self-service.
pub async fn patch_status<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Broker>, ApiError> {
    let mut broker = found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::PatchStatus,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;

    let patch: AccountStatusPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::MalformedInput(format!("invalid status patch: {e}")))?;
    patch.validate()?;
    if let Some(confirmed) = patch.confirmed {
        broker.confirmed = confirmed;
    }
    if let Some(blocked) = patch.blocked {
        broker.blocked = blocked;
    }
    state.store.update_broker(&broker).await?;
    Ok(Json(broker))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::AdminOnly).await?;
    state.store.delete_broker(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn listings<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::List,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    Ok(Json(state.store.list_listings_owned(id).await?))
}

pub async fn apartments<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Apartment>>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::List,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    Ok(Json(state.store.list_apartments_owned(id).await?))
}

pub async fn viewings<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Viewing>>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::List,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    Ok(Json(state.store.list_viewings_owned(id).await?))
}

/// Apartments of one building, addressed through its owning broker.
/// A building that exists but hangs off another broker is not under
/// this path, so it reads as missing.
pub async fn building_apartments<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path((id, building_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Apartment>>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::List,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    let building = found(state.store.find_building(building_id).await?)?;
    if building.fk_broker != id {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.store.list_apartments_in_building(building_id).await?))
}

pub async fn availability_viewings<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path((id, availability_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<Viewing>>, ApiError> {
    found(state.store.find_broker(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::List,
        &Resource::BrokerSelf { user_id: id },
    )
    .await?;
    let availability = found(state.store.find_availability(availability_id).await?)?;
    if availability.fk_broker != id {
        return Err(ApiError::NotFound);
    }
    Ok(Json(
        state
            .store
            .list_viewings_for_availability(availability_id)
            .await?,
    ))
}
