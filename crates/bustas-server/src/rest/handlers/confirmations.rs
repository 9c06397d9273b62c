use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Confirmation;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{ConfirmationPayload, parse_event_time};

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Confirmation>>, ApiError> {
    match state.policy.list_scope(&actor, Collection::Confirmations) {
        ListScope::All => Ok(Json(state.store.list_confirmations().await?)),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Confirmation>, ApiError> {
    let confirmation = found(state.store.find_confirmation(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::BuyerSelf {
            user_id: confirmation.fk_buyer,
        },
    )
    .await?;
    Ok(Json(confirmation))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ConfirmationPayload>,
) -> Result<(StatusCode, Json<Confirmation>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::BuyerSelf {
            user_id: payload.fk_buyer,
        },
    )
    .await?;
    let confirmation = Confirmation {
        id: payload
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().as_simple().to_string()),
        expires: parse_event_time(&payload.expires)?,
        fk_buyer: payload.fk_buyer,
    };
    state.store.insert_confirmation(&confirmation).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmationPayload>,
) -> Result<Json<Confirmation>, ApiError> {
    let existing = found(state.store.find_confirmation(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::BuyerSelf {
            user_id: existing.fk_buyer,
        },
    )
    .await?;
    // Re-pointing the row at another buyer needs rights on that buyer too.
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::BuyerSelf {
            user_id: payload.fk_buyer,
        },
    )
    .await?;
    let confirmation = Confirmation {
        id,
        expires: parse_event_time(&payload.expires)?,
        fk_buyer: payload.fk_buyer,
    };
    state.store.update_confirmation(&confirmation).await?;
    Ok(Json(confirmation))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let confirmation = found(state.store.find_confirmation(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Delete,
        &Resource::BuyerSelf {
            user_id: confirmation.fk_buyer,
        },
    )
    .await?;
    state.store.delete_confirmation(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ADMIN, BUYER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn buyer_creates_and_reads_their_own_confirmation() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        let response = app
            .server
            .post("/api/confirmations")
            .authorization_bearer(&buyer)
            .json(&json!({
                "id": "c1",
                "expires": "2026-09-30 12:00",
                "fkBuyer": BUYER,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        app.server
            .get("/api/confirmations/c1")
            .authorization_bearer(&buyer)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn confirmation_for_someone_else_is_403() {
        let app = spawn_app().await;
        let broker = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .post("/api/confirmations")
            .authorization_bearer(&broker)
            .json(&json!({
                "id": "c2",
                "expires": "2026-09-30 12:00",
                "fkBuyer": BUYER,
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn confirmation_for_an_unknown_buyer_is_422() {
        let app = spawn_app().await;
        let admin = app.token(ADMIN, Role::Administrator);
        app.server
            .post("/api/confirmations")
            .authorization_bearer(&admin)
            .json(&json!({
                "id": "c3",
                "expires": "2026-09-30 12:00",
                "fkBuyer": 9999,
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn listing_confirmations_is_admin_only() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/confirmations")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let admin = app.token(ADMIN, Role::Administrator);
        app.server
            .get("/api/confirmations")
            .authorization_bearer(&admin)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn expiry_without_time_component_is_422() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .post("/api/confirmations")
            .authorization_bearer(&buyer)
            .json(&json!({
                "id": "c4",
                "expires": "2026-09-30",
                "fkBuyer": BUYER,
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
