use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Listing;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::ListingPayload;

use super::{ensure_allowed, found};

/// Admins read the full collection; a broker gets the listings whose
/// ownership chain ends at them; every other role is refused.
pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Listings) {
        ListScope::All => state.store.list_listings().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_listings_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ApiError> {
    let listing = found(state.store.find_listing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Listing { id }).await?;
    Ok(Json(listing))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ListingPayload>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::NewListing {
            picture_id: payload.fk_picture.clone(),
        },
    )
    .await?;
    let id = payload.require_id()?;
    let listing = payload.into_listing(id);
    state.store.insert_listing(&listing).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<ListingPayload>,
) -> Result<Json<Listing>, ApiError> {
    found(state.store.find_listing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::Listing { id }).await?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::NewListing {
            picture_id: payload.fk_picture.clone(),
        },
    )
    .await?;
    let listing = payload.into_listing(id);
    state.store.update_listing(&listing).await?;
    Ok(Json(listing))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_listing(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::Listing { id }).await?;
    state.store.delete_listing(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{BUYER, OTHER_BROKER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn listing_collection_is_never_global_for_non_admins() {
        let app = spawn_app().await;

        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/listings")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .get("/api/listings")
            .authorization_bearer(&owner)
            .await;
        response.assert_status_ok();
        let body: Vec<serde_json::Value> = response.json();
        assert_eq!(body.len(), 1);

        // A broker with no chain down to listing 30 sees an empty set.
        let other = app.token(OTHER_BROKER, Role::Broker);
        let response = app
            .server
            .get("/api/listings")
            .authorization_bearer(&other)
            .await;
        response.assert_status_ok();
        let body: Vec<serde_json::Value> = response.json();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn single_listing_reads_are_owner_scoped() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .get("/api/listings/30")
            .authorization_bearer(&owner)
            .await
            .assert_status_ok();

        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .get("/api/listings/30")
            .authorization_bearer(&other)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_requires_owning_the_picture() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);

        // A fresh picture, since "p1" already backs listing 30.
        app.server
            .post("/api/pictures")
            .authorization_bearer(&owner)
            .json(&json!({"id": "p2", "fkApartment": 20}))
            .await
            .assert_status(StatusCode::CREATED);

        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .post("/api/listings")
            .authorization_bearer(&other)
            .json(&json!({
                "idListing": 31,
                "description": "stolen",
                "askingPrice": 1.0,
                "fkPicture": "p2",
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        app.server
            .post("/api/listings")
            .authorization_bearer(&owner)
            .json(&json!({
                "idListing": 31,
                "description": "another flat",
                "askingPrice": 180000.0,
                "fkPicture": "p2",
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn a_picture_backs_at_most_one_listing() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .post("/api/listings")
            .authorization_bearer(&owner)
            .json(&json!({
                "idListing": 32,
                "description": "double-booked picture",
                "askingPrice": 99.0,
                "fkPicture": "p1",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_listing_is_404_before_403() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/listings/9999")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
