use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::{Apartment, Listing};
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::ApartmentPayload;

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Apartment>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Apartments) {
        ListScope::All => state.store.list_apartments().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_apartments_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Apartment>, ApiError> {
    let apartment = found(state.store.find_apartment(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Apartment { id }).await?;
    Ok(Json(apartment))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<ApartmentPayload>,
) -> Result<(StatusCode, Json<Apartment>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::NewApartment {
            building_id: payload.fk_building,
        },
    )
    .await?;
    let id = payload.require_id()?;
    let apartment = payload.into_apartment(id);
    state.store.insert_apartment(&apartment).await?;
    Ok((StatusCode::CREATED, Json(apartment)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<ApartmentPayload>,
) -> Result<Json<Apartment>, ApiError> {
    found(state.store.find_apartment(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::Apartment { id }).await?;
    // Moving the apartment into another building needs ownership of
    // the target building as well.
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::NewApartment {
            building_id: payload.fk_building,
        },
    )
    .await?;
    let apartment = payload.into_apartment(id);
    state.store.update_apartment(&apartment).await?;
    Ok(Json(apartment))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_apartment(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::Apartment { id }).await?;
    state.store.delete_apartment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The listing advertising this apartment, reached through its
/// pictures. 404 when none of the pictures backs a listing.
pub async fn listing<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Listing>, ApiError> {
    found(state.store.find_apartment(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Apartment { id }).await?;

    for picture in state.store.list_pictures_of_apartment(id).await? {
        if let Some(listing) = state.store.find_listing_by_picture(&picture.id).await? {
            return Ok(Json(listing));
        }
    }
    Err(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ADMIN, OTHER_BROKER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    fn apartment_body(id: i64, building: i64) -> serde_json::Value {
        json!({
            "idApartment": id,
            "area": 48.0,
            "rooms": 2,
            "finish": 1,
            "fkBuilding": building,
        })
    }

    #[tokio::test]
    async fn chain_owner_reads_the_apartment() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .get("/api/apartments/20")
            .authorization_bearer(&owner)
            .await
            .assert_status_ok();

        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .get("/api/apartments/20")
            .authorization_bearer(&other)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn create_requires_owning_the_declared_building() {
        let app = spawn_app().await;
        let other = app.token(OTHER_BROKER, Role::Broker);
        let response = app
            .server
            .post("/api/apartments")
            .authorization_bearer(&other)
            .json(&apartment_body(21, 10))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .post("/api/apartments")
            .authorization_bearer(&owner)
            .json(&apartment_body(21, 10))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn admin_create_into_unknown_building_is_422() {
        let app = spawn_app().await;
        let admin = app.token(ADMIN, Role::Administrator);
        let response = app
            .server
            .post("/api/apartments")
            .authorization_bearer(&admin)
            .json(&apartment_body(22, 9999))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn nested_listing_read_resolves_through_pictures() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .get("/api/apartments/20/listing")
            .authorization_bearer(&owner)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["idListing"], 30);
    }

    #[tokio::test]
    async fn apartment_without_a_listing_reads_as_404() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .post("/api/apartments")
            .authorization_bearer(&owner)
            .json(&apartment_body(23, 10))
            .await
            .assert_status(StatusCode::CREATED);
        app.server
            .get("/api/apartments/23/listing")
            .authorization_bearer(&owner)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn owner_cannot_move_the_apartment_into_a_foreign_building() {
        let app = spawn_app().await;
        // Broker 6 gets their own building.
        let admin = app.token(ADMIN, Role::Administrator);
        app.server
            .post("/api/buildings")
            .authorization_bearer(&admin)
            .json(&json!({
                "idBuilding": 11,
                "city": "Tartu",
                "address": "Raekoja 3",
                "area": 300.0,
                "year": 2005,
                "floors": 3,
                "fkBroker": OTHER_BROKER,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .put("/api/apartments/20")
            .authorization_bearer(&owner)
            .json(&apartment_body(20, 11))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
