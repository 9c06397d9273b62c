use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::{Apartment, Building, Picture};
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::BuildingPayload;

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Buildings) {
        ListScope::All => state.store.list_buildings().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_buildings_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Building>, ApiError> {
    let building = found(state.store.find_building(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Building { id }).await?;
    Ok(Json(building))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<BuildingPayload>,
) -> Result<(StatusCode, Json<Building>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::NewBuilding {
            broker_id: payload.fk_broker,
        },
    )
    .await?;
    let id = payload.require_id()?;
    let building = payload.into_building(id);
    state.store.insert_building(&building).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<BuildingPayload>,
) -> Result<Json<Building>, ApiError> {
    found(state.store.find_building(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Update, &Resource::Building { id }).await?;
    // Handing the building to another broker needs rights on that
    // broker id too; for non-admins that means it must be their own.
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::NewBuilding {
            broker_id: payload.fk_broker,
        },
    )
    .await?;
    let building = payload.into_building(id);
    state.store.update_building(&building).await?;
    Ok(Json(building))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_building(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::Building { id }).await?;
    state.store.delete_building(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn apartments<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Apartment>>, ApiError> {
    found(state.store.find_building(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Building { id }).await?;
    Ok(Json(state.store.list_apartments_in_building(id).await?))
}

/// All pictures hanging off the building, through its apartments.
pub async fn pictures<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Picture>>, ApiError> {
    found(state.store.find_building(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Building { id }).await?;

    let mut pictures = Vec::new();
    for apartment in state.store.list_apartments_in_building(id).await? {
        pictures.extend(
            state
                .store
                .list_pictures_of_apartment(apartment.id_apartment)
                .await?,
        );
    }
    Ok(Json(pictures))
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ADMIN, BUYER, OTHER_BROKER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn list_narrows_to_owned_buildings() {
        let app = spawn_app().await;

        let admin = app.token(ADMIN, Role::Administrator);
        let body: Vec<serde_json::Value> = app
            .server
            .get("/api/buildings")
            .authorization_bearer(&admin)
            .await
            .json();
        assert_eq!(body.len(), 1);

        let owner = app.token(OWNER_BROKER, Role::Broker);
        let body: Vec<serde_json::Value> = app
            .server
            .get("/api/buildings")
            .authorization_bearer(&owner)
            .await
            .json();
        assert_eq!(body.len(), 1);

        let other = app.token(OTHER_BROKER, Role::Broker);
        let body: Vec<serde_json::Value> = app
            .server
            .get("/api/buildings")
            .authorization_bearer(&other)
            .await
            .json();
        assert!(body.is_empty());

        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/buildings")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn only_the_owner_reads_a_building() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .get("/api/buildings/10")
            .authorization_bearer(&owner)
            .await
            .assert_status_ok();

        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .get("/api/buildings/10")
            .authorization_bearer(&other)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_building_is_404_before_403() {
        let app = spawn_app().await;
        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .get("/api/buildings/9999")
            .authorization_bearer(&other)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn broker_creates_buildings_only_for_themselves() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .post("/api/buildings")
            .authorization_bearer(&owner)
            .json(&json!({
                "idBuilding": 11,
                "city": "Tartu",
                "address": "Raekoja 3",
                "area": 300.0,
                "year": 2005,
                "floors": 3,
                "fkBroker": OWNER_BROKER,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        // Declaring another broker as the owner is refused.
        let response = app
            .server
            .post("/api/buildings")
            .authorization_bearer(&owner)
            .json(&json!({
                "idBuilding": 12,
                "city": "Tartu",
                "address": "Raekoja 4",
                "area": 300.0,
                "year": 2005,
                "floors": 3,
                "fkBroker": OTHER_BROKER,
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn duplicate_building_id_is_409() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .post("/api/buildings")
            .authorization_bearer(&owner)
            .json(&json!({
                "idBuilding": 10,
                "city": "Tallinn",
                "address": "Pikk 1",
                "area": 420.0,
                "year": 1998,
                "floors": 4,
                "fkBroker": OWNER_BROKER,
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_energy_class_is_422() {
        let app = spawn_app().await;
        let admin = app.token(ADMIN, Role::Administrator);
        let response = app
            .server
            .post("/api/buildings")
            .authorization_bearer(&admin)
            .json(&json!({
                "idBuilding": 13,
                "city": "Narva",
                "address": "Kreenholmi 1",
                "area": 800.0,
                "year": 1975,
                "floors": 9,
                "energy": 99,
                "fkBroker": OWNER_BROKER,
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn owner_cannot_hand_the_building_to_another_broker() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .put("/api/buildings/10")
            .authorization_bearer(&owner)
            .json(&json!({
                "city": "Tallinn",
                "address": "Pikk 1",
                "area": 420.0,
                "year": 1998,
                "floors": 4,
                "fkBroker": OTHER_BROKER,
            }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deleting_a_building_cascades_down_the_chain() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .delete("/api/buildings/10")
            .authorization_bearer(&owner)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let admin = app.token(ADMIN, Role::Administrator);
        app.server
            .get("/api/apartments/20")
            .authorization_bearer(&admin)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        app.server
            .get("/api/listings/30")
            .authorization_bearer(&admin)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn nested_pictures_walk_the_apartments() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .get("/api/buildings/10/pictures")
            .authorization_bearer(&owner)
            .await;
        response.assert_status_ok();
        let body: Vec<serde_json::Value> = response.json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "p1");
    }
}
