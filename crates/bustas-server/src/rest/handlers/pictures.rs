use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Picture;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{PicturePayload, PictureVisibilityPatch};

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Picture>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Pictures) {
        ListScope::All => state.store.list_pictures().await?,
        ListScope::OwnedBy(broker_id) => state.store.list_pictures_owned(broker_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Picture>, ApiError> {
    let picture = found(state.store.find_picture(&id).await?)?;
    ensure_allowed(&state, &actor, Operation::Read, &Resource::Picture { id }).await?;
    Ok(Json(picture))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<PicturePayload>,
) -> Result<(StatusCode, Json<Picture>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::NewPicture {
            apartment_id: payload.fk_apartment,
        },
    )
    .await?;
    let id = payload.require_id()?;
    let picture = payload.into_picture(id);
    state.store.insert_picture(&picture).await?;
    Ok((StatusCode::CREATED, Json(picture)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<PicturePayload>,
) -> Result<Json<Picture>, ApiError> {
    found(state.store.find_picture(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::Picture { id: id.clone() },
    )
    .await?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::NewPicture {
            apartment_id: payload.fk_apartment,
        },
    )
    .await?;
    let picture = payload.into_picture(id);
    state.store.update_picture(&picture).await?;
    Ok(Json(picture))
}

pub async fn patch_visibility<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<Picture>, ApiError> {
    let mut picture = found(state.store.find_picture(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::Picture { id },
    )
    .await?;
    let patch: PictureVisibilityPatch = serde_json::from_value(body)
        .map_err(|e| ApiError::MalformedInput(format!("invalid visibility patch: {e}")))?;
    picture.public = patch.public;
    state.store.update_picture(&picture).await?;
    Ok(Json(picture))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_picture(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Delete,
        &Resource::Picture { id: id.clone() },
    )
    .await?;
    state.store.delete_picture(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{BUYER, OTHER_BROKER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn private_picture_is_owner_only() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .get("/api/pictures/p1")
            .authorization_bearer(&owner)
            .await
            .assert_status_ok();

        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/pictures/p1")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn visibility_flag_does_not_bypass_chain_ownership() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .patch("/api/pictures/p1/visibility")
            .authorization_bearer(&owner)
            .json(&json!({"public": true}))
            .await
            .assert_status_ok();

        // The flag is plain data; reads still require the chain owner.
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/pictures/p1")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn only_the_chain_owner_flips_visibility() {
        let app = spawn_app().await;
        let other = app.token(OTHER_BROKER, Role::Broker);
        app.server
            .patch("/api/pictures/p1/visibility")
            .authorization_bearer(&other)
            .json(&json!({"public": true}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bad_visibility_patch_shape_is_400() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .patch("/api/pictures/p1/visibility")
            .authorization_bearer(&owner)
            .json(&json!({"visible": true}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_under_own_apartment_and_duplicate_id() {
        let app = spawn_app().await;
        let owner = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .post("/api/pictures")
            .authorization_bearer(&owner)
            .json(&json!({"id": "p2", "public": true, "fkApartment": 20}))
            .await
            .assert_status(StatusCode::CREATED);

        app.server
            .post("/api/pictures")
            .authorization_bearer(&owner)
            .json(&json!({"id": "p2", "fkApartment": 20}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn missing_picture_is_404_before_403() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .get("/api/pictures/nope")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
