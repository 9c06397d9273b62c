//! Refresh-token sessions as a managed resource. The login flow writes
//! these rows; this surface lets a user inspect and revoke their own,
//! and an administrator everyone's.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use bustas_core::model::Session;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{SessionPayload, SessionUpdate};

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let rows = match state.policy.list_scope(&actor, Collection::Sessions) {
        ListScope::All => state.store.list_sessions().await?,
        ListScope::OwnedBy(user_id) => state.store.list_sessions_for_user(user_id).await?,
        ListScope::Deny => return Err(ApiError::Forbidden),
    };
    Ok(Json(rows))
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let session = found(state.store.find_session(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::UserSelf {
            user_id: session.fk_user,
        },
    )
    .await?;
    Ok(Json(session))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<SessionPayload>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    ensure_allowed(
        &state,
        &actor,
        Operation::Create,
        &Resource::UserSelf {
            user_id: payload.fk_user,
        },
    )
    .await?;
    let mut session = state.tokens.new_session(payload.fk_user, payload.remember);
    if let Some(id) = payload.id {
        session.id = id;
    }
    state.store.insert_session(&session).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(payload): Json<SessionUpdate>,
) -> Result<Json<Session>, ApiError> {
    let session = found(state.store.find_session(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::UserSelf {
            user_id: session.fk_user,
        },
    )
    .await?;
    let session = payload.apply(session);
    state.store.update_session(&session).await?;
    Ok(Json(session))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session = found(state.store.find_session(&id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Delete,
        &Resource::UserSelf {
            user_id: session.fk_user,
        },
    )
    .await?;
    state.store.delete_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ADMIN, BUYER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn users_see_only_their_own_sessions() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&buyer)
            .json(&json!({"id": "s-buyer", "remember": true, "fkUser": BUYER}))
            .await
            .assert_status(StatusCode::CREATED);

        let broker = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&broker)
            .json(&json!({"id": "s-broker", "fkUser": OWNER_BROKER}))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Vec<serde_json::Value> = app
            .server
            .get("/api/sessions")
            .authorization_bearer(&buyer)
            .await
            .json();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["id"], "s-buyer");

        let admin = app.token(ADMIN, Role::Administrator);
        let body: Vec<serde_json::Value> = app
            .server
            .get("/api/sessions")
            .authorization_bearer(&admin)
            .await
            .json();
        assert_eq!(body.len(), 2);
    }

    #[tokio::test]
    async fn creating_a_session_for_someone_else_is_403() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&buyer)
            .json(&json!({"fkUser": OWNER_BROKER}))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn duplicate_session_id_is_409() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&buyer)
            .json(&json!({"id": "dup", "fkUser": BUYER}))
            .await
            .assert_status(StatusCode::CREATED);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&buyer)
            .json(&json!({"id": "dup", "fkUser": BUYER}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn owner_revokes_their_session_via_put() {
        let app = spawn_app().await;
        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&buyer)
            .json(&json!({"id": "s1", "remember": true, "fkUser": BUYER}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .put("/api/sessions/s1")
            .authorization_bearer(&buyer)
            .json(&json!({"remember": true, "revoked": true}))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["revoked"], true);
    }

    #[tokio::test]
    async fn touching_a_foreign_session_is_403_and_missing_is_404() {
        let app = spawn_app().await;
        let broker = app.token(OWNER_BROKER, Role::Broker);
        app.server
            .post("/api/sessions")
            .authorization_bearer(&broker)
            .json(&json!({"id": "sb", "fkUser": OWNER_BROKER}))
            .await
            .assert_status(StatusCode::CREATED);

        let buyer = app.token(BUYER, Role::Buyer);
        app.server
            .delete("/api/sessions/sb")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        app.server
            .delete("/api/sessions/absent")
            .authorization_bearer(&buyer)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
