use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;

use bustas_core::model::User;
use bustas_core::{Actor, Collection, ListScope, Operation, Resource};
use bustas_storage::Store;

use crate::auth::hash_password;
use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::UserPayload;

use super::{ensure_allowed, found};

pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<User>>, ApiError> {
    match state.policy.list_scope(&actor, Collection::Users) {
        ListScope::All => Ok(Json(state.store.list_users().await?)),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn get_one<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = found(state.store.find_user(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Read,
        &Resource::UserSelf { user_id: id },
    )
    .await?;
    Ok(Json(user))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UserPayload>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    ensure_allowed(&state, &actor, Operation::Create, &Resource::AdminOnly).await?;
    let id = payload.require_id()?;
    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| ApiError::MalformedInput("password is required".to_string()))?;
    let password_hash = hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = User {
        id_user: id,
        name: payload.name,
        surname: payload.surname,
        email: payload.email,
        phone: payload.phone,
        password_hash,
        registration_time: Utc::now(),
        profile_picture: payload.profile_picture,
    };
    state.store.insert_user(&user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<User>, ApiError> {
    let existing = found(state.store.find_user(id).await?)?;
    ensure_allowed(
        &state,
        &actor,
        Operation::Update,
        &Resource::UserSelf { user_id: id },
    )
    .await?;

    // A missing password keeps the stored hash.
    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?
        }
        None => existing.password_hash,
    };

    let user = User {
        id_user: id,
        name: payload.name,
        surname: payload.surname,
        email: payload.email,
        phone: payload.phone,
        password_hash,
        registration_time: existing.registration_time,
        profile_picture: payload.profile_picture,
    };
    state.store.update_user(&user).await?;
    Ok(Json(user))
}

pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    found(state.store.find_user(id).await?)?;
    ensure_allowed(&state, &actor, Operation::Delete, &Resource::AdminOnly).await?;
    state.store.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{ADMIN, BUYER, OWNER_BROKER, spawn_app};
    use axum::http::StatusCode;
    use bustas_core::Role;
    use serde_json::json;

    #[tokio::test]
    async fn admin_lists_all_users() {
        let app = spawn_app().await;
        let token = app.token(ADMIN, Role::Administrator);
        let response = app
            .server
            .get("/api/users")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body: Vec<serde_json::Value> = response.json();
        assert_eq!(body.len(), 5);
    }

    #[tokio::test]
    async fn broker_cannot_list_users() {
        let app = spawn_app().await;
        let token = app.token(OWNER_BROKER, Role::Broker);
        let response = app
            .server
            .get("/api/users")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn user_reads_own_record_but_not_others() {
        let app = spawn_app().await;
        let token = app.token(BUYER, Role::Buyer);
        app.server
            .get(&format!("/api/users/{BUYER}"))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        let response = app
            .server
            .get(&format!("/api/users/{OWNER_BROKER}"))
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_user_is_404_before_403() {
        let app = spawn_app().await;
        let token = app.token(BUYER, Role::Buyer);
        let response = app
            .server
            .get("/api/users/9999")
            .authorization_bearer(&token)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn responses_never_leak_the_password_hash() {
        let app = spawn_app().await;
        let token = app.token(ADMIN, Role::Administrator);
        let response = app
            .server
            .get(&format!("/api/users/{BUYER}"))
            .authorization_bearer(&token)
            .await;
        let body: serde_json::Value = response.json();
        assert!(body.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_409() {
        let app = spawn_app().await;
        let token = app.token(ADMIN, Role::Administrator);
        let response = app
            .server
            .post("/api/users")
            .authorization_bearer(&token)
            .json(&json!({
                "idUser": 100,
                "name": "Dup",
                "surname": "Licate",
                "email": "buyer8@example.com",
                "phone": "+3725550001",
                "password": "secret",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn self_update_keeps_password_when_absent() {
        let app = spawn_app().await;
        let token = app.token(BUYER, Role::Buyer);
        let response = app
            .server
            .put(&format!("/api/users/{BUYER}"))
            .authorization_bearer(&token)
            .json(&json!({
                "name": "New",
                "surname": "Name",
                "email": "buyer8@example.com",
                "phone": "+3725559999",
            }))
            .await;
        response.assert_status_ok();

        // The old password still logs in.
        app.server
            .post("/api/authentication")
            .json(&json!({"email": "buyer8@example.com", "password": "hunter8"}))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn delete_is_admin_only() {
        let app = spawn_app().await;
        let buyer_token = app.token(BUYER, Role::Buyer);
        app.server
            .delete(&format!("/api/users/{BUYER}"))
            .authorization_bearer(&buyer_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let admin_token = app.token(ADMIN, Role::Administrator);
        app.server
            .delete(&format!("/api/users/{BUYER}"))
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
