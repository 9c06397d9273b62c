use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;

use bustas_core::{Actor, Role};
use bustas_storage::Store;

use crate::auth::{derive_role, verify_password};
use crate::error::ApiError;
use crate::rest::AppState;
use crate::rest::types::{LoginRequest, LogoutRequest, RefreshRequest, TokenResponse};

use super::found;

fn invalid_credentials() -> ApiError {
    // One message for unknown email and wrong password.
    ApiError::Unauthenticated("invalid credentials".to_string())
}

/// Verifies email and password, then issues an access token and a
/// refresh-token session. The role is derived at issuance.
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    let valid = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(invalid_credentials());
    }

    let role = derive_role(&state.store, user.id_user).await?;
    match role {
        Role::Broker => {
            if let Some(broker) = state.store.find_broker(user.id_user).await?
                && broker.blocked
            {
                return Err(ApiError::Forbidden);
            }
        }
        Role::Buyer => {
            if let Some(buyer) = state.store.find_buyer(user.id_user).await?
                && buyer.blocked
            {
                return Err(ApiError::Forbidden);
            }
        }
        Role::Administrator | Role::User => {}
    }

    let access_token = state
        .tokens
        .issue_access_token(user.id_user, role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let session = state.tokens.new_session(user.id_user, payload.remember);
    state.store.insert_session(&session).await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: session.id,
    }))
}

/// Rotates a refresh token: the presented session is revoked and a
/// fresh one takes its place.
pub async fn refresh<S: Store>(
    State(state): State<AppState<S>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut session = state
        .store
        .find_session(&payload.refresh_token)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("unknown refresh token".to_string()))?;

    if session.revoked || session.expires <= Utc::now() {
        return Err(ApiError::Unauthenticated(
            "refresh token expired or revoked".to_string(),
        ));
    }

    session.revoked = true;
    session.last_activity = Utc::now();
    state.store.update_session(&session).await?;

    let role = derive_role(&state.store, session.fk_user).await?;
    let access_token = state
        .tokens
        .issue_access_token(session.fk_user, role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let next = state.tokens.new_session(session.fk_user, session.remember);
    state.store.insert_session(&next).await?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: next.id,
    }))
}

/// Revokes the presented refresh token. Administrators may revoke any
/// session; everyone else only their own.
pub async fn logout<S: Store>(
    State(state): State<AppState<S>>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    let mut session = found(state.store.find_session(&payload.refresh_token).await?)?;

    if !actor.is_admin() && session.fk_user != actor.user_id {
        return Err(ApiError::Forbidden);
    }

    session.revoked = true;
    session.last_activity = Utc::now();
    state.store.update_session(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
