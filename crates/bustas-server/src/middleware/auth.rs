use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use bustas_core::Role;
use bustas_storage::Store;

use crate::rest::AppState;

fn skip_auth(path: &str) -> bool {
    matches!(
        path,
        "/healthz" | "/api/authentication" | "/api/authentication/refresh"
    )
}

/// Resolves the bearer token to an [`bustas_core::Actor`] and rejects
/// blocked broker and buyer accounts before any handler runs.
pub async fn require_auth<S: Store>(
    State(state): State<AppState<S>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if skip_auth(&path) {
        return next.run(request).await;
    }

    let auth_header = match request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        Some(h) => h.to_string(),
        None => {
            return error_json(StatusCode::UNAUTHORIZED, "missing authorization header");
        }
    };

    let token = match auth_header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            return error_json(StatusCode::UNAUTHORIZED, "invalid authorization format");
        }
    };

    let actor = match state.tokens.verify_access_token(token) {
        Ok(actor) => actor,
        Err(_) => {
            return error_json(StatusCode::UNAUTHORIZED, "invalid or expired token");
        }
    };

    // Blocked status is re-read on every request so that blocking takes
    // effect immediately, not at the next token refresh.
    match actor.role {
        Role::Broker => match state.store.find_broker(actor.user_id).await {
            Ok(Some(broker)) if broker.blocked => {
                return error_json(StatusCode::FORBIDDEN, "account is blocked");
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_json(StatusCode::UNAUTHORIZED, "account no longer exists");
            }
            Err(e) => {
                tracing::error!(error = %e, "broker status lookup failed");
                return error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        },
        Role::Buyer => match state.store.find_buyer(actor.user_id).await {
            Ok(Some(buyer)) if buyer.blocked => {
                return error_json(StatusCode::FORBIDDEN, "account is blocked");
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_json(StatusCode::UNAUTHORIZED, "account no longer exists");
            }
            Err(e) => {
                tracing::error!(error = %e, "buyer status lookup failed");
                return error_json(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        },
        Role::Administrator | Role::User => {}
    }

    request.extensions_mut().insert(actor);
    next.run(request).await
}

fn error_json(status: StatusCode, msg: &str) -> Response {
    let body = serde_json::json!({"error": msg});
    (status, axum::Json(body)).into_response()
}
