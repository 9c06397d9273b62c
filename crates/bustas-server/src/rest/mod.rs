mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post};

use bustas_core::AccessPolicy;
use bustas_storage::Store;

use crate::auth::TokenIssuer;

const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1 MB

pub struct AppState<S: Store> {
    pub store: S,
    pub policy: Arc<AccessPolicy<S>>,
    pub tokens: Arc<TokenIssuer>,
}

impl<S: Store> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, tokens: TokenIssuer) -> Self {
        let policy = Arc::new(AccessPolicy::new(store.clone()));
        Self {
            store,
            policy,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/authentication", post(handlers::auth::login::<S>))
        .route(
            "/api/authentication/refresh",
            post(handlers::auth::refresh::<S>),
        )
        .route(
            "/api/authentication/logout",
            post(handlers::auth::logout::<S>),
        )
        .route(
            "/api/users",
            get(handlers::users::list::<S>).post(handlers::users::create::<S>),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_one::<S>)
                .put(handlers::users::update::<S>)
                .delete(handlers::users::remove::<S>),
        )
        .route(
            "/api/administrators",
            get(handlers::administrators::list::<S>).post(handlers::administrators::create::<S>),
        )
        .route(
            "/api/administrators/{id}",
            get(handlers::administrators::get_one::<S>)
                .delete(handlers::administrators::remove::<S>),
        )
        .route(
            "/api/brokers",
            get(handlers::brokers::list::<S>).post(handlers::brokers::create::<S>),
        )
        .route(
            "/api/brokers/{id}",
            get(handlers::brokers::get_one::<S>)
                .put(handlers::brokers::update::<S>)
                .patch(handlers::brokers::patch_status::<S>)
                .delete(handlers::brokers::remove::<S>),
        )
        .route(
            "/api/brokers/{id}/listings",
            get(handlers::brokers::listings::<S>),
        )
        .route(
            "/api/brokers/{id}/apartments",
            get(handlers::brokers::apartments::<S>),
        )
        .route(
            "/api/brokers/{id}/viewings",
            get(handlers::brokers::viewings::<S>),
        )
        .route(
            "/api/brokers/{id}/building/{building_id}/apartments",
            get(handlers::brokers::building_apartments::<S>),
        )
        .route(
            "/api/brokers/{id}/availability/{availability_id}/viewings",
            get(handlers::brokers::availability_viewings::<S>),
        )
        .route(
            "/api/buyers",
            get(handlers::buyers::list::<S>).post(handlers::buyers::create::<S>),
        )
        .route(
            "/api/buyers/{id}",
            get(handlers::buyers::get_one::<S>)
                .put(handlers::buyers::update::<S>)
                .patch(handlers::buyers::patch_status::<S>)
                .delete(handlers::buyers::remove::<S>),
        )
        .route(
            "/api/buildings",
            get(handlers::buildings::list::<S>).post(handlers::buildings::create::<S>),
        )
        .route(
            "/api/buildings/{id}",
            get(handlers::buildings::get_one::<S>)
                .put(handlers::buildings::update::<S>)
                .delete(handlers::buildings::remove::<S>),
        )
        .route(
            "/api/buildings/{id}/apartments",
            get(handlers::buildings::apartments::<S>),
        )
        .route(
            "/api/buildings/{id}/pictures",
            get(handlers::buildings::pictures::<S>),
        )
        .route(
            "/api/apartments",
            get(handlers::apartments::list::<S>).post(handlers::apartments::create::<S>),
        )
        .route(
            "/api/apartments/{id}",
            get(handlers::apartments::get_one::<S>)
                .put(handlers::apartments::update::<S>)
                .delete(handlers::apartments::remove::<S>),
        )
        .route(
            "/api/apartments/{id}/listing",
            get(handlers::apartments::listing::<S>),
        )
        .route(
            "/api/pictures",
            get(handlers::pictures::list::<S>).post(handlers::pictures::create::<S>),
        )
        .route(
            "/api/pictures/{id}",
            get(handlers::pictures::get_one::<S>)
                .put(handlers::pictures::update::<S>)
                .delete(handlers::pictures::remove::<S>),
        )
        .route(
            "/api/pictures/{id}/visibility",
            patch(handlers::pictures::patch_visibility::<S>),
        )
        .route(
            "/api/listings",
            get(handlers::listings::list::<S>).post(handlers::listings::create::<S>),
        )
        .route(
            "/api/listings/{id}",
            get(handlers::listings::get_one::<S>)
                .put(handlers::listings::update::<S>)
                .delete(handlers::listings::remove::<S>),
        )
        .route(
            "/api/availabilities",
            get(handlers::availabilities::list::<S>).post(handlers::availabilities::create::<S>),
        )
        .route(
            "/api/availabilities/{id}",
            get(handlers::availabilities::get_one::<S>)
                .put(handlers::availabilities::update::<S>)
                .delete(handlers::availabilities::remove::<S>),
        )
        .route(
            "/api/viewings",
            get(handlers::viewings::list::<S>).post(handlers::viewings::create::<S>),
        )
        .route(
            "/api/viewings/{id}",
            get(handlers::viewings::get_one::<S>)
                .put(handlers::viewings::update::<S>)
                .patch(handlers::viewings::patch_status::<S>)
                .delete(handlers::viewings::remove::<S>),
        )
        .route(
            "/api/sessions",
            get(handlers::sessions::list::<S>).post(handlers::sessions::create::<S>),
        )
        .route(
            "/api/sessions/{id}",
            get(handlers::sessions::get_one::<S>)
                .put(handlers::sessions::update::<S>)
                .delete(handlers::sessions::remove::<S>),
        )
        .route(
            "/api/confirmations",
            get(handlers::confirmations::list::<S>).post(handlers::confirmations::create::<S>),
        )
        .route(
            "/api/confirmations/{id}",
            get(handlers::confirmations::get_one::<S>)
                .put(handlers::confirmations::update::<S>)
                .delete(handlers::confirmations::remove::<S>),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::require_auth::<S>,
        ))
        .with_state(state)
}
