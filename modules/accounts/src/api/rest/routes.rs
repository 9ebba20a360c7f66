use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Build the accounts router.
///
/// `/api/users` and `/api/users/token` are open; `/api/users/me` requires a
/// valid token. Unsupported methods get a 405 from axum's method routing.
pub fn router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/api/users", post(handlers::register_user))
        .route("/api/users/token", post(handlers::create_token))
        .route(
            "/api/users/me",
            get(handlers::me)
                .put(handlers::update_me)
                .patch(handlers::update_me),
        )
        .layer(Extension(service))
}
