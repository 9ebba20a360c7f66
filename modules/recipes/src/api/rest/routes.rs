use axum::{
    routing::{get, patch},
    Extension, Router,
};
use std::sync::Arc;

use accounts::domain::service::Service as AccountsService;

use crate::api::rest::handlers;
use crate::domain::service::Service;

/// Build the recipes router.
///
/// Every route requires a valid API token. The accounts service backs the
/// `CurrentUser` extractor and is attached here so the router works on its
/// own; unsupported methods get a 405 from axum's method routing.
pub fn router(service: Arc<Service>, accounts: Arc<AccountsService>) -> Router {
    Router::new()
        .route(
            "/api/recipes",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/api/recipes/{id}",
            get(handlers::get_recipe)
                .put(handlers::replace_recipe)
                .patch(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route("/api/tags", get(handlers::list_tags))
        .route(
            "/api/tags/{id}",
            patch(handlers::update_tag).delete(handlers::delete_tag),
        )
        .route("/api/ingredients", get(handlers::list_ingredients))
        .route(
            "/api/ingredients/{id}",
            patch(handlers::update_ingredient).delete(handlers::delete_ingredient),
        )
        .layer(Extension(service))
        .layer(Extension(accounts))
}
