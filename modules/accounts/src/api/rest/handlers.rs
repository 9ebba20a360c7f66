use axum::{
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{RegisterUserReq, TokenDto, TokenReq, UpdateMeReq, UserDto};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::extract::CurrentUser;
use crate::domain::service::Service;

use api_core::problem::ProblemResponse;

/// Register a new user account
pub async fn register_user(
    uri: Uri,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Json(req_body): Json<RegisterUserReq>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    info!("Registering user with email: {}", req_body.email);

    let new_user = req_body.into();

    match svc.create_user(new_user).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to register user: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Exchange credentials for a fresh API token
pub async fn create_token(
    uri: Uri,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Json(req_body): Json<TokenReq>,
) -> Result<Json<TokenDto>, ProblemResponse> {
    info!("Issuing token for email: {}", req_body.email);

    let user = match svc.authenticate(&req_body.email, &req_body.password).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to authenticate: {}", e);
            return Err(map_domain_error(&e, uri.path()));
        }
    };

    match svc.issue_token(user.id).await {
        Ok(token) => Ok(Json(TokenDto { token })),
        Err(e) => {
            error!("Failed to issue token: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Return the authenticated user's profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserDto> {
    Json(UserDto::from(user))
}

/// Update the authenticated user's profile
pub async fn update_me(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Json(req_body): Json<UpdateMeReq>,
) -> Result<Json<UserDto>, ProblemResponse> {
    info!("Updating profile for user {}", user.id);

    let patch = req_body.into();

    match svc.update_profile(user.id, patch).await {
        Ok(updated) => Ok(Json(UserDto::from(updated))),
        Err(e) => {
            error!("Failed to update profile for {}: {}", user.id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
