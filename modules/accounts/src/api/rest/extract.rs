use std::sync::Arc;

use api_core::problem::ProblemResponse;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, StatusCode};
use tracing::error;

use crate::api::rest::error;
use crate::contract::model::User;
use crate::domain::service::Service;

/// Extractor for the account owning the request's API token.
///
/// Accepts `Authorization: Token <key>` as well as `Authorization: Bearer <key>`.
/// Rejects with an RFC 9457 401 problem when the header is missing, malformed
/// or the token is unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_owned();

        let svc = parts
            .extensions
            .get::<Arc<Service>>()
            .cloned()
            .ok_or_else(|| {
                error!("Account service extension is missing");
                error::from_parts(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal error",
                    "An internal error occurred",
                    &path,
                )
            })?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let Some(token) = parse_auth_header(header) else {
            return Err(error::unauthorized(
                "Authentication credentials were not provided",
                &path,
            ));
        };

        match svc.resolve_token(token).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(error::unauthorized("Invalid authentication token", &path)),
            Err(e) => {
                error!("Failed to resolve token: {}", e);
                Err(error::map_domain_error(&e, &path))
            }
        }
    }
}

/// Pull the token out of an Authorization header value.
fn parse_auth_header(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(' ')?;
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        Some(token)
    } else {
        None
    }
}
