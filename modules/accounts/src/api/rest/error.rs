use api_core::problem::{Problem, ProblemResponse};
use axum::http::StatusCode;

use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.pantry.dev/{}", code))
        .with_code(code)
        .with_instance(instance);

    // Add request ID from current tracing span if available
    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_request_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "ACCOUNTS_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        // Registration mirrors form validation: a taken email is a 400, not 409
        DomainError::EmailAlreadyExists { email } => from_parts(
            StatusCode::BAD_REQUEST,
            "ACCOUNTS_EMAIL_TAKEN",
            "Email already registered",
            format!("Email '{}' is already in use", email),
            instance,
        ),
        DomainError::InvalidEmail { email } => from_parts(
            StatusCode::BAD_REQUEST,
            "ACCOUNTS_INVALID_EMAIL",
            "Invalid email",
            format!("Email '{}' is invalid", email),
            instance,
        ),
        DomainError::PasswordTooShort { .. }
        | DomainError::EmptyName
        | DomainError::NameTooLong { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "ACCOUNTS_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::InvalidCredentials => from_parts(
            StatusCode::BAD_REQUEST,
            "ACCOUNTS_BAD_CREDENTIALS",
            "Invalid credentials",
            "Unable to authenticate with provided credentials",
            instance,
        ),
        DomainError::PasswordHash { .. } | DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Internal error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}

/// 401 problem for requests without a usable token.
pub fn unauthorized(detail: impl Into<String>, instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::UNAUTHORIZED,
        "ACCOUNTS_UNAUTHORIZED",
        "Unauthorized",
        detail,
        instance,
    )
}
