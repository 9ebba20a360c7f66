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
        DomainError::RecipeNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "RECIPES_NOT_FOUND",
            "Recipe not found",
            format!("Recipe with id {} was not found", id),
            instance,
        ),
        DomainError::TagNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "RECIPES_NOT_FOUND",
            "Tag not found",
            format!("Tag with id {} was not found", id),
            instance,
        ),
        DomainError::IngredientNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "RECIPES_NOT_FOUND",
            "Ingredient not found",
            format!("Ingredient with id {} was not found", id),
            instance,
        ),
        DomainError::NameAlreadyExists { name } => from_parts(
            StatusCode::CONFLICT,
            "RECIPES_NAME_TAKEN",
            "Name already in use",
            format!("A label named '{}' already exists", name),
            instance,
        ),
        DomainError::EmptyTitle
        | DomainError::TitleTooLong { .. }
        | DomainError::EmptyName
        | DomainError::NameTooLong { .. }
        | DomainError::InvalidPrice { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "RECIPES_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::Database { .. } => {
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
