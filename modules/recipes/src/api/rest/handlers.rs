use accounts::CurrentUser;
use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::api::rest::dto::{
    CreateRecipeReq, IngredientDto, ListLabelsParams, RecipeDetailDto, RecipeSummaryDto,
    RenameLabelReq, ReplaceRecipeReq, TagDto, UpdateRecipeReq,
};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::Service;

use api_core::problem::ProblemResponse;

/// List the caller's recipes, most recent first
pub async fn list_recipes(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
) -> Result<Json<Vec<RecipeSummaryDto>>, ProblemResponse> {
    match svc.list_recipes(user.id).await {
        Ok(recipes) => Ok(Json(
            recipes.into_iter().map(RecipeSummaryDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list recipes: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a recipe owned by the caller
pub async fn create_recipe(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Json(req_body): Json<CreateRecipeReq>,
) -> Result<(StatusCode, Json<RecipeDetailDto>), ProblemResponse> {
    info!("Creating recipe for user {}", user.id);

    match svc.create_recipe(user.id, req_body.into()).await {
        Ok(recipe) => Ok((StatusCode::CREATED, Json(RecipeDetailDto::from(recipe)))),
        Err(e) => {
            error!("Failed to create recipe: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Fetch one of the caller's recipes
pub async fn get_recipe(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeDetailDto>, ProblemResponse> {
    match svc.get_recipe(user.id, id).await {
        Ok(recipe) => Ok(Json(RecipeDetailDto::from(recipe))),
        Err(e) => {
            error!("Failed to get recipe {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Partially update one of the caller's recipes
pub async fn update_recipe(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req_body): Json<UpdateRecipeReq>,
) -> Result<Json<RecipeDetailDto>, ProblemResponse> {
    info!("Updating recipe {}", id);

    match svc.update_recipe(user.id, id, req_body.into()).await {
        Ok(recipe) => Ok(Json(RecipeDetailDto::from(recipe))),
        Err(e) => {
            error!("Failed to update recipe {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Replace one of the caller's recipes
pub async fn replace_recipe(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req_body): Json<ReplaceRecipeReq>,
) -> Result<Json<RecipeDetailDto>, ProblemResponse> {
    info!("Replacing recipe {}", id);

    match svc.update_recipe(user.id, id, req_body.into()).await {
        Ok(recipe) => Ok(Json(RecipeDetailDto::from(recipe))),
        Err(e) => {
            error!("Failed to replace recipe {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete one of the caller's recipes
pub async fn delete_recipe(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting recipe {}", id);

    match svc.delete_recipe(user.id, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete recipe {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List the caller's tags
pub async fn list_tags(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Query(params): Query<ListLabelsParams>,
) -> Result<Json<Vec<TagDto>>, ProblemResponse> {
    match svc.list_tags(user.id, params.assigned_only()).await {
        Ok(tags) => Ok(Json(tags.into_iter().map(TagDto::from).collect())),
        Err(e) => {
            error!("Failed to list tags: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Rename one of the caller's tags
pub async fn update_tag(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req_body): Json<RenameLabelReq>,
) -> Result<Json<TagDto>, ProblemResponse> {
    info!("Renaming tag {}", id);

    match svc.update_tag(user.id, id, &req_body.name).await {
        Ok(tag) => Ok(Json(TagDto::from(tag))),
        Err(e) => {
            error!("Failed to rename tag {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete one of the caller's tags
pub async fn delete_tag(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting tag {}", id);

    match svc.delete_tag(user.id, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete tag {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// List the caller's ingredients
pub async fn list_ingredients(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Query(params): Query<ListLabelsParams>,
) -> Result<Json<Vec<IngredientDto>>, ProblemResponse> {
    match svc.list_ingredients(user.id, params.assigned_only()).await {
        Ok(ingredients) => Ok(Json(
            ingredients.into_iter().map(IngredientDto::from).collect(),
        )),
        Err(e) => {
            error!("Failed to list ingredients: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Rename one of the caller's ingredients
pub async fn update_ingredient(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req_body): Json<RenameLabelReq>,
) -> Result<Json<IngredientDto>, ProblemResponse> {
    info!("Renaming ingredient {}", id);

    match svc.update_ingredient(user.id, id, &req_body.name).await {
        Ok(ingredient) => Ok(Json(IngredientDto::from(ingredient))),
        Err(e) => {
            error!("Failed to rename ingredient {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete one of the caller's ingredients
pub async fn delete_ingredient(
    uri: Uri,
    CurrentUser(user): CurrentUser,
    Extension(svc): Extension<std::sync::Arc<Service>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    info!("Deleting ingredient {}", id);

    match svc.delete_ingredient(user.id, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete ingredient {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
