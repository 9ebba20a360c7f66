use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use tower::ServiceExt;

use accounts::{
    contract::model::NewUser,
    domain::service::{Service as AccountsService, ServiceConfig as AccountsServiceConfig},
    infra::storage::migrations::Migrator as AccountsMigrator,
};
use recipes::{
    contract::model::{NewRecipe, RecipePatch},
    domain::error::DomainError,
    domain::service::{Service, ServiceConfig},
    infra::storage::migrations::Migrator,
};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    // Accounts owns the users table the recipe schema references
    AccountsMigrator::up(&db, None)
        .await
        .expect("Failed to run accounts migrations");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run recipes migrations");

    db
}

/// Create the recipes service together with the accounts service it shares
/// a database with
async fn create_test_services() -> (Arc<Service>, Arc<AccountsService>) {
    let db = create_test_db().await;
    let accounts_svc = Arc::new(AccountsService::new(
        db.clone(),
        AccountsServiceConfig::default(),
    ));
    let recipes_svc = Arc::new(Service::new(db, ServiceConfig::default()));
    (recipes_svc, accounts_svc)
}

/// Create a test HTTP router covering both modules
async fn create_test_router() -> (Router, Arc<Service>, Arc<AccountsService>) {
    let (recipes_svc, accounts_svc) = create_test_services().await;
    let router = accounts::api::rest::routes::router(accounts_svc.clone()).merge(
        recipes::api::rest::routes::router(recipes_svc.clone(), accounts_svc.clone()),
    );
    (router, recipes_svc, accounts_svc)
}

async fn create_test_user(svc: &AccountsService, email: &str) -> accounts::model::User {
    svc.create_user(NewUser {
        email: email.to_string(),
        password: "testpass123".to_string(),
        name: "Test Name".to_string(),
    })
    .await
    .expect("Failed to create test user")
}

fn sample_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        time_minutes: 22,
        price: Decimal::new(525, 2),
        description: "Sample description".to_string(),
        link: "http://example.com/recipe.pdf".to_string(),
        tags: vec![],
        ingredients: vec![],
    }
}

/// Send an authenticated request with an optional JSON body
async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Token {}", token));
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// === Recipe service tests ===

#[tokio::test]
async fn test_create_and_get_recipe() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let created = svc
        .create_recipe(user.id, sample_recipe("Sample recipe"))
        .await?;

    assert_eq!(created.title, "Sample recipe");
    assert_eq!(created.time_minutes, 22);
    assert_eq!(created.price, Decimal::new(525, 2));
    assert_eq!(created.description, "Sample description");
    assert_eq!(created.link, "http://example.com/recipe.pdf");
    assert!(created.tags.is_empty());
    assert!(created.ingredients.is_empty());

    let fetched = svc.get_recipe(user.id, created.id).await?;
    assert_eq!(fetched, created);

    Ok(())
}

#[tokio::test]
async fn test_list_recipes_owner_scoped_most_recent_first() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    svc.create_recipe(user.id, sample_recipe("First")).await?;
    svc.create_recipe(user.id, sample_recipe("Second")).await?;
    svc.create_recipe(other.id, sample_recipe("Foreign")).await?;

    let listed = svc.list_recipes(user.id).await?;
    let titles: Vec<&str> = listed.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Second", "First"]);

    let foreign = svc.list_recipes(other.id).await?;
    assert_eq!(foreign.len(), 1);
    assert_eq!(foreign[0].title, "Foreign");

    Ok(())
}

#[tokio::test]
async fn test_get_recipe_limited_to_owner() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Mine")).await?;

    let result = svc.get_recipe(other.id, created.id).await;
    assert!(matches!(result, Err(DomainError::RecipeNotFound { .. })));

    // Still visible to its owner
    assert!(svc.get_recipe(user.id, created.id).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_create_recipe_validation() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let blank_title = sample_recipe("  ");
    let result = svc.create_recipe(user.id, blank_title).await;
    assert!(matches!(result, Err(DomainError::EmptyTitle)));

    let mut negative = sample_recipe("Negative price");
    negative.price = Decimal::new(-100, 2);
    let result = svc.create_recipe(user.id, negative).await;
    assert!(matches!(result, Err(DomainError::InvalidPrice { .. })));

    let mut too_precise = sample_recipe("Too precise");
    too_precise.price = Decimal::new(2505, 3);
    let result = svc.create_recipe(user.id, too_precise).await;
    assert!(matches!(result, Err(DomainError::InvalidPrice { .. })));

    let mut too_large = sample_recipe("Too large");
    too_large.price = Decimal::new(1000, 0);
    let result = svc.create_recipe(user.id, too_large).await;
    assert!(matches!(result, Err(DomainError::InvalidPrice { .. })));

    let mut blank_tag = sample_recipe("Blank tag");
    blank_tag.tags = vec!["  ".to_string()];
    let result = svc.create_recipe(user.id, blank_tag).await;
    assert!(matches!(result, Err(DomainError::EmptyName)));

    // None of the failed attempts left a row behind
    assert!(svc.list_recipes(user.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_create_recipe_with_new_tags() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Thai prawn curry");
    new_recipe.tags = vec!["Thai".to_string(), "Dinner".to_string()];

    let created = svc.create_recipe(user.id, new_recipe).await?;

    let names: Vec<&str> = created.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(created.tags.len(), 2);
    assert!(names.contains(&"Thai"));
    assert!(names.contains(&"Dinner"));

    assert_eq!(svc.list_tags(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_create_recipe_with_existing_tag_reused() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let indian = svc.get_or_create_tag(user.id, "Indian").await?;

    let mut new_recipe = sample_recipe("Pongal");
    new_recipe.tags = vec!["Indian".to_string(), "Breakfast".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    assert_eq!(created.tags.len(), 2);
    assert!(created.tags.iter().any(|t| t.id == indian.id));

    // The existing row was reused, not duplicated
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_create_recipe_with_new_ingredients() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Cauliflower tacos");
    new_recipe.ingredients = vec!["Cauliflower".to_string(), "Salt".to_string()];

    let created = svc.create_recipe(user.id, new_recipe).await?;

    assert_eq!(created.ingredients.len(), 2);
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_create_recipe_with_existing_ingredient_reused() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let lemon = svc.get_or_create_ingredient(user.id, "Lemon").await?;

    let mut new_recipe = sample_recipe("Vietnamese soup");
    new_recipe.ingredients = vec!["Lemon".to_string(), "Fish sauce".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    assert_eq!(created.ingredients.len(), 2);
    assert!(created.ingredients.iter().any(|i| i.id == lemon.id));
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_update_recipe_partial() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Original")).await?;

    let patch = RecipePatch {
        link: Some("http://example.com/new-recipe.pdf".to_string()),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.link, "http://example.com/new-recipe.pdf");
    // Unset fields stay untouched
    assert_eq!(updated.title, "Original");
    assert_eq!(updated.time_minutes, 22);
    assert_eq!(updated.price, Decimal::new(525, 2));

    Ok(())
}

#[tokio::test]
async fn test_update_recipe_full() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Spaghetti")).await?;

    let patch = RecipePatch {
        title: Some("Spaghetti carbonara".to_string()),
        time_minutes: Some(25),
        price: Some(Decimal::new(1050, 2)),
        description: Some("New description".to_string()),
        link: Some("http://example.com/updated.pdf".to_string()),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.title, "Spaghetti carbonara");
    assert_eq!(updated.time_minutes, 25);
    assert_eq!(updated.price, Decimal::new(1050, 2));
    assert_eq!(updated.description, "New description");
    assert_eq!(updated.link, "http://example.com/updated.pdf");

    Ok(())
}

#[tokio::test]
async fn test_update_foreign_recipe_fails() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Mine")).await?;

    let patch = RecipePatch {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let result = svc.update_recipe(other.id, created.id, patch).await;
    assert!(matches!(result, Err(DomainError::RecipeNotFound { .. })));

    let fetched = svc.get_recipe(user.id, created.id).await?;
    assert_eq!(fetched.title, "Mine");

    Ok(())
}

#[tokio::test]
async fn test_delete_recipe() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Doomed")).await?;

    // Another user cannot delete it
    let result = svc.delete_recipe(other.id, created.id).await;
    assert!(matches!(result, Err(DomainError::RecipeNotFound { .. })));
    assert!(svc.get_recipe(user.id, created.id).await.is_ok());

    svc.delete_recipe(user.id, created.id).await?;
    let result = svc.get_recipe(user.id, created.id).await;
    assert!(matches!(result, Err(DomainError::RecipeNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_delete_recipe_keeps_labels() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Labelled");
    new_recipe.tags = vec!["Dinner".to_string()];
    new_recipe.ingredients = vec!["Rice".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    svc.delete_recipe(user.id, created.id).await?;

    // The registry entries survive, merely detached
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 1);
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 1);
    assert!(svc.list_tags(user.id, true).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_patch_with_fresh_tag_name_creates_and_attaches() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let created = svc.create_recipe(user.id, sample_recipe("Plain")).await?;

    let patch = RecipePatch {
        tags: Some(vec!["Lunch".to_string()]),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].name, "Lunch");
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_patch_replaces_tag_set() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Porridge");
    new_recipe.tags = vec!["Breakfast".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    let lunch = svc.get_or_create_tag(user.id, "Lunch").await?;
    let patch = RecipePatch {
        tags: Some(vec!["Lunch".to_string()]),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].id, lunch.id);

    // Breakfast is detached but still registered
    let all_names: Vec<String> = svc
        .list_tags(user.id, false)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert!(all_names.contains(&"Breakfast".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_patch_empty_tag_list_clears_associations() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Tagged");
    new_recipe.tags = vec!["Dessert".to_string(), "Fruity".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    let patch = RecipePatch {
        tags: Some(vec![]),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert!(updated.tags.is_empty());
    // The rows themselves persist in the registry
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_patch_without_tags_key_leaves_associations() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Stable");
    new_recipe.tags = vec!["Dinner".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    let patch = RecipePatch {
        title: Some("Stable renamed".to_string()),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.title, "Stable renamed");
    assert_eq!(updated.tags.len(), 1);
    assert_eq!(updated.tags[0].name, "Dinner");

    Ok(())
}

#[tokio::test]
async fn test_patch_replaces_ingredient_set() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Soup");
    new_recipe.ingredients = vec!["Pepper".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    let patch = RecipePatch {
        ingredients: Some(vec!["Chili".to_string()]),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].name, "Chili");

    // Both names now live in the registry
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_patch_empty_ingredient_list_clears_associations() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Garlic bread");
    new_recipe.ingredients = vec!["Garlic".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;

    let patch = RecipePatch {
        ingredients: Some(vec![]),
        ..Default::default()
    };
    let updated = svc.update_recipe(user.id, created.id, patch).await?;

    assert!(updated.ingredients.is_empty());
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 1);

    Ok(())
}

// === Registry tests ===

#[tokio::test]
async fn test_list_tags_name_descending_owner_scoped() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    svc.get_or_create_tag(user.id, "Vegan").await?;
    svc.get_or_create_tag(user.id, "Dessert").await?;
    svc.get_or_create_tag(user.id, "Fruity").await?;
    svc.get_or_create_tag(other.id, "Comfort food").await?;

    let listed = svc.list_tags(user.id, false).await?;
    let names: Vec<&str> = listed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Vegan", "Fruity", "Dessert"]);

    Ok(())
}

#[tokio::test]
async fn test_get_or_create_tag_idempotent() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let first = svc.get_or_create_tag(user.id, "Vegan").await?;
    let second = svc.get_or_create_tag(user.id, "Vegan").await?;

    assert_eq!(first.id, second.id);
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_update_tag() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    let tag = svc.get_or_create_tag(user.id, "After dinner").await?;

    let renamed = svc.update_tag(user.id, tag.id, "Dessert").await?;
    assert_eq!(renamed.id, tag.id);
    assert_eq!(renamed.name, "Dessert");

    // Foreign rows look absent
    let result = svc.update_tag(other.id, tag.id, "Stolen").await;
    assert!(matches!(result, Err(DomainError::TagNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_update_tag_name_conflict() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    svc.get_or_create_tag(user.id, "Breakfast").await?;
    let brunch = svc.get_or_create_tag(user.id, "Brunch").await?;

    let result = svc.update_tag(user.id, brunch.id, "Breakfast").await;
    assert!(matches!(result, Err(DomainError::NameAlreadyExists { .. })));

    Ok(())
}

#[tokio::test]
async fn test_delete_tag_removes_associations() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    let mut new_recipe = sample_recipe("Spicy stew");
    new_recipe.tags = vec!["Spicy".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;
    let tag_id = created.tags[0].id;

    let result = svc.delete_tag(other.id, tag_id).await;
    assert!(matches!(result, Err(DomainError::TagNotFound { .. })));

    svc.delete_tag(user.id, tag_id).await?;

    assert!(svc.list_tags(user.id, false).await?.is_empty());
    // The recipe survives without the tag
    let fetched = svc.get_recipe(user.id, created.id).await?;
    assert!(fetched.tags.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_ingredients_name_descending_owner_scoped() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;

    svc.get_or_create_ingredient(user.id, "Kale").await?;
    svc.get_or_create_ingredient(user.id, "Vanilla").await?;
    svc.get_or_create_ingredient(other.id, "Salt").await?;

    let listed = svc.list_ingredients(user.id, false).await?;
    let names: Vec<&str> = listed.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Vanilla", "Kale"]);

    Ok(())
}

#[tokio::test]
async fn test_update_ingredient_rename_and_conflict() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let cilantro = svc.get_or_create_ingredient(user.id, "Cilantro").await?;
    svc.get_or_create_ingredient(user.id, "Coriander").await?;

    let renamed = svc
        .update_ingredient(user.id, cilantro.id, "Fresh cilantro")
        .await?;
    assert_eq!(renamed.name, "Fresh cilantro");

    let result = svc
        .update_ingredient(user.id, cilantro.id, "Coriander")
        .await;
    assert!(matches!(result, Err(DomainError::NameAlreadyExists { .. })));

    Ok(())
}

#[tokio::test]
async fn test_delete_ingredient_removes_associations() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut new_recipe = sample_recipe("Lentil soup");
    new_recipe.ingredients = vec!["Lentils".to_string()];
    let created = svc.create_recipe(user.id, new_recipe).await?;
    let ingredient_id = created.ingredients[0].id;

    svc.delete_ingredient(user.id, ingredient_id).await?;

    assert!(svc.list_ingredients(user.id, false).await?.is_empty());
    let fetched = svc.get_recipe(user.id, created.id).await?;
    assert!(fetched.ingredients.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_get_or_create_ingredient_idempotent() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let first = svc.get_or_create_ingredient(user.id, "Turmeric").await?;
    let second = svc.get_or_create_ingredient(user.id, "Turmeric").await?;

    assert_eq!(first.id, second.id);
    assert_eq!(svc.list_ingredients(user.id, false).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_assigned_only_filters_and_dedupes() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    // Breakfast is attached to two recipes, Lunch to none
    let mut eggs = sample_recipe("Eggs benedict");
    eggs.tags = vec!["Breakfast".to_string()];
    svc.create_recipe(user.id, eggs).await?;

    let mut pancakes = sample_recipe("Pancakes");
    pancakes.tags = vec!["Breakfast".to_string()];
    svc.create_recipe(user.id, pancakes).await?;

    svc.get_or_create_tag(user.id, "Lunch").await?;

    let assigned = svc.list_tags(user.id, true).await?;
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].name, "Breakfast");

    let all = svc.list_tags(user.id, false).await?;
    assert_eq!(all.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_assigned_only_ingredients_unique() -> Result<()> {
    let (svc, accounts_svc) = create_test_services().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;

    let mut eggs = sample_recipe("Eggs benedict");
    eggs.ingredients = vec!["Eggs".to_string()];
    svc.create_recipe(user.id, eggs).await?;

    let mut herb_eggs = sample_recipe("Herb eggs");
    herb_eggs.ingredients = vec!["Eggs".to_string(), "Herbs".to_string()];
    svc.create_recipe(user.id, herb_eggs).await?;

    svc.get_or_create_ingredient(user.id, "Lentils").await?;

    let assigned = svc.list_ingredients(user.id, true).await?;
    let names: Vec<&str> = assigned.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Herbs", "Eggs"]);

    Ok(())
}

// === REST tests ===

#[tokio::test]
async fn test_rest_recipes_require_auth() -> Result<()> {
    let (router, _svc, _accounts_svc) = create_test_router().await;

    for uri in ["/api/recipes", "/api/tags", "/api/ingredients"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert_eq!(content_type, "application/problem+json");
    }

    Ok(())
}

#[tokio::test]
async fn test_rest_create_and_fetch_recipe() -> Result<()> {
    let (router, _svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let payload = json!({
        "title": "Avocado toast",
        "time_minutes": 10,
        "price": "2.50",
        "ingredients": [{"name": "A"}, {"name": "B"}]
    });
    let response = send(&router, "POST", "/api/recipes", &token, Some(payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["title"], "Avocado toast");
    assert_eq!(body["time_minutes"], 10);
    assert_eq!(body["price"], "2.50");
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 2);
    let recipe_id = body["id"].as_str().unwrap().to_string();

    // The list endpoint returns summaries without the description
    let response = send(&router, "GET", "/api/recipes", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let summaries = listed.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(!summaries[0].as_object().unwrap().contains_key("description"));

    // The detail endpoint carries it
    let uri = format!("/api/recipes/{}", recipe_id);
    let response = send(&router, "GET", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert!(detail.as_object().unwrap().contains_key("description"));

    Ok(())
}

#[tokio::test]
async fn test_rest_owner_field_in_payload_ignored() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let recipe = svc.create_recipe(user.id, sample_recipe("Mine")).await?;

    let payload = json!({
        "title": "Renamed",
        "user_id": other.id,
        "owner": other.id
    });
    let uri = format!("/api/recipes/{}", recipe.id);
    let response = send(&router, "PATCH", &uri, &token, Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Renamed, but still owned by the caller
    let fetched = svc.get_recipe(user.id, recipe.id).await?;
    assert_eq!(fetched.title, "Renamed");
    assert!(svc.get_recipe(other.id, recipe.id).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_rest_put_replaces_recipe() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let recipe = svc.create_recipe(user.id, sample_recipe("Old")).await?;

    let payload = json!({
        "title": "New title",
        "time_minutes": 5,
        "price": "9.99",
        "description": "Fresh",
        "link": "",
        "tags": [{"name": "Quick"}]
    });
    let uri = format!("/api/recipes/{}", recipe.id);
    let response = send(&router, "PUT", &uri, &token, Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["title"], "New title");
    assert_eq!(body["price"], "9.99");
    assert_eq!(body["tags"][0]["name"], "Quick");

    Ok(())
}

#[tokio::test]
async fn test_rest_delete_recipe() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let recipe = svc.create_recipe(user.id, sample_recipe("Doomed")).await?;

    let uri = format!("/api/recipes/{}", recipe.id);
    let response = send(&router, "DELETE", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&router, "GET", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_rest_foreign_recipe_hidden() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let other = create_test_user(&accounts_svc, "other@example.com").await;
    let other_token = accounts_svc.issue_token(other.id).await?;

    let recipe = svc.create_recipe(user.id, sample_recipe("Hidden")).await?;

    let uri = format!("/api/recipes/{}", recipe.id);
    let response = send(&router, "GET", &uri, &other_token, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&router, "DELETE", &uri, &other_token, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(svc.get_recipe(user.id, recipe.id).await.is_ok());

    Ok(())
}

#[tokio::test]
async fn test_rest_invalid_price_rejected() -> Result<()> {
    let (router, _svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    for price in ["12.345", "-1", "1000"] {
        let payload = json!({
            "title": "Bad price",
            "time_minutes": 10,
            "price": price
        });
        let response = send(&router, "POST", "/api/recipes", &token, Some(payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "RECIPES_VALIDATION");
    }

    Ok(())
}

#[tokio::test]
async fn test_rest_tag_rename_and_delete() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let tag = svc.get_or_create_tag(user.id, "After dinner").await?;
    svc.get_or_create_tag(user.id, "Dessert").await?;

    let uri = format!("/api/tags/{}", tag.id);
    let response = send(
        &router,
        "PATCH",
        &uri,
        &token,
        Some(json!({"name": "Evening"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Evening");

    // Renaming onto a taken name conflicts
    let response = send(
        &router,
        "PATCH",
        &uri,
        &token,
        Some(json!({"name": "Dessert"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&router, "DELETE", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(svc.list_tags(user.id, false).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_rest_list_tags_assigned_only_param() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let mut new_recipe = sample_recipe("Tagged");
    new_recipe.tags = vec!["Attached".to_string()];
    svc.create_recipe(user.id, new_recipe).await?;
    svc.get_or_create_tag(user.id, "Loose").await?;

    let response = send(&router, "GET", "/api/tags?assigned_only=1", &token, None).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Attached");

    let response = send(&router, "GET", "/api/tags?assigned_only=true", &token, None).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Anything else means false
    let response = send(&router, "GET", "/api/tags?assigned_only=0", &token, None).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = send(&router, "GET", "/api/tags", &token, None).await;
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_rest_ingredients_endpoints() -> Result<()> {
    let (router, svc, accounts_svc) = create_test_router().await;
    let user = create_test_user(&accounts_svc, "user@example.com").await;
    let token = accounts_svc.issue_token(user.id).await?;

    let ingredient = svc.get_or_create_ingredient(user.id, "Paprika").await?;

    let response = send(&router, "GET", "/api/ingredients", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "Paprika");

    let uri = format!("/api/ingredients/{}", ingredient.id);
    let response = send(
        &router,
        "PATCH",
        &uri,
        &token,
        Some(json!({"name": "Smoked paprika"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&router, "DELETE", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(svc.list_ingredients(user.id, false).await?.is_empty());

    Ok(())
}
