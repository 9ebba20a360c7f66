use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{Ingredient, NewRecipe, Recipe, RecipePatch, Tag};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDto {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientDto {
    pub id: Uuid,
    pub name: String,
}

/// Nested label reference in recipe payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRefDto {
    pub name: String,
}

/// Summary representation used by the list endpoint; omits the description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub tags: Vec<TagDto>,
    pub ingredients: Vec<IngredientDto>,
}

/// Full representation returned by detail, create and update endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetailDto {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub tags: Vec<TagDto>,
    pub ingredients: Vec<IngredientDto>,
}

/// REST DTO for creating a recipe. Unknown keys in the payload are dropped,
/// so a client-supplied owner field is ignored rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecipeReq {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub tags: Vec<LabelRefDto>,
    #[serde(default)]
    pub ingredients: Vec<LabelRefDto>,
}

/// REST DTO for partial recipe updates. A present `tags`/`ingredients` list
/// replaces the association set wholesale; an absent one leaves it untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRecipeReq {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<LabelRefDto>>,
    pub ingredients: Option<Vec<LabelRefDto>>,
}

/// REST DTO for full replacement. Base fields are required; the label lists
/// keep the replace-on-present rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRecipeReq {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    pub tags: Option<Vec<LabelRefDto>>,
    pub ingredients: Option<Vec<LabelRefDto>>,
}

/// REST DTO for renaming a tag or ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameLabelReq {
    pub name: String,
}

/// Query parameters for the tag and ingredient list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListLabelsParams {
    pub assigned_only: Option<String>,
}

impl ListLabelsParams {
    /// `1` and `true` (case-insensitive) select the assigned-only variant.
    pub fn assigned_only(&self) -> bool {
        match self.assigned_only.as_deref() {
            Some(v) => v == "1" || v.eq_ignore_ascii_case("true"),
            None => false,
        }
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<Tag> for TagDto {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

impl From<Ingredient> for IngredientDto {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}

impl From<Recipe> for RecipeSummaryDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags.into_iter().map(TagDto::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(IngredientDto::from)
                .collect(),
        }
    }
}

impl From<Recipe> for RecipeDetailDto {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            description: recipe.description,
            link: recipe.link,
            tags: recipe.tags.into_iter().map(TagDto::from).collect(),
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(IngredientDto::from)
                .collect(),
        }
    }
}

fn label_names(labels: Vec<LabelRefDto>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

impl From<CreateRecipeReq> for NewRecipe {
    fn from(req: CreateRecipeReq) -> Self {
        Self {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            description: req.description,
            link: req.link,
            tags: label_names(req.tags),
            ingredients: label_names(req.ingredients),
        }
    }
}

impl From<UpdateRecipeReq> for RecipePatch {
    fn from(req: UpdateRecipeReq) -> Self {
        Self {
            title: req.title,
            time_minutes: req.time_minutes,
            price: req.price,
            description: req.description,
            link: req.link,
            tags: req.tags.map(label_names),
            ingredients: req.ingredients.map(label_names),
        }
    }
}

impl From<ReplaceRecipeReq> for RecipePatch {
    fn from(req: ReplaceRecipeReq) -> Self {
        Self {
            title: Some(req.title),
            time_minutes: Some(req.time_minutes),
            price: Some(req.price),
            description: Some(req.description),
            link: Some(req.link),
            tags: req.tags.map(label_names),
            ingredients: req.ingredients.map(label_names),
        }
    }
}
