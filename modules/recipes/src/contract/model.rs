use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Pure models for inter-module communication (no serde). Ownership is not
/// part of the models: every operation takes the owner explicitly and rows
/// from other owners are invisible.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
}

/// Data for creating a new recipe. `tags` and `ingredients` carry label
/// names; the service reconciles them against the owner's registry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub description: String,
    pub link: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Partial update data for a recipe.
///
/// For `tags` and `ingredients` the distinction between `None` and
/// `Some(vec![])` matters: `None` leaves the association set untouched,
/// an empty list detaches every label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}
