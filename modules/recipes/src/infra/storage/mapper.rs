use rust_decimal::Decimal;

use super::{ingredient, recipe, tag};
use crate::contract::model::{Ingredient, Recipe, Tag};
use crate::domain::error::DomainError;

pub fn tag_to_contract(row: tag::Model) -> Tag {
    Tag {
        id: row.id,
        name: row.name,
    }
}

pub fn ingredient_to_contract(row: ingredient::Model) -> Ingredient {
    Ingredient {
        id: row.id,
        name: row.name,
    }
}

/// Assembles a full recipe from its row plus the already-loaded label rows.
pub fn recipe_to_contract(
    row: recipe::Model,
    tags: Vec<tag::Model>,
    ingredients: Vec<ingredient::Model>,
) -> Result<Recipe, DomainError> {
    // Prices are written from a Decimal, so a parse failure here means the
    // column was corrupted outside the service.
    let price = Decimal::from_str_exact(&row.price).map_err(|e| {
        DomainError::database(format!("stored price {:?} is not a decimal: {e}", row.price))
    })?;

    Ok(Recipe {
        id: row.id,
        title: row.title,
        time_minutes: row.time_minutes,
        price,
        description: row.description,
        link: row.link,
        created_at: row.created_at,
        tags: tags.into_iter().map(tag_to_contract).collect(),
        ingredients: ingredients.into_iter().map(ingredient_to_contract).collect(),
    })
}
