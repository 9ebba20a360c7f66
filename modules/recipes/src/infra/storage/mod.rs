pub mod ingredient;
pub mod mapper;
pub mod migrations;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod tag;
