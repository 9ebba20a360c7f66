use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Recipe not found: {id}")]
    RecipeNotFound { id: Uuid },

    #[error("Tag not found: {id}")]
    TagNotFound { id: Uuid },

    #[error("Ingredient not found: {id}")]
    IngredientNotFound { id: Uuid },

    #[error("A label named '{name}' already exists")]
    NameAlreadyExists { name: String },

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title too long: {len} characters (max: {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Label name cannot be empty")]
    EmptyName,

    #[error("Label name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn recipe_not_found(id: Uuid) -> Self {
        Self::RecipeNotFound { id }
    }

    pub fn tag_not_found(id: Uuid) -> Self {
        Self::TagNotFound { id }
    }

    pub fn ingredient_not_found(id: Uuid) -> Self {
        Self::IngredientNotFound { id }
    }

    pub fn name_already_exists(name: impl Into<String>) -> Self {
        Self::NameAlreadyExists { name: name.into() }
    }

    pub fn empty_title() -> Self {
        Self::EmptyTitle
    }

    pub fn title_too_long(len: usize, max: usize) -> Self {
        Self::TitleTooLong { len, max }
    }

    pub fn empty_name() -> Self {
        Self::EmptyName
    }

    pub fn name_too_long(len: usize, max: usize) -> Self {
        Self::NameTooLong { len, max }
    }

    pub fn invalid_price(message: impl Into<String>) -> Self {
        Self::InvalidPrice {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
