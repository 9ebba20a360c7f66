use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("User with email '{email}' already exists")]
    EmailAlreadyExists { email: String },

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Password too short: minimum {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name too long: {len} characters (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn email_already_exists(email: impl Into<String>) -> Self {
        Self::EmailAlreadyExists {
            email: email.into(),
        }
    }

    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn password_too_short(min: usize) -> Self {
        Self::PasswordTooShort { min }
    }

    pub fn empty_name() -> Self {
        Self::EmptyName
    }

    pub fn name_too_long(len: usize, max: usize) -> Self {
        Self::NameTooLong { len, max }
    }

    pub fn password_hash(message: impl Into<String>) -> Self {
        Self::PasswordHash {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
