use serde::{Deserialize, Serialize};

use crate::contract::model::{NewUser, ProfilePatch, User};

/// REST DTO for user representation. The password never appears in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDto {
    pub email: String,
    pub name: String,
}

/// REST DTO for registering a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserReq {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// REST DTO for obtaining an API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenReq {
    pub email: String,
    pub password: String,
}

/// REST DTO carrying a freshly issued API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    pub token: String,
}

/// REST DTO for updating the authenticated user's profile (partial)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMeReq {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

impl From<RegisterUserReq> for NewUser {
    fn from(req: RegisterUserReq) -> Self {
        Self {
            email: req.email,
            password: req.password,
            name: req.name,
        }
    }
}

impl From<UpdateMeReq> for ProfilePatch {
    fn from(req: UpdateMeReq) -> Self {
        Self {
            email: req.email,
            name: req.name,
            password: req.password,
        }
    }
}
