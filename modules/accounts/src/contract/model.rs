use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Pure account model for inter-module communication (no serde).
/// Carries no password hash; credentials stay behind the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for registering a new user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Partial update data for the authenticated user's own profile
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}
