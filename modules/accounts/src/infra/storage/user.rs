use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Data for creating a new user row
pub struct NewUserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update data for an existing user row
pub struct UpdateUserRow {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Find a user by ID
pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id).one(db).await
}

/// Find a user by (already normalized) email
pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Email.eq(email))
        .one(db)
        .await
}

/// Check if an email already exists
pub async fn email_exists(db: &DatabaseConnection, email: &str) -> Result<bool, DbErr> {
    let count = Entity::find()
        .filter(Column::Email.eq(email))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Create a new user
pub async fn create(db: &DatabaseConnection, new_user: NewUserRow) -> Result<Model, DbErr> {
    let active_model = ActiveModel {
        id: Set(new_user.id),
        email: Set(new_user.email),
        name: Set(new_user.name),
        password_hash: Set(new_user.password_hash),
        is_staff: Set(new_user.is_staff),
        is_superuser: Set(new_user.is_superuser),
        created_at: Set(new_user.created_at),
        updated_at: Set(new_user.updated_at),
    };

    active_model.insert(db).await
}

/// Update an existing user
pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    update_data: UpdateUserRow,
) -> Result<Model, DbErr> {
    let mut active_model = ActiveModel {
        id: Set(id),
        updated_at: Set(update_data.updated_at),
        ..Default::default()
    };

    if let Some(email) = update_data.email {
        active_model.email = Set(email);
    }
    if let Some(name) = update_data.name {
        active_model.name = Set(name);
    }
    if let Some(password_hash) = update_data.password_hash {
        active_model.password_hash = Set(password_hash);
    }

    active_model.update(db).await
}
