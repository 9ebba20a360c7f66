use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// API token rows hold a SHA-256 digest of the issued token, never the
/// plaintext. A user may hold several live tokens at once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Data for persisting a freshly issued token
pub struct NewTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub digest: String,
    pub created_at: DateTime<Utc>,
}

/// Store a new token digest
pub async fn create(db: &DatabaseConnection, new_token: NewTokenRow) -> Result<Model, DbErr> {
    let active_model = ActiveModel {
        id: Set(new_token.id),
        user_id: Set(new_token.user_id),
        digest: Set(new_token.digest),
        created_at: Set(new_token.created_at),
    };

    active_model.insert(db).await
}

/// Find a token row by digest
pub async fn find_by_digest(db: &DatabaseConnection, digest: &str) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Digest.eq(digest))
        .one(db)
        .await
}
