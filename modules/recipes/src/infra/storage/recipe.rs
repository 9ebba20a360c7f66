use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    // Canonical decimal string; scale would not survive a float column
    pub price: String,
    pub description: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_ingredient::Relation::Ingredient.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_ingredient::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Data for creating a new recipe row
pub struct NewRecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub description: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update data for an existing recipe row. The owner is not part of
/// this struct: it cannot be changed.
#[derive(Default)]
pub struct UpdateRecipeRow {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl UpdateRecipeRow {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.time_minutes.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.link.is_none()
    }
}

/// Find an owner's recipe by id; rows of other owners are invisible
pub async fn find_by_id_for_owner<C>(
    conn: &C,
    owner: Uuid,
    id: Uuid,
) -> Result<Option<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find_by_id(id)
        .filter(Column::UserId.eq(owner))
        .one(conn)
        .await
}

/// All of an owner's recipes, most recent first
pub async fn list_for_owner<C>(conn: &C, owner: Uuid) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::UserId.eq(owner))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(conn)
        .await
}

/// Create a new recipe
pub async fn create<C>(conn: &C, new_recipe: NewRecipeRow) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    let active_model = ActiveModel {
        id: Set(new_recipe.id),
        user_id: Set(new_recipe.user_id),
        title: Set(new_recipe.title),
        time_minutes: Set(new_recipe.time_minutes),
        price: Set(new_recipe.price),
        description: Set(new_recipe.description),
        link: Set(new_recipe.link),
        created_at: Set(new_recipe.created_at),
    };

    active_model.insert(conn).await
}

/// Update base fields of an existing recipe
pub async fn update<C>(conn: &C, id: Uuid, update_data: UpdateRecipeRow) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active_model = ActiveModel {
        id: Set(id),
        ..Default::default()
    };

    if let Some(title) = update_data.title {
        active_model.title = Set(title);
    }
    if let Some(time_minutes) = update_data.time_minutes {
        active_model.time_minutes = Set(time_minutes);
    }
    if let Some(price) = update_data.price {
        active_model.price = Set(price);
    }
    if let Some(description) = update_data.description {
        active_model.description = Set(description);
    }
    if let Some(link) = update_data.link {
        active_model.link = Set(link);
    }

    active_model.update(conn).await
}

/// Delete an owner's recipe, returns true if a row was deleted
pub async fn delete_for_owner<C>(conn: &C, owner: Uuid, id: Uuid) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
{
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(owner))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}
