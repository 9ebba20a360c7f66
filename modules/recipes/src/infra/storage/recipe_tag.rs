use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Junction rows attaching tags to recipes. Deleting either side cascades
/// here; the tag row itself survives a detach.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipe_tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id"
    )]
    Recipe,
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id"
    )]
    Tag,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Attach tags to a recipe
pub async fn link<C>(conn: &C, recipe_id: Uuid, tag_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }

    let rows = tag_ids.iter().map(|tag_id| ActiveModel {
        recipe_id: Set(recipe_id),
        tag_id: Set(*tag_id),
    });

    Entity::insert_many(rows).exec(conn).await?;
    Ok(())
}

/// Detach every tag from a recipe
pub async fn clear_for_recipe<C>(conn: &C, recipe_id: Uuid) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    Entity::delete_many()
        .filter(Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;
    Ok(())
}
