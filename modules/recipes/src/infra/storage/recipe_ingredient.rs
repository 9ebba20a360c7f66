use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Junction rows attaching ingredients to recipes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recipe_ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient_id: Uuid,
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
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id"
    )]
    Ingredient,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Attach ingredients to a recipe
pub async fn link<C>(conn: &C, recipe_id: Uuid, ingredient_ids: &[Uuid]) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    if ingredient_ids.is_empty() {
        return Ok(());
    }

    let rows = ingredient_ids.iter().map(|ingredient_id| ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(*ingredient_id),
    });

    Entity::insert_many(rows).exec(conn).await?;
    Ok(())
}

/// Detach every ingredient from a recipe
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
