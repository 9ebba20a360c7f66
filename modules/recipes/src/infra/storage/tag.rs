use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

/// Per-user tag rows. `(user_id, name)` is unique; the index backs the
/// get-or-create reconciliation under concurrency.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Data for creating a new tag row
pub struct NewLabelRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

/// Find an owner's tag by id; rows of other owners are invisible
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

/// Exact, case-sensitive lookup on (owner, name)
pub async fn find_by_owner_and_name<C>(
    conn: &C,
    owner: Uuid,
    name: &str,
) -> Result<Option<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::UserId.eq(owner))
        .filter(Column::Name.eq(name))
        .one(conn)
        .await
}

/// All of an owner's tags, name descending
pub async fn list_for_owner<C>(conn: &C, owner: Uuid) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::UserId.eq(owner))
        .order_by_desc(Column::Name)
        .all(conn)
        .await
}

/// Tags attached to at least one of the owner's recipes, each listed once
pub async fn list_assigned_for_owner<C>(conn: &C, owner: Uuid) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .filter(Column::UserId.eq(owner))
        .inner_join(super::recipe_tag::Entity)
        .distinct()
        .order_by_desc(Column::Name)
        .all(conn)
        .await
}

/// Tags attached to one recipe, name descending
pub async fn for_recipe<C>(conn: &C, recipe_id: Uuid) -> Result<Vec<Model>, DbErr>
where
    C: ConnectionTrait,
{
    Entity::find()
        .inner_join(super::recipe_tag::Entity)
        .filter(super::recipe_tag::Column::RecipeId.eq(recipe_id))
        .order_by_desc(Column::Name)
        .all(conn)
        .await
}

/// Create a new tag
pub async fn create<C>(conn: &C, new_label: NewLabelRow) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    let active_model = ActiveModel {
        id: Set(new_label.id),
        user_id: Set(new_label.user_id),
        name: Set(new_label.name),
    };

    active_model.insert(conn).await
}

/// Rename an existing tag
pub async fn rename<C>(conn: &C, row: Model, name: String) -> Result<Model, DbErr>
where
    C: ConnectionTrait,
{
    let mut active_model: ActiveModel = row.into();
    active_model.name = Set(name);
    active_model.update(conn).await
}

/// Delete an owner's tag, returns true if a row was deleted
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
