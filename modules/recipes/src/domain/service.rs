use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, LoaderTrait, SqlErr, TransactionTrait};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{Ingredient, NewRecipe, Recipe, RecipePatch, Tag};
use crate::domain::error::DomainError;
use crate::infra::storage::{ingredient, mapper, recipe, recipe_ingredient, recipe_tag, tag};

/// Domain service containing business logic for recipe management.
///
/// Every operation is scoped to an owner: rows belonging to other users are
/// treated as nonexistent, not as forbidden.
#[derive(Clone)]
pub struct Service {
    db: DatabaseConnection,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_title_len: usize,
    pub max_label_len: usize,
    /// Exclusive upper bound for recipe prices.
    pub max_price: Decimal,
    pub max_price_scale: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_title_len: 255,
            max_label_len: 255,
            max_price: Decimal::new(1000, 0),
            max_price_scale: 2,
        }
    }
}

impl Service {
    pub fn new(db: DatabaseConnection, config: ServiceConfig) -> Self {
        Self { db, config }
    }

    /// List the owner's recipes, most recently created first.
    #[instrument(name = "recipes.service.list_recipes", skip(self), fields(owner = %owner))]
    pub async fn list_recipes(&self, owner: Uuid) -> Result<Vec<Recipe>, DomainError> {
        debug!("Listing recipes");

        let rows = recipe::list_for_owner(&self.db, owner)
            .await
            .map_err(db_err)?;

        // One query per label table instead of one per recipe.
        let mut tags = rows
            .load_many_to_many(tag::Entity, recipe_tag::Entity, &self.db)
            .await
            .map_err(db_err)?;
        let mut ingredients = rows
            .load_many_to_many(ingredient::Entity, recipe_ingredient::Entity, &self.db)
            .await
            .map_err(db_err)?;

        for list in tags.iter_mut() {
            list.sort_by(|a, b| b.name.cmp(&a.name));
        }
        for list in ingredients.iter_mut() {
            list.sort_by(|a, b| b.name.cmp(&a.name));
        }

        rows.into_iter()
            .zip(tags)
            .zip(ingredients)
            .map(|((row, row_tags), row_ingredients)| {
                mapper::recipe_to_contract(row, row_tags, row_ingredients)
            })
            .collect()
    }

    #[instrument(name = "recipes.service.get_recipe", skip(self), fields(owner = %owner, recipe_id = %id))]
    pub async fn get_recipe(&self, owner: Uuid, id: Uuid) -> Result<Recipe, DomainError> {
        debug!("Getting recipe by id");

        let row = recipe::find_by_id_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;

        self.assemble(&self.db, row).await
    }

    #[instrument(name = "recipes.service.create_recipe", skip(self, new_recipe), fields(owner = %owner))]
    pub async fn create_recipe(
        &self,
        owner: Uuid,
        new_recipe: NewRecipe,
    ) -> Result<Recipe, DomainError> {
        info!("Creating new recipe");

        self.validate_title(&new_recipe.title)?;
        self.validate_price(new_recipe.price)?;
        let tag_names = self.validated_names(&new_recipe.tags)?;
        let ingredient_names = self.validated_names(&new_recipe.ingredients)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let row = recipe::create(
            &txn,
            recipe::NewRecipeRow {
                id: Uuid::new_v4(),
                user_id: owner,
                title: new_recipe.title,
                time_minutes: new_recipe.time_minutes,
                price: new_recipe.price.to_string(),
                description: new_recipe.description,
                link: new_recipe.link,
                created_at: Utc::now(),
            },
        )
        .await
        .map_err(db_err)?;

        let tag_ids = self.reconcile_tags(&txn, owner, &tag_names).await?;
        recipe_tag::link(&txn, row.id, &tag_ids)
            .await
            .map_err(db_err)?;

        let ingredient_ids = self
            .reconcile_ingredients(&txn, owner, &ingredient_names)
            .await?;
        recipe_ingredient::link(&txn, row.id, &ingredient_ids)
            .await
            .map_err(db_err)?;

        let created = self.assemble(&txn, row).await?;
        txn.commit().await.map_err(db_err)?;

        info!("Successfully created recipe with id={}", created.id);
        Ok(created)
    }

    /// Apply a partial update. Label lists replace the association set
    /// wholesale; an absent list leaves it untouched.
    #[instrument(name = "recipes.service.update_recipe", skip(self, patch), fields(owner = %owner, recipe_id = %id))]
    pub async fn update_recipe(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: RecipePatch,
    ) -> Result<Recipe, DomainError> {
        info!("Updating recipe");

        if let Some(ref title) = patch.title {
            self.validate_title(title)?;
        }
        if let Some(price) = patch.price {
            self.validate_price(price)?;
        }
        let tag_names = match patch.tags {
            Some(ref names) => Some(self.validated_names(names)?),
            None => None,
        };
        let ingredient_names = match patch.ingredients {
            Some(ref names) => Some(self.validated_names(names)?),
            None => None,
        };

        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = recipe::find_by_id_for_owner(&txn, owner, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::recipe_not_found(id))?;

        let update_data = recipe::UpdateRecipeRow {
            title: patch.title,
            time_minutes: patch.time_minutes,
            price: patch.price.map(|p| p.to_string()),
            description: patch.description,
            link: patch.link,
        };

        let row = if update_data.is_empty() {
            existing
        } else {
            recipe::update(&txn, existing.id, update_data)
                .await
                .map_err(db_err)?
        };

        if let Some(names) = tag_names {
            recipe_tag::clear_for_recipe(&txn, row.id)
                .await
                .map_err(db_err)?;
            let ids = self.reconcile_tags(&txn, owner, &names).await?;
            recipe_tag::link(&txn, row.id, &ids).await.map_err(db_err)?;
        }

        if let Some(names) = ingredient_names {
            recipe_ingredient::clear_for_recipe(&txn, row.id)
                .await
                .map_err(db_err)?;
            let ids = self.reconcile_ingredients(&txn, owner, &names).await?;
            recipe_ingredient::link(&txn, row.id, &ids)
                .await
                .map_err(db_err)?;
        }

        let updated = self.assemble(&txn, row).await?;
        txn.commit().await.map_err(db_err)?;

        info!("Successfully updated recipe");
        Ok(updated)
    }

    /// Delete a recipe. Junction rows go with it via the cascading foreign
    /// keys; the labels themselves stay in the registry.
    #[instrument(name = "recipes.service.delete_recipe", skip(self), fields(owner = %owner, recipe_id = %id))]
    pub async fn delete_recipe(&self, owner: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting recipe");

        let deleted = recipe::delete_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?;
        if !deleted {
            return Err(DomainError::recipe_not_found(id));
        }

        info!("Successfully deleted recipe");
        Ok(())
    }

    /// List the owner's tags, name-descending. With `assigned_only` the list
    /// is restricted to tags attached to at least one recipe.
    #[instrument(name = "recipes.service.list_tags", skip(self), fields(owner = %owner))]
    pub async fn list_tags(&self, owner: Uuid, assigned_only: bool) -> Result<Vec<Tag>, DomainError> {
        debug!("Listing tags");

        let rows = if assigned_only {
            tag::list_assigned_for_owner(&self.db, owner).await
        } else {
            tag::list_for_owner(&self.db, owner).await
        }
        .map_err(db_err)?;

        Ok(rows.into_iter().map(mapper::tag_to_contract).collect())
    }

    #[instrument(name = "recipes.service.update_tag", skip(self, name), fields(owner = %owner, tag_id = %id))]
    pub async fn update_tag(&self, owner: Uuid, id: Uuid, name: &str) -> Result<Tag, DomainError> {
        info!("Renaming tag");

        let name = name.trim();
        self.validate_label_name(name)?;

        let row = tag::find_by_id_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::tag_not_found(id))?;

        let renamed = match tag::rename(&self.db, row, name.to_string()).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(DomainError::name_already_exists(name))
            }
            Err(e) => return Err(db_err(e)),
        };

        Ok(mapper::tag_to_contract(renamed))
    }

    #[instrument(name = "recipes.service.delete_tag", skip(self), fields(owner = %owner, tag_id = %id))]
    pub async fn delete_tag(&self, owner: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting tag");

        let deleted = tag::delete_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?;
        if !deleted {
            return Err(DomainError::tag_not_found(id));
        }
        Ok(())
    }

    /// Fetch the owner's tag with this name, creating it if absent.
    #[instrument(name = "recipes.service.get_or_create_tag", skip(self, name), fields(owner = %owner))]
    pub async fn get_or_create_tag(&self, owner: Uuid, name: &str) -> Result<Tag, DomainError> {
        let name = name.trim();
        self.validate_label_name(name)?;

        let row = self.obtain_tag(&self.db, owner, name).await?;
        Ok(mapper::tag_to_contract(row))
    }

    /// List the owner's ingredients, name-descending. With `assigned_only`
    /// the list is restricted to ingredients attached to at least one recipe.
    #[instrument(name = "recipes.service.list_ingredients", skip(self), fields(owner = %owner))]
    pub async fn list_ingredients(
        &self,
        owner: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Ingredient>, DomainError> {
        debug!("Listing ingredients");

        let rows = if assigned_only {
            ingredient::list_assigned_for_owner(&self.db, owner).await
        } else {
            ingredient::list_for_owner(&self.db, owner).await
        }
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(mapper::ingredient_to_contract)
            .collect())
    }

    #[instrument(name = "recipes.service.update_ingredient", skip(self, name), fields(owner = %owner, ingredient_id = %id))]
    pub async fn update_ingredient(
        &self,
        owner: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Ingredient, DomainError> {
        info!("Renaming ingredient");

        let name = name.trim();
        self.validate_label_name(name)?;

        let row = ingredient::find_by_id_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::ingredient_not_found(id))?;

        let renamed = match ingredient::rename(&self.db, row, name.to_string()).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => {
                return Err(DomainError::name_already_exists(name))
            }
            Err(e) => return Err(db_err(e)),
        };

        Ok(mapper::ingredient_to_contract(renamed))
    }

    #[instrument(name = "recipes.service.delete_ingredient", skip(self), fields(owner = %owner, ingredient_id = %id))]
    pub async fn delete_ingredient(&self, owner: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting ingredient");

        let deleted = ingredient::delete_for_owner(&self.db, owner, id)
            .await
            .map_err(db_err)?;
        if !deleted {
            return Err(DomainError::ingredient_not_found(id));
        }
        Ok(())
    }

    /// Fetch the owner's ingredient with this name, creating it if absent.
    #[instrument(name = "recipes.service.get_or_create_ingredient", skip(self, name), fields(owner = %owner))]
    pub async fn get_or_create_ingredient(
        &self,
        owner: Uuid,
        name: &str,
    ) -> Result<Ingredient, DomainError> {
        let name = name.trim();
        self.validate_label_name(name)?;

        let row = self.obtain_ingredient(&self.db, owner, name).await?;
        Ok(mapper::ingredient_to_contract(row))
    }

    async fn assemble<C>(&self, conn: &C, row: recipe::Model) -> Result<Recipe, DomainError>
    where
        C: ConnectionTrait,
    {
        let tags = tag::for_recipe(conn, row.id).await.map_err(db_err)?;
        let ingredients = ingredient::for_recipe(conn, row.id)
            .await
            .map_err(db_err)?;
        mapper::recipe_to_contract(row, tags, ingredients)
    }

    async fn reconcile_tags<C>(
        &self,
        conn: &C,
        owner: Uuid,
        names: &[String],
    ) -> Result<Vec<Uuid>, DomainError>
    where
        C: ConnectionTrait,
    {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let row = self.obtain_tag(conn, owner, name).await?;
            ids.push(row.id);
        }
        Ok(ids)
    }

    async fn reconcile_ingredients<C>(
        &self,
        conn: &C,
        owner: Uuid,
        names: &[String],
    ) -> Result<Vec<Uuid>, DomainError>
    where
        C: ConnectionTrait,
    {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let row = self.obtain_ingredient(conn, owner, name).await?;
            ids.push(row.id);
        }
        Ok(ids)
    }

    async fn obtain_tag<C>(&self, conn: &C, owner: Uuid, name: &str) -> Result<tag::Model, DomainError>
    where
        C: ConnectionTrait,
    {
        if let Some(existing) = tag::find_by_owner_and_name(conn, owner, name)
            .await
            .map_err(db_err)?
        {
            return Ok(existing);
        }

        let row = tag::NewLabelRow {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.to_string(),
        };

        match tag::create(conn, row).await {
            Ok(created) => Ok(created),
            // Lost the race against a concurrent insert of the same name;
            // fetch the winner instead.
            Err(e) if is_unique_violation(&e) => tag::find_by_owner_and_name(conn, owner, name)
                .await
                .map_err(db_err)?
                .ok_or_else(|| DomainError::database("tag vanished after unique violation")),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn obtain_ingredient<C>(
        &self,
        conn: &C,
        owner: Uuid,
        name: &str,
    ) -> Result<ingredient::Model, DomainError>
    where
        C: ConnectionTrait,
    {
        if let Some(existing) = ingredient::find_by_owner_and_name(conn, owner, name)
            .await
            .map_err(db_err)?
        {
            return Ok(existing);
        }

        let row = ingredient::NewLabelRow {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.to_string(),
        };

        match ingredient::create(conn, row).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => {
                ingredient::find_by_owner_and_name(conn, owner, name)
                    .await
                    .map_err(db_err)?
                    .ok_or_else(|| {
                        DomainError::database("ingredient vanished after unique violation")
                    })
            }
            Err(e) => Err(db_err(e)),
        }
    }

    /// Validate a recipe title
    fn validate_title(&self, title: &str) -> Result<(), DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::empty_title());
        }
        if title.len() > self.config.max_title_len {
            return Err(DomainError::title_too_long(
                title.len(),
                self.config.max_title_len,
            ));
        }
        Ok(())
    }

    /// Validate a tag or ingredient name
    fn validate_label_name(&self, name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::empty_name());
        }
        if name.len() > self.config.max_label_len {
            return Err(DomainError::name_too_long(
                name.len(),
                self.config.max_label_len,
            ));
        }
        Ok(())
    }

    fn validate_price(&self, price: Decimal) -> Result<(), DomainError> {
        if price < Decimal::ZERO {
            return Err(DomainError::invalid_price("price cannot be negative"));
        }
        if price.scale() > self.config.max_price_scale {
            return Err(DomainError::invalid_price(format!(
                "at most {} decimal places allowed",
                self.config.max_price_scale
            )));
        }
        if price >= self.config.max_price {
            return Err(DomainError::invalid_price(format!(
                "price must be below {}",
                self.config.max_price
            )));
        }
        Ok(())
    }

    /// Trim, validate and dedupe label names, keeping first occurrences in
    /// their original order.
    fn validated_names(&self, names: &[String]) -> Result<Vec<String>, DomainError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            self.validate_label_name(name)?;
            if seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
        }
        Ok(out)
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::database(e.to_string())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
