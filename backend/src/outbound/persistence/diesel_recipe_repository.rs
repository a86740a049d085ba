//! PostgreSQL-backed `RecipeRepository` implementation using Diesel ORM.
//!
//! Recipe writes and their tag/ingredient reconciliation share a single
//! transaction. Attribute names are resolved with
//! `INSERT .. ON CONFLICT DO NOTHING` followed by a lookup, so two writers
//! racing on the same new name both end up linking the one stored row.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    DeletedRecipe, ImageReplacement, RecipeRepository, RecipeRepositoryError,
};
use crate::domain::{
    AttributeChanges, AttributeKind, AttributeName, Price, Recipe, RecipeAttribute,
    RecipeChanges, RecipeDraft, RecipeFilter, RecipeId, UserId, sort_for_listing,
};

use super::diesel_helpers::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_recipe_attribute_repository::row_to_attribute;
use super::models::{
    AttributeLinkRow, AttributeRow, NewAttributeRow, NewRecipeRow, RecipeRow, RecipeUpdate,
};
use super::pool::{DbPool, PoolError};
use super::schema::{recipe_attribute_links, recipe_attributes, recipes};

/// Diesel-backed implementation of the recipe repository port.
#[derive(Clone)]
pub struct DieselRecipeRepository {
    pool: DbPool,
}

impl DieselRecipeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a recipe transaction.
#[derive(Debug)]
enum TxError {
    Database(DieselError),
    /// A name was neither inserted nor found; a concurrent transaction
    /// removed it between the two statements.
    UnresolvedAttribute { kind: AttributeKind, name: String },
    /// A resolved attribute was deleted before its link was inserted.
    DetachedAttribute { kind: AttributeKind, names: String },
    CorruptRow(String),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Database(error)
    }
}

fn map_pool_error(error: PoolError) -> RecipeRepositoryError {
    map_basic_pool_error(error, RecipeRepositoryError::connection)
}

fn map_diesel_error(error: DieselError) -> RecipeRepositoryError {
    map_basic_diesel_error(
        error,
        RecipeRepositoryError::query,
        RecipeRepositoryError::connection,
    )
}

fn map_tx_error(error: TxError) -> RecipeRepositoryError {
    match error {
        TxError::Database(error) => map_diesel_error(error),
        TxError::UnresolvedAttribute { kind, name } => {
            RecipeRepositoryError::attribute_conflict(kind.as_str(), name)
        }
        TxError::DetachedAttribute { kind, names } => {
            RecipeRepositoryError::attribute_conflict(kind.as_str(), names)
        }
        TxError::CorruptRow(message) => RecipeRepositoryError::query(message),
    }
}

#[derive(Default)]
struct Associations {
    tags: Vec<RecipeAttribute>,
    ingredients: Vec<RecipeAttribute>,
}

fn row_to_recipe(row: RecipeRow, associations: Associations) -> Recipe {
    let Associations {
        mut tags,
        mut ingredients,
    } = associations;
    sort_for_listing(&mut tags);
    sort_for_listing(&mut ingredients);
    Recipe {
        id: RecipeId::new(row.id),
        owner: UserId::from_uuid(row.user_id),
        title: row.title,
        time_minutes: row.time_minutes,
        price: Price::from_cents(row.price_cents),
        description: row.description,
        link: row.link,
        image: row.image,
        tags,
        ingredients,
    }
}

/// Attach association rows to their recipes, preserving the row order.
async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<RecipeRow>,
) -> Result<Vec<Recipe>, TxError> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let links: Vec<(i64, AttributeRow)> = if ids.is_empty() {
        Vec::new()
    } else {
        recipe_attribute_links::table
            .inner_join(recipe_attributes::table)
            .filter(recipe_attribute_links::recipe_id.eq_any(ids))
            .select((recipe_attribute_links::recipe_id, AttributeRow::as_select()))
            .load(conn)
            .await?
    };

    let mut grouped: HashMap<i64, Associations> = HashMap::new();
    for (recipe_id, row) in links {
        let attribute = row_to_attribute(row).map_err(TxError::CorruptRow)?;
        let entry = grouped.entry(recipe_id).or_default();
        match attribute.kind {
            AttributeKind::Tag => entry.tags.push(attribute),
            AttributeKind::Ingredient => entry.ingredients.push(attribute),
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let associations = grouped.remove(&row.id).unwrap_or_default();
            row_to_recipe(row, associations)
        })
        .collect())
}

async fn load_owned(
    conn: &mut AsyncPgConnection,
    owner: Uuid,
    id: i64,
) -> Result<Option<Recipe>, TxError> {
    let row: Option<RecipeRow> = recipes::table
        .filter(recipes::id.eq(id))
        .filter(recipes::user_id.eq(owner))
        .select(RecipeRow::as_select())
        .first(conn)
        .await
        .optional()?;
    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Recipe ids carrying any of `attribute_ids` of `kind` for the owner.
async fn recipes_with_any(
    conn: &mut AsyncPgConnection,
    owner: Uuid,
    kind: AttributeKind,
    attribute_ids: &[i64],
) -> Result<Vec<i64>, DieselError> {
    recipe_attribute_links::table
        .inner_join(recipe_attributes::table)
        .filter(recipe_attributes::user_id.eq(owner))
        .filter(recipe_attributes::kind.eq(kind.as_str()))
        .filter(recipe_attribute_links::attribute_id.eq_any(attribute_ids.to_vec()))
        .select(recipe_attribute_links::recipe_id)
        .distinct()
        .load(conn)
        .await
}

/// Find-or-create every name for the owner and return the stored ids.
async fn resolve_names(
    conn: &mut AsyncPgConnection,
    owner: Uuid,
    kind: AttributeKind,
    names: &[AttributeName],
) -> Result<Vec<i64>, TxError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let raw: Vec<&str> = names.iter().map(|name| name.as_ref()).collect();
    let new_rows: Vec<NewAttributeRow<'_>> = raw
        .iter()
        .map(|&name| NewAttributeRow {
            user_id: owner,
            kind: kind.as_str(),
            name,
        })
        .collect();

    diesel::insert_into(recipe_attributes::table)
        .values(&new_rows)
        .on_conflict((
            recipe_attributes::user_id,
            recipe_attributes::kind,
            recipe_attributes::name,
        ))
        .do_nothing()
        .execute(conn)
        .await?;

    let stored: Vec<(i64, String)> = recipe_attributes::table
        .filter(recipe_attributes::user_id.eq(owner))
        .filter(recipe_attributes::kind.eq(kind.as_str()))
        .filter(recipe_attributes::name.eq_any(raw.clone()))
        .select((recipe_attributes::id, recipe_attributes::name))
        .load(conn)
        .await?;

    let missing = raw.iter().copied().find(|name| {
        !stored
            .iter()
            .any(|(_, stored_name)| stored_name.as_str() == *name)
    });
    if let Some(name) = missing {
        return Err(TxError::UnresolvedAttribute {
            kind,
            name: name.to_owned(),
        });
    }
    Ok(stored.into_iter().map(|(id, _)| id).collect())
}

/// Classify a failed link insert; a foreign key violation means a linked
/// attribute was deleted after it was resolved.
fn link_insert_error(error: DieselError, kind: AttributeKind, names: &[AttributeName]) -> TxError {
    if is_foreign_key_violation(&error) {
        let names = names
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        TxError::DetachedAttribute { kind, names }
    } else {
        TxError::Database(error)
    }
}

/// Replace the recipe's links of `kind` with exactly `attribute_ids`.
async fn replace_links(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    kind: AttributeKind,
    names: &[AttributeName],
    attribute_ids: &[i64],
) -> Result<(), TxError> {
    let current: Vec<i64> = recipe_attribute_links::table
        .inner_join(recipe_attributes::table)
        .filter(recipe_attribute_links::recipe_id.eq(recipe_id))
        .filter(recipe_attributes::kind.eq(kind.as_str()))
        .select(recipe_attribute_links::attribute_id)
        .load(conn)
        .await?;
    if !current.is_empty() {
        diesel::delete(
            recipe_attribute_links::table
                .filter(recipe_attribute_links::recipe_id.eq(recipe_id))
                .filter(recipe_attribute_links::attribute_id.eq_any(current)),
        )
        .execute(conn)
        .await?;
    }
    if !attribute_ids.is_empty() {
        let rows: Vec<AttributeLinkRow> = attribute_ids
            .iter()
            .map(|attribute_id| AttributeLinkRow {
                recipe_id,
                attribute_id: *attribute_id,
            })
            .collect();
        diesel::insert_into(recipe_attribute_links::table)
            .values(&rows)
            .execute(conn)
            .await
            .map_err(|error| link_insert_error(error, kind, names))?;
    }
    Ok(())
}

async fn reconcile(
    conn: &mut AsyncPgConnection,
    owner: Uuid,
    recipe_id: i64,
    attributes: &AttributeChanges,
) -> Result<(), TxError> {
    for (kind, names) in attributes.replacements() {
        let ids = resolve_names(conn, owner, kind, names).await?;
        replace_links(conn, recipe_id, kind, names, &ids).await?;
    }
    Ok(())
}

#[async_trait]
impl RecipeRepository for DieselRecipeRepository {
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();
        let tag_ids: Vec<i64> = filter.tag_ids.iter().map(|id| id.get()).collect();
        let ingredient_ids: Vec<i64> = filter.ingredient_ids.iter().map(|id| id.get()).collect();

        conn.transaction(|conn| {
            async move {
                let mut query = recipes::table
                    .filter(recipes::user_id.eq(owner_id))
                    .into_boxed();
                for (kind, wanted) in [
                    (AttributeKind::Tag, &tag_ids),
                    (AttributeKind::Ingredient, &ingredient_ids),
                ] {
                    if wanted.is_empty() {
                        continue;
                    }
                    let matching = recipes_with_any(conn, owner_id, kind, wanted).await?;
                    query = query.filter(recipes::id.eq_any(matching));
                }
                let rows: Vec<RecipeRow> = query
                    .select(RecipeRow::as_select())
                    .order_by(recipes::id.desc())
                    .load(conn)
                    .await?;
                hydrate(conn, rows).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();
        conn.transaction(|conn| {
            async move { load_owned(conn, owner_id, id.get()).await }.scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
        attributes: &AttributeChanges,
    ) -> Result<Recipe, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();
        let new_row = NewRecipeRow {
            user_id: owner_id,
            title: draft.title.as_ref(),
            time_minutes: draft.time_minutes.get(),
            price_cents: draft.price.cents(),
            description: draft.description.as_str(),
            link: draft.link.as_ref(),
        };

        let created = conn
            .transaction(|conn| {
                async move {
                    let recipe_id: i64 = diesel::insert_into(recipes::table)
                        .values(&new_row)
                        .returning(recipes::id)
                        .get_result(conn)
                        .await?;
                    reconcile(conn, owner_id, recipe_id, attributes).await?;
                    load_owned(conn, owner_id, recipe_id).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;

        created.ok_or_else(|| RecipeRepositoryError::query("inserted recipe vanished"))
    }

    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        changes: &RecipeChanges,
        attributes: &AttributeChanges,
    ) -> Result<Option<Recipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();
        let recipe_id = id.get();
        let changeset = RecipeUpdate {
            title: changes.title.as_ref().map(|title| title.as_ref()),
            time_minutes: changes.time_minutes.map(|time| time.get()),
            price_cents: changes.price.map(Price::cents),
            description: changes.description.as_deref(),
            link: changes.link.as_ref().map(|link| link.as_ref()),
        };
        let has_scalar_changes = !changes.is_empty();

        conn.transaction(|conn| {
            async move {
                let locked: Option<i64> = recipes::table
                    .filter(recipes::id.eq(recipe_id))
                    .filter(recipes::user_id.eq(owner_id))
                    .select(recipes::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Ok(None);
                }
                if has_scalar_changes {
                    diesel::update(recipes::table.find(recipe_id))
                        .set(&changeset)
                        .execute(conn)
                        .await?;
                }
                reconcile(conn, owner_id, recipe_id, attributes).await?;
                load_owned(conn, owner_id, recipe_id).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn delete(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<DeletedRecipe>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Link rows cascade; attributes stay.
        let image: Option<Option<String>> = diesel::delete(
            recipes::table
                .filter(recipes::id.eq(id.get()))
                .filter(recipes::user_id.eq(*owner.as_uuid())),
        )
        .returning(recipes::image)
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        Ok(image.map(|image| DeletedRecipe { id, image }))
    }

    async fn replace_image(
        &self,
        owner: &UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<Option<ImageReplacement>, RecipeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();
        let recipe_id = id.get();

        conn.transaction(|conn| {
            async move {
                let previous: Option<Option<String>> = recipes::table
                    .filter(recipes::id.eq(recipe_id))
                    .filter(recipes::user_id.eq(owner_id))
                    .select(recipes::image)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(previous) = previous else {
                    return Ok(None);
                };
                diesel::update(recipes::table.find(recipe_id))
                    .set(recipes::image.eq(Some(image)))
                    .execute(conn)
                    .await?;
                let recipe = load_owned(conn, owner_id, recipe_id).await?;
                Ok(recipe.map(|recipe| ImageReplacement { recipe, previous }))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }
}
