//! PostgreSQL-backed `RecipeAttributeRepository` implementation.
//!
//! Tags and ingredients share the `recipe_attributes` table, discriminated by
//! the `kind` column. Names use the `C` collation so `ORDER BY name DESC`
//! matches the domain's code-point ordering.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{RecipeAttributeRepository, RecipeAttributeRepositoryError};
use crate::domain::{AttributeId, AttributeKind, AttributeName, RecipeAttribute, UserId};

use super::diesel_helpers::{
    collect_rows, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::AttributeRow;
use super::pool::{DbPool, PoolError};
use super::schema::{recipe_attribute_links, recipe_attributes};

/// Diesel-backed implementation of the attribute repository port.
#[derive(Clone)]
pub struct DieselRecipeAttributeRepository {
    pool: DbPool,
}

impl DieselRecipeAttributeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RecipeAttributeRepositoryError {
    map_basic_pool_error(error, RecipeAttributeRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> RecipeAttributeRepositoryError {
    map_basic_diesel_error(
        error,
        RecipeAttributeRepositoryError::query,
        RecipeAttributeRepositoryError::connection,
    )
}

/// Convert a database row into a domain attribute.
pub(super) fn row_to_attribute(row: AttributeRow) -> Result<RecipeAttribute, String> {
    let kind = AttributeKind::from_storage(&row.kind)
        .ok_or_else(|| format!("unknown attribute kind `{}` on row {}", row.kind, row.id))?;
    Ok(RecipeAttribute {
        id: AttributeId::new(row.id),
        owner: UserId::from_uuid(row.user_id),
        kind,
        name: row.name,
    })
}

#[async_trait]
impl RecipeAttributeRepository for DieselRecipeAttributeRepository {
    async fn list(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttribute>, RecipeAttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();

        let rows: Vec<AttributeRow> = conn
            .transaction(|conn| {
                async move {
                    let mut query = recipe_attributes::table
                        .filter(recipe_attributes::user_id.eq(owner_id))
                        .filter(recipe_attributes::kind.eq(kind.as_str()))
                        .into_boxed();
                    if assigned_only {
                        let assigned: Vec<i64> = recipe_attribute_links::table
                            .inner_join(recipe_attributes::table)
                            .filter(recipe_attributes::user_id.eq(owner_id))
                            .filter(recipe_attributes::kind.eq(kind.as_str()))
                            .select(recipe_attribute_links::attribute_id)
                            .distinct()
                            .load(conn)
                            .await?;
                        query = query.filter(recipe_attributes::id.eq_any(assigned));
                    }
                    query
                        .select(AttributeRow::as_select())
                        .order_by((recipe_attributes::name.desc(), recipe_attributes::id.desc()))
                        .load(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        collect_rows(
            rows.into_iter().map(row_to_attribute),
            RecipeAttributeRepositoryError::query,
        )
    }

    async fn rename(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
        name: &AttributeName,
    ) -> Result<Option<RecipeAttribute>, RecipeAttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_name: &str = name.as_ref();
        let target = recipe_attributes::table
            .filter(recipe_attributes::id.eq(id.get()))
            .filter(recipe_attributes::user_id.eq(*owner.as_uuid()))
            .filter(recipe_attributes::kind.eq(kind.as_str()));
        let row: Option<AttributeRow> = diesel::update(target)
            .set(recipe_attributes::name.eq(new_name))
            .returning(AttributeRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|error| {
                if is_unique_violation(&error) {
                    RecipeAttributeRepositoryError::duplicate_name(name.to_string())
                } else {
                    map_diesel_error(error)
                }
            })?;
        row.map(row_to_attribute)
            .transpose()
            .map_err(RecipeAttributeRepositoryError::query)
    }

    async fn delete(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Result<bool, RecipeAttributeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Link rows go with the attribute through ON DELETE CASCADE.
        let target = recipe_attributes::table
            .filter(recipe_attributes::id.eq(id.get()))
            .filter(recipe_attributes::user_id.eq(*owner.as_uuid()))
            .filter(recipe_attributes::kind.eq(kind.as_str()));
        let deleted = diesel::delete(target)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }
}
