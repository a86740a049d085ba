//! Driving port for recipe reads.

use async_trait::async_trait;

use crate::domain::{Error, Recipe, RecipeFilter, RecipeId, UserId};

/// Port for owner-scoped recipe reads.
#[async_trait]
pub trait RecipesQuery: Send + Sync {
    /// The owner's recipes matching `filter`, newest first.
    async fn list_recipes(&self, owner: &UserId, filter: &RecipeFilter)
    -> Result<Vec<Recipe>, Error>;

    /// One of the owner's recipes; other owners' recipes are `NotFound`.
    async fn get_recipe(&self, owner: &UserId, recipe_id: RecipeId) -> Result<Recipe, Error>;
}
