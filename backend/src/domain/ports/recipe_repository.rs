//! Port for owner-scoped recipe persistence.
//!
//! Every method receives the owner explicitly and must treat rows of other
//! owners as absent. Writes that carry [`AttributeChanges`] run the
//! find-or-create and association replacement in the same transaction as the
//! recipe row itself, so a failure leaves no partial association set.

use async_trait::async_trait;

use crate::domain::{
    AttributeChanges, Recipe, RecipeChanges, RecipeDraft, RecipeFilter, RecipeId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by recipe repository adapters.
    pub enum RecipeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "recipe repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "recipe repository query failed: {message}",
        /// A concurrent write created or removed an attribute this write
        /// links to.
        AttributeConflict { kind: String, name: String } =>
            "{kind} changed concurrently: {name}",
    }
}

/// Identity and image reference of a deleted recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRecipe {
    pub id: RecipeId,
    pub image: Option<String>,
}

/// Result of swapping a recipe's image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReplacement {
    pub recipe: Recipe,
    /// Reference that was attached before the swap.
    pub previous: Option<String>,
}

/// Port for recipe storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// List the owner's recipes matching `filter`, newest id first.
    async fn list(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RecipeRepositoryError>;

    /// Fetch one of the owner's recipes.
    async fn find(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RecipeRepositoryError>;

    /// Insert a recipe owned by `owner` and reconcile its attributes.
    async fn create(
        &self,
        owner: &UserId,
        draft: &RecipeDraft,
        attributes: &AttributeChanges,
    ) -> Result<Recipe, RecipeRepositoryError>;

    /// Update one of the owner's recipes; `None` when it is not theirs.
    async fn update(
        &self,
        owner: &UserId,
        id: RecipeId,
        changes: &RecipeChanges,
        attributes: &AttributeChanges,
    ) -> Result<Option<Recipe>, RecipeRepositoryError>;

    /// Delete one of the owner's recipes along with its association rows.
    async fn delete(
        &self,
        owner: &UserId,
        id: RecipeId,
    ) -> Result<Option<DeletedRecipe>, RecipeRepositoryError>;

    /// Point the recipe at a new image reference.
    async fn replace_image(
        &self,
        owner: &UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<Option<ImageReplacement>, RecipeRepositoryError>;
}
