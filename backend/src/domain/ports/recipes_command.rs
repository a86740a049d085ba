//! Driving port for recipe mutations.
//!
//! HTTP handlers call [`RecipesCommand`] after turning payloads into
//! validated domain values. The owner travels with every request; the
//! service never reads it from ambient context.

use async_trait::async_trait;

use crate::domain::{AttributeChanges, Error, Recipe, RecipeChanges, RecipeDraft, RecipeId, UserId};

/// Request to create a recipe.
#[derive(Debug, Clone)]
pub struct CreateRecipeRequest {
    pub owner: UserId,
    pub draft: RecipeDraft,
    pub attributes: AttributeChanges,
}

/// Request to update a recipe (full or partial; the adapter enforces which
/// fields are mandatory).
#[derive(Debug, Clone)]
pub struct UpdateRecipeRequest {
    pub owner: UserId,
    pub recipe_id: RecipeId,
    pub changes: RecipeChanges,
    pub attributes: AttributeChanges,
}

/// Request to attach an image to a recipe.
#[derive(Debug, Clone)]
pub struct UploadImageRequest {
    pub owner: UserId,
    pub recipe_id: RecipeId,
    /// Raw payload; decoded and validated by the service.
    pub bytes: Vec<u8>,
}

/// Port for recipe writes.
#[async_trait]
pub trait RecipesCommand: Send + Sync {
    async fn create_recipe(&self, request: CreateRecipeRequest) -> Result<Recipe, Error>;

    async fn update_recipe(&self, request: UpdateRecipeRequest) -> Result<Recipe, Error>;

    async fn delete_recipe(&self, owner: &UserId, recipe_id: RecipeId) -> Result<(), Error>;

    /// Replace the recipe image. Invalid payloads leave the recipe untouched.
    async fn upload_image(&self, request: UploadImageRequest) -> Result<Recipe, Error>;
}
