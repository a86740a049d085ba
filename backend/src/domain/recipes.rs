//! Recipe domain service.
//!
//! Implements [`RecipesCommand`] and [`RecipesQuery`] over a
//! [`RecipeRepository`] and an [`ImageStore`]. The service owns the image
//! lifecycle: new files are written before the reference moves, and the
//! replaced file is removed only after the reference points elsewhere.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::domain::ports::{
    CreateRecipeRequest, ImageStore, ImageStoreError, RecipeRepository, RecipeRepositoryError,
    RecipesCommand, RecipesQuery, UpdateRecipeRequest, UploadImageRequest,
};
use crate::domain::{Error, ImageUpload, Recipe, RecipeFilter, RecipeId, UserId};

/// Recipe service implementing the recipe driving ports.
#[derive(Clone)]
pub struct RecipeService<R, S> {
    recipes: Arc<R>,
    images: Arc<S>,
}

impl<R, S> RecipeService<R, S> {
    /// Create a new service with the given adapters.
    pub fn new(recipes: Arc<R>, images: Arc<S>) -> Self {
        Self { recipes, images }
    }
}

impl<R, S> RecipeService<R, S>
where
    R: RecipeRepository,
    S: ImageStore,
{
    fn map_repository_error(error: RecipeRepositoryError) -> Error {
        match error {
            RecipeRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("recipe repository unavailable: {message}"))
            }
            RecipeRepositoryError::Query { message } => {
                Error::internal(format!("recipe repository error: {message}"))
            }
            RecipeRepositoryError::AttributeConflict { kind, name } => {
                Error::conflict(format!("{kind} changed concurrently: {name}")).with_details(
                    json!({
                        "kind": kind,
                        "name": name,
                        "code": "attribute_conflict",
                    }),
                )
            }
        }
    }

    fn map_store_error(error: ImageStoreError) -> Error {
        Error::internal(format!("image store error: {error}"))
    }

    fn recipe_not_found(id: RecipeId) -> Error {
        Error::not_found("recipe not found").with_details(json!({
            "recipeId": id.get(),
            "code": "recipe_not_found",
        }))
    }

    async fn decode_upload(bytes: Vec<u8>) -> Result<ImageUpload, Error> {
        let decoded = tokio::task::spawn_blocking(move || ImageUpload::decode(bytes))
            .await
            .map_err(|err| Error::internal(format!("image decoding task failed: {err}")))?;
        decoded.map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": "image",
                "code": "invalid_image",
            }))
        })
    }

    /// Remove a file that is no longer referenced. Failure only leaks a file,
    /// so it is logged rather than surfaced.
    async fn discard_image(&self, path: &str) {
        if let Err(error) = self.images.remove(path).await {
            warn!(%path, %error, "failed to remove unreferenced recipe image");
        }
    }
}

#[async_trait]
impl<R, S> RecipesQuery for RecipeService<R, S>
where
    R: RecipeRepository,
    S: ImageStore,
{
    async fn list_recipes(
        &self,
        owner: &UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, Error> {
        self.recipes
            .list(owner, filter)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_recipe(&self, owner: &UserId, recipe_id: RecipeId) -> Result<Recipe, Error> {
        self.recipes
            .find(owner, recipe_id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::recipe_not_found(recipe_id))
    }
}

#[async_trait]
impl<R, S> RecipesCommand for RecipeService<R, S>
where
    R: RecipeRepository,
    S: ImageStore,
{
    async fn create_recipe(&self, request: CreateRecipeRequest) -> Result<Recipe, Error> {
        self.recipes
            .create(&request.owner, &request.draft, &request.attributes)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn update_recipe(&self, request: UpdateRecipeRequest) -> Result<Recipe, Error> {
        self.recipes
            .update(
                &request.owner,
                request.recipe_id,
                &request.changes,
                &request.attributes,
            )
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::recipe_not_found(request.recipe_id))
    }

    async fn delete_recipe(&self, owner: &UserId, recipe_id: RecipeId) -> Result<(), Error> {
        let deleted = self
            .recipes
            .delete(owner, recipe_id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::recipe_not_found(recipe_id))?;
        if let Some(path) = deleted.image.as_deref() {
            self.discard_image(path).await;
        }
        Ok(())
    }

    async fn upload_image(&self, request: UploadImageRequest) -> Result<Recipe, Error> {
        let UploadImageRequest {
            owner,
            recipe_id,
            bytes,
        } = request;

        // Reject unknown recipes before doing any decoding or file IO.
        self.recipes
            .find(&owner, recipe_id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::recipe_not_found(recipe_id))?;

        let upload = Self::decode_upload(bytes).await?;
        let path = upload.storage_path();
        self.images
            .save(&path, upload.bytes())
            .await
            .map_err(Self::map_store_error)?;

        let replaced = match self.recipes.replace_image(&owner, recipe_id, &path).await {
            Ok(Some(replaced)) => replaced,
            Ok(None) => {
                self.discard_image(&path).await;
                return Err(Self::recipe_not_found(recipe_id));
            }
            Err(error) => {
                self.discard_image(&path).await;
                return Err(Self::map_repository_error(error));
            }
        };

        match replaced.previous.as_deref() {
            Some(previous) if previous != path => self.discard_image(previous).await,
            _ => {}
        }
        Ok(replaced.recipe)
    }
}

#[cfg(test)]
#[path = "recipes_tests.rs"]
mod tests;
