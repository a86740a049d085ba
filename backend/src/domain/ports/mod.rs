//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`, [`AccountService`]) are what inbound
//! adapters call; driven ports (`*Repository`, [`ImageStore`]) are what the
//! domain services call and outbound adapters implement.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod attributes_command;
mod attributes_query;
mod image_store;
mod recipe_attribute_repository;
mod recipe_repository;
mod recipes_command;
mod recipes_query;
mod user_repository;

pub use account_service::{AccountService, ProfileChanges, RegisterRequest};
pub use attributes_command::AttributesCommand;
pub use attributes_query::AttributesQuery;
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{ImageStore, ImageStoreError};
#[cfg(test)]
pub use recipe_attribute_repository::MockRecipeAttributeRepository;
pub use recipe_attribute_repository::{RecipeAttributeRepository, RecipeAttributeRepositoryError};
#[cfg(test)]
pub use recipe_repository::MockRecipeRepository;
pub use recipe_repository::{
    DeletedRecipe, ImageReplacement, RecipeRepository, RecipeRepositoryError,
};
pub use recipes_command::{
    CreateRecipeRequest, RecipesCommand, UpdateRecipeRequest, UploadImageRequest,
};
pub use recipes_query::RecipesQuery;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    NewUser, ProfileUpdate, StoredCredentials, UserRepository, UserRepositoryError,
};
