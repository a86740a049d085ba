//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed recipe-box model shared by the HTTP
//! adapter and the persistence adapters, plus the services that implement
//! the driving ports in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - User, EmailAddress, UserName, UserId: account identity.
//! - Recipe, RecipeDraft, RecipeChanges, RecipeFilter, Price: recipes.
//! - RecipeAttribute, AttributeKind, AttributeName: owner-scoped tags and
//!   ingredients.
//! - AttributeChanges: reconciliation instructions for a recipe write.
//! - RecipeService, AttributeService, UserAccounts: port implementations.

pub mod accounts;
pub mod attribute;
pub mod attributes_service;
pub mod auth;
pub mod error;
pub mod image;
pub mod ports;
pub mod recipe;
pub mod recipes;
pub mod reconcile;
pub mod trace_id;
pub mod user;

pub use self::accounts::UserAccounts;
pub use self::attribute::{
    ATTRIBUTE_NAME_MAX, AttributeId, AttributeKind, AttributeName, AttributeValidationError,
    RecipeAttribute, listing_order, sort_for_listing,
};
pub use self::attributes_service::AttributeService;
pub use self::auth::{
    AuthToken, AuthValidationError, LoginCredentials, PASSWORD_MIN_LENGTH, Password,
    PasswordHash, PasswordHashError,
};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::image::{ImageUpload, ImageValidationError, RECIPE_IMAGE_DIR};
pub use self::recipe::{
    Price, Recipe, RecipeChanges, RecipeDraft, RecipeFilter, RecipeId, RecipeLink, RecipeTitle,
    RecipeValidationError, TimeMinutes,
};
pub use self::recipes::RecipeService;
pub use self::reconcile::{AssociationChange, AttributeChanges};
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, User, UserId, UserName, UserValidationError};

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
