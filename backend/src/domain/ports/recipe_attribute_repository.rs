//! Port for owner-scoped tag and ingredient persistence.
//!
//! Attributes are never created here; reconciliation inside
//! [`super::RecipeRepository`] writes does that. Deleting an attribute drops
//! its association rows but never the recipes that carried it.

use async_trait::async_trait;

use crate::domain::{AttributeId, AttributeKind, AttributeName, RecipeAttribute, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attribute repository adapters.
    pub enum RecipeAttributeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "attribute repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "attribute repository query failed: {message}",
        /// The owner already has an attribute of this kind with the name.
        DuplicateName { name: String } =>
            "name already in use: {name}",
    }
}

/// Port for attribute storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeAttributeRepository: Send + Sync {
    /// List the owner's attributes of `kind` in listing order.
    ///
    /// With `assigned_only`, only attributes linked to at least one recipe
    /// are returned, each once.
    async fn list(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttribute>, RecipeAttributeRepositoryError>;

    /// Rename one of the owner's attributes.
    async fn rename(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
        name: &AttributeName,
    ) -> Result<Option<RecipeAttribute>, RecipeAttributeRepositoryError>;

    /// Delete one of the owner's attributes; `false` when it is not theirs.
    async fn delete(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Result<bool, RecipeAttributeRepositoryError>;
}
