//! Driving port for tag and ingredient maintenance.

use async_trait::async_trait;

use crate::domain::{AttributeId, AttributeKind, AttributeName, Error, RecipeAttribute, UserId};

/// Port for renaming and deleting attributes.
#[async_trait]
pub trait AttributesCommand: Send + Sync {
    async fn rename_attribute(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
        name: &AttributeName,
    ) -> Result<RecipeAttribute, Error>;

    async fn delete_attribute(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Result<(), Error>;
}
