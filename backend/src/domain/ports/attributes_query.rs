//! Driving port for tag and ingredient reads.

use async_trait::async_trait;

use crate::domain::{AttributeKind, Error, RecipeAttribute, UserId};

/// Port for owner-scoped attribute reads.
#[async_trait]
pub trait AttributesQuery: Send + Sync {
    async fn list_attributes(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttribute>, Error>;
}
