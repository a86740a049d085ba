//! Tag and ingredient domain service.
//!
//! One service serves both attribute kinds; the kind travels with each call
//! so the HTTP adapter can mount identical routes for tags and ingredients.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{
    AttributesCommand, AttributesQuery, RecipeAttributeRepository, RecipeAttributeRepositoryError,
};
use crate::domain::{AttributeId, AttributeKind, AttributeName, Error, RecipeAttribute, UserId};

/// Attribute service implementing the attribute driving ports.
#[derive(Clone)]
pub struct AttributeService<A> {
    attributes: Arc<A>,
}

impl<A> AttributeService<A> {
    /// Create a new service backed by `attributes`.
    pub fn new(attributes: Arc<A>) -> Self {
        Self { attributes }
    }
}

impl<A> AttributeService<A>
where
    A: RecipeAttributeRepository,
{
    fn map_repository_error(kind: AttributeKind, error: RecipeAttributeRepositoryError) -> Error {
        match error {
            RecipeAttributeRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("{kind} repository unavailable: {message}"))
            }
            RecipeAttributeRepositoryError::Query { message } => {
                Error::internal(format!("{kind} repository error: {message}"))
            }
            RecipeAttributeRepositoryError::DuplicateName { name } => {
                Error::conflict(format!("{kind} with this name already exists")).with_details(
                    json!({
                        "field": "name",
                        "value": name,
                        "code": "duplicate_name",
                    }),
                )
            }
        }
    }

    fn not_found(kind: AttributeKind, id: AttributeId) -> Error {
        Error::not_found(format!("{kind} not found")).with_details(json!({
            "id": id.get(),
            "code": format!("{kind}_not_found"),
        }))
    }
}

#[async_trait]
impl<A> AttributesQuery for AttributeService<A>
where
    A: RecipeAttributeRepository,
{
    async fn list_attributes(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        assigned_only: bool,
    ) -> Result<Vec<RecipeAttribute>, Error> {
        self.attributes
            .list(owner, kind, assigned_only)
            .await
            .map_err(|err| Self::map_repository_error(kind, err))
    }
}

#[async_trait]
impl<A> AttributesCommand for AttributeService<A>
where
    A: RecipeAttributeRepository,
{
    async fn rename_attribute(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
        name: &AttributeName,
    ) -> Result<RecipeAttribute, Error> {
        self.attributes
            .rename(owner, kind, id, name)
            .await
            .map_err(|err| Self::map_repository_error(kind, err))?
            .ok_or_else(|| Self::not_found(kind, id))
    }

    async fn delete_attribute(
        &self,
        owner: &UserId,
        kind: AttributeKind,
        id: AttributeId,
    ) -> Result<(), Error> {
        let deleted = self
            .attributes
            .delete(owner, kind, id)
            .await
            .map_err(|err| Self::map_repository_error(kind, err))?;
        if deleted {
            Ok(())
        } else {
            Err(Self::not_found(kind, id))
        }
    }
}
