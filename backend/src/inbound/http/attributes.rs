//! Tag and ingredient HTTP handlers.
//!
//! ```text
//! GET    /api/recipe/tags?assigned_only=1
//! PUT    /api/recipe/tags/{id} {"name":"Vegan"}
//! PATCH  /api/recipe/tags/{id} {"name":"Vegan"}
//! DELETE /api/recipe/tags/{id}
//! ```
//!
//! `/api/recipe/ingredients` mirrors the tag routes. There is no create
//! endpoint; attributes are created while writing recipes.

use actix_web::{HttpResponse, delete, get, patch, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AttributeId, AttributeKind, AttributeName, Error, RecipeAttribute};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, missing_field_error};

const NAME: FieldName = FieldName::new("name");

/// Tag or ingredient as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AttributeResponse {
    #[schema(example = 7)]
    pub id: i64,
    #[schema(example = "Vegan")]
    pub name: String,
}

impl From<RecipeAttribute> for AttributeResponse {
    fn from(attribute: RecipeAttribute) -> Self {
        Self {
            id: attribute.id.get(),
            name: attribute.name,
        }
    }
}

/// Rename payload for `PUT`/`PATCH`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RenameRequest {
    pub name: Option<String>,
}

/// Query parameters for attribute listings.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AttributeListQuery {
    /// `1` restricts the listing to attributes used by at least one recipe.
    #[param(example = 1)]
    pub assigned_only: Option<u8>,
}

impl AttributeListQuery {
    fn assigned_only(&self) -> bool {
        matches!(self.assigned_only, Some(flag) if flag != 0)
    }
}

pub(crate) fn parse_rename(payload: RenameRequest) -> Result<AttributeName, Error> {
    let raw = payload.name.ok_or_else(|| missing_field_error(NAME))?;
    AttributeName::new(raw).map_err(|err| invalid_field_error("name", err))
}

async fn list_kind(
    state: &HttpState,
    user: &AuthenticatedUser,
    kind: AttributeKind,
    query: &AttributeListQuery,
) -> ApiResult<HttpResponse> {
    let attributes = state
        .attributes_query
        .list_attributes(user.id(), kind, query.assigned_only())
        .await?;
    let body: Vec<AttributeResponse> = attributes.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(body))
}

async fn rename_kind(
    state: &HttpState,
    user: &AuthenticatedUser,
    kind: AttributeKind,
    id: i64,
    payload: RenameRequest,
) -> ApiResult<web::Json<AttributeResponse>> {
    let name = parse_rename(payload)?;
    let renamed = state
        .attributes
        .rename_attribute(user.id(), kind, AttributeId::new(id), &name)
        .await?;
    Ok(web::Json(renamed.into()))
}

async fn delete_kind(
    state: &HttpState,
    user: &AuthenticatedUser,
    kind: AttributeKind,
    id: i64,
) -> ApiResult<HttpResponse> {
    state
        .attributes
        .delete_attribute(user.id(), kind, AttributeId::new(id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List the caller's tags, name descending.
#[utoipa::path(
    get,
    path = "/api/recipe/tags",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "Tags", body = [AttributeResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "listTags"
)]
#[get("/tags")]
pub async fn list_tags(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<AttributeListQuery>,
) -> ApiResult<HttpResponse> {
    list_kind(&state, &user, AttributeKind::Tag, &query).await
}

/// Rename one of the caller's tags.
#[utoipa::path(
    put,
    path = "/api/recipe/tags/{id}",
    request_body = RenameRequest,
    params(("id" = i64, Path, description = "Tag identifier")),
    responses(
        (status = 200, description = "Renamed tag", body = AttributeResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "updateTag"
)]
#[put("/tags/{id}")]
pub async fn update_tag(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RenameRequest>,
) -> ApiResult<web::Json<AttributeResponse>> {
    rename_kind(
        &state,
        &user,
        AttributeKind::Tag,
        path.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Rename one of the caller's tags (partial form).
#[utoipa::path(
    patch,
    path = "/api/recipe/tags/{id}",
    request_body = RenameRequest,
    params(("id" = i64, Path, description = "Tag identifier")),
    responses(
        (status = 200, description = "Renamed tag", body = AttributeResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "patchTag"
)]
#[patch("/tags/{id}")]
pub async fn patch_tag(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RenameRequest>,
) -> ApiResult<web::Json<AttributeResponse>> {
    rename_kind(
        &state,
        &user,
        AttributeKind::Tag,
        path.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Delete one of the caller's tags; recipes carrying it are kept.
#[utoipa::path(
    delete,
    path = "/api/recipe/tags/{id}",
    params(("id" = i64, Path, description = "Tag identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tags"],
    operation_id = "deleteTag"
)]
#[delete("/tags/{id}")]
pub async fn delete_tag(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    delete_kind(&state, &user, AttributeKind::Tag, path.into_inner()).await
}

/// List the caller's ingredients, name descending.
#[utoipa::path(
    get,
    path = "/api/recipe/ingredients",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "Ingredients", body = [AttributeResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["ingredients"],
    operation_id = "listIngredients"
)]
#[get("/ingredients")]
pub async fn list_ingredients(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<AttributeListQuery>,
) -> ApiResult<HttpResponse> {
    list_kind(&state, &user, AttributeKind::Ingredient, &query).await
}

/// Rename one of the caller's ingredients.
#[utoipa::path(
    put,
    path = "/api/recipe/ingredients/{id}",
    request_body = RenameRequest,
    params(("id" = i64, Path, description = "Ingredient identifier")),
    responses(
        (status = 200, description = "Renamed ingredient", body = AttributeResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["ingredients"],
    operation_id = "updateIngredient"
)]
#[put("/ingredients/{id}")]
pub async fn update_ingredient(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RenameRequest>,
) -> ApiResult<web::Json<AttributeResponse>> {
    rename_kind(
        &state,
        &user,
        AttributeKind::Ingredient,
        path.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Rename one of the caller's ingredients (partial form).
#[utoipa::path(
    patch,
    path = "/api/recipe/ingredients/{id}",
    request_body = RenameRequest,
    params(("id" = i64, Path, description = "Ingredient identifier")),
    responses(
        (status = 200, description = "Renamed ingredient", body = AttributeResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["ingredients"],
    operation_id = "patchIngredient"
)]
#[patch("/ingredients/{id}")]
pub async fn patch_ingredient(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RenameRequest>,
) -> ApiResult<web::Json<AttributeResponse>> {
    rename_kind(
        &state,
        &user,
        AttributeKind::Ingredient,
        path.into_inner(),
        payload.into_inner(),
    )
    .await
}

/// Delete one of the caller's ingredients; recipes using it are kept.
#[utoipa::path(
    delete,
    path = "/api/recipe/ingredients/{id}",
    params(("id" = i64, Path, description = "Ingredient identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["ingredients"],
    operation_id = "deleteIngredient"
)]
#[delete("/ingredients/{id}")]
pub async fn delete_ingredient(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    delete_kind(&state, &user, AttributeKind::Ingredient, path.into_inner()).await
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
