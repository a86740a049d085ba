//! Recipe HTTP handlers.
//!
//! ```text
//! GET    /api/recipe/recipes?tags=1,2&ingredients=3
//! POST   /api/recipe/recipes {"title":"Curry","time_minutes":30,"price":"5.50","tags":[{"name":"Thai"}]}
//! GET    /api/recipe/recipes/{id}
//! PUT    /api/recipe/recipes/{id}
//! PATCH  /api/recipe/recipes/{id}
//! DELETE /api/recipe/recipes/{id}
//! POST   /api/recipe/recipes/{id}/upload-image (multipart field `image`)
//! ```
//!
//! Each operation kind has its own response shape: listings omit the
//! description and image, details include them and uploads return only the
//! image reference.

use std::convert::Infallible;

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateRecipeRequest, UpdateRecipeRequest, UploadImageRequest};
use crate::domain::{
    AttributeChanges, AttributeId, Error, Price, Recipe, RecipeChanges, RecipeDraft, RecipeFilter,
    RecipeId, RecipeLink, RecipeTitle, RecipeValidationError, TimeMinutes, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::attributes::AttributeResponse;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, missing_field_error, parse_id_list,
};

const TITLE: FieldName = FieldName::new("title");
const TIME_MINUTES: FieldName = FieldName::new("time_minutes");
const PRICE: FieldName = FieldName::new("price");
const TAGS: FieldName = FieldName::new("tags");
const INGREDIENTS: FieldName = FieldName::new("ingredients");
const IMAGE: FieldName = FieldName::new("image");
const IMAGE_FIELD: &str = "image";

/// Which fields a recipe write must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeWriteMode {
    /// `POST`: title, time and price required.
    Create,
    /// `PUT`: same requirements as create.
    Replace,
    /// `PATCH`: every field optional.
    Partial,
}

impl RecipeWriteMode {
    fn requires_core_fields(self) -> bool {
        !matches!(self, Self::Partial)
    }
}

/// `{name}` item of a nested tag or ingredient list.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AttributeNameInput {
    #[schema(example = "Thai")]
    pub name: String,
}

/// Price accepted either as a JSON string or a JSON number.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PriceInput {
    Text(String),
    Number(serde_json::Number),
}

impl PriceInput {
    fn parse(&self) -> Result<Price, RecipeValidationError> {
        match self {
            Self::Text(raw) => raw.parse(),
            Self::Number(number) => number.to_string().parse(),
        }
    }
}

/// Recipe write payload shared by create, replace and partial update.
///
/// Unknown fields (including any `user`) are ignored; the owner is always
/// the caller.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct RecipeRequest {
    #[schema(example = "Thai green curry")]
    pub title: Option<String>,
    #[schema(example = 30)]
    pub time_minutes: Option<i64>,
    #[schema(value_type = Option<String>, example = "5.50")]
    pub price: Option<PriceInput>,
    pub description: Option<String>,
    pub link: Option<String>,
    /// Replaces the tag set; omit to keep it, `[]` to clear it.
    pub tags: Option<Vec<AttributeNameInput>>,
    /// Replaces the ingredient set; omit to keep it, `[]` to clear it.
    pub ingredients: Option<Vec<AttributeNameInput>>,
}

/// Recipe as listed.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeSummaryResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(example = "5.50")]
    pub price: String,
    pub link: String,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

/// Recipe detail, returned by every single-recipe operation except upload.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub time_minutes: i32,
    #[schema(example = "5.50")]
    pub price: String,
    pub link: String,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
    pub description: String,
    /// Media reference relative to the media root.
    #[schema(example = "uploads/recipe/0f8fad5b-d9cb-469f-a165-70867728950e.png")]
    pub image: Option<String>,
}

/// Upload result.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct RecipeImageResponse {
    pub id: i64,
    pub image: Option<String>,
}

fn attribute_responses(attributes: Vec<crate::domain::RecipeAttribute>) -> Vec<AttributeResponse> {
    attributes.into_iter().map(AttributeResponse::from).collect()
}

impl From<Recipe> for RecipeSummaryResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.get(),
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link,
            tags: attribute_responses(recipe.tags),
            ingredients: attribute_responses(recipe.ingredients),
        }
    }
}

impl From<Recipe> for RecipeDetailResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.get(),
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price.to_string(),
            link: recipe.link,
            tags: attribute_responses(recipe.tags),
            ingredients: attribute_responses(recipe.ingredients),
            description: recipe.description,
            image: recipe.image,
        }
    }
}

impl From<Recipe> for RecipeImageResponse {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id.get(),
            image: recipe.image,
        }
    }
}

/// Listing filters: comma separated attribute ids.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RecipeListQuery {
    /// Tag ids, e.g. `1,2`.
    pub tags: Option<String>,
    /// Ingredient ids, e.g. `3`.
    pub ingredients: Option<String>,
}

pub(crate) fn parse_filter(query: &RecipeListQuery) -> Result<RecipeFilter, Error> {
    let ids = |raw: &Option<String>, field| -> Result<Vec<AttributeId>, Error> {
        match raw {
            Some(raw) => Ok(parse_id_list(raw, field)?
                .into_iter()
                .map(AttributeId::new)
                .collect()),
            None => Ok(Vec::new()),
        }
    };
    Ok(RecipeFilter {
        tag_ids: ids(&query.tags, TAGS)?,
        ingredient_ids: ids(&query.ingredients, INGREDIENTS)?,
    })
}

fn recipe_field_error(err: RecipeValidationError) -> Error {
    invalid_field_error(err.field(), &err)
}

fn names(items: Option<Vec<AttributeNameInput>>) -> Option<Vec<String>> {
    items.map(|items| items.into_iter().map(|item| item.name).collect())
}

/// Validated recipe write.
#[derive(Debug)]
pub(crate) struct ParsedRecipe {
    pub(crate) changes: RecipeChanges,
    pub(crate) attributes: AttributeChanges,
}

impl ParsedRecipe {
    /// Build the creation draft; description and link default to empty.
    fn into_draft(self) -> Result<(RecipeDraft, AttributeChanges), Error> {
        let RecipeChanges {
            title,
            time_minutes,
            price,
            description,
            link,
        } = self.changes;
        let draft = RecipeDraft {
            title: title.ok_or_else(|| missing_field_error(TITLE))?,
            time_minutes: time_minutes.ok_or_else(|| missing_field_error(TIME_MINUTES))?,
            price: price.ok_or_else(|| missing_field_error(PRICE))?,
            description: description.unwrap_or_default(),
            link: link.unwrap_or_default(),
        };
        Ok((draft, self.attributes))
    }
}

pub(crate) fn parse_recipe_request(
    payload: RecipeRequest,
    mode: RecipeWriteMode,
) -> Result<ParsedRecipe, Error> {
    if mode.requires_core_fields() {
        for (present, field) in [
            (payload.title.is_some(), TITLE),
            (payload.time_minutes.is_some(), TIME_MINUTES),
            (payload.price.is_some(), PRICE),
        ] {
            if !present {
                return Err(missing_field_error(field));
            }
        }
    }

    let changes = RecipeChanges {
        title: payload
            .title
            .map(RecipeTitle::new)
            .transpose()
            .map_err(recipe_field_error)?,
        time_minutes: payload
            .time_minutes
            .map(TimeMinutes::new)
            .transpose()
            .map_err(recipe_field_error)?,
        price: payload
            .price
            .as_ref()
            .map(PriceInput::parse)
            .transpose()
            .map_err(recipe_field_error)?,
        description: payload.description,
        link: payload
            .link
            .map(RecipeLink::new)
            .transpose()
            .map_err(recipe_field_error)?,
    };
    let attributes = AttributeChanges::from_lists(names(payload.tags), names(payload.ingredients))?;
    Ok(ParsedRecipe {
        changes,
        attributes,
    })
}

fn multipart_error(message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": IMAGE_FIELD,
        "code": "invalid_multipart",
    }))
}

/// Pull the `image` field out of a buffered multipart body.
pub(crate) async fn read_image_field(
    content_type: Option<&str>,
    body: web::Bytes,
) -> Result<Option<Vec<u8>>, Error> {
    let content_type =
        content_type.ok_or_else(|| multipart_error("expected a multipart/form-data body"))?;
    let boundary = multer::parse_boundary(content_type)
        .map_err(|err| multipart_error(format!("expected a multipart/form-data body: {err}")))?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(format!("malformed multipart body: {err}")))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| multipart_error(format!("malformed multipart body: {err}")))?;
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}

fn recipe_id(path: web::Path<i64>) -> RecipeId {
    RecipeId::new(path.into_inner())
}

async fn update_with_mode(
    state: &HttpState,
    owner: &UserId,
    recipe_id: RecipeId,
    payload: RecipeRequest,
    mode: RecipeWriteMode,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    let ParsedRecipe {
        changes,
        attributes,
    } = parse_recipe_request(payload, mode)?;
    let recipe = state
        .recipes
        .update_recipe(UpdateRecipeRequest {
            owner: *owner,
            recipe_id,
            changes,
            attributes,
        })
        .await?;
    Ok(web::Json(recipe.into()))
}

/// List the caller's recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/recipe/recipes",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "Recipes", body = [RecipeSummaryResponse]),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "listRecipes"
)]
#[get("/recipes")]
pub async fn list_recipes(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<RecipeListQuery>,
) -> ApiResult<HttpResponse> {
    let filter = parse_filter(&query)?;
    let recipes = state.recipes_query.list_recipes(user.id(), &filter).await?;
    let body: Vec<RecipeSummaryResponse> = recipes.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(body))
}

/// Create a recipe owned by the caller.
#[utoipa::path(
    post,
    path = "/api/recipe/recipes",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Created recipe", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Conflict", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "createRecipe"
)]
#[post("/recipes")]
pub async fn create_recipe(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<RecipeRequest>,
) -> ApiResult<HttpResponse> {
    let (draft, attributes) =
        parse_recipe_request(payload.into_inner(), RecipeWriteMode::Create)?.into_draft()?;
    let recipe = state
        .recipes
        .create_recipe(CreateRecipeRequest {
            owner: *user.id(),
            draft,
            attributes,
        })
        .await?;
    Ok(HttpResponse::Created().json(RecipeDetailResponse::from(recipe)))
}

/// Fetch one of the caller's recipes.
#[utoipa::path(
    get,
    path = "/api/recipe/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe identifier")),
    responses(
        (status = 200, description = "Recipe", body = RecipeDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "getRecipe"
)]
#[get("/recipes/{id}")]
pub async fn get_recipe(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let recipe = state
        .recipes_query
        .get_recipe(user.id(), recipe_id(path))
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(RecipeDetailResponse::from(recipe)))
}

/// Replace a recipe; title, time and price are required.
#[utoipa::path(
    put,
    path = "/api/recipe/recipes/{id}",
    request_body = RecipeRequest,
    params(("id" = i64, Path, description = "Recipe identifier")),
    responses(
        (status = 200, description = "Updated recipe", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "replaceRecipe"
)]
#[put("/recipes/{id}")]
pub async fn replace_recipe(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RecipeRequest>,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    update_with_mode(
        &state,
        user.id(),
        recipe_id(path),
        payload.into_inner(),
        RecipeWriteMode::Replace,
    )
    .await
}

/// Partially update a recipe.
#[utoipa::path(
    patch,
    path = "/api/recipe/recipes/{id}",
    request_body = RecipeRequest,
    params(("id" = i64, Path, description = "Recipe identifier")),
    responses(
        (status = 200, description = "Updated recipe", body = RecipeDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "patchRecipe"
)]
#[patch("/recipes/{id}")]
pub async fn patch_recipe(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    payload: web::Json<RecipeRequest>,
) -> ApiResult<web::Json<RecipeDetailResponse>> {
    update_with_mode(
        &state,
        user.id(),
        recipe_id(path),
        payload.into_inner(),
        RecipeWriteMode::Partial,
    )
    .await
}

/// Delete a recipe and its image; its tags and ingredients are kept.
#[utoipa::path(
    delete,
    path = "/api/recipe/recipes/{id}",
    params(("id" = i64, Path, description = "Recipe identifier")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "deleteRecipe"
)]
#[delete("/recipes/{id}")]
pub async fn delete_recipe(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state
        .recipes
        .delete_recipe(user.id(), recipe_id(path))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Attach or replace the recipe image.
#[utoipa::path(
    post,
    path = "/api/recipe/recipes/{id}/upload-image",
    params(("id" = i64, Path, description = "Recipe identifier")),
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Stored image reference", body = RecipeImageResponse),
        (status = 400, description = "Missing or undecodable image", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["recipes"],
    operation_id = "uploadRecipeImage"
)]
#[post("/recipes/{id}/upload-image")]
pub async fn upload_recipe_image(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<i64>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<web::Json<RecipeImageResponse>> {
    let recipe_id = recipe_id(path);
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let image = match read_image_field(content_type, body).await? {
        Some(bytes) => bytes,
        None => {
            // Unknown recipes are reported before the missing field.
            state.recipes_query.get_recipe(user.id(), recipe_id).await?;
            return Err(missing_field_error(IMAGE));
        }
    };
    let recipe = state
        .recipes
        .upload_image(UploadImageRequest {
            owner: *user.id(),
            recipe_id,
            bytes: image,
        })
        .await?;
    Ok(web::Json(recipe.into()))
}

#[cfg(test)]
#[path = "recipes_tests.rs"]
mod tests;
