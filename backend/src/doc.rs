//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the request/response DTOs and the
//! domain schema wrappers ([`ErrorSchema`], [`ErrorCodeSchema`]), plus the
//! `TokenAuth` scheme carried in the `Authorization` header.
//!
//! Swagger UI serves the document in debug builds.

use crate::inbound::http::attributes::{AttributeResponse, RenameRequest};
use crate::inbound::http::recipes::{
    AttributeNameInput, RecipeDetailResponse, RecipeImageResponse, RecipeRequest,
    RecipeSummaryResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{
    CreateUserRequest, ProfileUpdateRequest, TokenRequest, TokenResponse, UserResponse,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Name of the token security scheme in the generated document.
pub const TOKEN_AUTH: &str = "TokenAuth";

/// Enrich the generated document with the token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            TOKEN_AUTH,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` as issued by POST /api/user/token.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Recipe API",
        description = "Owner-scoped recipes, tags and ingredients behind token authentication."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("TokenAuth" = [])),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::create_token,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::replace_profile,
        crate::inbound::http::users::patch_profile,
        crate::inbound::http::recipes::list_recipes,
        crate::inbound::http::recipes::create_recipe,
        crate::inbound::http::recipes::get_recipe,
        crate::inbound::http::recipes::replace_recipe,
        crate::inbound::http::recipes::patch_recipe,
        crate::inbound::http::recipes::delete_recipe,
        crate::inbound::http::recipes::upload_recipe_image,
        crate::inbound::http::attributes::list_tags,
        crate::inbound::http::attributes::update_tag,
        crate::inbound::http::attributes::patch_tag,
        crate::inbound::http::attributes::delete_tag,
        crate::inbound::http::attributes::list_ingredients,
        crate::inbound::http::attributes::update_ingredient,
        crate::inbound::http::attributes::patch_ingredient,
        crate::inbound::http::attributes::delete_ingredient,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CreateUserRequest,
        TokenRequest,
        TokenResponse,
        ProfileUpdateRequest,
        UserResponse,
        RecipeRequest,
        AttributeNameInput,
        RecipeSummaryResponse,
        RecipeDetailResponse,
        RecipeImageResponse,
        AttributeResponse,
        RenameRequest,
    )),
    tags(
        (name = "users", description = "Registration, tokens and profiles"),
        (name = "recipes", description = "Owner-scoped recipes"),
        (name = "tags", description = "Owner-scoped recipe tags"),
        (name = "ingredients", description = "Owner-scoped recipe ingredients"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn token_auth_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.as_ref().expect("components");
        assert!(components.security_schemes.contains_key(TOKEN_AUTH));
    }

    #[rstest]
    #[case("/api/user/create")]
    #[case("/api/user/token")]
    #[case("/api/user/me")]
    #[case("/api/recipe/recipes")]
    #[case("/api/recipe/recipes/{id}")]
    #[case("/api/recipe/recipes/{id}/upload-image")]
    #[case("/api/recipe/tags/{id}")]
    #[case("/api/recipe/ingredients")]
    #[case("/health/ready")]
    fn documented_paths_are_present(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn recipe_price_is_documented_as_string() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).expect("document serialises");
        let price = &json["components"]["schemas"]["RecipeDetailResponse"]["properties"]["price"];
        assert_eq!(price["type"], "string");
    }
}
