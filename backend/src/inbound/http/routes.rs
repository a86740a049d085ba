//! Route table for the `/api` surface.
//!
//! ```text
//! /api/user/{create,token,me}
//! /api/recipe/{recipes,tags,ingredients}
//! ```

use actix_web::web;

use super::attributes::{
    delete_ingredient, delete_tag, list_ingredients, list_tags, patch_ingredient, patch_tag,
    update_ingredient, update_tag,
};
use super::error::{json_error_handler, path_error_handler, query_error_handler};
use super::recipes::{
    create_recipe, delete_recipe, get_recipe, list_recipes, patch_recipe, replace_recipe,
    upload_recipe_image,
};
use super::users::{create_token, create_user, get_profile, patch_profile, replace_profile};

/// Largest accepted request body, in bytes. Bounds image uploads.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Register every `/api` handler plus the extractor error handlers.
///
/// The caller provides `web::Data<HttpState>` as app data.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use recipe_backend::inbound::http::routes::configure_api;
///
/// let _app = App::new().configure(configure_api);
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_BODY_BYTES)
                    .error_handler(json_error_handler),
            )
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
            .service(
                web::scope("/user")
                    .service(create_user)
                    .service(create_token)
                    .service(get_profile)
                    .service(replace_profile)
                    .service(patch_profile),
            )
            .service(
                web::scope("/recipe")
                    .service(list_recipes)
                    .service(create_recipe)
                    .service(get_recipe)
                    .service(replace_recipe)
                    .service(patch_recipe)
                    .service(delete_recipe)
                    .service(upload_recipe_image)
                    .service(list_tags)
                    .service(update_tag)
                    .service(patch_tag)
                    .service(delete_tag)
                    .service(list_ingredients)
                    .service(update_ingredient)
                    .service(patch_ingredient)
                    .service(delete_ingredient),
            ),
    );
}
