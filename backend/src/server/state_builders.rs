//! Builders wiring domain services to their driven adapters.

use std::sync::Arc;

use recipe_backend::domain::ports::{
    ImageStore, RecipeAttributeRepository, RecipeRepository, UserRepository,
};
use recipe_backend::domain::{AttributeService, RecipeService, UserAccounts};
use recipe_backend::inbound::http::state::{HttpState, HttpStatePorts};
use recipe_backend::outbound::media::FsImageStore;
use recipe_backend::outbound::memory::MemoryStore;
use recipe_backend::outbound::persistence::{
    DbPool, DieselRecipeAttributeRepository, DieselRecipeRepository, DieselUserRepository,
};
use tracing::{info, warn};

use super::ServerConfig;

/// Assemble the HTTP ports from one user, recipe and attribute adapter each.
fn build_ports<U, R, A, S>(
    users: Arc<U>,
    recipes: Arc<R>,
    attributes: Arc<A>,
    images: Arc<S>,
) -> HttpStatePorts
where
    U: UserRepository + 'static,
    R: RecipeRepository + 'static,
    A: RecipeAttributeRepository + 'static,
    S: ImageStore + 'static,
{
    let recipe_service = Arc::new(RecipeService::new(recipes, images));
    let attribute_service = Arc::new(AttributeService::new(attributes));
    HttpStatePorts {
        accounts: Arc::new(UserAccounts::new(users)),
        recipes: recipe_service.clone(),
        recipes_query: recipe_service,
        attributes: attribute_service.clone(),
        attributes_query: attribute_service,
    }
}

fn diesel_ports(pool: &DbPool, images: Arc<FsImageStore>) -> HttpStatePorts {
    build_ports(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselRecipeRepository::new(pool.clone())),
        Arc::new(DieselRecipeAttributeRepository::new(pool.clone())),
        images,
    )
}

fn memory_ports(images: Arc<FsImageStore>) -> HttpStatePorts {
    let store = Arc::new(MemoryStore::new());
    build_ports(store.clone(), store.clone(), store, images)
}

/// Build the HTTP state, selecting PostgreSQL adapters when a pool is
/// configured and the in-memory store otherwise.
///
/// # Errors
/// Returns [`std::io::Error`] when the media root cannot be opened.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<HttpState> {
    let images = FsImageStore::open(&config.media_root).map_err(|err| {
        std::io::Error::other(format!(
            "failed to open media root {}: {err}",
            config.media_root.display()
        ))
    })?;
    info!(media_root = %images.root_path().display(), "media store ready");
    let images = Arc::new(images);

    let ports = match &config.db_pool {
        Some(pool) => diesel_ports(pool, images),
        None => {
            warn!("no database configured; data is kept in memory and lost on restart");
            memory_ports(images)
        }
    };
    Ok(HttpState::new(ports))
}
