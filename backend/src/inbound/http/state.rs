//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, AttributesCommand, AttributesQuery, RecipesCommand, RecipesQuery,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub accounts: Arc<dyn AccountService>,
    pub recipes: Arc<dyn RecipesCommand>,
    pub recipes_query: Arc<dyn RecipesQuery>,
    pub attributes: Arc<dyn AttributesCommand>,
    pub attributes_query: Arc<dyn AttributesQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub recipes: Arc<dyn RecipesCommand>,
    pub recipes_query: Arc<dyn RecipesQuery>,
    pub attributes: Arc<dyn AttributesCommand>,
    pub attributes_query: Arc<dyn AttributesQuery>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use recipe_backend::domain::{AttributeService, RecipeService, UserAccounts};
    /// use recipe_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use recipe_backend::outbound::memory::{MemoryImageStore, MemoryStore};
    ///
    /// let store = Arc::new(MemoryStore::new());
    /// let recipes = Arc::new(RecipeService::new(store.clone(), Arc::new(MemoryImageStore::new())));
    /// let attributes = Arc::new(AttributeService::new(store.clone()));
    /// let state = HttpState::new(HttpStatePorts {
    ///     accounts: Arc::new(UserAccounts::new(store)),
    ///     recipes: recipes.clone(),
    ///     recipes_query: recipes,
    ///     attributes: attributes.clone(),
    ///     attributes_query: attributes,
    /// });
    /// let _accounts = state.accounts.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            accounts,
            recipes,
            recipes_query,
            attributes,
            attributes_query,
        } = ports;
        Self {
            accounts,
            recipes,
            recipes_query,
            attributes,
            attributes_query,
        }
    }
}
