//! Test helpers for inbound HTTP components.
//!
//! Handlers are exercised against the real domain services wired to the
//! in-memory adapters, so tests cover the full request path without I/O.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use crate::domain::{AttributeService, RecipeService, UserAccounts};
use crate::inbound::http::routes::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{MemoryImageStore, MemoryStore};

/// Adapters backing a test application, kept for direct assertions.
pub struct TestBackend {
    pub store: Arc<MemoryStore>,
    pub images: Arc<MemoryImageStore>,
    pub state: web::Data<HttpState>,
}

impl TestBackend {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(MemoryImageStore::new());
        let recipes = Arc::new(RecipeService::new(store.clone(), images.clone()));
        let attributes = Arc::new(AttributeService::new(store.clone()));
        let state = HttpState::new(HttpStatePorts {
            accounts: Arc::new(UserAccounts::new(store.clone())),
            recipes: recipes.clone(),
            recipes_query: recipes,
            attributes: attributes.clone(),
            attributes_query: attributes,
        });
        Self {
            store,
            images,
            state: web::Data::new(state),
        }
    }

    /// Application exposing the full `/api` surface.
    pub fn app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(configure_api)
    }
}

/// Register an account and return its `Authorization` header value.
pub async fn signed_up(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    email: &str,
) -> String {
    let created = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/user/create")
            .set_json(json!({"email": email, "password": "testpass123", "name": "Test Cook"}))
            .to_request(),
    )
    .await;
    assert!(created.status().is_success(), "registration succeeds");

    let issued: Value = actix_test::call_and_read_body_json(
        app,
        actix_test::TestRequest::post()
            .uri("/api/user/token")
            .set_json(json!({"email": email, "password": "testpass123"}))
            .to_request(),
    )
    .await;
    let token = issued["token"].as_str().expect("token issued");
    format!("Token {token}")
}
