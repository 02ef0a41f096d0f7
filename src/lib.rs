use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

pub mod config;
pub mod domain;
pub mod eos_client;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use domain::registry::OperationRegistry;
use eos_client::UserDirectoryService;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectoryService>,
    pub registry: Arc<OperationRegistry>,
    pub dev_mode: bool,
}

impl AppState {
    pub fn new(directory: Arc<dyn UserDirectoryService>, dev_mode: bool) -> Self {
        let registry = Arc::new(OperationRegistry::new(directory.clone()));
        Self {
            directory,
            registry,
            dev_mode,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route("/auth/login", post(http::handlers::login))
        .route("/users", get(http::handlers::list_users))
        .route("/users/current", get(http::handlers::current_user))
        .route("/users/invite", post(http::handlers::invite_user))
        .route("/users/{id}/status", patch(http::handlers::update_user_status))
        .route("/users/{id}", delete(http::handlers::delete_user))
        .fallback(http::handlers::route_not_found)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
