//! Application state and the health endpoint.

use std::sync::Arc;

use axum::Json;

use crate::infrastructure::{Repositories, TodoRepository, TokenRepository, UserRepository};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Uses trait objects so the backend is picked at run time by
/// `RepositoryFactory`.
#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoRepository + Send + Sync>,
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub tokens: Arc<dyn TokenRepository + Send + Sync>,
}

impl AppState {
    /// Creates a new `AppState` from initialized repositories.
    #[must_use]
    pub fn from_repositories(repositories: Repositories) -> Self {
        Self {
            todos: repositories.todos,
            users: repositories.users,
            tokens: repositories.tokens,
        }
    }

    /// Creates a state backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repositories(Repositories::in_memory())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("AppState").finish_non_exhaustive()
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
///
/// # Response
///
/// - **200 OK**: Service is healthy
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
