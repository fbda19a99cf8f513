//! Route configuration.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | /health | `health_check` |
//! | POST | /register | `register` |
//! | POST | /login | `login` |
//! | POST | /logout | `logout` |
//! | GET, DELETE | /me | `current_user`, `delete_account` |
//! | GET, POST | /todos | `list_todos`, `create_todo` |
//! | GET | /todos/statistics | `todo_statistics` |
//! | DELETE | /todos/clear_completed | `clear_completed` |
//! | GET, PATCH, PUT, DELETE | /todos/{id} | `get_todo`, `update_todo`, `replace_todo`, `delete_todo` |

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::auth::{current_user, delete_account, login, logout, register};
use super::error::{ApiError, ApiErrorResponse};
use super::handlers::{AppState, health_check};
use super::todos::{
    clear_completed, create_todo, delete_todo, get_todo, list_todos, replace_todo,
    todo_statistics, update_todo,
};

async fn route_not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found("Not found.")
}

async fn method_not_allowed() -> impl IntoResponse {
    ApiErrorResponse::new(
        StatusCode::METHOD_NOT_ALLOWED,
        ApiError::new("METHOD_NOT_ALLOWED", "Method not allowed."),
    )
}

/// Creates the router with every route, the JSON fallbacks and the
/// tracing, request-id and CORS layers.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::from_repositories(factory.create().await?);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, create_router(state)).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Accounts
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(current_user).delete(delete_account))
        // Todos
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/statistics", get(todo_statistics))
        .route("/todos/clear_completed", delete(clear_completed))
        .route(
            "/todos/{id}",
            get(get_todo)
                .patch(update_todo)
                .put(replace_todo)
                .delete(delete_todo),
        )
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}
