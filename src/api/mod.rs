//! API module for HTTP handlers.
//!
//! This module contains route definitions, extractors, validation and
//! request/response handlers.

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod todos;
pub mod validation;

pub use auth::{current_user, delete_account, login, logout, register};
pub use dto::{
    AuthResponse, ClearCompletedResponse, ListTodosQuery, LoginRequest, RegisterRequest,
    StatisticsResponse, TodoRequest, TodoResponse, UserResponse,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use extract::{CurrentUser, JsonBody, QueryParams};
pub use handlers::{AppState, HealthResponse, health_check};
pub use routes::create_router;
pub use todos::{
    clear_completed, create_todo, delete_todo, get_todo, list_todos, replace_todo,
    todo_statistics, update_todo,
};
