//! HTTP handlers for to-do items.
//!
//! Every handler takes a [`CurrentUser`] and passes its id to the repository,
//! so no handler can see or touch another user's items. Each request reads
//! the clock once and uses that instant for every derived status it reports.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::dto::{
    ClearCompletedResponse, ListTodosQuery, StatisticsResponse, TodoRequest, TodoResponse,
};
use super::error::ApiErrorResponse;
use super::extract::{CurrentUser, JsonBody, QueryParams};
use super::handlers::AppState;
use super::validation::{
    validate_create_request, validate_replace_request, validate_update_request,
};
use crate::domain::{Timestamp, TodoChanges, TodoId, TodoQuery};

const NOT_FOUND_MESSAGE: &str = "No Todo matches the given query.";

/// Parses a path id. Anything that is not an integer cannot name an item.
fn parse_todo_id(raw: &str) -> Result<TodoId, ApiErrorResponse> {
    raw.parse()
        .map_err(|_| ApiErrorResponse::not_found(NOT_FOUND_MESSAGE))
}

fn not_found() -> ApiErrorResponse {
    ApiErrorResponse::not_found(NOT_FOUND_MESSAGE)
}

// =============================================================================
// Collection Handlers
// =============================================================================

/// `GET /todos`: lists the caller's items.
///
/// Query parameters `status`, `search` and `ordering` never fail; unknown
/// values simply apply no restriction and a repeated key keeps its last value.
///
/// # Errors
///
/// Returns 401 without valid credentials and 500 on storage failure.
pub async fn list_todos(
    State(state): State<AppState>,
    user: CurrentUser,
    QueryParams(pairs): QueryParams<Vec<(String, String)>>,
) -> Result<Json<Vec<TodoResponse>>, ApiErrorResponse> {
    let params = ListTodosQuery::from_pairs(pairs);
    let query = TodoQuery::from_params(
        params.status.as_deref(),
        params.search.as_deref(),
        params.ordering.as_deref(),
    );
    let now = Timestamp::now();

    let todos = state.todos.list(user.user_id, query, now).await?;

    Ok(Json(
        todos
            .iter()
            .map(|todo| TodoResponse::new(todo, now))
            .collect(),
    ))
}

/// `POST /todos`: creates an item owned by the caller.
///
/// # Errors
///
/// Returns 400 on invalid fields, 401 without credentials and 500 on storage failure.
pub async fn create_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(request): JsonBody<TodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), ApiErrorResponse> {
    let draft = validate_create_request(&request)?;
    let now = Timestamp::now();

    let todo = state.todos.insert(user.user_id, draft, now).await?;
    tracing::debug!(user_id = %user.user_id, todo_id = %todo.id, "Created todo");

    Ok((StatusCode::CREATED, Json(TodoResponse::new(&todo, now))))
}

/// `GET /todos/statistics`: counts the caller's items by derived status.
///
/// # Errors
///
/// Returns 401 without credentials and 500 on storage failure.
pub async fn todo_statistics(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<StatisticsResponse>, ApiErrorResponse> {
    let statistics = state
        .todos
        .statistics(user.user_id, Timestamp::now())
        .await?;

    Ok(Json(StatisticsResponse::from(statistics)))
}

/// `DELETE /todos/clear_completed`: deletes every completed item of the caller.
///
/// # Errors
///
/// Returns 401 without credentials and 500 on storage failure.
pub async fn clear_completed(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ClearCompletedResponse>, ApiErrorResponse> {
    let count = state.todos.delete_completed(user.user_id).await?;
    tracing::info!(user_id = %user.user_id, count, "Cleared completed todos");

    Ok(Json(ClearCompletedResponse::new(count)))
}

// =============================================================================
// Item Handlers
// =============================================================================

/// `GET /todos/{id}`.
///
/// # Errors
///
/// Returns 404 when the item is missing or belongs to someone else.
pub async fn get_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let id = parse_todo_id(&raw_id)?;

    let todo = state
        .todos
        .find_owned(user.user_id, id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(TodoResponse::new(&todo, Timestamp::now())))
}

async fn apply_changes(
    state: &AppState,
    user: CurrentUser,
    id: TodoId,
    changes: TodoChanges,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let now = Timestamp::now();

    let todo = state
        .todos
        .update_owned(user.user_id, id, changes, now)
        .await?
        .ok_or_else(not_found)?;
    tracing::debug!(user_id = %user.user_id, todo_id = %todo.id, "Updated todo");

    Ok(Json(TodoResponse::new(&todo, now)))
}

/// `PATCH /todos/{id}`: changes only the supplied fields.
///
/// # Errors
///
/// Returns 404 for missing or foreign items and 400 on invalid fields.
pub async fn update_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
    JsonBody(request): JsonBody<TodoRequest>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let id = parse_todo_id(&raw_id)?;
    let changes = validate_update_request(&request)?;

    apply_changes(&state, user, id, changes).await
}

/// `PUT /todos/{id}`: replaces every mutable field.
///
/// # Errors
///
/// Returns 404 for missing or foreign items and 400 on invalid fields.
pub async fn replace_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
    JsonBody(request): JsonBody<TodoRequest>,
) -> Result<Json<TodoResponse>, ApiErrorResponse> {
    let id = parse_todo_id(&raw_id)?;
    let changes = validate_replace_request(&request)?;

    apply_changes(&state, user, id, changes).await
}

/// `DELETE /todos/{id}`.
///
/// # Errors
///
/// Returns 404 when the item is missing or belongs to someone else.
pub async fn delete_todo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiErrorResponse> {
    let id = parse_todo_id(&raw_id)?;

    if state.todos.delete_owned(user.user_id, id).await? {
        tracing::debug!(user_id = %user.user_id, todo_id = %id, "Deleted todo");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
