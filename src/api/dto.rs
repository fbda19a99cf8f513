//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs keep every field optional so validation can report all
//! problems at once, and so `null` can be told apart from an absent field.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{DerivedStatus, Timestamp, Todo, TodoStatistics, User};

/// Deserializes a field that may be absent, `null`, or a value.
///
/// Combined with `#[serde(default)]`, absent becomes `None` and `null`
/// becomes `Some(None)`.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Todo DTOs
// =============================================================================

/// Request body for `POST /todos`, `PUT /todos/{id}` and `PATCH /todos/{id}`.
///
/// Read-only and unknown fields (`id`, `created_at`, `status`, ...) are ignored.
/// Whether `title` is required depends on the endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoRequest {
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub completed: Option<Option<bool>>,
    /// Raw integer; range-checked during validation.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub priority: Option<Option<i64>>,
    /// Raw date-time text; parsed during validation.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub due_date: Option<Option<String>>,
}

/// Query string for `GET /todos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListTodosQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

impl ListTodosQuery {
    /// Collects raw query pairs. A repeated key keeps its last value and
    /// unknown keys are ignored.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::default(), |mut query, (key, value)| {
                match key.as_str() {
                    "status" => query.status = Some(value),
                    "search" => query.search = Some(value),
                    "ordering" => query.ordering = Some(value),
                    _ => {}
                }
                query
            })
    }
}

/// Response DTO for a to-do item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub due_date: Option<Timestamp>,
    /// Priority as its integer value (1 = Low, 2 = Medium, 3 = High).
    pub priority: u8,
    /// Status derived at response time.
    pub status: DerivedStatus,
}

impl TodoResponse {
    /// Builds the response for `todo`, deriving its status at `now`.
    #[must_use]
    pub fn new(todo: &Todo, now: Timestamp) -> Self {
        Self {
            id: todo.id.value(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            due_date: todo.due_date,
            priority: todo.priority.value(),
            status: todo.status_at(now),
        }
    }
}

/// Response DTO for `GET /todos/statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub overdue: u64,
}

impl From<TodoStatistics> for StatisticsResponse {
    fn from(statistics: TodoStatistics) -> Self {
        Self {
            total: statistics.total,
            completed: statistics.completed,
            pending: statistics.pending,
            overdue: statistics.overdue,
        }
    }
}

/// Response DTO for `DELETE /todos/clear_completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCompletedResponse {
    pub message: String,
    pub count: u64,
}

impl ClearCompletedResponse {
    #[must_use]
    pub fn new(count: u64) -> Self {
        Self {
            message: format!("Deleted {count} completed todos"),
            count,
        }
    }
}

// =============================================================================
// Account DTOs
// =============================================================================

/// Request body for `POST /register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

/// Request body for `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Response DTO for a successful registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

/// Response DTO for `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
