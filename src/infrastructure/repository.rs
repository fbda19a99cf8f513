//! Repository traits for domain entities.
//!
//! Every operation that touches items takes the owning [`UserId`] explicitly.
//! Implementations must never return, modify or delete an item whose owner
//! differs from the one passed in.
//!
//! Operations return boxed `'static` futures so the traits stay object safe
//! and handlers can hold `Arc<dyn TodoRepository + Send + Sync>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{
    AuthToken, NewTodo, NewUser, Timestamp, Todo, TodoChanges, TodoId, TodoQuery, TodoStatistics,
    User, UserCredentials, UserId,
};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// The future type returned by every repository operation.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Todo Repository
// =============================================================================

/// Owner-scoped storage for to-do items.
pub trait TodoRepository: Send + Sync {
    /// Stores a new item for `owner`, stamping both timestamps with `timestamp`.
    fn insert(&self, owner: UserId, todo: NewTodo, timestamp: Timestamp) -> RepositoryFuture<Todo>;

    /// Finds an item by id among `owner`'s items.
    ///
    /// Returns `None` for both missing and foreign items.
    fn find_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<Option<Todo>>;

    /// Applies `changes` to one of `owner`'s items and sets `updated_at` to `timestamp`.
    ///
    /// Returns the updated item, or `None` if no such owned item exists.
    fn update_owned(
        &self,
        owner: UserId,
        id: TodoId,
        changes: TodoChanges,
        timestamp: Timestamp,
    ) -> RepositoryFuture<Option<Todo>>;

    /// Deletes one of `owner`'s items. Returns `true` if a row was removed.
    fn delete_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<bool>;

    /// Lists `owner`'s items that match `query`, in query order.
    fn list(&self, owner: UserId, query: TodoQuery, now: Timestamp) -> RepositoryFuture<Vec<Todo>>;

    /// Counts `owner`'s items by derived status, from one consistent snapshot.
    fn statistics(&self, owner: UserId, now: Timestamp) -> RepositoryFuture<TodoStatistics>;

    /// Deletes every completed item of `owner` and returns how many were removed.
    fn delete_completed(&self, owner: UserId) -> RepositoryFuture<u64>;
}

// =============================================================================
// User Repository
// =============================================================================

/// Storage for user accounts.
pub trait UserRepository: Send + Sync {
    /// Creates a user. Fails with [`RepositoryError::Conflict`] if the username is taken.
    fn create(&self, user: NewUser, date_joined: Timestamp) -> RepositoryFuture<User>;

    /// Looks up a user and their password hash by exact username.
    fn find_credentials(&self, username: String) -> RepositoryFuture<Option<UserCredentials>>;

    fn find_by_id(&self, id: UserId) -> RepositoryFuture<Option<User>>;

    /// Deletes a user together with their items and token.
    fn delete(&self, id: UserId) -> RepositoryFuture<bool>;
}

// =============================================================================
// Token Repository
// =============================================================================

/// Storage for authentication tokens. A user holds at most one token.
pub trait TokenRepository: Send + Sync {
    /// Returns the user's existing token, or stores `candidate` if they have none.
    fn issue(&self, user: UserId, candidate: AuthToken) -> RepositoryFuture<AuthToken>;

    /// Maps a presented token to its user.
    fn resolve(&self, token: AuthToken) -> RepositoryFuture<Option<UserId>>;

    /// Deletes the user's token. Returns `true` if one existed.
    fn revoke(&self, user: UserId) -> RepositoryFuture<bool>;
}
