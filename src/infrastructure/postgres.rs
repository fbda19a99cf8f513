//! `PostgreSQL` repository implementation.
//!
//! [`PostgresStore`] implements all three repository traits on one `sqlx`
//! connection pool. Ownership is enforced in SQL: every item statement
//! carries `owner_id = $owner` in its `WHERE` clause.
//!
//! # Table Schema
//!
//! See `migrations/0001_create_tables.sql`, applied at startup through
//! [`MIGRATOR`]. Deleting a user cascades to `todos` and `auth_tokens`
//! through foreign keys.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::domain::{
    AuthToken, NewTodo, NewUser, OrderingField, Priority, StatusFilter, Timestamp, Todo,
    TodoChanges, TodoId, TodoOrdering, TodoQuery, TodoStatistics, User, UserCredentials, UserId,
};
use crate::infrastructure::{
    RepositoryError, RepositoryFuture, TodoRepository, TokenRepository, UserRepository,
};

const TODO_COLUMNS: &str =
    "id, owner_id, title, description, completed, priority, due_date, created_at, updated_at";

/// Schema migrations embedded from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// `SQLSTATE` for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Rewrites the mutable columns of one owned item and returns the stored row,
/// so timestamps come back at the column's precision.
fn update_todo_sql() -> String {
    format!(
        "UPDATE todos SET title = $1, description = $2, completed = $3, \
         priority = $4, due_date = $5, updated_at = $6 \
         WHERE id = $7 AND owner_id = $8 \
         RETURNING {TODO_COLUMNS}"
    )
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    owner_id: i64,
    title: String,
    description: String,
    completed: bool,
    priority: i16,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TodoRow> for Todo {
    type Error = RepositoryError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let priority = Priority::try_from(row.priority)
            .map_err(|error| RepositoryError::DatabaseError(format!("todo {}: {error}", row.id)))?;

        Ok(Self {
            id: TodoId::new(row.id),
            owner: UserId::new(row.owner_id),
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority,
            due_date: row.due_date.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    date_joined: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            date_joined: Timestamp::from_datetime(row.date_joined),
        }
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

#[derive(Debug, FromRow)]
struct StatisticsRow {
    total: i64,
    completed: i64,
    overdue: i64,
}

// =============================================================================
// Helper Functions
// =============================================================================

fn database_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

#[allow(clippy::cast_sign_loss)]
const fn count(value: i64) -> u64 {
    if value < 0 { 0 } else { value as u64 }
}

/// Escapes `LIKE` wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Builds the `ORDER BY` clause for `ordering`, including the tie-break.
///
/// Null due dates sort last ascending and first descending, matching
/// `PostgreSQL`'s default null placement and the in-memory comparator.
fn order_by_clause(ordering: &TodoOrdering) -> String {
    let keys: Vec<String> = ordering
        .terms()
        .iter()
        .map(|term| {
            let direction = if term.descending {
                "DESC NULLS FIRST"
            } else {
                "ASC NULLS LAST"
            };
            format!("{} {direction}", term.field.column())
        })
        .chain(["created_at DESC".to_string(), "id DESC".to_string()])
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

/// Appends the status and search predicates of `query` to `builder`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &TodoQuery, now: Timestamp) {
    match query.status {
        Some(StatusFilter::Completed) => {
            builder.push(" AND completed = TRUE");
        }
        Some(StatusFilter::Pending) => {
            builder.push(" AND completed = FALSE");
        }
        Some(StatusFilter::Overdue) => {
            builder.push(" AND completed = FALSE AND due_date < ");
            builder.push_bind(*now.as_datetime());
        }
        None => {}
    }

    if let Some(search) = &query.search {
        for term in search.terms() {
            let pattern = like_pattern(term);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

// =============================================================================
// PostgreSQL Store
// =============================================================================

/// `PostgreSQL` implementation of every repository trait.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/todos").await?;
/// let store = PostgresStore::new(pool);
/// let todos = store.list(owner, TodoQuery::default(), Timestamp::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TodoRepository for PostgresStore {
    fn insert(&self, owner: UserId, todo: NewTodo, timestamp: Timestamp) -> RepositoryFuture<Todo> {
        let pool = self.pool.clone();

        async move {
            let row: TodoRow = sqlx::query_as(&format!(
                "INSERT INTO todos \
                 (owner_id, title, description, completed, priority, due_date, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
                 RETURNING {TODO_COLUMNS}"
            ))
            .bind(owner.value())
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.completed)
            .bind(i16::from(todo.priority.value()))
            .bind(todo.due_date.map(|due| *due.as_datetime()))
            .bind(*timestamp.as_datetime())
            .fetch_one(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Todo::try_from(row)
        }
        .boxed()
    }

    fn find_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<Option<Todo>> {
        let pool = self.pool.clone();

        async move {
            let row: Option<TodoRow> = sqlx::query_as(&format!(
                "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2"
            ))
            .bind(id.value())
            .bind(owner.value())
            .fetch_optional(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            row.map(Todo::try_from).transpose()
        }
        .boxed()
    }

    fn update_owned(
        &self,
        owner: UserId,
        id: TodoId,
        changes: TodoChanges,
        timestamp: Timestamp,
    ) -> RepositoryFuture<Option<Todo>> {
        let pool = self.pool.clone();

        async move {
            let mut transaction = pool.begin().await.map_err(|error| database_error(&error))?;

            let existing: Option<TodoRow> = sqlx::query_as(&format!(
                "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND owner_id = $2 FOR UPDATE"
            ))
            .bind(id.value())
            .bind(owner.value())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(|error| database_error(&error))?;

            let Some(existing) = existing else {
                return Ok(None);
            };
            let updated = Todo::try_from(existing)?.apply(changes, timestamp);

            let row: TodoRow = sqlx::query_as(&update_todo_sql())
                .bind(&updated.title)
                .bind(&updated.description)
                .bind(updated.completed)
                .bind(i16::from(updated.priority.value()))
                .bind(updated.due_date.map(|due| *due.as_datetime()))
                .bind(*updated.updated_at.as_datetime())
                .bind(id.value())
                .bind(owner.value())
                .fetch_one(&mut *transaction)
                .await
                .map_err(|error| database_error(&error))?;

            transaction
                .commit()
                .await
                .map_err(|error| database_error(&error))?;

            Todo::try_from(row).map(Some)
        }
        .boxed()
    }

    fn delete_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
                .bind(id.value())
                .bind(owner.value())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }

    fn list(&self, owner: UserId, query: TodoQuery, now: Timestamp) -> RepositoryFuture<Vec<Todo>> {
        let pool = self.pool.clone();

        async move {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new(format!("SELECT {TODO_COLUMNS} FROM todos WHERE owner_id = "));
            builder.push_bind(owner.value());
            push_filters(&mut builder, &query, now);
            builder.push(order_by_clause(&query.ordering));

            let rows: Vec<TodoRow> = builder
                .build_query_as()
                .fetch_all(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            rows.into_iter().map(Todo::try_from).collect()
        }
        .boxed()
    }

    fn statistics(&self, owner: UserId, now: Timestamp) -> RepositoryFuture<TodoStatistics> {
        let pool = self.pool.clone();

        async move {
            let row: StatisticsRow = sqlx::query_as(
                "SELECT COUNT(*) AS total, \
                 COUNT(*) FILTER (WHERE completed) AS completed, \
                 COUNT(*) FILTER (WHERE NOT completed AND due_date < $2) AS overdue \
                 FROM todos WHERE owner_id = $1",
            )
            .bind(owner.value())
            .bind(*now.as_datetime())
            .fetch_one(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(TodoStatistics::from_counts(
                count(row.total),
                count(row.completed),
                count(row.overdue),
            ))
        }
        .boxed()
    }

    fn delete_completed(&self, owner: UserId) -> RepositoryFuture<u64> {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query("DELETE FROM todos WHERE owner_id = $1 AND completed = TRUE")
                .bind(owner.value())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected())
        }
        .boxed()
    }
}

impl UserRepository for PostgresStore {
    fn create(&self, user: NewUser, date_joined: Timestamp) -> RepositoryFuture<User> {
        let pool = self.pool.clone();

        async move {
            let result: Result<UserRow, sqlx::Error> = sqlx::query_as(
                "INSERT INTO users (username, email, password_hash, date_joined) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, username, email, date_joined",
            )
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(*date_joined.as_datetime())
            .fetch_one(&pool)
            .await;

            match result {
                Ok(row) => Ok(User::from(row)),
                Err(error) if is_unique_violation(&error) => Err(RepositoryError::Conflict(
                    format!("username '{}' is already taken", user.username),
                )),
                Err(error) => Err(database_error(&error)),
            }
        }
        .boxed()
    }

    fn find_credentials(&self, username: String) -> RepositoryFuture<Option<UserCredentials>> {
        let pool = self.pool.clone();

        async move {
            let row: Option<CredentialsRow> = sqlx::query_as(
                "SELECT id, username, email, date_joined, password_hash \
                 FROM users WHERE username = $1",
            )
            .bind(&username)
            .fetch_optional(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(row.map(|row| UserCredentials {
                user: User::from(row.user),
                password_hash: row.password_hash,
            }))
        }
        .boxed()
    }

    fn find_by_id(&self, id: UserId) -> RepositoryFuture<Option<User>> {
        let pool = self.pool.clone();

        async move {
            let row: Option<UserRow> =
                sqlx::query_as("SELECT id, username, email, date_joined FROM users WHERE id = $1")
                    .bind(id.value())
                    .fetch_optional(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;

            Ok(row.map(User::from))
        }
        .boxed()
    }

    fn delete(&self, id: UserId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.value())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

impl TokenRepository for PostgresStore {
    fn issue(&self, user: UserId, candidate: AuthToken) -> RepositoryFuture<AuthToken> {
        let pool = self.pool.clone();

        async move {
            sqlx::query(
                "INSERT INTO auth_tokens (key, user_id, created) VALUES ($1, $2, NOW()) \
                 ON CONFLICT (user_id) DO NOTHING",
            )
            .bind(candidate.as_str())
            .bind(user.value())
            .execute(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            let (key,): (String,) = sqlx::query_as("SELECT key FROM auth_tokens WHERE user_id = $1")
                .bind(user.value())
                .fetch_one(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(AuthToken::from_string(key))
        }
        .boxed()
    }

    fn resolve(&self, token: AuthToken) -> RepositoryFuture<Option<UserId>> {
        let pool = self.pool.clone();

        async move {
            let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM auth_tokens WHERE key = $1")
                .bind(token.as_str())
                .fetch_optional(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(row.map(|(user_id,)| UserId::new(user_id)))
        }
        .boxed()
    }

    fn revoke(&self, user: UserId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();

        async move {
            let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
                .bind(user.value())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected() > 0)
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
