//! In-memory repository implementation.
//!
//! A single [`InMemoryStore`] implements all three repository traits over one
//! set of tables, so deleting a user can cascade to their items and token the
//! same way foreign keys do in `PostgreSQL`.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Reads share the lock, writes take it exclusively
//! - Statistics and listings are computed under one read guard

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::RwLock;

use crate::domain::{
    AuthToken, NewTodo, NewUser, Timestamp, Todo, TodoChanges, TodoId, TodoQuery, TodoStatistics,
    User, UserCredentials, UserId,
};
use crate::infrastructure::{
    RepositoryError, RepositoryFuture, TodoRepository, TokenRepository, UserRepository,
};

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserCredentials>,
    usernames: HashMap<String, UserId>,
    /// Token key to user.
    tokens: HashMap<String, UserId>,
    todos: BTreeMap<TodoId, Todo>,
    last_user_id: i64,
    last_todo_id: i64,
}

impl Tables {
    fn owned(&self, owner: UserId) -> impl Iterator<Item = &Todo> {
        self.todos.values().filter(move |todo| todo.owner == owner)
    }

    fn owned_mut(&mut self, owner: UserId, id: TodoId) -> Option<&mut Todo> {
        self.todos.get_mut(&id).filter(|todo| todo.owner == owner)
    }

    fn token_of(&self, user: UserId) -> Option<&String> {
        self.tokens
            .iter()
            .find_map(|(key, holder)| (*holder == user).then_some(key))
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory implementation of every repository trait.
///
/// Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TodoRepository for InMemoryStore {
    fn insert(&self, owner: UserId, todo: NewTodo, timestamp: Timestamp) -> RepositoryFuture<Todo> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            guard.last_todo_id += 1;
            let id = TodoId::new(guard.last_todo_id);
            let stored = todo.into_todo(id, owner, timestamp);
            guard.todos.insert(id, stored.clone());
            Ok(stored)
        }
        .boxed()
    }

    fn find_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<Option<Todo>> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(guard
                .todos
                .get(&id)
                .filter(|todo| todo.owner == owner)
                .cloned())
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
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            let Some(slot) = guard.owned_mut(owner, id) else {
                return Ok(None);
            };
            let updated = slot.clone().apply(changes, timestamp);
            *slot = updated.clone();
            Ok(Some(updated))
        }
        .boxed()
    }

    fn delete_owned(&self, owner: UserId, id: TodoId) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            if guard.owned_mut(owner, id).is_none() {
                return Ok(false);
            }
            Ok(guard.todos.remove(&id).is_some())
        }
        .boxed()
    }

    fn list(&self, owner: UserId, query: TodoQuery, now: Timestamp) -> RepositoryFuture<Vec<Todo>> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(query.apply(guard.owned(owner), now))
        }
        .boxed()
    }

    fn statistics(&self, owner: UserId, now: Timestamp) -> RepositoryFuture<TodoStatistics> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(TodoStatistics::tally(guard.owned(owner), now))
        }
        .boxed()
    }

    fn delete_completed(&self, owner: UserId) -> RepositoryFuture<u64> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            let before = guard.todos.len();
            guard
                .todos
                .retain(|_, todo| !(todo.owner == owner && todo.completed));
            Ok((before - guard.todos.len()) as u64)
        }
        .boxed()
    }
}

impl UserRepository for InMemoryStore {
    fn create(&self, user: NewUser, date_joined: Timestamp) -> RepositoryFuture<User> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            if guard.usernames.contains_key(&user.username) {
                return Err(RepositoryError::Conflict(format!(
                    "username '{}' is already taken",
                    user.username
                )));
            }

            guard.last_user_id += 1;
            let id = UserId::new(guard.last_user_id);
            let stored = User {
                id,
                username: user.username,
                email: user.email,
                date_joined,
            };
            guard.usernames.insert(stored.username.clone(), id);
            guard.users.insert(
                id,
                UserCredentials {
                    user: stored.clone(),
                    password_hash: user.password_hash,
                },
            );
            Ok(stored)
        }
        .boxed()
    }

    fn find_credentials(&self, username: String) -> RepositoryFuture<Option<UserCredentials>> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(guard
                .usernames
                .get(&username)
                .and_then(|id| guard.users.get(id))
                .cloned())
        }
        .boxed()
    }

    fn find_by_id(&self, id: UserId) -> RepositoryFuture<Option<User>> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(guard.users.get(&id).map(|credentials| credentials.user.clone()))
        }
        .boxed()
    }

    fn delete(&self, id: UserId) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            let Some(removed) = guard.users.remove(&id) else {
                return Ok(false);
            };
            guard.usernames.remove(&removed.user.username);
            guard.tokens.retain(|_, holder| *holder != id);
            guard.todos.retain(|_, todo| todo.owner != id);
            Ok(true)
        }
        .boxed()
    }
}

impl TokenRepository for InMemoryStore {
    fn issue(&self, user: UserId, candidate: AuthToken) -> RepositoryFuture<AuthToken> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            if let Some(existing) = guard.token_of(user) {
                return Ok(AuthToken::from_string(existing.clone()));
            }
            guard.tokens.insert(candidate.as_str().to_string(), user);
            Ok(candidate)
        }
        .boxed()
    }

    fn resolve(&self, token: AuthToken) -> RepositoryFuture<Option<UserId>> {
        let tables = Arc::clone(&self.tables);

        async move {
            let guard = tables.read().await;
            Ok(guard.tokens.get(token.as_str()).copied())
        }
        .boxed()
    }

    fn revoke(&self, user: UserId) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);

        async move {
            let mut guard = tables.write().await;
            let before = guard.tokens.len();
            guard.tokens.retain(|_, holder| *holder != user);
            Ok(guard.tokens.len() < before)
        }
        .boxed()
    }
}

// =============================================================================
// Tests
// =============================================================================
