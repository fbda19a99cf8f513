//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default 5)
//!
//! # Example
//!
//! ```ignore
//! let factory = RepositoryFactory::new(RepositoryConfig::from_env()?);
//! let repositories = factory.create().await?;
//! let state = AppState::from_repositories(repositories);
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::postgres::MIGRATOR;
use super::{InMemoryStore, PostgresStore, TodoRepository, TokenRepository, UserRepository};

/// Default size of the `PostgreSQL` connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for users, tokens and items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// In-process storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    /// Parses a storage mode from a string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
///
/// Use `RepositoryConfigBuilder` for a fluent API to construct this.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if:
    /// - `STORAGE_MODE` or `DATABASE_MAX_CONNECTIONS` contains an invalid value
    /// - `DATABASE_URL` is missing when `STORAGE_MODE=postgres`
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => parse_max_connections(&value)?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        // Empty or whitespace-only counts as unset
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let config = Self {
            storage_mode,
            database_url,
            max_connections,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the URL is missing for `Postgres` or the pool size is zero.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }

        if self.max_connections == 0 {
            return Err(ConfigurationError::InvalidMaxConnections("0".to_string()));
        }

        Ok(())
    }
}

fn parse_max_connections(value: &str) -> Result<u32, ConfigurationError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|connections| *connections > 0)
        .ok_or_else(|| ConfigurationError::InvalidMaxConnections(value.to_string()))
}

/// Builder for `RepositoryConfig`.
///
/// # Example
///
/// ```ignore
/// let config = RepositoryConfig::builder()
///     .storage_mode(StorageMode::Postgres)
///     .database_url("postgres://localhost/todos")
///     .max_connections(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
    max_connections: Option<u32>,
}

impl RepositoryConfigBuilder {
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn max_connections(mut self, connections: u32) -> Self {
        self.max_connections = Some(connections);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
            max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors in the repository configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    #[error("Invalid DATABASE_MAX_CONNECTIONS: '{0}'. Expected a positive integer")]
    InvalidMaxConnections(String),

    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database migration error: {0}")]
    Migration(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// Collection of initialized repositories.
///
/// All three usually point at the same store instance.
#[derive(Clone)]
pub struct Repositories {
    pub todos: Arc<dyn TodoRepository + Send + Sync>,
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub tokens: Arc<dyn TokenRepository + Send + Sync>,
}

impl Repositories {
    /// Builds a collection backed by one in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            todos: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            tokens: Arc::new(store),
        }
    }

    /// Builds a collection backed by one `PostgreSQL` store.
    #[must_use]
    pub fn postgres(store: PostgresStore) -> Self {
        Self {
            todos: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            tokens: Arc::new(store),
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("todos", &"Arc<dyn TodoRepository>")
            .field("users", &"Arc<dyn UserRepository>")
            .field("tokens", &"Arc<dyn TokenRepository>")
            .finish()
    }
}

/// Factory for creating repository instances based on configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// Creates all repositories based on the configuration.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the database connection or the schema migration fails.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Repositories::in_memory()),
            StorageMode::Postgres => {
                let database_url = self
                    .config
                    .database_url
                    .as_ref()
                    .ok_or(ConfigurationError::MissingDatabaseUrl)?;

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .connect(database_url)
                    .await
                    .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))?;

                MIGRATOR
                    .run(&pool)
                    .await
                    .map_err(|error| FactoryError::Migration(error.to_string()))?;
                tracing::info!("Database migrations applied");

                Ok(Repositories::postgres(PostgresStore::new(pool)))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
