//! Infrastructure module for external services.
//!
//! This module contains the repository traits, their in-memory and
//! `PostgreSQL` implementations, backend selection and password hashing.

pub mod credentials;
pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use credentials::{
    CredentialError, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
pub use factory::{
    ConfigurationError, FactoryError, Repositories, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use repository::{
    RepositoryError, RepositoryFuture, TodoRepository, TokenRepository, UserRepository,
};
