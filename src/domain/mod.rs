//! Domain module for to-do management.
//!
//! This module contains domain models and the pure functions that decide
//! which items a query selects, in which order, and how they are counted.
//! Nothing here performs I/O.

pub mod query;
pub mod statistics;
pub mod status;
pub mod todo;
pub mod user;

pub use query::{OrderingField, OrderingTerm, SearchTerms, StatusFilter, TodoOrdering, TodoQuery};
pub use statistics::TodoStatistics;
pub use status::{DerivedStatus, derive_status};
pub use todo::{
    InvalidPriority, NewTodo, Priority, TITLE_MAX_LENGTH, Timestamp, Todo, TodoChanges, TodoId,
};
pub use user::{AuthToken, NewUser, User, UserCredentials, UserId};
