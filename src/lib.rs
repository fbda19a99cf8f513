//! To-do Service Library
//!
//! A multi-user to-do REST service. Every stored item belongs to exactly one
//! user, and every read or write is scoped to the authenticated caller.
//!
//! # Architecture
//!
//! - **Domain Layer**: items, users, derived status, list queries, statistics
//! - **Infrastructure Layer**: repositories (in-memory, `PostgreSQL`), credentials
//! - **API Layer**: HTTP handlers, DTOs, validation, extractors

pub mod api;
pub mod domain;
pub mod infrastructure;
