//! Kanban task store server library.
//!
//! Exposes the repository and HTTP API for use in tests and embedding.

pub mod api;
pub mod config;
pub mod store;
