//! Kanban board client library: board model, optimistic sync engine, edit
//! guard, task store clients and the terminal UI.

pub mod app;
pub mod board;
pub mod config;
pub mod edit;
pub mod search;
pub mod store;
pub mod sync;
pub mod ui;
