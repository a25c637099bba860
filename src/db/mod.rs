//! Database layer
//!
//! SQLite-backed persistence for the Pressnote server. The repositories are
//! trait objects so services can be exercised against any backing store.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
