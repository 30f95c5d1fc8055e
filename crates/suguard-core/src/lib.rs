//! `Suguard` Core Library
//!
//! Shared functionality for `Suguard` components:
//! - Configuration resolution (settings file, environment overrides)
//! - `SQLite` pool utilities and the database-struct macro
//! - Common error types
//! - Tracing initialization

pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
