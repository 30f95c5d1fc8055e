//! `SQLite` storage for Suguard grant records.
//!
//! Provides persistence for elevated-privilege authorization records keyed
//! by OS identity (uid).

mod db;
mod models;
mod queries;

pub use db::{Database, DatabaseError};
pub use models::*;
