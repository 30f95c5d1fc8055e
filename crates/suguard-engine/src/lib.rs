//! Suguard Engine Library
//!
//! Core functionality for the Suguard authorization engine:
//! - SQLite storage for elevated-privilege grant records
//! - Inventory provider contract for installed-application enumeration
//! - Reconciliation of store state against the live package inventory
//! - Mutation coordination (grant, deny, revoke, flag toggles) with an
//!   optional re-authentication gate

pub mod auth;
pub mod inventory;
pub mod policy;
pub mod storage;
