//! # Timetable Backend
//!
//! Edit-validation and versioning engine for institutional weekly timetables.
//!
//! A timetable is generated once by an external solver and then refined by an
//! operator, cell by cell or by drag and drop. Every proposed change is
//! checked for double-booked teachers and rooms, lunch-break violations,
//! unassigned teachers and overlong teaching runs. Accepted changes are
//! committed as new versions with a full, revertible history.
//!
//! ## Architecture
//!
//! - [`models`]: schedule grid, timetables, registry records and ids
//! - [`db`]: repository traits, the in-memory repository, checksums
//! - [`services`]: conflict validation, drop zones, history, edit sessions,
//!   generation and read views
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based REST API (feature `http-server`)

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
