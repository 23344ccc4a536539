//! # Time Tracking Backend
//!
//! Backend for a hierarchical time-tracking service. It manages accounts,
//! nested activity categories, and timed entries (instantaneous events and
//! start/stop ranges), and performs asynchronous bulk imports of whole
//! category trees.
//!
//! ## Features
//!
//! - **Accounts**: per-user accounts, each anchored by a hidden root category
//! - **Categories**: arbitrarily nested trees scoped to one account
//! - **Entries**: events and ranges, with at most one open range per category
//! - **Bulk Import**: validated tree submission with queued, dependency-ordered
//!   execution and live progress reporting
//! - **HTTP API**: RESTful endpoints via Axum, bearer-token sessions
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: core domain types (accounts, categories, entries, imports)
//! - [`db`]: repository traits, in-memory backend, and persistence errors
//! - [`services`]: ownership resolution, import pipeline, entry action mapping
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
