//! HTTP API layer.
//!
//! REST surface for accounts, categories, time entries, and bulk import.
//! Handlers authenticate with a bearer session token, authorize through the
//! ownership chain (user -> account -> category -> entry), and delegate all
//! state changes to the repository layer.
//!
//! ```text
//!     Request ──> auth (CurrentUser) ──> handler ──> services ──> repository
//!                       │                                │
//!                       └── 401 on bad token             └── AppError -> JSON
//! ```
//!
//! Only compiled with the `http-server` feature.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use auth::CurrentUser;
pub use error::{ApiError, AppError};
pub use router::create_router;
pub use state::AppState;
