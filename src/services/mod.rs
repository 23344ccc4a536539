//! Business logic services.
//!
//! Services operate on the repository traits and stay free of HTTP
//! concerns; the handlers translate their errors into responses.
//!
//! - [`ownership`]: multi-hop authorization (user → account → category →
//!   entry) required by every category/entry operation
//! - [`import_validator`]: structural validation of submitted import trees
//! - [`import_processor`]: import job registration and asynchronous,
//!   dependency-ordered execution
//! - [`entry_actions`]: mapping of `(entry type, action)` requests onto
//!   store operations

pub mod entry_actions;
pub mod import_processor;
pub mod import_validator;
pub mod ownership;

pub use entry_actions::{
    apply_entry_operation, resolve_entry_action, EntryActionError, EntryOperation,
};
pub use import_processor::{execute_import, submit_import, ImportQueue, ImportSubmitError};
pub use import_validator::{validate_tree, TreeCounts, TreeValidationError};
pub use ownership::{authorize_category, authorize_entry, authorize_import, AuthError};
