//! Domain model types shared across the repository, service, and HTTP layers.

pub mod account;
pub mod category;
pub mod entry;
pub mod import;

pub use account::{Account, AccountId, User, UserId};
pub use category::{Category, CategoryId};
pub use entry::{Entry, EntryAction, EntryId, EntryType};
pub use import::{EventDescriptor, ImportJob, ImportJobId, ImportTreeNode, RangeDescriptor};
