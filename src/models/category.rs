//! Categories form a tree per account, rooted at a synthetic category that
//! is created together with the account itself.

use serde::{Deserialize, Serialize};

use super::account::AccountId;

/// Category identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub i64);

impl CategoryId {
    pub fn new(value: i64) -> Self {
        CategoryId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// A node in an account's category tree.
///
/// Invariants (enforced by the repository):
/// - `parent_id` always references a category in the same account.
/// - only the account's root category has an empty name and no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub account_id: AccountId,
    pub parent_id: Option<CategoryId>,
}

impl Category {
    /// Whether this is the account's synthetic root category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
