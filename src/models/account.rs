//! Accounts and users.
//!
//! An account is a shared ownership container: every category (and through
//! it, every entry) belongs to exactly one account, and an account is owned
//! by one or more users. Authorization always reduces to "is this user a
//! member of the owning account?".

use serde::{Deserialize, Serialize};

/// User identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Account identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl AccountId {
    pub fn new(value: i64) -> Self {
        AccountId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// An authenticated user. Credentials and token issuance live outside this
/// crate; the repository only stores identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
}

/// An ownership container for categories. Creating an account also creates
/// its root category as a store side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub user_ids: Vec<UserId>,
}

impl Account {
    /// Whether `user_id` is one of the owning users.
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.user_ids.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_check() {
        let account = Account {
            id: AccountId::new(1),
            user_ids: vec![UserId::new(10), UserId::new(11)],
        };
        assert!(account.is_member(UserId::new(10)));
        assert!(!account.is_member(UserId::new(12)));
    }
}
