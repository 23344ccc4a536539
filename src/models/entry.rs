//! Time entries: instantaneous events and open/closed ranges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::CategoryId;

/// Entry identifier (database primary key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub i64);

impl EntryId {
    pub fn new(value: i64) -> Self {
        EntryId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// The two kinds of entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Instantaneous. Never carries ended-at data.
    Event,
    /// A span of time. Open while `ended_at` is unset; at most one open
    /// range may exist per category.
    Range,
}

/// Requested state transition for a range entry (`POST /entries`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryAction {
    Start,
    Stop,
}

/// A recorded event or range belonging to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub entry_type: EntryType,
    pub category_id: CategoryId,
    pub started_at: DateTime<Utc>,
    pub started_at_timezone: Option<String>,
    pub ended_at: Option<DateTime<Utc>>,
    pub ended_at_timezone: Option<String>,
}

impl Entry {
    /// An open range is a started but not yet stopped `Range` entry.
    pub fn is_open(&self) -> bool {
        self.entry_type == EntryType::Range && self.ended_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(ended: bool) -> Entry {
        Entry {
            id: EntryId::new(1),
            entry_type: EntryType::Range,
            category_id: CategoryId::new(1),
            started_at: Utc::now(),
            started_at_timezone: None,
            ended_at: ended.then(Utc::now),
            ended_at_timezone: None,
        }
    }

    #[test]
    fn open_range_detection() {
        assert!(range(false).is_open());
        assert!(!range(true).is_open());

        let event = Entry {
            entry_type: EntryType::Event,
            ..range(false)
        };
        assert!(!event.is_open());
    }
}
