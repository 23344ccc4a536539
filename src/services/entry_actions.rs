//! Entry action resolution.
//!
//! `POST /entries` carries an entry type and, for ranges, an action. The
//! resolver is a pure mapping from that pair onto one of the three store
//! operations; the store itself decides whether the transition is legal
//! given the category's current open range.

use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::{Category, Entry, EntryAction, EntryType};

/// The store operation an entry request maps onto.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryOperation {
    /// Record a closed, instantaneous event.
    Log,
    /// Open a new range.
    Start,
    /// Close the currently open range.
    Stop,
}

/// Contract violations in the `(type, action)` pair. The request schema
/// rejects these before the resolver normally sees them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryActionError {
    #[error("events do not take an action")]
    ActionNotAllowed,

    #[error("ranges require an action")]
    ActionRequired,
}

/// Map an entry type and optional action onto a store operation.
pub fn resolve_entry_action(
    entry_type: EntryType,
    action: Option<EntryAction>,
) -> Result<EntryOperation, EntryActionError> {
    match (entry_type, action) {
        (EntryType::Event, None) => Ok(EntryOperation::Log),
        (EntryType::Event, Some(_)) => Err(EntryActionError::ActionNotAllowed),
        (EntryType::Range, Some(EntryAction::Start)) => Ok(EntryOperation::Start),
        (EntryType::Range, Some(EntryAction::Stop)) => Ok(EntryOperation::Stop),
        (EntryType::Range, None) => Err(EntryActionError::ActionRequired),
    }
}

/// Apply a resolved operation against the store. Double-start and
/// stop-with-nothing-open surface as `RepositoryError::InvalidAction`.
pub async fn apply_entry_operation(
    repo: &dyn FullRepository,
    operation: EntryOperation,
    category: &Category,
    timezone: Option<String>,
) -> RepositoryResult<Entry> {
    match operation {
        EntryOperation::Log => repo.log_for(category, timezone).await,
        EntryOperation::Start => repo.start_for(category, timezone).await,
        EntryOperation::Stop => repo.stop_for(category, timezone).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_without_action_logs() {
        assert_eq!(
            resolve_entry_action(EntryType::Event, None),
            Ok(EntryOperation::Log)
        );
    }

    #[test]
    fn event_with_action_is_a_contract_violation() {
        assert_eq!(
            resolve_entry_action(EntryType::Event, Some(EntryAction::Start)),
            Err(EntryActionError::ActionNotAllowed)
        );
        assert_eq!(
            resolve_entry_action(EntryType::Event, Some(EntryAction::Stop)),
            Err(EntryActionError::ActionNotAllowed)
        );
    }

    #[test]
    fn range_actions_map_to_start_and_stop() {
        assert_eq!(
            resolve_entry_action(EntryType::Range, Some(EntryAction::Start)),
            Ok(EntryOperation::Start)
        );
        assert_eq!(
            resolve_entry_action(EntryType::Range, Some(EntryAction::Stop)),
            Ok(EntryOperation::Stop)
        );
    }

    #[test]
    fn range_without_action_is_rejected() {
        assert_eq!(
            resolve_entry_action(EntryType::Range, None),
            Err(EntryActionError::ActionRequired)
        );
    }
}
