//! Structural validation of submitted import trees.
//!
//! Runs before anything is persisted: a rejected tree must leave no job
//! and no entities behind. The validator also computes the expected counts
//! that seed the import job's progress record.

use serde::{Deserialize, Serialize};

use crate::models::ImportTreeNode;

/// Expected entity counts for a validated tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeCounts {
    pub categories: u64,
    pub events: u64,
    pub ranges: u64,
}

impl TreeCounts {
    /// Events and ranges both become entries.
    pub fn entries(&self) -> u64 {
        self.events + self.ranges
    }
}

/// Rejection reasons for an import tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    /// A non-root node has an empty name. The root alone may be unnamed,
    /// which means "attach my children to the account's root category".
    #[error("Only the root name can be empty")]
    InvalidName,

    /// An unnamed root carries events or ranges. It contributes no
    /// category, so there would be nothing to attach them to.
    #[error("An unnamed root cannot hold events or ranges")]
    UnattachedEntries,
}

/// Validate a tree and compute its expected counts.
///
/// Pure function over the input: no side effects, no mutation. Fails on
/// the first empty-named non-root node encountered (depth-first).
pub fn validate_tree(tree: &ImportTreeNode) -> Result<TreeCounts, TreeValidationError> {
    // An unnamed root creates no category, so entries placed directly on
    // it could never be imported. Rejecting them up front keeps the
    // expected counts equal to the imported counts on every successful
    // job.
    if tree.name.is_empty() && !(tree.events.is_empty() && tree.ranges.is_empty()) {
        return Err(TreeValidationError::UnattachedEntries);
    }

    let mut counts = TreeCounts::default();
    visit(tree, true, &mut counts)?;

    // An unnamed root contributes no category of its own.
    if tree.name.is_empty() {
        counts.categories -= 1;
    }

    Ok(counts)
}

fn visit(
    node: &ImportTreeNode,
    is_root: bool,
    counts: &mut TreeCounts,
) -> Result<(), TreeValidationError> {
    if node.name.is_empty() && !is_root {
        return Err(TreeValidationError::InvalidName);
    }

    counts.categories += 1;
    counts.events += node.events.len() as u64;
    counts.ranges += node.ranges.len() as u64;

    for child in &node.children {
        visit(child, false, counts)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventDescriptor, RangeDescriptor};
    use chrono::{TimeZone, Utc};

    fn node(name: &str, events: usize, ranges: usize, children: Vec<ImportTreeNode>) -> ImportTreeNode {
        let started_at = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        ImportTreeNode {
            name: name.to_string(),
            events: (0..events)
                .map(|_| EventDescriptor {
                    started_at,
                    started_at_timezone: None,
                })
                .collect(),
            ranges: (0..ranges)
                .map(|_| RangeDescriptor {
                    started_at,
                    started_at_timezone: None,
                    ended_at: started_at + chrono::Duration::hours(1),
                    ended_at_timezone: None,
                })
                .collect(),
            children,
        }
    }

    #[test]
    fn named_root_counts_itself() {
        let tree = node("Life", 2, 1, vec![node("Work", 0, 3, vec![])]);
        let counts = validate_tree(&tree).unwrap();
        assert_eq!(counts.categories, 2);
        assert_eq!(counts.events, 2);
        assert_eq!(counts.ranges, 4);
        assert_eq!(counts.entries(), 6);
    }

    #[test]
    fn unnamed_root_is_excluded_from_category_count() {
        let tree = node("", 0, 0, vec![node("Work", 1, 0, vec![])]);
        let counts = validate_tree(&tree).unwrap();
        assert_eq!(counts.categories, 1);
        assert_eq!(counts.events, 1);
        assert_eq!(counts.ranges, 0);
    }

    #[test]
    fn empty_name_below_root_is_rejected_wherever_it_occurs() {
        // Two levels deep.
        let deep = node("", 0, 0, vec![node("Ok", 0, 0, vec![node("", 0, 0, vec![])])]);
        assert_eq!(
            validate_tree(&deep).unwrap_err(),
            TreeValidationError::InvalidName
        );

        // Direct child.
        let shallow = node("Root", 0, 0, vec![node("", 0, 0, vec![])]);
        assert_eq!(
            validate_tree(&shallow).unwrap_err(),
            TreeValidationError::InvalidName
        );
    }

    #[test]
    fn empty_root_without_children_counts_nothing() {
        let tree = node("", 0, 0, vec![]);
        let counts = validate_tree(&tree).unwrap();
        assert_eq!(counts, TreeCounts::default());
    }

    #[test]
    fn entries_on_unnamed_root_are_rejected() {
        // With no category of its own, an unnamed root has nowhere to put
        // its descriptors.
        let with_events = node("", 2, 0, vec![node("Work", 0, 0, vec![])]);
        assert_eq!(
            validate_tree(&with_events).unwrap_err(),
            TreeValidationError::UnattachedEntries
        );

        let with_ranges = node("", 0, 1, vec![]);
        assert_eq!(
            validate_tree(&with_ranges).unwrap_err(),
            TreeValidationError::UnattachedEntries
        );

        // The same descriptors on a named root are fine.
        let named = node("Root", 2, 1, vec![]);
        assert!(validate_tree(&named).is_ok());
    }
}
