//! Change summaries derived from a committed batch.
//!
//! Callers never report what a batch changed; the editor derives it by
//! comparing the pre-batch snapshot with the final sequence by identity.
//! Replacements are the one exception: they are an operation-level fact
//! recorded when `replace_at` runs, never inferred from positions.

use crate::Identity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The immutable result of one batch.
///
/// Invariants:
/// - `added` and `removed` are disjoint by identity.
/// - moved items appear in none of the three fields.
/// - one `replaced` pair exists per replacement chain whose before side was
///   present before the batch and whose after side survived it, even when
///   the before and after values compare equal. Chains (`a -> b` followed
///   by `b -> c`) collapse to a single `(a, c)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet<T> {
    /// Items present after the batch whose identity was not present
    /// before, excluding replacement targets.
    pub added: Vec<T>,
    /// Items present before the batch whose identity is absent after,
    /// excluding items superseded by a replacement.
    pub removed: Vec<T>,
    /// One `(before, after)` pair per explicit replace operation.
    pub replaced: Vec<(T, T)>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            replaced: Vec::new(),
        }
    }
}

impl<T> ChangeSet<T> {
    /// Whether the batch changed nothing observable (move-only batches
    /// produce an empty change set).
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.replaced.is_empty()
    }

    /// Net change in item count produced by the batch.
    pub fn count_delta(&self) -> isize {
        self.added.len() as isize - self.removed.len() as isize
    }
}

impl<T: Identity + Clone> ChangeSet<T> {
    /// Derive the change set from a pre-batch snapshot, the final
    /// sequence, and the replace pairs recorded during the batch.
    ///
    /// `added` and `removed` are computed by identity presence; the sides
    /// of a replacement are excluded so a replaced slot never doubles as
    /// an add/remove.
    ///
    /// Recorded pairs are normalized first: chains collapse, and a pair
    /// only counts as a replacement when its before side existed in the
    /// snapshot and its after side is still present in the final sequence.
    /// Anything else (the after side removed later in the batch, or a
    /// batch-added item replaced before commit) falls through to the
    /// presence scan, which reports the surviving side as a plain
    /// addition or removal. Without this, a `replace_at` whose target is
    /// removed later in the same batch would report a count delta of zero
    /// against an actual delta of minus one.
    pub(crate) fn compute(snapshot: &[T], finals: &[T], replaced: Vec<(T, T)>) -> Self {
        let before_ids: HashSet<T::Id> = snapshot.iter().map(Identity::identity).collect();
        let after_ids: HashSet<T::Id> = finals.iter().map(Identity::identity).collect();

        let replaced: Vec<(T, T)> = Self::coalesce(replaced)
            .into_iter()
            .filter(|(before, after)| {
                before_ids.contains(&before.identity()) && after_ids.contains(&after.identity())
            })
            .collect();

        let replaced_before: HashSet<T::Id> =
            replaced.iter().map(|(before, _)| before.identity()).collect();
        let replaced_after: HashSet<T::Id> =
            replaced.iter().map(|(_, after)| after.identity()).collect();

        let added = finals
            .iter()
            .filter(|item| {
                let id = item.identity();
                !before_ids.contains(&id) && !replaced_after.contains(&id)
            })
            .cloned()
            .collect();

        let removed = snapshot
            .iter()
            .filter(|item| {
                let id = item.identity();
                !after_ids.contains(&id) && !replaced_before.contains(&id)
            })
            .cloned()
            .collect();

        Self {
            added,
            removed,
            replaced,
        }
    }

    /// Collapse replacement chains: when the after side of one pair is the
    /// before side of a later pair, the intermediate item never survived
    /// the batch and only the endpoints matter.
    fn coalesce(pairs: Vec<(T, T)>) -> Vec<(T, T)> {
        let mut chained: Vec<(T, T)> = Vec::with_capacity(pairs.len());
        let mut slot_by_after: HashMap<T::Id, usize> = HashMap::new();
        for (before, after) in pairs {
            let after_id = after.identity();
            if let Some(slot) = slot_by_after.remove(&before.identity()) {
                chained[slot].1 = after;
                slot_by_after.insert(after_id, slot);
            } else {
                slot_by_after.insert(after_id, chained.len());
                chained.push((before, after));
            }
        }
        chained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn removal_is_derived() {
        let change = ChangeSet::compute(&ids(&["a", "b", "c"]), &ids(&["a", "c"]), vec![]);
        assert_eq!(change.added, Vec::<String>::new());
        assert_eq!(change.removed, ids(&["b"]));
        assert_eq!(change.count_delta(), -1);
    }

    #[test]
    fn insertion_is_derived() {
        let change = ChangeSet::compute(&ids(&["a", "b"]), &ids(&["a", "x", "b"]), vec![]);
        assert_eq!(change.added, ids(&["x"]));
        assert!(change.removed.is_empty());
    }

    #[test]
    fn move_produces_empty_change() {
        let change = ChangeSet::compute(&ids(&["a", "b", "c"]), &ids(&["b", "c", "a"]), vec![]);
        assert!(change.is_empty());
    }

    #[test]
    fn replace_excluded_from_added_and_removed() {
        let change = ChangeSet::compute(
            &ids(&["a", "b"]),
            &ids(&["a", "x"]),
            vec![("b".to_string(), "x".to_string())],
        );
        assert!(change.added.is_empty());
        assert!(change.removed.is_empty());
        assert_eq!(change.replaced, vec![("b".to_string(), "x".to_string())]);
    }

    #[test]
    fn remove_plus_add_at_same_position_is_not_a_replace() {
        // Same shape as a replacement, but no replace op was issued.
        let change = ChangeSet::compute(&ids(&["a", "b"]), &ids(&["a", "x"]), vec![]);
        assert_eq!(change.added, ids(&["x"]));
        assert_eq!(change.removed, ids(&["b"]));
        assert!(change.replaced.is_empty());
    }

    #[test]
    fn replace_pair_kept_even_when_values_equal() {
        let change = ChangeSet::compute(
            &ids(&["a"]),
            &ids(&["a"]),
            vec![("a".to_string(), "a".to_string())],
        );
        assert!(!change.is_empty());
        assert_eq!(change.replaced.len(), 1);
    }

    #[test]
    fn replace_whose_target_is_gone_demotes_to_removal() {
        // replace a -> b, then b removed before commit: the batch as a
        // whole removed a, and b never existed as far as callers know.
        let change = ChangeSet::compute(
            &ids(&["a"]),
            &[],
            vec![("a".to_string(), "b".to_string())],
        );
        assert!(change.added.is_empty());
        assert_eq!(change.removed, ids(&["a"]));
        assert!(change.replaced.is_empty());
        assert_eq!(change.count_delta(), -1);
    }

    #[test]
    fn replace_of_batch_added_item_promotes_to_addition() {
        // b appended then replaced by c within one batch: only c arrived.
        let change = ChangeSet::compute(
            &[],
            &ids(&["c"]),
            vec![("b".to_string(), "c".to_string())],
        );
        assert_eq!(change.added, ids(&["c"]));
        assert!(change.removed.is_empty());
        assert!(change.replaced.is_empty());
        assert_eq!(change.count_delta(), 1);
    }

    #[test]
    fn chained_replacements_coalesce_to_endpoints() {
        let change = ChangeSet::compute(
            &ids(&["a"]),
            &ids(&["c"]),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
            ],
        );
        assert!(change.added.is_empty());
        assert!(change.removed.is_empty());
        assert_eq!(change.replaced, vec![("a".to_string(), "c".to_string())]);
    }

    #[test]
    fn added_and_removed_disjoint() {
        let change = ChangeSet::compute(&ids(&["a", "b"]), &ids(&["b", "c"]), vec![]);
        for added in &change.added {
            assert!(!change.removed.contains(added));
        }
    }
}
