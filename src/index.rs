//! Incrementally maintained key lookup indexes.
//!
//! An index maps an extracted key to the set of item identities currently
//! holding it. It is built once when registered and from then on updated
//! only by change-set deltas at commit time, so it exactly reflects roster
//! contents after every commit and is never observably stale.

use crate::{ChangeSet, Identity};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// A key extractor registered with an index.
///
/// Must be pure and stable (same item, same key) between commits; the
/// engine otherwise never inspects item internals.
pub type KeyExtractor<T, K> = Box<dyn Fn(&T) -> K + Send>;

/// One secondary lookup index over a roster, for one key extractor.
///
/// Multiple items may share a key. Lookups are resolved against the live
/// roster in collection order; the bucket sets only gate which identities
/// qualify, so the result never depends on index insertion order.
pub struct KeyIndex<T: Identity, K> {
    extractor: KeyExtractor<T, K>,
    buckets: HashMap<K, HashSet<T::Id>>,
}

impl<T: Identity, K: Eq + Hash + Clone> KeyIndex<T, K> {
    /// Build an index over the current items.
    pub(crate) fn build(extractor: KeyExtractor<T, K>, items: &[T]) -> Self {
        let mut index = Self {
            extractor,
            buckets: HashMap::new(),
        };
        for item in items {
            index.insert(item);
        }
        index
    }

    /// Rebuild the buckets from scratch. Only the initial store load uses
    /// this; every commit afterwards is a delta via [`Self::apply`].
    pub(crate) fn rebuild(&mut self, items: &[T]) {
        self.buckets.clear();
        for item in items {
            self.insert(item);
        }
    }

    /// Extract the key of an item with this index's extractor.
    pub(crate) fn key_of(&self, item: &T) -> K {
        (self.extractor)(item)
    }

    /// Identities currently holding `key`, if any.
    pub(crate) fn ids_for(&self, key: &K) -> Option<&HashSet<T::Id>> {
        self.buckets.get(key)
    }

    /// Apply one committed batch to the index.
    ///
    /// Exactly three deltas: entries leave for removed items and the
    /// before side of each replacement, entries arrive for added items and
    /// the after side of each replacement. Moved items are untouched.
    pub(crate) fn apply(&mut self, change: &ChangeSet<T>) {
        for item in &change.removed {
            self.remove(item);
        }
        for (before, _) in &change.replaced {
            self.remove(before);
        }
        for item in &change.added {
            self.insert(item);
        }
        for (_, after) in &change.replaced {
            self.insert(after);
        }
    }

    fn insert(&mut self, item: &T) {
        self.buckets
            .entry(self.key_of(item))
            .or_default()
            .insert(item.identity());
    }

    fn remove(&mut self, item: &T) {
        let key = self.key_of(item);
        if let Some(ids) = self.buckets.get_mut(&key) {
            ids.remove(&item.identity());
            if ids.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl<T: Identity, K> std::fmt::Debug for KeyIndex<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIndex")
            .field("buckets", &self.buckets.len())
            .finish_non_exhaustive()
    }
}
