//! The batch editor - the only mutation path into a roster.
//!
//! An edit snapshots the current sequence, runs caller-supplied mutation
//! logic against a restricted [`Batch`] capability, derives the
//! [`ChangeSet`] from the snapshot, applies index deltas, commits, triggers
//! the store save, and notifies observers. Batches are all-or-nothing: any
//! error inside the mutation logic restores the pre-batch snapshot.

use crate::index::{KeyExtractor, KeyIndex};
use crate::{ChangeSet, Error, Identity, Result, Roster, StoreAdapter, Version};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Handle returned by [`BatchEditor::observe`], used to unregister.
pub type ObserverId = u64;

type Observer<T> = Box<dyn FnMut(&ChangeSet<T>) + Send>;

/// Owns a roster and everything that must stay synchronized with it:
/// the commit version, the key indexes, the observer list, and the
/// optional store adapter.
///
/// `K` is the key type shared by every index registered on this editor;
/// it defaults to `String`.
pub struct BatchEditor<T: Identity, K = String> {
    roster: Roster<T>,
    version: Version,
    indexes: HashMap<String, KeyIndex<T, K>>,
    observers: Vec<(ObserverId, Observer<T>)>,
    next_observer: ObserverId,
    adapter: Option<StoreAdapter<T>>,
}

impl<T, K> BatchEditor<T, K>
where
    T: Identity + Clone,
    K: Eq + Hash + Clone,
{
    /// Create an editor over an empty roster with no persistence.
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    /// Create an editor over an existing sequence with no persistence.
    pub fn from_items(items: Vec<T>) -> Self {
        Self {
            roster: Roster::from_items(items),
            version: 0,
            indexes: HashMap::new(),
            observers: Vec::new(),
            next_observer: 0,
            adapter: None,
        }
    }

    /// Create an editor backed by a store adapter. The roster starts
    /// unloaded; the first edit (or an explicit [`Self::ensure_loaded`])
    /// performs the initial load.
    pub fn with_adapter(adapter: StoreAdapter<T>) -> Self {
        let mut editor = Self::new();
        editor.adapter = Some(adapter);
        editor
    }

    /// Read-only view of the current committed roster.
    pub fn roster(&self) -> &Roster<T> {
        &self.roster
    }

    /// Number of committed batches so far.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Perform the initial store load if one is pending.
    ///
    /// Loaded contents replace the roster and rebuild any indexes
    /// registered before the load. Without a store adapter this is a
    /// no-op.
    pub fn ensure_loaded(&mut self) -> Result<()> {
        if let Some(adapter) = &mut self.adapter {
            if let Some(items) = adapter.ensure_loaded()? {
                self.roster.set_items(items);
                for index in self.indexes.values_mut() {
                    index.rebuild(self.roster.as_slice());
                }
            }
        }
        Ok(())
    }

    /// Execute one atomic batch of mutations.
    ///
    /// The mutation logic runs synchronously against a [`Batch`]
    /// capability; any error it returns aborts the whole batch and
    /// restores the pre-batch sequence. On success the derived change set
    /// is applied to every index, the version is bumped, a best-effort
    /// save is issued, observers are notified in registration order, and
    /// the change set is returned.
    pub fn edit<F>(&mut self, mutation: F) -> Result<ChangeSet<T>>
    where
        F: FnOnce(&mut Batch<'_, T>) -> Result<()>,
    {
        self.ensure_loaded()?;

        let snapshot = self.roster.to_vec();
        let mut replaced = Vec::new();
        let mut batch = Batch {
            items: self.roster.items_mut(),
            replaced: &mut replaced,
        };

        if let Err(err) = mutation(&mut batch) {
            self.roster.set_items(snapshot);
            return Err(err);
        }

        let change = ChangeSet::compute(&snapshot, self.roster.as_slice(), replaced);
        for index in self.indexes.values_mut() {
            index.apply(&change);
        }
        self.version += 1;

        if let Some(adapter) = &mut self.adapter {
            adapter.save_commit(self.roster.as_slice(), self.version);
        }

        for (_, observer) in &mut self.observers {
            observer(&change);
        }

        Ok(change)
    }

    /// Register (or replace) a key index under `name`.
    ///
    /// The index is built from the current contents once and maintained
    /// incrementally from then on. Registering the same name again swaps
    /// in the new extractor and rebuilds, which is the only rebuild an
    /// index ever undergoes.
    pub fn register_index(
        &mut self,
        name: impl Into<String>,
        extractor: impl Fn(&T) -> K + Send + 'static,
    ) {
        let extractor: KeyExtractor<T, K> = Box::new(extractor);
        self.indexes
            .insert(name.into(), KeyIndex::build(extractor, self.roster.as_slice()));
    }

    /// Query the index registered under `name`, or `None` if no such
    /// index exists.
    pub fn lookup(&self, name: &str) -> Option<KeyQuery<'_, T, K>> {
        self.indexes.get(name).map(|index| KeyQuery {
            roster: &self.roster,
            index,
        })
    }

    /// First item whose indexed key equals `value`, in collection order.
    ///
    /// Absence (of the index or of a match) yields `None`.
    pub fn first_where(&self, name: &str, value: &K) -> Option<&T> {
        self.lookup(name)?.first(value)
    }

    /// Remove the first item whose indexed key equals `value`.
    ///
    /// Issues a single-element batch when a match exists; returns whether
    /// anything was removed.
    pub fn remove_first_where(&mut self, name: &str, value: &K) -> Result<bool> {
        self.ensure_loaded()?;
        match self.position_where(name, value) {
            Some(index) => {
                self.edit(|batch| batch.remove_at(&[index]))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace the first item whose indexed key equals `value` with
    /// `transform(match)`.
    ///
    /// Returns the new value, or `None` without running any batch when
    /// nothing matches.
    pub fn replace_first_where(
        &mut self,
        name: &str,
        value: &K,
        transform: impl FnOnce(&T) -> T,
    ) -> Result<Option<T>> {
        self.ensure_loaded()?;
        let Some(index) = self.position_where(name, value) else {
            return Ok(None);
        };
        let new_item = transform(self.roster.get(index)?);
        let returned = new_item.clone();
        self.edit(|batch| batch.replace_at(&[index], vec![new_item]))?;
        Ok(Some(returned))
    }

    /// Keep only the candidates whose extracted key is not already held
    /// by any current item. Read-only merge helper; mutates nothing.
    pub fn filter_not_present(&self, candidates: Vec<T>, extractor: impl Fn(&T) -> K) -> Vec<T> {
        let present: HashSet<K> = self.roster.iter().map(&extractor).collect();
        candidates
            .into_iter()
            .filter(|candidate| !present.contains(&extractor(candidate)))
            .collect()
    }

    /// Register an observer, notified synchronously once per successful
    /// batch, in registration order.
    pub fn observe(&mut self, observer: impl FnMut(&ChangeSet<T>) + Send + 'static) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Unregister an observer. Returns whether it was registered.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn position_where(&self, name: &str, value: &K) -> Option<usize> {
        let ids = self.indexes.get(name)?.ids_for(value)?;
        self.roster.position(|item| ids.contains(&item.identity()))
    }
}

impl<T, K> Default for BatchEditor<T, K>
where
    T: Identity + Clone,
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identity, K> std::fmt::Debug for BatchEditor<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEditor")
            .field("len", &self.roster.len())
            .field("version", &self.version)
            .field("indexes", &self.indexes.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

/// Lookup handle over one index, resolving results against the live
/// roster so matches always come back in collection order.
#[derive(Debug)]
pub struct KeyQuery<'a, T: Identity, K> {
    roster: &'a Roster<T>,
    index: &'a KeyIndex<T, K>,
}

impl<'a, T, K> KeyQuery<'a, T, K>
where
    T: Identity,
    K: Eq + Hash + Clone,
{
    /// First item holding `value`, in collection order.
    pub fn first(&self, value: &K) -> Option<&'a T> {
        let ids = self.index.ids_for(value)?;
        self.roster
            .first_matching(|item| ids.contains(&item.identity()))
    }

    /// All items holding `value`, in collection order.
    pub fn all(&self, value: &K) -> Vec<&'a T> {
        match self.index.ids_for(value) {
            Some(ids) => self
                .roster
                .iter()
                .filter(|item| ids.contains(&item.identity()))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Restricted mutation capability handed to the logic of one batch.
///
/// Every index argument is validated against the current length, after
/// prior operations in the same batch; a violation aborts the batch.
#[derive(Debug)]
pub struct Batch<'a, T> {
    items: &'a mut Vec<T>,
    replaced: &'a mut Vec<(T, T)>,
}

impl<T: Clone> Batch<'_, T> {
    /// Current length, reflecting prior operations in this batch.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence is currently empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current contents, for mutation logic that inspects as it goes.
    pub fn items(&self) -> &[T] {
        self.items
    }

    /// Append items at the end.
    pub fn append(&mut self, items: Vec<T>) {
        self.items.extend(items);
    }

    /// Insert items at the paired indices, in ascending index order.
    ///
    /// Each index addresses the sequence as it stands once the preceding
    /// insertions of this call have landed, so `insert([x, y], &[1, 3])`
    /// on `[a, b]` yields `[a, x, b, y]`. Indices may equal the length
    /// (append position). Fails [`Error::CountMismatch`] when the lengths
    /// differ, [`Error::IndexOutOfRange`] otherwise, mutating nothing.
    pub fn insert(&mut self, items: Vec<T>, at_indices: &[usize]) -> Result<()> {
        if items.len() != at_indices.len() {
            return Err(Error::CountMismatch {
                indices: at_indices.len(),
                items: items.len(),
            });
        }

        let mut pairs: Vec<(usize, T)> = at_indices.iter().copied().zip(items).collect();
        pairs.sort_by_key(|(index, _)| *index);

        // With ascending application, the k-th insertion sees a sequence
        // grown by k, so index <= len + k is the exact bound.
        let len = self.items.len();
        for (offset, (index, _)) in pairs.iter().enumerate() {
            if *index > len + offset {
                return Err(Error::IndexOutOfRange {
                    index: *index,
                    len: len + offset,
                });
            }
        }

        for (index, item) in pairs {
            self.items.insert(index, item);
        }
        Ok(())
    }

    /// Remove the items at `indices` (duplicates collapse).
    ///
    /// All indices are validated before anything is removed.
    pub fn remove_at(&mut self, indices: &[usize]) -> Result<()> {
        let sorted = self.validated_set(indices)?;
        for index in sorted.iter().rev() {
            self.items.remove(*index);
        }
        Ok(())
    }

    /// Replace the item at each index with the paired new item.
    ///
    /// Records one `(before, after)` pair per index for the change set,
    /// even when the values compare equal: replacement is an
    /// operation-level fact, not a value-level one. Fails
    /// [`Error::CountMismatch`] when the lengths differ.
    pub fn replace_at(&mut self, indices: &[usize], new_items: Vec<T>) -> Result<()> {
        if indices.len() != new_items.len() {
            return Err(Error::CountMismatch {
                indices: indices.len(),
                items: new_items.len(),
            });
        }
        let len = self.items.len();
        for &index in indices {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        for (&index, item) in indices.iter().zip(new_items) {
            self.replaced.push((self.items[index].clone(), item.clone()));
            self.items[index] = item;
        }
        Ok(())
    }

    /// Move the items at `indices` (deduplicated, ascending) to
    /// `to_index`, preserving their relative order.
    ///
    /// The origin items are removed first; `to_index` addresses the
    /// post-removal sequence and may equal its length. Moves never
    /// contribute to the change set. See [`crate::reorder::translate`]
    /// for converting a pre-removal destination as produced by
    /// drag-and-drop UIs.
    pub fn move_to(&mut self, indices: &[usize], to_index: usize) -> Result<()> {
        let sorted = self.validated_set(indices)?;

        let remaining = self.items.len() - sorted.len();
        if to_index > remaining {
            return Err(Error::IndexOutOfRange {
                index: to_index,
                len: remaining,
            });
        }

        let moved: Vec<T> = sorted.iter().map(|&index| self.items[index].clone()).collect();
        for index in sorted.iter().rev() {
            self.items.remove(*index);
        }
        self.items.splice(to_index..to_index, moved);
        Ok(())
    }

    /// Clear the sequence and reset it to `items`.
    pub fn replace_all(&mut self, items: Vec<T>) {
        *self.items = items;
    }

    fn validated_set(&self, indices: &[usize]) -> Result<BTreeSet<usize>> {
        let len = self.items.len();
        let sorted: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(&index) = sorted.iter().find(|&&index| index >= len) {
            return Err(Error::IndexOutOfRange { index, len });
        }
        Ok(sorted)
    }
}
