//! Shared handles over one batch editor.
//!
//! A [`SharedEditor`] is a cloneable handle that serializes edits across
//! threads and turns a same-thread nested edit (from inside mutation logic
//! or an observer) into [`Error::ReentrantEdit`] instead of a deadlock.
//! Every consumer of a handle observes identical committed state.
//!
//! A [`RosterView`] is a read-oriented consumer of a handle: it caches the
//! last commit version it has seen and re-pulls contents only when the
//! version moved, with no global notification channel involved.

use crate::{Batch, BatchEditor, ChangeSet, Error, Identity, ObserverId, Result, Version};
use parking_lot::ReentrantMutex;
use std::cell::{Cell, RefCell};
use std::hash::Hash;
use std::sync::Arc;

/// Cloneable, thread-safe handle to a [`BatchEditor`].
///
/// Read methods perform the lazy initial load when a store adapter is
/// attached, so the first access through any handle populates the roster.
pub struct SharedEditor<T: Identity, K = String> {
    inner: Arc<ReentrantMutex<RefCell<BatchEditor<T, K>>>>,
}

impl<T: Identity, K> Clone for SharedEditor<T, K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, K> SharedEditor<T, K>
where
    T: Identity + Clone,
    K: Eq + Hash + Clone,
{
    /// Wrap an editor in a shared handle.
    pub fn new(editor: BatchEditor<T, K>) -> Self {
        Self {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(editor))),
        }
    }

    /// Execute one atomic batch. See [`BatchEditor::edit`].
    ///
    /// Edits through clones of this handle are mutually exclusive; a
    /// nested call from the same thread fails [`Error::ReentrantEdit`]
    /// without mutating anything.
    pub fn edit<F>(&self, mutation: F) -> Result<ChangeSet<T>>
    where
        F: FnOnce(&mut Batch<'_, T>) -> Result<()>,
    {
        self.with_editor(|editor| editor.edit(mutation))?
    }

    /// Apply an external reorder request. See [`BatchEditor::reorder`].
    pub fn reorder(&self, origins: &[usize], destination: usize) -> Result<ChangeSet<T>> {
        self.with_editor(|editor| editor.reorder(origins, destination))?
    }

    /// Perform the initial store load if one is pending.
    pub fn ensure_loaded(&self) -> Result<()> {
        self.with_editor(|editor| editor.ensure_loaded())?
    }

    /// Number of items in the committed roster.
    pub fn len(&self) -> Result<usize> {
        self.read(|editor| editor.roster().len())
    }

    /// Whether the committed roster is empty.
    pub fn is_empty(&self) -> Result<bool> {
        self.read(|editor| editor.roster().is_empty())
    }

    /// Clone of the item at `index`.
    pub fn get(&self, index: usize) -> Result<T> {
        self.read(|editor| editor.roster().get(index).cloned())?
    }

    /// Defensive snapshot of the committed sequence.
    pub fn items(&self) -> Result<Vec<T>> {
        self.read(|editor| editor.roster().to_vec())
    }

    /// Number of committed batches so far.
    pub fn version(&self) -> Result<Version> {
        self.read(|editor| editor.version())
    }

    /// Clone of the first item whose indexed key equals `value`.
    pub fn first_where(&self, name: &str, value: &K) -> Result<Option<T>> {
        self.read(|editor| editor.first_where(name, value).cloned())
    }

    /// Register (or replace) a key index. See [`BatchEditor::register_index`].
    pub fn register_index(
        &self,
        name: impl Into<String>,
        extractor: impl Fn(&T) -> K + Send + 'static,
    ) -> Result<()> {
        self.with_editor(|editor| editor.register_index(name, extractor))
    }

    /// Remove the first item whose indexed key equals `value`.
    pub fn remove_first_where(&self, name: &str, value: &K) -> Result<bool> {
        self.with_editor(|editor| editor.remove_first_where(name, value))?
    }

    /// Replace the first item whose indexed key equals `value`.
    pub fn replace_first_where(
        &self,
        name: &str,
        value: &K,
        transform: impl FnOnce(&T) -> T,
    ) -> Result<Option<T>> {
        self.with_editor(|editor| editor.replace_first_where(name, value, transform))?
    }

    /// Register an observer. See [`BatchEditor::observe`].
    pub fn observe(
        &self,
        observer: impl FnMut(&ChangeSet<T>) + Send + 'static,
    ) -> Result<ObserverId> {
        self.with_editor(|editor| editor.observe(observer))
    }

    /// Unregister an observer.
    pub fn unobserve(&self, id: ObserverId) -> Result<bool> {
        self.with_editor(|editor| editor.unobserve(id))
    }

    fn with_editor<R>(&self, f: impl FnOnce(&mut BatchEditor<T, K>) -> R) -> Result<R> {
        let guard = self.inner.lock();
        let mut editor = guard.try_borrow_mut().map_err(|_| Error::ReentrantEdit)?;
        Ok(f(&mut editor))
    }

    fn read<R>(&self, f: impl FnOnce(&BatchEditor<T, K>) -> R) -> Result<R> {
        self.with_editor(|editor| {
            editor.ensure_loaded()?;
            Ok(f(editor))
        })?
    }
}

impl<T: Identity, K> std::fmt::Debug for SharedEditor<T, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEditor").finish_non_exhaustive()
    }
}

/// Pull-on-demand consumer view over a shared editor.
///
/// Holds an explicit handle plus the last-seen commit version; callers
/// poll [`Self::changed`] and pull a fresh snapshot only when something
/// committed since the last pull.
#[derive(Debug)]
pub struct RosterView<T: Identity, K = String> {
    editor: SharedEditor<T, K>,
    seen: Cell<Option<Version>>,
}

impl<T, K> RosterView<T, K>
where
    T: Identity + Clone,
    K: Eq + Hash + Clone,
{
    /// Create a view that has seen nothing yet; the first
    /// [`Self::changed`] reports `true`.
    pub fn new(editor: SharedEditor<T, K>) -> Self {
        Self {
            editor,
            seen: Cell::new(None),
        }
    }

    /// Whether anything committed since the last [`Self::snapshot`].
    pub fn changed(&self) -> Result<bool> {
        let current = self.editor.version()?;
        Ok(self.seen.get() != Some(current))
    }

    /// Pull a fresh snapshot and remember the version it reflects.
    pub fn snapshot(&self) -> Result<Vec<T>> {
        let version = self.editor.version()?;
        let items = self.editor.items()?;
        self.seen.set(Some(version));
        Ok(items)
    }

    /// The commit version of the last snapshot pulled, if any.
    pub fn seen_version(&self) -> Option<Version> {
        self.seen.get()
    }
}
