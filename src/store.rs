//! Pluggable persistence for a roster.
//!
//! The engine owns no file or wire format; a [`Store`] collaborator loads
//! the initial sequence once and receives a full snapshot after every
//! committed batch. In-memory state is authoritative: persistence is
//! best-effort, and a failed save never rolls back a commit.

use crate::{Error, Result, Version};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Persistence collaborator contract.
///
/// `load` returns the initial sequence; `save` receives a full snapshot
/// plus the commit version it belongs to. Implementors that persist in
/// the background must hand completed versions back through the same
/// monotonic ordering they were issued in, or rely on [`SaveGate`] to
/// discard stale completions.
pub trait Store<T>: Send {
    /// Load the initial sequence, or fail with [`Error::Load`].
    fn load(&mut self) -> Result<Vec<T>>;

    /// Persist a full snapshot for `version`, or fail with [`Error::Save`].
    fn save(&mut self, items: &[T], version: Version) -> Result<()>;
}

/// What to do when the initial `load` fails.
///
/// A documented policy is required; there is no silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Treat a failed load as an empty roster and mark the editor loaded.
    StartEmpty,
    /// Propagate the load error; the editor stays unloaded so the caller
    /// can retry.
    Propagate,
}

/// Two-state load machine: unloaded until the first successful (possibly
/// empty) load, loaded forever after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loaded,
}

/// Monotonic admission gate for completed saves.
///
/// A save completing for a version at or below the newest version already
/// admitted is discarded, so an old snapshot can never overwrite a newer
/// one when saves race with subsequent fast edits.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveGate {
    latest: Option<Version>,
}

impl SaveGate {
    /// Create a gate that has admitted nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `version` if it is newer than everything admitted so far.
    pub fn admit(&mut self, version: Version) -> bool {
        match self.latest {
            Some(latest) if version <= latest => false,
            _ => {
                self.latest = Some(version);
                true
            }
        }
    }

    /// Newest version admitted so far.
    pub fn latest(&self) -> Option<Version> {
        self.latest
    }
}

/// Owns the store collaborator and the load/save state machine on behalf
/// of a [`crate::BatchEditor`].
pub struct StoreAdapter<T> {
    store: Box<dyn Store<T>>,
    policy: LoadPolicy,
    state: LoadState,
    gate: SaveGate,
    on_save_error: Option<Box<dyn FnMut(&Error) + Send>>,
}

impl<T> StoreAdapter<T> {
    /// Wrap a store collaborator with the given load-failure policy.
    pub fn new(store: impl Store<T> + 'static, policy: LoadPolicy) -> Self {
        Self {
            store: Box::new(store),
            policy,
            state: LoadState::Unloaded,
            gate: SaveGate::new(),
            on_save_error: None,
        }
    }

    /// Register the error channel for save failures. Save errors never
    /// fail or roll back a commit; this callback is how they surface.
    pub fn on_save_error(&mut self, callback: impl FnMut(&Error) + Send + 'static) {
        self.on_save_error = Some(Box::new(callback));
    }

    /// Current load state.
    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Perform the initial load if it has not happened yet.
    ///
    /// Returns `Some(items)` when this call performed the load (the items
    /// may be empty), `None` when the adapter was already loaded.
    pub fn ensure_loaded(&mut self) -> Result<Option<Vec<T>>> {
        if self.state == LoadState::Loaded {
            return Ok(None);
        }
        match self.store.load() {
            Ok(items) => {
                debug!(count = items.len(), "initial load complete");
                self.state = LoadState::Loaded;
                Ok(Some(items))
            }
            Err(err) => match self.policy {
                LoadPolicy::StartEmpty => {
                    warn!(%err, "initial load failed, starting empty");
                    self.state = LoadState::Loaded;
                    Ok(Some(Vec::new()))
                }
                LoadPolicy::Propagate => Err(err),
            },
        }
    }

    /// Persist a committed snapshot, best-effort.
    ///
    /// Stale versions are discarded by the gate; failures go to the error
    /// channel and the log, never to the caller.
    pub fn save_commit(&mut self, items: &[T], version: Version) {
        if !self.gate.admit(version) {
            warn!(version, latest = ?self.gate.latest(), "discarding stale save");
            return;
        }
        if let Err(err) = self.store.save(items, version) {
            error!(version, %err, "save failed, in-memory state unaffected");
            if let Some(callback) = &mut self.on_save_error {
                callback(&err);
            }
        }
    }
}

impl<T> std::fmt::Debug for StoreAdapter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct MemoryInner<T> {
    items: Vec<T>,
    saved_version: Option<Version>,
    fail_next_load: Option<String>,
    fail_next_save: Option<String>,
}

/// In-memory store, the reference [`Store`] implementation.
///
/// Cheaply cloneable; clones share contents, so tests can keep a handle
/// to inspect what the editor persisted. Load and save failures can be
/// injected one call at a time.
#[derive(Debug)]
pub struct MemoryStore<T> {
    inner: Arc<Mutex<MemoryInner<T>>>,
}

impl<T> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a store pre-seeded with initial contents.
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryInner {
                items,
                saved_version: None,
                fail_next_load: None,
                fail_next_save: None,
            })),
        }
    }

    /// Version of the last accepted save, if any.
    pub fn saved_version(&self) -> Option<Version> {
        self.inner.lock().saved_version
    }

    /// Make the next `load` fail with the given message.
    pub fn fail_next_load(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_load = Some(message.into());
    }

    /// Make the next `save` fail with the given message.
    pub fn fail_next_save(&self, message: impl Into<String>) {
        self.inner.lock().fail_next_save = Some(message.into());
    }
}

impl<T: Clone> MemoryStore<T> {
    /// Snapshot of the currently persisted contents.
    pub fn saved_items(&self) -> Vec<T> {
        self.inner.lock().items.clone()
    }
}

impl<T: Clone + Send> Store<T> for MemoryStore<T> {
    fn load(&mut self) -> Result<Vec<T>> {
        let mut inner = self.inner.lock();
        if let Some(message) = inner.fail_next_load.take() {
            return Err(Error::Load(message));
        }
        Ok(inner.items.clone())
    }

    fn save(&mut self, items: &[T], version: Version) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(message) = inner.fail_next_save.take() {
            return Err(Error::Save(message));
        }
        inner.items = items.to_vec();
        inner.saved_version = Some(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_monotonic() {
        let mut gate = SaveGate::new();
        assert!(gate.admit(1));
        assert!(gate.admit(3));
        assert!(!gate.admit(2));
        assert!(!gate.admit(3));
        assert!(gate.admit(4));
        assert_eq!(gate.latest(), Some(4));
    }

    #[test]
    fn ensure_loaded_once() {
        let store = MemoryStore::with_items(vec!["a".to_string()]);
        let mut adapter = StoreAdapter::new(store, LoadPolicy::Propagate);

        assert_eq!(adapter.state(), LoadState::Unloaded);
        let items = adapter.ensure_loaded().unwrap();
        assert_eq!(items, Some(vec!["a".to_string()]));
        assert_eq!(adapter.state(), LoadState::Loaded);

        // Second call is a no-op.
        assert_eq!(adapter.ensure_loaded().unwrap(), None);
    }

    #[test]
    fn empty_load_still_flips_to_loaded() {
        let store: MemoryStore<String> = MemoryStore::new();
        let mut adapter = StoreAdapter::new(store, LoadPolicy::Propagate);

        assert_eq!(adapter.ensure_loaded().unwrap(), Some(vec![]));
        assert_eq!(adapter.state(), LoadState::Loaded);
    }

    #[test]
    fn load_failure_propagates_and_stays_unloaded() {
        let store: MemoryStore<String> = MemoryStore::new();
        store.fail_next_load("backend offline");
        let mut adapter = StoreAdapter::new(store, LoadPolicy::Propagate);

        let result = adapter.ensure_loaded();
        assert_eq!(result, Err(Error::Load("backend offline".into())));
        assert_eq!(adapter.state(), LoadState::Unloaded);

        // Retry succeeds once the backend recovers.
        assert_eq!(adapter.ensure_loaded().unwrap(), Some(vec![]));
    }

    #[test]
    fn load_failure_starts_empty_under_policy() {
        let store: MemoryStore<String> = MemoryStore::with_items(vec!["a".into()]);
        store.fail_next_load("backend offline");
        let mut adapter = StoreAdapter::new(store, LoadPolicy::StartEmpty);

        assert_eq!(adapter.ensure_loaded().unwrap(), Some(vec![]));
        assert_eq!(adapter.state(), LoadState::Loaded);
    }

    #[test]
    fn stale_save_is_discarded() {
        let store: MemoryStore<String> = MemoryStore::new();
        let inspect = store.clone();
        let mut adapter = StoreAdapter::new(store, LoadPolicy::Propagate);

        adapter.save_commit(&["new".to_string()], 2);
        adapter.save_commit(&["old".to_string()], 1);

        assert_eq!(inspect.saved_items(), vec!["new".to_string()]);
        assert_eq!(inspect.saved_version(), Some(2));
    }

    #[test]
    fn save_failure_reaches_error_channel() {
        let store: MemoryStore<String> = MemoryStore::new();
        store.fail_next_save("disk full");
        let mut adapter = StoreAdapter::new(store, LoadPolicy::Propagate);

        let seen: Arc<Mutex<Vec<Error>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        adapter.on_save_error(move |err| sink.lock().push(err.clone()));

        adapter.save_commit(&["a".to_string()], 1);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], Error::Save("disk full".into()));
    }

    #[test]
    fn save_load_roundtrip() {
        let store: MemoryStore<String> = MemoryStore::new();
        let mut handle = store.clone();
        handle
            .save(&["a".to_string(), "b".to_string()], 1)
            .unwrap();

        let loaded = store.clone().load().unwrap();
        assert_eq!(loaded, vec!["a".to_string(), "b".to_string()]);
    }
}
