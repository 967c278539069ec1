//! # Roster Engine
//!
//! A batch mutation engine for in-memory ordered collections.
//!
//! This crate provides the core logic for editing an ordered collection
//! through atomic batches, deriving a precise change summary from every
//! batch, keeping secondary key indexes exactly synchronized with the
//! collection, and persisting contents through a pluggable store.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Derived, never reported**: what a batch changed is computed from the
//!   before/after sequences, callers never describe their own edits
//! - **Atomic batches**: a batch commits in full or not at all
//! - **Authoritative memory**: persistence is best-effort and version-gated;
//!   a failed save never affects committed state
//!
//! ## Core Concepts
//!
//! ### Items and identity
//!
//! Items are opaque to the engine. The [`Identity`] trait supplies a stable
//! identity per item; identity presence, not value equality, decides what a
//! batch added or removed. Moved items keep their identity and therefore
//! never show up in a change set.
//!
//! ### Batches
//!
//! All mutation goes through [`BatchEditor::edit`], which hands the caller
//! a restricted [`Batch`] capability: append, insert, remove, replace,
//! move, replace-all. Any error aborts the whole batch and restores the
//! pre-batch sequence.
//!
//! ### Change sets
//!
//! Each committed batch yields a [`ChangeSet`]: added items, removed items,
//! and the `(before, after)` pairs of explicit replacements. Replacement is
//! an operation-level fact; a remove plus an add at the same position is
//! never inferred to be one.
//!
//! ### Indexes
//!
//! [`BatchEditor::register_index`] registers a key extractor; the resulting
//! index is maintained incrementally from change-set deltas and exactly
//! mirrors the collection after every commit. Lookups resolve in collection
//! order.
//!
//! ### Persistence
//!
//! A [`Store`] collaborator loads initial contents lazily and receives a
//! full snapshot after every commit, gated by [`SaveGate`] so a stale save
//! can never clobber a newer one. [`RosterSnapshot`] is the JSON bridge for
//! hosts that persist snapshots themselves.
//!
//! ## Quick Start
//!
//! ```rust
//! use roster_engine::{BatchEditor, Identity};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Track {
//!     id: u64,
//!     artist: String,
//! }
//!
//! impl Identity for Track {
//!     type Id = u64;
//!     fn identity(&self) -> u64 {
//!         self.id
//!     }
//! }
//!
//! let mut editor: BatchEditor<Track> = BatchEditor::new();
//! editor.register_index("artist", |t: &Track| t.artist.clone());
//!
//! let change = editor
//!     .edit(|batch| {
//!         batch.append(vec![
//!             Track { id: 1, artist: "Ada".into() },
//!             Track { id: 2, artist: "Bo".into() },
//!         ]);
//!         batch.move_to(&[1], 0)
//!     })
//!     .unwrap();
//!
//! assert_eq!(change.added.len(), 2);
//! assert_eq!(editor.roster().get(0).unwrap().id, 2);
//! assert_eq!(editor.first_where("artist", &"Ada".to_string()).unwrap().id, 1);
//! ```
//!
//! ## Sharing
//!
//! [`SharedEditor`] is a cloneable handle that serializes edits across
//! threads and reports a same-thread nested edit as
//! [`Error::ReentrantEdit`]; [`RosterView`] pulls fresh contents on demand
//! by comparing commit versions.

pub mod changeset;
pub mod collection;
pub mod editor;
pub mod error;
pub mod index;
pub mod reorder;
pub mod shared;
pub mod snapshot;
pub mod store;

// Re-export main types at crate root
pub use changeset::ChangeSet;
pub use collection::{Identity, Roster};
pub use editor::{Batch, BatchEditor, KeyQuery, ObserverId};
pub use error::{Error, Result};
pub use index::{KeyExtractor, KeyIndex};
pub use reorder::Reorder;
pub use shared::{RosterView, SharedEditor};
pub use snapshot::{RosterSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use store::{LoadPolicy, LoadState, MemoryStore, SaveGate, Store, StoreAdapter};

/// Commit version: the number of batches committed so far.
pub type Version = u64;
