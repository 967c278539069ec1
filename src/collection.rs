//! The ordered collection and the identity contract its items satisfy.
//!
//! A [`Roster`] is a dense sequence of items: indices are `0..len` at all
//! times between batches, and order is externally observable. The roster
//! itself exposes only read queries; every mutation goes through a
//! [`crate::BatchEditor`] batch so that commits stay atomic and the derived
//! change set stays accurate.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Stable identity for items held in a roster.
///
/// Identity, not value equality, decides what a batch did: an item whose
/// identity survives a batch was kept (or moved), one whose identity
/// disappeared was removed. Identities must be stable for the duration of
/// a batch; the engine never inspects item internals beyond this.
///
/// Duplicate identities are allowed. The diff operates on identity
/// presence, so removing one of two copies sharing an identity reports no
/// removal.
pub trait Identity {
    /// The identity type extracted from an item.
    type Id: Clone + Eq + Hash;

    /// Extract this item's identity.
    fn identity(&self) -> Self::Id;
}

macro_rules! self_identity {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                type Id = $ty;

                fn identity(&self) -> $ty {
                    self.clone()
                }
            }
        )*
    };
}

// Self-identifying primitives, convenient for tests and simple rosters.
self_identity!(String, char, i32, i64, u32, u64, usize);

/// An ordered collection of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster<T> {
    items: Vec<T>,
}

impl<T> Default for Roster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Roster<T> {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a roster from an existing sequence.
    pub fn from_items(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether the roster holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the item at `index`, or [`Error::IndexOutOfRange`].
    pub fn get(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Get items at the given indices, in the order of the given indices.
    ///
    /// Fails on the first out-of-range index without returning a partial
    /// result.
    pub fn get_many(&self, indices: &[usize]) -> Result<Vec<&T>> {
        indices.iter().map(|&i| self.get(i)).collect()
    }

    /// First item matching `predicate`, in collection order.
    ///
    /// Absence is an expected outcome, so this returns `None` rather than
    /// an error.
    pub fn first_matching(&self, predicate: impl Fn(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    /// Index of the first item matching `predicate`, in collection order.
    pub fn position(&self, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        self.items.iter().position(|item| predicate(item))
    }

    /// Iterate items in collection order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Borrow the backing sequence.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub(crate) fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }
}

impl<T: Clone> Roster<T> {
    /// Defensive snapshot of the current sequence, immune to later
    /// mutation of the live roster.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<'a, T> IntoIterator for &'a Roster<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
