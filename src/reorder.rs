//! Translation of external reorder requests into a single move.
//!
//! Drag-and-drop style UIs report a set of origin indices plus one
//! destination index, both addressing the sequence before anything moved.
//! [`Batch::move_to`](crate::Batch::move_to) instead takes its destination
//! against the post-removal sequence, so the destination must be adjusted
//! downward by the number of origins that sat strictly before it. Doing
//! this translation in one place avoids the classic off-by-one where
//! removing preceding items shifts the intended insertion point.

use crate::{BatchEditor, ChangeSet, Identity, Result};
use std::hash::Hash;

/// A reorder request translated into `move_to` terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder {
    /// Origin indices, deduplicated and ascending.
    pub origins: Vec<usize>,
    /// Destination index against the post-removal sequence.
    pub destination: usize,
}

/// Translate a pre-removal reorder request into a [`Reorder`].
///
/// `destination` addresses the original sequence; the returned destination
/// addresses the sequence with the origins removed. The moved items keep
/// their relative order.
pub fn translate(origins: &[usize], destination: usize) -> Reorder {
    let mut sorted: Vec<usize> = origins.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let preceding = sorted.iter().filter(|&&origin| origin < destination).count();
    Reorder {
        origins: sorted,
        destination: destination - preceding,
    }
}

impl<T, K> BatchEditor<T, K>
where
    T: Identity + Clone,
    K: Eq + Hash + Clone,
{
    /// Apply an external reorder request as one move batch.
    ///
    /// `destination` addresses the sequence before removal, as produced
    /// by drag-and-drop UIs. Move-only batches yield an empty change set.
    pub fn reorder(&mut self, origins: &[usize], destination: usize) -> Result<ChangeSet<T>> {
        let reorder = translate(origins, destination);
        self.edit(|batch| batch.move_to(&reorder.origins, reorder.destination))
    }
}
