//! Snapshot type for hosts that persist roster state themselves.
//!
//! The engine performs no IO. A [`RosterSnapshot`] is the serialization
//! bridge: a [`crate::Store`] implementation (or the host directly) can
//! turn it into JSON and back, with items kept in collection order so the
//! output is deterministic.

use crate::{Error, Result, Version};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of a roster and its commit version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSnapshot<T> {
    /// Snapshot format version.
    pub format_version: u32,
    /// Commit version of the editor at snapshot time.
    pub version: Version,
    /// The full sequence, in collection order.
    pub items: Vec<T>,
}

impl<T> RosterSnapshot<T> {
    /// Capture a snapshot of the given sequence at `version`.
    pub fn new(items: Vec<T>, version: Version) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            version,
            items,
        }
    }

    /// Number of items captured.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot captured an empty roster.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> RosterSnapshot<T> {
    /// Serialize to JSON in collection order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Save(e.to_string()))
    }

    /// Serialize to pretty JSON in collection order.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Save(e.to_string()))
    }
}

impl<T: for<'de> Deserialize<'de>> RosterSnapshot<T> {
    /// Deserialize from JSON, rejecting snapshots written by a newer
    /// format than this build understands.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json).map_err(|e| Error::Load(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::Load(format!(
                "unsupported snapshot format version: {} (max supported: {})",
                snapshot.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }

        Ok(snapshot)
    }
}
