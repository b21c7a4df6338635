//! Immutable whole-scene snapshots.
//!
//! A [`Snapshot`] is a value: two snapshots are equal when their scene trees are
//! structurally equal, independent of how they were encoded. The JSON text form is
//! only used for transport and storage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Size;
use crate::scene::{Background, ObjectId, SceneObject};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors converting between live scenes and snapshots
#[derive(Debug, Error)]
pub enum SnapshotCodecError {
    #[error("object {0} has non-finite geometry")]
    NonFinite(ObjectId),

    #[error("canvas size is not finite")]
    NonFiniteCanvas,

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// The entire scene at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    background: Option<Background>,
    objects: Vec<SceneObject>,
}

impl Snapshot {
    /// Build a snapshot, rejecting non-finite geometry
    pub fn new(
        size: Size,
        background: Option<Background>,
        objects: Vec<SceneObject>,
    ) -> Result<Self, SnapshotCodecError> {
        let snapshot = Self {
            version: SNAPSHOT_VERSION,
            size,
            background,
            objects,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// An empty scene of the given size
    pub fn empty(size: Size) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            size,
            background: None,
            objects: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Copy of this snapshot carrying `background`
    pub fn with_background(&self, background: Background) -> Self {
        Self {
            background: Some(background),
            ..self.clone()
        }
    }

    /// Check every number in the scene is finite
    pub fn validate(&self) -> Result<(), SnapshotCodecError> {
        if !self.size.is_finite() {
            return Err(SnapshotCodecError::NonFiniteCanvas);
        }
        match self.objects.iter().find(|o| !o.is_finite()) {
            Some(bad) => Err(SnapshotCodecError::NonFinite(bad.id)),
            None => Ok(()),
        }
    }

    /// Encode to JSON text
    pub fn to_json(&self) -> Result<String, SnapshotCodecError> {
        self.validate()?;
        serde_json::to_string(self).map_err(SnapshotCodecError::Encode)
    }

    /// Decode from JSON text
    pub fn from_json(text: &str) -> Result<Self, SnapshotCodecError> {
        let snapshot: Snapshot = serde_json::from_str(text).map_err(SnapshotCodecError::Decode)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotCodecError::UnsupportedVersion(snapshot.version));
        }
        snapshot.validate()?;
        Ok(snapshot)
    }
}
