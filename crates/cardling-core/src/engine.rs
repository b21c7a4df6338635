//! The contract between history and whatever owns the live scene.

use async_trait::async_trait;
use thiserror::Error;

use crate::scene::ObjectId;
use crate::snapshot::{Snapshot, SnapshotCodecError};

/// The engine could not apply a snapshot to the live scene
#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("object {object} references an unusable image: {reason}")]
    InvalidAsset { object: ObjectId, reason: String },

    #[error("background pattern is unusable: {0}")]
    InvalidBackground(String),

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Owner of a live, mutable scene graph.
///
/// Implementations notify their own listeners when the scene changes, including
/// while `replace_scene` is loading a snapshot.
#[async_trait]
pub trait SceneEngine: Send + Sync {
    /// Capture the live scene. Must be deterministic for an unchanged scene.
    fn serialize_scene(&self) -> Result<Snapshot, SnapshotCodecError>;

    /// Replace the live scene with `snapshot`
    async fn replace_scene(&self, snapshot: &Snapshot) -> Result<(), SceneLoadError>;

    /// Full visual refresh
    fn force_redraw(&self);
}
