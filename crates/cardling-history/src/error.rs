use cardling_core::{SceneLoadError, SnapshotCodecError};
use thiserror::Error;

/// Errors surfaced by [`HistoryManager`](crate::HistoryManager) operations.
///
/// None of these are fatal: the manager stays usable after any of them.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// An undo/redo is still being applied to the scene
    #[error("history is busy applying a previous undo/redo")]
    Busy,

    /// The live scene could not be captured; no history point was added
    #[error(transparent)]
    Codec(#[from] SnapshotCodecError),

    /// The scene engine failed to load the restored snapshot
    #[error(transparent)]
    SceneLoad(#[from] SceneLoadError),
}
