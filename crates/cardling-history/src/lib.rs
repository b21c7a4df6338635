//! cardling-history: snapshot-based undo/redo for a live scene.
//!
//! Design rules:
//! - History only grows when a capture differs from the current snapshot.
//! - A fresh edit always invalidates redo.
//! - Captures are suppressed while an undo/redo is loading into the scene.
//! - A second undo/redo during a load is rejected, never interleaved.

pub mod error;
pub mod manager;
pub mod stack;

pub use error::HistoryError;
pub use manager::{DEFAULT_HISTORY_LIMIT, HistoryManager, RecordOutcome, WeakHistoryManager};
pub use stack::HistoryStack;
