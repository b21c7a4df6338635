//! Undo/redo manager over whole-scene snapshots.
//!
//! The manager keeps the snapshot the scene is believed to be in (`current`) plus
//! bounded undo and redo stacks. Undo/redo hand a snapshot to the [`SceneEngine`] to
//! load asynchronously; loading mutates the scene, which fires the same change
//! notifications a user edit would. While that load is in flight the manager is
//! locked so those notifications cannot record the restored state as a new edit.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cardling_core::{Background, SceneEngine, Snapshot, SnapshotCodecError};
use tracing::{debug, trace, warn};

use crate::error::HistoryError;
use crate::stack::HistoryStack;

/// Default number of entries kept on each stack
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Result of a [`HistoryManager::record`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The scene changed and the previous state was pushed onto the undo stack
    Recorded,
    /// The captured scene equals the current snapshot
    Unchanged,
    /// An undo/redo is being applied; capture skipped
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

struct HistoryState {
    engine: Arc<dyn SceneEngine>,
    current: Snapshot,
    undo: HistoryStack,
    redo: HistoryStack,
    locked: bool,
    /// Background restored by the last undo/redo, carried into captures that come
    /// back without one
    pending_background: Option<Background>,
}

/// Snapshot history bound to one scene engine.
///
/// Cloning yields another handle to the same history.
#[derive(Clone)]
pub struct HistoryManager {
    inner: Arc<Mutex<HistoryState>>,
}

/// Non-owning handle, for wiring change listeners without a reference cycle
#[derive(Clone)]
pub struct WeakHistoryManager {
    inner: Weak<Mutex<HistoryState>>,
}

impl WeakHistoryManager {
    pub fn upgrade(&self) -> Option<HistoryManager> {
        self.inner.upgrade().map(|inner| HistoryManager { inner })
    }
}

/// Releases the apply lock when dropped, whichever way the apply ends
struct ApplyGuard {
    inner: Arc<Mutex<HistoryState>>,
}

impl Drop for ApplyGuard {
    fn drop(&mut self) {
        lock_state(&self.inner).locked = false;
        trace!("history unlocked");
    }
}

fn lock_state(inner: &Mutex<HistoryState>) -> MutexGuard<'_, HistoryState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn capture(state: &mut HistoryState) -> Result<RecordOutcome, SnapshotCodecError> {
    if state.locked {
        trace!("capture suppressed while applying snapshot");
        return Ok(RecordOutcome::Suppressed);
    }

    let mut candidate = state.engine.serialize_scene()?;
    if candidate.background().is_some() {
        // The scene reports its own background again; stop carrying the restored one
        state.pending_background = None;
    } else if let Some(background) = &state.pending_background {
        candidate = candidate.with_background(background.clone());
    }

    if candidate == state.current {
        return Ok(RecordOutcome::Unchanged);
    }

    let previous = std::mem::replace(&mut state.current, candidate);
    if state.undo.push(previous).is_some() {
        debug!(limit = state.undo.limit(), "oldest undo entry evicted");
    }
    state.redo.clear();
    debug!(undo = state.undo.len(), "history recorded");
    Ok(RecordOutcome::Recorded)
}

impl HistoryManager {
    /// Bind a new history to `engine` with the default limit
    pub fn new(engine: Arc<dyn SceneEngine>) -> Result<Self, SnapshotCodecError> {
        Self::with_limit(engine, DEFAULT_HISTORY_LIMIT)
    }

    /// Bind a new history to `engine`, keeping at most `limit` entries per stack
    pub fn with_limit(
        engine: Arc<dyn SceneEngine>,
        limit: usize,
    ) -> Result<Self, SnapshotCodecError> {
        let current = engine.serialize_scene()?;
        let manager = Self {
            inner: Arc::new(Mutex::new(HistoryState {
                engine,
                current,
                undo: HistoryStack::new(limit),
                redo: HistoryStack::new(limit),
                locked: false,
                pending_background: None,
            })),
        };

        // Baseline capture; nothing has changed yet so this never pushes
        capture(&mut manager.state())?;
        Ok(manager)
    }

    fn state(&self) -> MutexGuard<'_, HistoryState> {
        lock_state(&self.inner)
    }

    pub fn downgrade(&self) -> WeakHistoryManager {
        WeakHistoryManager {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Rebind to a different engine instance (e.g. a recreated canvas)
    pub fn attach(&self, engine: Arc<dyn SceneEngine>) {
        let mut state = self.state();
        if state.locked {
            warn!("attaching a new scene engine while an undo/redo is in flight");
        }
        state.engine = engine;
        debug!("scene engine attached");
    }

    /// Capture the live scene after an edit.
    ///
    /// On a codec error nothing is changed and the error is returned so the caller
    /// can warn; editing can continue.
    pub fn record(&self) -> Result<RecordOutcome, HistoryError> {
        Ok(capture(&mut self.state())?)
    }

    /// Step back one edit. Returns `Ok(false)` when there is nothing to undo.
    pub async fn undo(&self) -> Result<bool, HistoryError> {
        self.transfer(Direction::Undo, || {}).await
    }

    /// Step forward one undone edit. Returns `Ok(false)` when there is nothing to redo.
    pub async fn redo(&self) -> Result<bool, HistoryError> {
        self.transfer(Direction::Redo, || {}).await
    }

    /// Like [`undo`](Self::undo), running `on_complete` after the scene has loaded
    /// and before the history unlocks
    pub async fn undo_then<F>(&self, on_complete: F) -> Result<bool, HistoryError>
    where
        F: FnOnce() + Send,
    {
        self.transfer(Direction::Undo, on_complete).await
    }

    /// Like [`redo`](Self::redo), running `on_complete` after the scene has loaded
    /// and before the history unlocks
    pub async fn redo_then<F>(&self, on_complete: F) -> Result<bool, HistoryError>
    where
        F: FnOnce() + Send,
    {
        self.transfer(Direction::Redo, on_complete).await
    }

    async fn transfer<F>(&self, direction: Direction, on_complete: F) -> Result<bool, HistoryError>
    where
        F: FnOnce() + Send,
    {
        let (engine, target, guard) = {
            let mut locked_state = self.state();
            let state = &mut *locked_state;
            if state.locked {
                return Err(HistoryError::Busy);
            }

            let (source, destination) = match direction {
                Direction::Undo => (&mut state.undo, &mut state.redo),
                Direction::Redo => (&mut state.redo, &mut state.undo),
            };
            let Some(target) = source.pop() else {
                return Ok(false);
            };

            let displaced = std::mem::replace(&mut state.current, target.clone());
            destination.push(displaced);
            state.pending_background = target.background().cloned();
            state.locked = true;
            debug!(
                ?direction,
                undo = state.undo.len(),
                redo = state.redo.len(),
                "applying snapshot"
            );

            let apply = ApplyGuard {
                inner: self.inner.clone(),
            };
            (state.engine.clone(), target, apply)
        };

        match engine.replace_scene(&target).await {
            Ok(()) => {
                on_complete();
                drop(guard);
                engine.force_redraw();
                Ok(true)
            }
            Err(e) => {
                drop(guard);
                warn!(?direction, error = %e, "scene engine failed to load snapshot");
                Err(e.into())
            }
        }
    }

    /// Drop all undo and redo entries, keeping the current snapshot
    pub fn clear(&self) {
        let mut state = self.state();
        state.undo.clear();
        state.redo.clear();
    }

    /// The snapshot the scene is believed to be in
    pub fn current(&self) -> Snapshot {
        self.state().current.clone()
    }

    pub fn can_undo(&self) -> bool {
        !self.state().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.state().redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.state().undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.state().redo.len()
    }

    /// True while an undo/redo is being applied
    pub fn is_locked(&self) -> bool {
        self.state().locked
    }

    pub fn limit(&self) -> usize {
        self.state().undo.limit()
    }

    /// Background restored by the last undo/redo, merged into captures that lack one
    pub fn pending_background(&self) -> Option<Background> {
        self.state().pending_background.clone()
    }

    /// Undo entries, oldest first
    pub fn undo_snapshots(&self) -> Vec<Snapshot> {
        self.state().undo.iter().cloned().collect()
    }

    /// Redo entries, oldest first
    pub fn redo_snapshots(&self) -> Vec<Snapshot> {
        self.state().redo.iter().cloned().collect()
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("HistoryManager")
            .field("undo", &state.undo.len())
            .field("redo", &state.redo.len())
            .field("locked", &state.locked)
            .finish()
    }
}
