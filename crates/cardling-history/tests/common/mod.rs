#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cardling_core::{SceneEngine, SceneLoadError, Size, Snapshot, SnapshotCodecError};

type LoadHook = Box<dyn Fn() + Send + Sync>;

/// Engine whose scene is set directly by the test
pub struct ScriptedEngine {
    scene: Mutex<Snapshot>,
    fail_capture: AtomicBool,
    fail_load: AtomicBool,
    during_load: Mutex<Option<LoadHook>>,
    pub loads: AtomicUsize,
    pub redraws: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Arc<Self> {
        Self::showing(snap(0))
    }

    pub fn showing(snapshot: Snapshot) -> Arc<Self> {
        Arc::new(Self {
            scene: Mutex::new(snapshot),
            fail_capture: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
            during_load: Mutex::new(None),
            loads: AtomicUsize::new(0),
            redraws: AtomicUsize::new(0),
        })
    }

    /// Simulate a user edit
    pub fn show(&self, snapshot: Snapshot) {
        *self.scene.lock().unwrap() = snapshot;
    }

    pub fn scene(&self) -> Snapshot {
        self.scene.lock().unwrap().clone()
    }

    pub fn fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    /// Run `hook` midway through every load, while the scene is half-built
    pub fn during_load(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.during_load.lock().unwrap() = Some(Box::new(hook));
    }
}

#[async_trait]
impl SceneEngine for ScriptedEngine {
    fn serialize_scene(&self) -> Result<Snapshot, SnapshotCodecError> {
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(SnapshotCodecError::NonFiniteCanvas);
        }
        Ok(self.scene())
    }

    async fn replace_scene(&self, snapshot: &Snapshot) -> Result<(), SceneLoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SceneLoadError::InvalidBackground("scripted failure".into()));
        }

        self.show(Snapshot::empty(Size::new(0.0, 0.0)));
        if let Some(hook) = self.during_load.lock().unwrap().as_ref() {
            hook();
        }
        self.show(snapshot.clone());
        Ok(())
    }

    fn force_redraw(&self) {
        self.redraws.fetch_add(1, Ordering::SeqCst);
    }
}

/// Distinct snapshot number `n`
pub fn snap(n: usize) -> Snapshot {
    Snapshot::empty(Size::new(100.0 + n as f64, 100.0))
}
