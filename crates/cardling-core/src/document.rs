//! In-memory live scene - THE canvas the editor draws on.
//!
//! Every user edit goes through [`Document`]. It handles:
//! - Object storage and mutation
//! - Change notification to registered listeners
//! - Loading whole snapshots back in (undo/redo), as a [`SceneEngine`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::data_url::{self, DataUrlError};
use crate::engine::{SceneEngine, SceneLoadError};
use crate::geometry::{Bounds, Point, Size, snap_angle, snap_to_center};
use crate::scene::{Background, Brush, ObjectId, ObjectKind, SceneObject, TextStyle};
use crate::snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotCodecError};

/// Scale applied to freshly inserted images
pub const IMAGE_INSERT_SCALE: f64 = 0.5;

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What changed in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(ObjectId),
    Modified(ObjectId),
    Removed(ObjectId),
    Background,
    Cleared,
}

/// Callback invoked synchronously after every scene change
pub type ChangeListener = Arc<dyn Fn(&SceneChange) + Send + Sync>;

/// Handle for removing a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct Scene {
    size: Size,
    background: Option<Background>,
    /// Bottom-to-top z-order
    objects: Vec<SceneObject>,
}

/// The live scene graph
pub struct Document {
    id: DocumentId,
    scene: Mutex<Scene>,
    listeners: Mutex<Vec<(ListenerId, ChangeListener)>>,
    next_listener: AtomicU64,
    redraws: AtomicU64,
}

impl Document {
    /// Create an empty document with the given canvas size
    pub fn new(size: Size) -> Self {
        Self {
            id: DocumentId::new(),
            scene: Mutex::new(Scene {
                size,
                background: None,
                objects: Vec::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            redraws: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    fn scene(&self) -> MutexGuard<'_, Scene> {
        self.scene.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a change listener
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SceneChange) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener, returns false if it was not registered
    pub fn off_change(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Notify listeners. Never called with the scene lock held.
    fn emit(&self, change: SceneChange) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        trace!(?change, listeners = listeners.len(), "scene changed");
        for listener in listeners {
            listener(&change);
        }
    }

    // ========== Queries ==========

    pub fn size(&self) -> Size {
        self.scene().size
    }

    pub fn background(&self) -> Option<Background> {
        self.scene().background.clone()
    }

    /// All objects, bottom to top
    pub fn objects(&self) -> Vec<SceneObject> {
        self.scene().objects.clone()
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.scene().objects.iter().map(|o| o.id).collect()
    }

    pub fn get(&self, id: ObjectId) -> Option<SceneObject> {
        self.scene().objects.iter().find(|o| o.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.scene().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scene().objects.is_empty()
    }

    /// Number of full redraws requested so far
    pub fn redraw_count(&self) -> u64 {
        self.redraws.load(Ordering::Relaxed)
    }

    // ========== Mutations ==========

    /// Add an object on top of the stack
    pub fn add(&self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.scene().objects.push(object);
        self.emit(SceneChange::Added(id));
        id
    }

    /// Add text centered on the canvas
    pub fn add_text(&self, content: impl Into<String>, style: &TextStyle) -> ObjectId {
        let center = self.size().center();
        self.add(SceneObject::new(
            ObjectKind::Text {
                content: content.into(),
                font: style.font.clone(),
                font_size: style.font_size,
                fill: style.fill,
                background: style.background,
            },
            center,
        ))
    }

    /// Add an image centered on the canvas at half scale
    pub fn add_image(
        &self,
        source: String,
        width: f64,
        height: f64,
    ) -> Result<ObjectId, DataUrlError> {
        data_url::parse(&source)?;
        let center = self.size().center();
        let object = SceneObject::new(
            ObjectKind::Image {
                source,
                width,
                height,
            },
            center,
        )
        .with_scale(IMAGE_INSERT_SCALE);
        Ok(self.add(object))
    }

    /// Add a freehand stroke from absolute canvas points
    pub fn add_path(&self, points: &[Point], brush: &Brush) -> Option<ObjectId> {
        let center = Bounds::from_points(points)?.center();
        let relative = points
            .iter()
            .map(|p| Point::new(p.x - center.x, p.y - center.y))
            .collect();
        Some(self.add(SceneObject::new(
            ObjectKind::Path {
                points: relative,
                stroke: brush.color,
                width: brush.width,
            },
            center,
        )))
    }

    /// Remove an object
    pub fn remove(&self, id: ObjectId) -> Option<SceneObject> {
        let removed = {
            let mut scene = self.scene();
            let index = scene.objects.iter().position(|o| o.id == id)?;
            scene.objects.remove(index)
        };
        self.emit(SceneChange::Removed(id));
        Some(removed)
    }

    /// Apply `f` to an object, returns false if it does not exist
    pub fn update<F>(&self, id: ObjectId, f: F) -> bool
    where
        F: FnOnce(&mut SceneObject),
    {
        let found = {
            let mut scene = self.scene();
            match scene.objects.iter_mut().find(|o| o.id == id) {
                Some(object) => {
                    f(object);
                    true
                }
                None => false,
            }
        };
        if found {
            self.emit(SceneChange::Modified(id));
        }
        found
    }

    /// Move an object's center, snapping to the canvas center when close
    pub fn move_to(&self, id: ObjectId, position: Point) -> bool {
        let snapped = snap_to_center(position, self.size());
        self.update(id, |o| o.position = snapped)
    }

    /// Rotate an object, snapping to right angles unless it is a freehand path
    pub fn rotate_to(&self, id: ObjectId, angle: f64) -> bool {
        self.update(id, |o| {
            o.angle = if o.kind.snaps_rotation() {
                snap_angle(angle)
            } else {
                angle
            };
        })
    }

    /// Restyle a text object, returns false for missing or non-text objects
    pub fn restyle_text(&self, id: ObjectId, style: &TextStyle) -> bool {
        let is_text = matches!(
            self.get(id).map(|o| o.kind),
            Some(ObjectKind::Text { .. })
        );
        is_text
            && self.update(id, |o| {
                if let ObjectKind::Text {
                    font,
                    font_size,
                    fill,
                    background,
                    ..
                } = &mut o.kind
                {
                    *font = style.font.clone();
                    *font_size = style.font_size;
                    *fill = style.fill;
                    *background = style.background;
                }
            })
    }

    /// Clone an object and center the copy on the canvas
    pub fn duplicate(&self, id: ObjectId) -> Option<ObjectId> {
        let mut copy = self.get(id)?.duplicate();
        copy.position = self.size().center();
        Some(self.add(copy))
    }

    /// Set or remove the background
    pub fn set_background(&self, background: Option<Background>) {
        self.scene().background = background;
        self.emit(SceneChange::Background);
    }

    /// Remove every object and the background
    pub fn clear(&self) {
        {
            let mut scene = self.scene();
            scene.objects.clear();
            scene.background = None;
        }
        self.emit(SceneChange::Cleared);
    }
}

fn check_asset(source: &str) -> Result<(), String> {
    data_url::parse(source).map(|_| ()).map_err(|e| e.to_string())
}

#[async_trait]
impl SceneEngine for Document {
    fn serialize_scene(&self) -> Result<Snapshot, SnapshotCodecError> {
        let scene = self.scene();
        Snapshot::new(scene.size, scene.background.clone(), scene.objects.clone())
    }

    async fn replace_scene(&self, snapshot: &Snapshot) -> Result<(), SceneLoadError> {
        if snapshot.version() != SNAPSHOT_VERSION {
            return Err(SceneLoadError::UnsupportedVersion(snapshot.version()));
        }
        for object in snapshot.objects() {
            if let ObjectKind::Image { source, .. } = &object.kind {
                check_asset(source).map_err(|reason| SceneLoadError::InvalidAsset {
                    object: object.id,
                    reason,
                })?;
            }
        }
        if let Some(Background::Pattern { source }) = snapshot.background() {
            check_asset(source).map_err(SceneLoadError::InvalidBackground)?;
        }

        // Image decoding happens off the current tick
        tokio::task::yield_now().await;

        {
            let mut scene = self.scene();
            scene.size = snapshot.size();
            scene.objects.clear();
        }
        self.emit(SceneChange::Cleared);

        // Objects are re-added one at a time, each firing a change like any other edit
        for object in snapshot.objects() {
            self.scene().objects.push(object.clone());
            self.emit(SceneChange::Added(object.id));
        }
        self.scene().background = snapshot.background().cloned();
        self.emit(SceneChange::Background);

        debug!(
            document = %self.id,
            objects = snapshot.objects().len(),
            "scene replaced from snapshot"
        );
        Ok(())
    }

    fn force_redraw(&self) {
        let count = self.redraws.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(document = %self.id, count, "redraw");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::color::Color;

    fn doc() -> Document {
        Document::new(Size::new(600.0, 400.0))
    }

    fn png_url() -> String {
        data_url::encode("image/png", b"\x89PNG\r\n")
    }

    #[test]
    fn listeners_see_every_edit() {
        let doc = doc();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = doc.on_change(move |c| sink.lock().unwrap().push(*c));

        let id = doc.add_text("hi", &TextStyle::default());
        doc.move_to(id, Point::new(10.0, 10.0));
        doc.set_background(Some(Background::color(Color::WHITE)));
        doc.remove(id);
        doc.clear();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SceneChange::Added(id),
                SceneChange::Modified(id),
                SceneChange::Background,
                SceneChange::Removed(id),
                SceneChange::Cleared,
            ]
        );

        assert!(doc.off_change(listener));
        assert!(!doc.off_change(listener));
        doc.add_text("quiet", &TextStyle::default());
        assert_eq!(seen.lock().unwrap().len(), 5);
    }

    #[test]
    fn serialize_is_deterministic() {
        let doc = doc();
        doc.add_text("a", &TextStyle::default());
        doc.add_path(
            &[Point::new(0.0, 0.0), Point::new(10.0, 20.0)],
            &Brush::default(),
        );
        assert_eq!(doc.serialize_scene().unwrap(), doc.serialize_scene().unwrap());
    }

    #[test]
    fn serialize_rejects_nan_geometry() {
        let doc = doc();
        let id = doc.add_text("a", &TextStyle::default());
        doc.update(id, |o| o.scale = f64::NAN);
        assert!(matches!(
            doc.serialize_scene(),
            Err(SnapshotCodecError::NonFinite(bad)) if bad == id
        ));
    }

    #[test]
    fn path_points_are_stored_relative_to_center() {
        let doc = doc();
        let id = doc
            .add_path(
                &[Point::new(10.0, 10.0), Point::new(30.0, 50.0)],
                &Brush::default(),
            )
            .unwrap();
        let object = doc.get(id).unwrap();
        assert_eq!(object.position, Point::new(20.0, 30.0));
        match object.kind {
            ObjectKind::Path { points, .. } => {
                assert_eq!(points, vec![Point::new(-10.0, -20.0), Point::new(10.0, 20.0)]);
            }
            other => panic!("expected path, got {other:?}"),
        }
        assert!(doc.add_path(&[], &Brush::default()).is_none());
    }

    #[test]
    fn rotation_snaps_except_for_paths() {
        let doc = doc();
        let text = doc.add_text("a", &TextStyle::default());
        let path = doc
            .add_path(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)], &Brush::default())
            .unwrap();
        doc.rotate_to(text, 93.0);
        doc.rotate_to(path, 93.0);
        assert_eq!(doc.get(text).unwrap().angle, 90.0);
        assert_eq!(doc.get(path).unwrap().angle, 93.0);
    }

    #[test]
    fn duplicate_and_images_land_in_the_center() {
        let doc = doc();
        let image = doc.add_image(png_url(), 200.0, 100.0).unwrap();
        let obj = doc.get(image).unwrap();
        assert_eq!(obj.position, Point::new(300.0, 200.0));
        assert_eq!(obj.scale, IMAGE_INSERT_SCALE);

        doc.move_to(image, Point::new(50.0, 50.0));
        let copy = doc.duplicate(image).unwrap();
        assert_ne!(copy, image);
        assert_eq!(doc.get(copy).unwrap().position, Point::new(300.0, 200.0));
        assert!(doc.add_image("not-a-url".into(), 1.0, 1.0).is_err());
    }

    #[test]
    fn restyle_only_touches_text() {
        let doc = doc();
        let text = doc.add_text("a", &TextStyle::default());
        let path = doc
            .add_path(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &Brush::default())
            .unwrap();
        let style = TextStyle {
            fill: Color::rgb(255, 0, 0),
            ..TextStyle::default()
        };
        assert!(doc.restyle_text(text, &style));
        assert!(!doc.restyle_text(path, &style));
        match doc.get(text).unwrap().kind {
            ObjectKind::Text { fill, .. } => assert_eq!(fill, Color::rgb(255, 0, 0)),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn replace_loads_snapshot_and_notifies() {
        let source = doc();
        source.add_text("restored", &TextStyle::default());
        source.set_background(Some(Background::color(Color::rgb(1, 2, 3))));
        let snapshot = source.serialize_scene().unwrap();

        let target = doc();
        let added = Arc::new(AtomicUsize::new(0));
        let counter = added.clone();
        target.on_change(move |c| {
            if matches!(c, SceneChange::Added(_)) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        target.replace_scene(&snapshot).await.unwrap();
        assert_eq!(target.serialize_scene().unwrap(), snapshot);
        assert_eq!(added.load(Ordering::SeqCst), 1);

        target.force_redraw();
        assert_eq!(target.redraw_count(), 1);
    }

    #[tokio::test]
    async fn replace_rejects_broken_assets_without_touching_scene() {
        let doc = doc();
        let keep = doc.add_text("keep", &TextStyle::default());
        let before = doc.serialize_scene().unwrap();

        let broken = SceneObject::new(
            ObjectKind::Image {
                source: "file:///gone.png".into(),
                width: 1.0,
                height: 1.0,
            },
            Point::new(0.0, 0.0),
        );
        let broken_id = broken.id;
        let snapshot = Snapshot::new(doc.size(), None, vec![broken]).unwrap();

        match doc.replace_scene(&snapshot).await {
            Err(SceneLoadError::InvalidAsset { object, .. }) => assert_eq!(object, broken_id),
            other => panic!("expected InvalidAsset, got {other:?}"),
        }
        assert_eq!(doc.serialize_scene().unwrap(), before);
        assert!(doc.get(keep).is_some());
    }
}
