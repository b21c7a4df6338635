//! History driven by a real document, wired the way the editor wires it:
//! every scene change calls `record()`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cardling_core::{
    Background, Color, Document, ObjectKind, Point, SceneEngine, SceneObject, Size, TextStyle,
};
use cardling_history::{HistoryManager, RecordOutcome};

struct Wired {
    doc: Arc<Document>,
    history: HistoryManager,
    suppressed: Arc<AtomicUsize>,
    errors: Arc<Mutex<Vec<String>>>,
}

fn wired() -> Wired {
    let doc = Arc::new(Document::new(Size::new(600.0, 400.0)));
    let history = HistoryManager::new(doc.clone()).unwrap();
    let suppressed = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(Vec::new()));

    let weak = history.downgrade();
    let (count, sink) = (suppressed.clone(), errors.clone());
    doc.on_change(move |_| {
        let Some(history) = weak.upgrade() else {
            return;
        };
        match history.record() {
            Ok(RecordOutcome::Suppressed) => {
                count.fetch_add(1, Ordering::SeqCst);
            }
            Ok(_) => {}
            Err(e) => sink.lock().unwrap().push(e.to_string()),
        }
    });

    Wired {
        doc,
        history,
        suppressed,
        errors,
    }
}

fn square() -> SceneObject {
    SceneObject::new(
        ObjectKind::Rect {
            width: 40.0,
            height: 40.0,
            fill: Some(Color::rgb(200, 30, 30)),
            stroke: Color::BLACK,
        },
        Point::new(100.0, 100.0),
    )
}

#[tokio::test]
async fn shape_text_undo_undo_redo_edit() {
    let w = wired();
    let e0 = w.doc.serialize_scene().unwrap();

    w.doc.add(square());
    let e1 = w.doc.serialize_scene().unwrap();
    assert_eq!(w.history.undo_snapshots(), vec![e0.clone()]);
    assert_eq!(w.history.current(), e1);

    w.doc.add_text("Greetings from Rust", &TextStyle::default());
    let e2 = w.doc.serialize_scene().unwrap();
    assert_eq!(w.history.undo_snapshots(), vec![e0.clone(), e1.clone()]);

    w.history.undo().await.unwrap();
    assert_eq!(w.history.current(), e1);
    assert_eq!(w.doc.serialize_scene().unwrap(), e1);
    assert_eq!(w.history.redo_snapshots(), vec![e2.clone()]);

    w.history.undo().await.unwrap();
    assert_eq!(w.doc.serialize_scene().unwrap(), e0);
    assert_eq!(w.history.redo_snapshots(), vec![e2.clone(), e1.clone()]);

    w.history.redo().await.unwrap();
    assert_eq!(w.doc.serialize_scene().unwrap(), e1);

    w.doc.add(square());
    assert!(w.history.redo_snapshots().is_empty());
    assert_eq!(w.history.undo_snapshots(), vec![e0, e1]);
    assert!(w.errors.lock().unwrap().is_empty());
}

#[tokio::test]
async fn loading_a_snapshot_records_nothing() {
    let w = wired();
    w.doc.add(square());
    w.doc.add(square());
    w.doc.add_text("three", &TextStyle::default());
    assert_eq!(w.history.undo_len(), 3);

    // Loading two objects fires Cleared, Added x2 and Background while locked
    w.history.undo().await.unwrap();
    assert_eq!(w.suppressed.load(Ordering::SeqCst), 4);
    assert_eq!(w.history.undo_len(), 2);
    assert_eq!(w.history.redo_len(), 1);
    assert_eq!(w.doc.len(), 2);
    assert_eq!(w.doc.redraw_count(), 1);
}

#[tokio::test]
async fn background_survives_undo_of_later_edits() {
    let w = wired();
    let yellow = Background::color(Color::rgb(255, 221, 0));
    w.doc.set_background(Some(yellow.clone()));
    let text = w.doc.add_text("hi", &TextStyle::default());
    w.doc.move_to(text, Point::new(20.0, 20.0));

    w.history.undo().await.unwrap();
    assert_eq!(w.doc.background(), Some(yellow.clone()));
    assert_eq!(w.history.pending_background(), Some(yellow));

    w.history.undo().await.unwrap();
    w.history.undo().await.unwrap();
    assert_eq!(w.doc.background(), None);
    assert!(w.doc.is_empty());
}

#[tokio::test]
async fn removing_the_background_is_an_edit() {
    let w = wired();
    w.doc.set_background(Some(Background::color(Color::WHITE)));
    w.doc.set_background(None);

    assert_eq!(w.history.undo_len(), 2);
    assert_eq!(w.history.current(), w.doc.serialize_scene().unwrap());
    assert_eq!(w.history.current().background(), None);

    w.history.undo().await.unwrap();
    assert_eq!(w.doc.background(), Some(Background::color(Color::WHITE)));
}

#[tokio::test]
async fn clear_undo_redo_leaves_no_background() {
    let w = wired();
    w.doc.set_background(Some(Background::color(Color::WHITE)));
    w.doc.add_text("postcard", &TextStyle::default());
    w.doc.clear();
    assert_eq!(w.history.current(), w.doc.serialize_scene().unwrap());

    w.history.undo().await.unwrap();
    assert_eq!(w.doc.background(), Some(Background::color(Color::WHITE)));
    assert_eq!(w.doc.len(), 1);

    w.history.redo().await.unwrap();
    assert_eq!(w.doc.background(), None);
    assert!(w.doc.is_empty());
    assert_eq!(w.history.current(), w.doc.serialize_scene().unwrap());
}

#[test]
fn nan_edit_is_reported_and_skipped() {
    let w = wired();
    let id = w.doc.add(square());
    let before = w.history.current();

    w.doc.update(id, |o| o.position = Point::new(f64::NAN, 0.0));
    assert_eq!(w.errors.lock().unwrap().len(), 1);
    assert_eq!(w.history.current(), before);
    assert_eq!(w.history.undo_len(), 1);

    w.doc.update(id, |o| o.position = Point::new(5.0, 5.0));
    assert_eq!(w.history.undo_len(), 2);
}
