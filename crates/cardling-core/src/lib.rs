//! cardling-core: the postcard scene model.
//!
//! - [`scene`]: objects that can be placed on a postcard
//! - [`snapshot`]: immutable whole-scene values with structural equality
//! - [`engine`]: the contract a live scene exposes to undo/redo
//! - [`document`]: the in-memory live scene used by the editor

pub mod color;
pub mod data_url;
pub mod document;
pub mod engine;
pub mod geometry;
pub mod scene;
pub mod snapshot;

pub use color::{Color, ParseColorError, contrast_color};
pub use document::{ChangeListener, Document, DocumentId, ListenerId, SceneChange};
pub use engine::{SceneEngine, SceneLoadError};
pub use geometry::{Bounds, Point, Size};
pub use scene::{Background, Brush, ObjectId, ObjectKind, SceneObject, TextStyle};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotCodecError};
