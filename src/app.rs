use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cardling_core::{
    Background, Brush, Color, Document, ListenerId, ObjectId, ObjectKind, Point, SceneEngine,
    SceneObject, TextStyle, contrast_color, data_url,
};
use cardling_export::{ShareEnvelope, export_svg, qr_terminal, save_svg, share_link};
use cardling_history::{HistoryError, HistoryManager};
use tracing::{debug, info, warn};

use crate::commands::{Command, HELP, Selector, StyleChange};
use crate::config::Config;

/// Editor state: one postcard, its history, and the current tool settings
pub struct App {
    pub doc: Arc<Document>,
    history: HistoryManager,
    listener: ListenerId,
    pub text_style: TextStyle,
    pub brush: Brush,
    pub selected: Option<ObjectId>,
    pub status_message: Option<String>,
    share_base_url: String,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let doc = Arc::new(Document::new(config.canvas));
        let engine: Arc<dyn SceneEngine> = doc.clone();
        let history = HistoryManager::with_limit(engine, config.history_limit)
            .context("capture initial scene")?;

        // Every scene change is offered to the history; loads from undo/redo are
        // filtered out by the history itself
        let weak = history.downgrade();
        let listener = doc.on_change(move |change| {
            let Some(history) = weak.upgrade() else {
                return;
            };
            if let Err(e) = history.record() {
                warn!(?change, error = %e, "could not record edit in history");
            }
        });

        info!(doc = %doc.id(), limit = history.limit(), "postcard opened");
        Ok(Self {
            doc,
            history,
            listener,
            text_style: config.text.clone(),
            brush: config.brush,
            selected: None,
            status_message: None,
            share_base_url: config.share_base_url.clone(),
        })
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Set a status message to display
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    /// Take the status message, leaving none
    pub fn take_status(&mut self) -> Option<String> {
        self.status_message.take()
    }

    /// Drop the selection if the selected object is gone
    fn validate_selection(&mut self) {
        if self.selected.is_some_and(|id| self.doc.get(id).is_none()) {
            self.selected = None;
        }
    }

    fn added(&mut self, id: ObjectId) {
        self.selected = Some(id);
        let name = self.doc.get(id).map(|o| o.kind.name()).unwrap_or("object");
        self.set_status(format!("Added {name}"));
    }

    // ========== Adding ==========

    pub fn add_text(&mut self, content: &str) {
        let id = self.doc.add_text(content, &self.text_style);
        self.added(id);
    }

    /// Embed an image file, centered at half scale
    pub fn add_image(&mut self, path: &Path) -> Result<()> {
        let (source, width, height) = load_image(path)?;
        let id = self.doc.add_image(source, width as f64, height as f64)?;
        self.added(id);
        Ok(())
    }

    /// Freehand stroke with the current brush
    pub fn draw(&mut self, points: &[Point]) {
        match self.doc.add_path(points, &self.brush) {
            Some(id) => self.added(id),
            None => self.set_status("Nothing to draw"),
        }
    }

    pub fn add_rect(&mut self, width: f64, height: f64) {
        let kind = ObjectKind::Rect {
            width,
            height,
            fill: None,
            stroke: self.brush.color,
        };
        let id = self.doc.add(SceneObject::new(kind, self.doc.size().center()));
        self.added(id);
    }

    pub fn add_ellipse(&mut self, radius_x: f64, radius_y: f64) {
        let kind = ObjectKind::Ellipse {
            radius_x,
            radius_y,
            fill: None,
            stroke: self.brush.color,
        };
        let id = self.doc.add(SceneObject::new(kind, self.doc.size().center()));
        self.added(id);
    }

    /// Straight line between two absolute canvas points
    pub fn add_line(&mut self, from: Point, to: Point) {
        let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
        let kind = ObjectKind::Line {
            from: Point::new(from.x - mid.x, from.y - mid.y),
            to: Point::new(to.x - mid.x, to.y - mid.y),
            stroke: self.brush.color,
            width: self.brush.width,
        };
        let id = self.doc.add(SceneObject::new(kind, mid));
        self.added(id);
    }

    // ========== Canvas ==========

    pub fn set_background(&mut self, color: Option<Color>) {
        self.doc.set_background(color.map(Background::color));
        match color {
            Some(c) => self.set_status(format!("Background {c}")),
            None => self.set_status("Background removed"),
        }
    }

    pub fn set_background_image(&mut self, path: &Path) -> Result<()> {
        let (source, _, _) = load_image(path)?;
        self.doc.set_background(Some(Background::Pattern { source }));
        self.set_status("Background image set");
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.doc.clear();
        self.selected = None;
        self.set_status("Cleared");
    }

    /// Selection highlight that stays visible over the current background
    pub fn selection_color(&self) -> Color {
        contrast_color(self.doc.background().as_ref())
    }

    // ========== Selection ==========

    pub fn select(&mut self, selector: Selector) {
        let ids = self.doc.object_ids();
        self.selected = match selector {
            Selector::Index(i) => ids.get(i).copied(),
            Selector::Last => ids.last().copied(),
            Selector::None => None,
        };
        match self.selected.and_then(|id| self.doc.get(id)) {
            Some(object) => self.set_status(format!("Selected {}", object.kind.name())),
            None => self.set_status("Nothing selected"),
        }
    }

    /// Duplicate the selection at the canvas center and select the copy
    pub fn copy_selected(&mut self) {
        match self.selected.and_then(|id| self.doc.duplicate(id)) {
            Some(copy) => {
                self.selected = Some(copy);
                self.set_status("Copied");
            }
            None => self.set_status("Nothing selected"),
        }
    }

    pub fn delete_selected(&mut self) {
        match self.selected.take().and_then(|id| self.doc.remove(id)) {
            Some(removed) => self.set_status(format!("Deleted {}", removed.kind.name())),
            None => self.set_status("Nothing selected"),
        }
    }

    pub fn move_selected(&mut self, position: Point) {
        match self.selected {
            Some(id) if self.doc.move_to(id, position) => {
                let at = self.doc.get(id).map(|o| o.position).unwrap_or(position);
                self.set_status(format!("Moved to {}, {}", at.x, at.y));
            }
            _ => self.set_status("Nothing selected"),
        }
    }

    pub fn rotate_selected(&mut self, angle: f64) {
        match self.selected {
            Some(id) if self.doc.rotate_to(id, angle) => {
                let angle = self.doc.get(id).map(|o| o.angle).unwrap_or(angle);
                self.set_status(format!("Rotated to {angle}°"));
            }
            _ => self.set_status("Nothing selected"),
        }
    }

    /// Apply the current text style to the selected text object
    pub fn restyle_selected(&mut self) {
        match self.selected {
            Some(id) if self.doc.restyle_text(id, &self.text_style) => {
                self.set_status("Restyled text")
            }
            Some(_) => self.set_status("Selection is not text"),
            None => self.set_status("Nothing selected"),
        }
    }

    pub fn apply_style(&mut self, change: StyleChange) {
        match change {
            StyleChange::Font(font) => self.text_style.font = font,
            StyleChange::FontSize(size) => self.text_style.font_size = size,
            StyleChange::Fill(color) => self.text_style.fill = color,
            StyleChange::TextBackground(color) => self.text_style.background = color,
            StyleChange::BrushColor(color) => self.brush.color = color,
            StyleChange::BrushWidth(width) => self.brush.width = width,
        }
        self.set_status("Style updated");
    }

    // ========== History ==========

    /// Undo the last edit
    pub async fn undo(&mut self) {
        let doc = self.doc.clone();
        let mut loaded = 0;
        let result = self.history.undo_then(|| loaded = doc.len()).await;
        self.history_status("Undo", "Nothing to undo", result, loaded);
    }

    /// Redo the last undone edit
    pub async fn redo(&mut self) {
        let doc = self.doc.clone();
        let mut loaded = 0;
        let result = self.history.redo_then(|| loaded = doc.len()).await;
        self.history_status("Redo", "Nothing to redo", result, loaded);
    }

    fn history_status(
        &mut self,
        action: &str,
        empty: &str,
        result: Result<bool, HistoryError>,
        loaded: usize,
    ) {
        self.validate_selection();
        match result {
            Ok(true) => self.set_status(format!("{action} ({loaded} objects)")),
            Ok(false) => self.set_status(empty),
            Err(HistoryError::Busy) => self.set_status(format!("{action} already in progress")),
            Err(e) => self.set_status(format!("{action} error: {e}")),
        }
    }

    // ========== Output ==========

    pub fn export_svg(&mut self, path: &Path) -> Result<()> {
        let snapshot = self.doc.serialize_scene()?;
        save_svg(&snapshot, path)?;
        self.set_status(format!("Exported {}", path.display()));
        Ok(())
    }

    /// Build a share link for the postcard as it looks now
    pub fn share_link(&mut self) -> Result<String> {
        let snapshot = self.doc.serialize_scene()?;
        let svg = export_svg(&snapshot)?;
        let link = share_link(&self.share_base_url, &ShareEnvelope::from_svg(&svg))?;
        self.set_status("Share link ready");
        Ok(link)
    }

    /// One-line summary of the editor state
    pub fn status_line(&self) -> String {
        let selected = self
            .selected
            .and_then(|id| self.doc.get(id))
            .map(|o| o.kind.name())
            .unwrap_or("none");
        format!(
            "{} objects | undo {} | redo {} | selected {} | highlight {}",
            self.doc.len(),
            self.history.undo_len(),
            self.history.redo_len(),
            selected,
            self.selection_color()
        )
    }

    /// Run one command; returns text to show the user, if any
    pub async fn execute(&mut self, command: Command) -> Result<Option<String>> {
        debug!(?command, "execute");
        match command {
            Command::Text(content) => self.add_text(&content),
            Command::Image(path) => self.add_image(&path)?,
            Command::Draw(points) => self.draw(&points),
            Command::Rect { width, height } => self.add_rect(width, height),
            Command::Ellipse { radius_x, radius_y } => self.add_ellipse(radius_x, radius_y),
            Command::Line { from, to } => self.add_line(from, to),
            Command::Background(color) => self.set_background(color),
            Command::BackgroundImage(path) => self.set_background_image(&path)?,
            Command::Clear => self.clear_all(),
            Command::Select(selector) => self.select(selector),
            Command::Copy => self.copy_selected(),
            Command::Delete => self.delete_selected(),
            Command::Move(position) => self.move_selected(position),
            Command::Rotate(angle) => self.rotate_selected(angle),
            Command::Style(change) => self.apply_style(change),
            Command::Restyle => self.restyle_selected(),
            Command::Undo => self.undo().await,
            Command::Redo => self.redo().await,
            Command::Export(path) => self.export_svg(&path)?,
            Command::Share => {
                let link = self.share_link()?;
                let output = match qr_terminal(&link) {
                    Ok(qr) => format!("{link}\n{qr}"),
                    Err(e) => {
                        warn!(error = %e, "share link does not fit in a QR code");
                        link
                    }
                };
                return Ok(Some(output));
            }
            Command::Status => return Ok(Some(self.status_line())),
            Command::Help => return Ok(Some(HELP.to_string())),
        }
        Ok(None)
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.doc.off_change(self.listener);
    }
}

/// Read an image file into a data URL plus its pixel dimensions
fn load_image(path: &Path) -> Result<(String, u32, u32)> {
    let format = image::ImageFormat::from_path(path)
        .with_context(|| format!("unsupported image: {}", path.display()))?;
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("read image: {}", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("read image: {}", path.display()))?;
    Ok((data_url::encode(format.to_mime_type(), &bytes), width, height))
}
