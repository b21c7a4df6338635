//! Scene objects for cardling postcards.
//!
//! A scene is a z-ordered list of [`SceneObject`]s plus an optional [`Background`].
//! Every object is positioned by its center, so transforms (rotation, scale) pivot
//! around `position`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::geometry::{Bounds, Point};

/// Default font for new text objects
pub const DEFAULT_FONT: &str = "Arial";

/// Default font size for new text objects
pub const DEFAULT_FONT_SIZE: f64 = 40.0;

/// Object identifier - UUID so duplicated objects never collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canvas background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Background {
    /// Solid fill
    Color { color: Color },
    /// Tiled image, referenced by data URL
    Pattern { source: String },
}

impl Background {
    pub fn color(color: Color) -> Self {
        Background::Color { color }
    }
}

/// Different kinds of objects on a postcard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ObjectKind {
    /// Editable text
    Text {
        content: String,
        font: String,
        font_size: f64,
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<Color>,
    },
    /// Raster image embedded as a data URL
    Image {
        source: String,
        width: f64,
        height: f64,
    },
    /// Freehand brush stroke; points are relative to the object position
    Path {
        points: Vec<Point>,
        stroke: Color,
        width: f64,
    },
    /// Rectangle of the given size
    Rect {
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
        stroke: Color,
    },
    /// Ellipse with the given radii
    Ellipse {
        radius_x: f64,
        radius_y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Color>,
        stroke: Color,
    },
    /// Straight line; endpoints are relative to the object position
    Line {
        from: Point,
        to: Point,
        stroke: Color,
        width: f64,
    },
}

impl ObjectKind {
    /// Short type name for status messages
    pub fn name(&self) -> &'static str {
        match self {
            ObjectKind::Text { .. } => "text",
            ObjectKind::Image { .. } => "image",
            ObjectKind::Path { .. } => "path",
            ObjectKind::Rect { .. } => "rect",
            ObjectKind::Ellipse { .. } => "ellipse",
            ObjectKind::Line { .. } => "line",
        }
    }

    /// Whether rotation snapping applies (freehand strokes rotate freely)
    pub fn snaps_rotation(&self) -> bool {
        !matches!(self, ObjectKind::Path { .. })
    }

    /// Bounds in object-local coordinates (centered on the origin for boxed kinds)
    pub fn local_bounds(&self) -> Bounds {
        let origin = Point::default();
        match self {
            ObjectKind::Text {
                content, font_size, ..
            } => {
                // Rough average glyph width of 0.6em
                let longest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                let lines = content.lines().count().max(1);
                let width = longest as f64 * font_size * 0.6;
                let height = lines as f64 * font_size * 1.2;
                Bounds::around(origin, width / 2.0, height / 2.0)
            }
            ObjectKind::Image { width, height, .. } | ObjectKind::Rect { width, height, .. } => {
                Bounds::around(origin, width / 2.0, height / 2.0)
            }
            ObjectKind::Ellipse {
                radius_x, radius_y, ..
            } => Bounds::around(origin, *radius_x, *radius_y),
            ObjectKind::Path { points, .. } => {
                Bounds::from_points(points).unwrap_or(Bounds::new(origin, origin))
            }
            ObjectKind::Line { from, to, .. } => {
                Bounds::from_points(&[*from, *to]).unwrap_or(Bounds::new(origin, origin))
            }
        }
    }

    /// Every float the kind carries, for finiteness checks
    fn scalars(&self) -> Vec<f64> {
        match self {
            ObjectKind::Text { font_size, .. } => vec![*font_size],
            ObjectKind::Image { width, height, .. } | ObjectKind::Rect { width, height, .. } => {
                vec![*width, *height]
            }
            ObjectKind::Ellipse {
                radius_x, radius_y, ..
            } => vec![*radius_x, *radius_y],
            ObjectKind::Path { points, width, .. } => points
                .iter()
                .flat_map(|p| [p.x, p.y])
                .chain(std::iter::once(*width))
                .collect(),
            ObjectKind::Line {
                from, to, width, ..
            } => vec![from.x, from.y, to.x, to.y, *width],
        }
    }
}

/// Style applied to newly added text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font: String,
    pub font_size: f64,
    pub fill: Color,
    #[serde(default)]
    pub background: Option<Color>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            fill: Color::BLACK,
            background: None,
        }
    }
}

/// Freehand brush settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Color,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 5.0,
        }
    }
}

/// An object placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Center of the object in canvas coordinates
    pub position: Point,
    /// Rotation in degrees, clockwise
    #[serde(default)]
    pub angle: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

fn default_scale() -> f64 {
    1.0
}

impl SceneObject {
    pub fn new(kind: ObjectKind, position: Point) -> Self {
        Self {
            id: ObjectId::new(),
            position,
            angle: 0.0,
            scale: 1.0,
            kind,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// True when position, transform and geometry are all finite numbers
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.angle.is_finite()
            && self.scale.is_finite()
            && self.kind.scalars().iter().all(|v| v.is_finite())
    }

    /// Clone with a fresh id
    pub fn duplicate(&self) -> Self {
        Self {
            id: ObjectId::new(),
            ..self.clone()
        }
    }
}
