use serde::{Deserialize, Serialize};

/// Distance (in canvas units) at which a moved object snaps to the canvas center
pub const CENTER_SNAP_THRESHOLD: f64 = 10.0;

/// Angular distance (in degrees) at which a rotation snaps to a right angle
pub const ROTATION_SNAP_THRESHOLD: f64 = 10.0;

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Canvas dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn is_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Bounds centered on `center` with the given half extents
    pub fn around(center: Point, half_width: f64, half_height: f64) -> Self {
        Self {
            min: Point::new(center.x - half_width, center.y - half_height),
            max: Point::new(center.x + half_width, center.y + half_height),
        }
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds::new(*first, *first);
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

/// Snap an object center to the canvas center, independently per axis
pub fn snap_to_center(pos: Point, canvas: Size) -> Point {
    let center = canvas.center();
    let x = if (pos.x - center.x).abs() < CENTER_SNAP_THRESHOLD {
        center.x
    } else {
        pos.x
    };
    let y = if (pos.y - center.y).abs() < CENTER_SNAP_THRESHOLD {
        center.y
    } else {
        pos.y
    };
    Point::new(x, y)
}

/// Snap an angle (degrees) to the nearest multiple of 90 when close enough
pub fn snap_angle(angle: f64) -> f64 {
    let nearest = (angle / 90.0).round() * 90.0;
    if (angle - nearest).abs() < ROTATION_SNAP_THRESHOLD {
        nearest
    } else {
        angle
    }
}
