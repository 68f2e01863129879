//! Dock icon geometry: hit-region types, the published snapshot cache, and the
//! macOS sampler that reads icon positions from the Dock process.

pub mod cache;
#[cfg(target_os = "macos")]
pub mod sampler;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in global screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment check: the right and bottom edges are exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One dock icon hit-region paired with the icon's display label.
///
/// Labels are display names, not bundle identifiers, and may be truncated or
/// decorated relative to the running application's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRegion {
    pub rect: Rect,
    pub label: String,
}

impl IconRegion {
    pub fn new(rect: Rect, label: impl Into<String>) -> Self {
        Self {
            rect,
            label: label.into(),
        }
    }
}

#[derive(Debug)]
pub enum GeometryError {
    DockNotRunning,
    Inspection(String),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DockNotRunning => write!(f, "dock process not running"),
            GeometryError::Inspection(detail) => {
                write!(f, "dock inspection failed: {detail}")
            }
        }
    }
}

impl std::error::Error for GeometryError {}

/// Source of dock icon geometry. May be slow; callers must not invoke it on the
/// click decision path.
pub trait DockSampler: Send {
    fn sample(&self) -> Result<Vec<IconRegion>, GeometryError>;
}
