//! Coordinate mapping between OCR output and screen space.
//!
//! Vision reports boxes normalized to `[0, 1]` with the origin at the bottom
//! left of the image. Clicks and annotations want absolute screen points with
//! the origin at the top left.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

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

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Scales every component, e.g. screen points to Retina bitmap pixels.
    pub fn scaled(&self, sx: f64, sy: f64) -> Rect {
        Rect {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// A bounding box in the OCR backend's native convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Primary display size in screen points (not bitmap pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Maps a normalized bottom-left-origin box to a top-left-origin screen rect.
///
/// Always scales by the screen size. On Retina displays the captured bitmap
/// is twice the screen size, and scaling by the bitmap would put every click
/// off target.
pub fn to_screen_rect(normalized: &NormalizedBox, screen: ScreenSize) -> Rect {
    let x = normalized.x * screen.width;
    let y = screen.height - normalized.y * screen.height - normalized.height * screen.height;
    let width = normalized.width * screen.width;
    let height = normalized.height * screen.height;

    Rect {
        x,
        y,
        width,
        height,
    }
}
