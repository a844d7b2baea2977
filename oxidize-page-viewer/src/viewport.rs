//! Geometry primitives and the scrollable viewport

use serde::{Deserialize, Serialize};

/// Width/height pair in CSS-style pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero, negative or not a number
    pub fn is_empty(&self) -> bool {
        self.width.is_nan() || self.height.is_nan() || self.width <= 0.0 || self.height <= 0.0
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Pointer position in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Scroll position of the viewport content
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub left: f32,
    pub top: f32,
}

impl ScrollOffset {
    pub const ORIGIN: ScrollOffset = ScrollOffset { left: 0.0, top: 0.0 };

    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Viewport mirrors the scrollable host surface the pages are stacked in.
///
/// The host owns the real element; the controller keeps this copy current
/// from resize and scroll events and writes scroll changes back through
/// effects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Viewport {
    width: f32,
    height: f32,
    scroll_top: f32,
    scroll_left: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: sanitize(width),
            height: sanitize(height),
            scroll_top: 0.0,
            scroll_left: 0.0,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = sanitize(width);
        self.height = sanitize(height);
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        ScrollOffset::new(self.scroll_left, self.scroll_top)
    }

    /// Scroll offsets never go below the content origin
    pub fn scroll_to(&mut self, offset: ScrollOffset) {
        self.scroll_left = sanitize(offset.left);
        self.scroll_top = sanitize(offset.top);
    }

    pub fn reset_scroll(&mut self) {
        self.scroll_to(ScrollOffset::ORIGIN);
    }

    /// Vertical band `[top, bottom)` currently on screen
    pub fn visible_band(&self) -> (f32, f32) {
        (self.scroll_top, self.scroll_top + self.height)
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
