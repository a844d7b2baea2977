//! Grab-to-pan
//!
//! Dragging moves the content with the pointer, which means the scroll
//! offset moves against it: pulling the page down scrolls up.

use crate::viewport::{Point, ScrollOffset};

/// Cursor the host should show over the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorAffordance {
    #[default]
    Default,
    Grabbing,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        origin: Point,
        start_scroll: ScrollOffset,
    },
}

/// Pointer-driven pan state machine.
///
/// While dragging, the host must deliver pointer moves and the release from
/// anywhere on screen, not only from inside the viewport.
#[derive(Debug, Clone, Default)]
pub struct DragScrollController {
    state: DragState,
}

impl DragScrollController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn cursor(&self) -> CursorAffordance {
        if self.is_dragging() {
            CursorAffordance::Grabbing
        } else {
            CursorAffordance::Default
        }
    }

    /// Start a drag. A second pointer-down restarts from the new position.
    pub fn begin(&mut self, pointer: Point, scroll: ScrollOffset) {
        self.state = DragState::Dragging {
            origin: pointer,
            start_scroll: scroll,
        };
    }

    /// Scroll offset for the current pointer position, `None` when idle
    pub fn motion(&self, pointer: Point) -> Option<ScrollOffset> {
        let DragState::Dragging {
            origin,
            start_scroll,
        } = self.state
        else {
            return None;
        };

        Some(ScrollOffset::new(
            (start_scroll.left + (origin.x - pointer.x)).max(0.0),
            (start_scroll.top + (origin.y - pointer.y)).max(0.0),
        ))
    }

    /// Back to idle. Returns whether a drag was actually active.
    pub fn end(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}
