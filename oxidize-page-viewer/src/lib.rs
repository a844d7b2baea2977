//! Geometry and navigation engine for a continuous multi-page image viewer.
//!
//! Pages are stacked vertically inside one scrollable viewport. The engine
//! keeps zoom, per-page rotation, drag panning and the current-page indicator
//! consistent while the host feeds it events:
//!
//! - [`ViewerController`] is the entry point and owns all state.
//! - [`ScaleCalculator`] and [`ZoomStepper`] turn zoom modes and steps into
//!   scale factors.
//! - [`RotationStore`] applies rotations optimistically and rolls them back
//!   when the save fails; [`persist_rotation`] runs a save with a timeout.
//! - [`PageVisibilityTracker`] infers the current page after scrolling settles.
//! - [`DragScrollController`] implements grab-to-pan.
//!
//! ```
//! use std::time::{Duration, Instant};
//! use oxidize_page_viewer::{
//!     DocumentRef, PageImage, ScrollOffset, Size, ViewerConfig, ViewerController, Viewport,
//! };
//!
//! let mut viewer = ViewerController::new(ViewerConfig::default(), Viewport::new(800.0, 600.0))?;
//! viewer.load_document(
//!     DocumentRef::new("dossier-42", 1_700_000_000),
//!     vec![PageImage::new("scan-1"), PageImage::new("scan-2")],
//! );
//! viewer.on_image_loaded(0, Size::new(776.0, 600.0));
//! viewer.on_image_loaded(1, Size::new(776.0, 600.0));
//! assert_eq!(viewer.toolbar_state().zoom_percent, 100);
//!
//! let now = Instant::now();
//! viewer.on_scroll(ScrollOffset::new(0.0, 500.0), now);
//! assert_eq!(viewer.tick(now + Duration::from_millis(300)), Some(2));
//! # Ok::<(), oxidize_page_viewer::ConfigError>(())
//! ```

mod config;
mod document;
mod drag;
mod error;
mod rotation;
mod scale;
mod viewer;
mod viewport;
mod visibility;
mod zoom;

pub use config::{ViewerConfig, ZoomConfig};
pub use document::{Document, DocumentRef, Page, PageImage, PagePlacement};
pub use drag::{CursorAffordance, DragScrollController, DragState};
pub use error::{ConfigError, NavigationError, PersistenceError};
pub use rotation::{
    persist_rotation, RotationAngle, RotationCompletion, RotationDirection, RotationFailure,
    RotationPersistence, RotationRequest, RotationStore, RotationTicket,
};
pub use scale::{zoom_percent, ScaleCalculator, ScaleMode};
pub use viewer::{ToolbarState, ViewerController, ViewerEffect, ViewerState, WheelEvent};
pub use viewport::{Point, ScrollOffset, Size, Viewport};
pub use visibility::{
    intersection_percent, pick_current, PageBand, PageVisibility, PageVisibilityTracker,
    ScrollDebouncer,
};
pub use zoom::ZoomStepper;
