//! Viewer orchestration
//!
//! [`ViewerController`] owns every piece of viewer state and is the only
//! thing that mutates it. The host forwards viewport and toolbar events to it
//! and applies the [`ViewerEffect`]s it returns. Handlers take `&mut self`,
//! so each one sees the state left by the previous event and never a stale
//! copy.

use std::time::{Duration, Instant};

use crate::config::ViewerConfig;
use crate::error::ConfigError;
use crate::document::{Document, DocumentRef, PageImage, PagePlacement};
use crate::drag::{CursorAffordance, DragScrollController};
use crate::error::{NavigationError, PersistenceError};
use crate::rotation::{
    RotationAngle, RotationCompletion, RotationDirection, RotationFailure, RotationRequest,
    RotationStore, RotationTicket,
};
use crate::scale::{zoom_percent, ScaleCalculator, ScaleMode};
use crate::viewport::{Point, ScrollOffset, Size, Viewport};
use crate::visibility::{PageVisibilityTracker, ScrollDebouncer};
use crate::zoom::ZoomStepper;

/// State shown by the toolbar. Replaced wholesale when the document changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    /// 1-based
    pub current_page: usize,
    /// Raw text of the page-number field; may lag behind while the user types
    pub page_number_input: String,
    pub scale_mode: ScaleMode,
    /// Scale of the first page, used as the viewer-wide zoom display
    pub scale_numeric: f32,
    pub rotation_in_flight: Option<RotationDirection>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_number_input: "1".to_string(),
            scale_mode: ScaleMode::FitWidth,
            scale_numeric: 1.0,
            rotation_in_flight: None,
        }
    }
}

/// Instruction for the host surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEffect {
    ScrollTo(ScrollOffset),
    /// Drop keyboard focus from whatever input holds it
    BlurFocus,
    SetCursor(CursorAffordance),
    /// Route pointer moves and releases from the whole window to the viewer
    CapturePointer,
    ReleasePointer,
    /// Suppress the host's default handling of the current event
    PreventDefault,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    /// Positive when scrolling down
    pub delta_y: f32,
    /// Whether the zoom-gesture modifier (Ctrl) is held
    pub zoom_modifier: bool,
}

/// Everything the toolbar needs to render itself
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarState {
    pub current_page: usize,
    pub page_count: usize,
    pub page_number_input: String,
    pub scale_mode: ScaleMode,
    pub scale_numeric: f32,
    pub zoom_percent: u32,
    pub rotation_in_flight: Option<RotationDirection>,
    pub rotation_error: Option<RotationFailure>,
}

#[derive(Debug)]
pub struct ViewerController {
    config: ViewerConfig,
    calculator: ScaleCalculator,
    stepper: ZoomStepper,
    document: Document,
    state: ViewerState,
    rotations: RotationStore,
    tracker: PageVisibilityTracker,
    debouncer: ScrollDebouncer,
    drag: DragScrollController,
    viewport: Viewport,
}

impl ViewerController {
    /// Fails when `config` does not pass [`ViewerConfig::validate`].
    pub fn new(config: ViewerConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            calculator: ScaleCalculator::new(config.viewport_margin),
            stepper: ZoomStepper::new(&config.zoom)?,
            debouncer: ScrollDebouncer::new(config.scroll_debounce()),
            document: Document::default(),
            state: ViewerState::default(),
            rotations: RotationStore::default(),
            tracker: PageVisibilityTracker::new(),
            drag: DragScrollController::new(),
            viewport,
            config,
        })
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    pub fn rotation(&self, page_index: usize) -> RotationAngle {
        self.rotations.angle(page_index)
    }

    pub fn cursor(&self) -> CursorAffordance {
        self.drag.cursor()
    }

    /// Timeout the host should pass to [`crate::persist_rotation`]
    pub fn rotation_save_timeout(&self) -> Duration {
        self.config.rotation_save_timeout()
    }

    pub fn page_placement(&self, page_index: usize) -> Option<PagePlacement> {
        self.document
            .page(page_index)?
            .placement(self.rotations.angle(page_index))
    }

    pub fn toolbar_state(&self) -> ToolbarState {
        ToolbarState {
            current_page: self.state.current_page,
            page_count: self.document.page_count(),
            page_number_input: self.state.page_number_input.clone(),
            scale_mode: self.state.scale_mode,
            scale_numeric: self.state.scale_numeric,
            zoom_percent: zoom_percent(self.state.scale_numeric),
            rotation_in_flight: self.state.rotation_in_flight,
            rotation_error: self.rotations.last_failure().cloned(),
        }
    }

    /// Supply the page images of a document.
    ///
    /// A different identity or modification time resets the whole viewer.
    /// The same document with a different page count only resets rotations.
    pub fn load_document(
        &mut self,
        reference: DocumentRef,
        images: Vec<PageImage>,
    ) -> Vec<ViewerEffect> {
        let page_count = images.len();
        let same_document = self.document.reference() == Some(&reference);
        if same_document && page_count == self.document.page_count() {
            tracing::debug!(id = %reference.id, "document unchanged");
            return Vec::new();
        }

        let mut effects = Vec::new();
        if same_document {
            tracing::info!(id = %reference.id, page_count, "page set changed");
            let page = self.state.current_page.clamp(1, page_count.max(1));
            self.set_current_page(page);
        } else {
            tracing::info!(
                id = %reference.id,
                last_modified = reference.last_modified,
                page_count,
                "loading document"
            );
            self.state = ViewerState::default();
            self.debouncer.cancel();
            effects.extend(self.finish_drag());
            self.viewport.reset_scroll();
            effects.push(ViewerEffect::ScrollTo(ScrollOffset::ORIGIN));
        }

        self.document = Document::new(reference, images, self.state.scale_numeric);
        self.rotations.reset(page_count);
        self.state.rotation_in_flight = None;
        self.tracker
            .observe(self.document.layout(self.rotations.angles(), self.config.page_gap));
        effects
    }

    /// A page image finished decoding; apply the current mode to that page.
    pub fn on_image_loaded(&mut self, page_index: usize, natural: Size) -> bool {
        if natural.is_empty() {
            tracing::debug!(page_index, ?natural, "ignoring image without dimensions");
            return false;
        }
        let page_count = self.document.page_count();
        let viewport = self.viewport.size();
        let rotation = self.rotations.angle(page_index);
        let Some(page) = self.document.page_mut(page_index) else {
            tracing::debug!(page_index, "image loaded for unknown page");
            return false;
        };

        page.set_natural(natural);
        let scale = self.calculator.calc_scale(
            self.state.scale_mode,
            rotation,
            viewport,
            natural,
            page_count,
            page.applied_scale(),
        );
        page.set_applied_scale(scale);
        tracing::debug!(page_index, scale, "page loaded");

        if page_index == 0 {
            self.state.scale_numeric = scale;
        }
        self.refresh_layout();
        true
    }

    pub fn on_viewport_resized(&mut self, width: f32, height: f32) {
        self.viewport.resize(width, height);
        self.apply_scale(self.state.scale_mode);
    }

    /// Re-apply `mode` to every page. The first page's result becomes the
    /// viewer-wide scale even when pages differ in size or rotation.
    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        if let ScaleMode::Numeric(value) = mode {
            if !(value.is_finite() && value > 0.0) {
                tracing::debug!(value, "ignoring unusable zoom value");
                return;
            }
        }
        self.apply_scale(mode);
    }

    /// Ctrl+wheel zooms by one step; plain wheel events are left to the host.
    pub fn on_wheel(&mut self, event: WheelEvent) -> Vec<ViewerEffect> {
        if !event.zoom_modifier {
            return Vec::new();
        }
        let current = self.state.scale_numeric;
        let next = if event.delta_y > 0.0 {
            self.stepper.zoom_out(current)
        } else {
            self.stepper.zoom_in(current)
        };
        tracing::debug!(current, next, "wheel zoom");
        self.set_scale_mode(ScaleMode::Numeric(next));
        vec![ViewerEffect::PreventDefault]
    }

    pub fn set_page_number_input(&mut self, input: impl Into<String>) {
        self.state.page_number_input = input.into();
    }

    pub fn parse_page_number(&self, input: &str) -> Result<usize, NavigationError> {
        let trimmed = input.trim();
        let page: usize = trimmed
            .parse()
            .map_err(|_| NavigationError::NotANumber(trimmed.to_string()))?;
        let page_count = self.document.page_count();
        if page == 0 || page > page_count {
            return Err(NavigationError::OutOfRange { page, page_count });
        }
        Ok(page)
    }

    /// Jump to the page typed into the toolbar. Anything that is not a page
    /// of this document just drops focus.
    pub fn set_page(&mut self, input: &str) -> Vec<ViewerEffect> {
        match self.parse_page_number(input) {
            Ok(page) => self.jump_to_page(page),
            Err(error) => {
                tracing::debug!("ignoring page jump: {error}");
                vec![ViewerEffect::BlurFocus]
            }
        }
    }

    /// Scroll so the top of `page` (1-based) meets the top of the viewport.
    pub fn jump_to_page(&mut self, page: usize) -> Vec<ViewerEffect> {
        if page == 0 || page > self.document.page_count() {
            return vec![ViewerEffect::BlurFocus];
        }
        let top = self.tracker.band(page - 1).map_or(0.0, |band| band.top);
        let left = self.viewport.scroll_offset().left;
        self.viewport.scroll_to(ScrollOffset::new(left, top));
        self.set_current_page(page);
        tracing::debug!(page, top, "jumped to page");
        vec![ViewerEffect::ScrollTo(self.viewport.scroll_offset())]
    }

    /// Record a scroll position; the current page is re-evaluated by
    /// [`Self::tick`] once scrolling has settled.
    pub fn on_scroll(&mut self, offset: ScrollOffset, now: Instant) {
        self.viewport.scroll_to(offset);
        self.debouncer.schedule(now);
    }

    /// When the host should call [`Self::tick`] next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Run the debounced visibility pass if it is due. Returns the new
    /// current page when it changed.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if !self.debouncer.fire(now) {
            return None;
        }
        let (view_top, _) = self.viewport.visible_band();
        let page = self.tracker.current_page(view_top, self.viewport.height())?;
        if page == self.state.current_page {
            return None;
        }
        tracing::debug!(from = self.state.current_page, to = page, "current page changed");
        self.set_current_page(page);
        Some(page)
    }

    /// Rotate `page` (1-based) by a quarter turn.
    ///
    /// The new angle and the rescale are visible immediately. The returned
    /// request must be persisted by the host and its outcome reported through
    /// [`Self::on_rotation_saved`].
    pub fn rotate(&mut self, page: usize, direction: RotationDirection) -> Option<RotationRequest> {
        let reference = self.document.reference()?.clone();
        let request = self
            .rotations
            .rotate(&reference, page.checked_sub(1)?, direction)?;
        self.state.rotation_in_flight = self.rotations.in_flight();
        self.apply_scale(ScaleMode::PreserveOnRotate);
        tracing::info!(
            page,
            angle = request.angle.degrees(),
            direction = direction.label(),
            "rotated page"
        );
        Some(request)
    }

    pub fn on_rotation_saved(
        &mut self,
        ticket: RotationTicket,
        result: Result<(), PersistenceError>,
    ) -> RotationCompletion {
        let completion = self.rotations.complete(ticket, result);
        self.state.rotation_in_flight = self.rotations.in_flight();
        if completion == (RotationCompletion::Failed { reverted: true }) {
            self.apply_scale(ScaleMode::PreserveOnRotate);
        }
        completion
    }

    pub fn dismiss_rotation_error(&mut self) -> Option<RotationFailure> {
        self.rotations.dismiss_failure()
    }

    pub fn pointer_down(&mut self, pointer: Point) -> Vec<ViewerEffect> {
        self.drag.begin(pointer, self.viewport.scroll_offset());
        vec![
            ViewerEffect::BlurFocus,
            ViewerEffect::SetCursor(CursorAffordance::Grabbing),
            ViewerEffect::CapturePointer,
        ]
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Vec<ViewerEffect> {
        match self.drag.motion(pointer) {
            Some(offset) => {
                self.viewport.scroll_to(offset);
                vec![ViewerEffect::ScrollTo(self.viewport.scroll_offset())]
            }
            None => Vec::new(),
        }
    }

    pub fn pointer_up(&mut self) -> Vec<ViewerEffect> {
        self.finish_drag()
    }

    /// The host lost the pointer (window blur, touch cancel)
    pub fn pointer_cancel(&mut self) -> Vec<ViewerEffect> {
        self.finish_drag()
    }

    fn finish_drag(&mut self) -> Vec<ViewerEffect> {
        if self.drag.end() {
            vec![
                ViewerEffect::SetCursor(CursorAffordance::Default),
                ViewerEffect::ReleasePointer,
            ]
        } else {
            Vec::new()
        }
    }

    fn set_current_page(&mut self, page: usize) {
        self.state.current_page = page;
        self.state.page_number_input = page.to_string();
    }

    fn apply_scale(&mut self, mode: ScaleMode) {
        let page_count = self.document.page_count();
        let viewport = self.viewport.size();
        let mut first = None;

        for page in self.document.pages_mut() {
            let rotation = self.rotations.angle(page.index());
            let scale = self.calculator.calc_scale(
                mode,
                rotation,
                viewport,
                page.natural().unwrap_or_default(),
                page_count,
                page.applied_scale(),
            );
            page.set_applied_scale(scale);
            if page.index() == 0 {
                first = Some(scale);
            }
        }

        self.state.scale_mode = mode;
        if let Some(scale) = first {
            self.state.scale_numeric = scale;
        }
        // Pages still waiting for their image pick up the viewer-wide zoom.
        let canonical = self.state.scale_numeric;
        for page in self
            .document
            .pages_mut()
            .iter_mut()
            .filter(|page| page.natural().is_none())
        {
            page.set_applied_scale(canonical);
        }
        tracing::debug!(?mode, scale = self.state.scale_numeric, "scale applied");
        self.refresh_layout();
    }

    fn refresh_layout(&mut self) {
        let bands = self
            .document
            .layout(self.rotations.angles(), self.config.page_gap);
        self.tracker.update(&bands);
    }
}
