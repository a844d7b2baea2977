//! Current-page inference from scroll position
//!
//! Scroll events arrive in bursts. [`ScrollDebouncer`] turns a burst into a
//! single pass once scrolling has been quiet for a while, and
//! [`PageVisibilityTracker`] then works out which page the reader is on from
//! how much of each page is inside the visible band.

use std::time::{Duration, Instant};

/// Vertical extent of one page in content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageBand {
    pub top: f32,
    pub height: f32,
}

impl PageBand {
    pub const fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Share of a page inside the visible band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageVisibility {
    /// 1-based page number
    pub page: usize,
    /// Truncated percentage, 0..=100
    pub percent: u8,
}

/// Truncated percentage of `band` inside `[view_top, view_bottom)`
pub fn intersection_percent(band: PageBand, view_top: f32, view_bottom: f32) -> u8 {
    if band.height.is_nan() || band.height <= 0.0 {
        return 0;
    }
    let visible = (band.bottom().min(view_bottom) - band.top.max(view_top)).max(0.0);
    ((visible * 100.0 / band.height) as u32).min(100) as u8
}

/// Choose the current page among visible candidates in top-to-bottom order.
///
/// The largest share wins; on equal shares the lower page wins.
pub fn pick_current(candidates: &[PageVisibility]) -> Option<usize> {
    candidates
        .iter()
        .reduce(|best, next| if best.percent > next.percent { best } else { next })
        .map(|visible| visible.page)
}

/// Collapses bursts of scroll events into one evaluation
#[derive(Debug, Clone)]
pub struct ScrollDebouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl ScrollDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Every event pushes the deadline out again
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True exactly once per burst, when the quiet interval has passed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Keeps the page bands of the current document and evaluates them against
/// the viewport.
///
/// One tracker lives for the whole document: the band list is replaced when
/// the page set changes and patched when a page's layout changes.
#[derive(Debug, Clone, Default)]
pub struct PageVisibilityTracker {
    bands: Vec<PageBand>,
}

impl PageVisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, bands: Vec<PageBand>) {
        self.bands = bands;
    }

    /// Patch bands in place; pages whose band did not move are left alone
    pub fn update(&mut self, bands: &[PageBand]) -> usize {
        if bands.len() != self.bands.len() {
            self.observe(bands.to_vec());
            return bands.len();
        }
        let mut changed = 0;
        for (current, next) in self.bands.iter_mut().zip(bands) {
            if current != next {
                *current = *next;
                changed += 1;
            }
        }
        changed
    }

    pub fn bands(&self) -> &[PageBand] {
        &self.bands
    }

    pub fn band(&self, page_index: usize) -> Option<PageBand> {
        self.bands.get(page_index).copied()
    }

    /// Pages with a non-zero share of `[view_top, view_top + view_height)`
    pub fn visible_pages(&self, view_top: f32, view_height: f32) -> Vec<PageVisibility> {
        let view_bottom = view_top + view_height;
        self.bands
            .iter()
            .enumerate()
            .filter_map(|(index, band)| {
                let percent = intersection_percent(*band, view_top, view_bottom);
                (percent > 0).then_some(PageVisibility {
                    page: index + 1,
                    percent,
                })
            })
            .collect()
    }

    /// 1-based page the reader is on, `None` when nothing is visible
    pub fn current_page(&self, view_top: f32, view_height: f32) -> Option<usize> {
        let visible = self.visible_pages(view_top, view_height);
        let page = pick_current(&visible);
        tracing::debug!(?visible, ?page, "visibility pass");
        page
    }
}
