//! Scale resolution
//!
//! Turns a symbolic [`ScaleMode`] into the numeric factor applied to one
//! page. The calculator never fails: whenever the inputs cannot produce a
//! usable factor it hands back the previous one.

use serde::{Deserialize, Serialize};

use crate::rotation::RotationAngle;
use crate::viewport::Size;

/// Zoom policy selected in the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Explicit zoom factor, 1.0 = natural pixel size
    Numeric(f32),
    #[default]
    FitWidth,
    /// Whole page inside the viewport. Degrades to [`ScaleMode::FitWidth`]
    /// for documents with more than one page.
    FitPage,
    /// Keep the scale each page already has; used after rotation
    PreserveOnRotate,
}

impl ScaleMode {
    /// Identifier the toolbar uses for its zoom selector
    pub fn label(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::FitWidth => "page-width",
            Self::FitPage => "page-fit",
            Self::PreserveOnRotate => "page-rotate",
        }
    }
}

/// Scale rounded to a whole percentage for display
pub fn zoom_percent(scale: f32) -> u32 {
    (scale * 100.0).round().max(0.0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleCalculator {
    margin: f32,
}

impl Default for ScaleCalculator {
    fn default() -> Self {
        Self::new(0.03)
    }
}

impl ScaleCalculator {
    /// `margin` is the fraction of the viewport width kept free for the
    /// scrollbar and padding.
    pub fn new(margin: f32) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Resolve `mode` for a single page.
    ///
    /// Under a quarter turn the page's width and height swap before fitting.
    /// `previous` is returned unchanged whenever the natural size is unknown
    /// or the result would not be a finite positive number.
    pub fn calc_scale(
        &self,
        mode: ScaleMode,
        rotation: RotationAngle,
        viewport: Size,
        natural: Size,
        page_count: usize,
        previous: f32,
    ) -> f32 {
        let scale = match mode {
            ScaleMode::Numeric(value) => value,
            ScaleMode::PreserveOnRotate => previous,
            ScaleMode::FitWidth | ScaleMode::FitPage if natural.is_empty() => previous,
            ScaleMode::FitWidth => self.width_term(viewport, effective(natural, rotation)),
            ScaleMode::FitPage => {
                let page = effective(natural, rotation);
                let width_term = self.width_term(viewport, page);
                // Stacked pages scroll vertically, so only width fits them.
                if page_count > 1 {
                    width_term
                } else {
                    width_term.min(viewport.height / page.height)
                }
            }
        };

        if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            tracing::debug!(?mode, scale, previous, "unusable scale, keeping previous");
            previous
        }
    }

    fn width_term(&self, viewport: Size, page: Size) -> f32 {
        viewport.width * (1.0 - self.margin) / page.width
    }
}

fn effective(natural: Size, rotation: RotationAngle) -> Size {
    if rotation.is_quarter_turn() {
        Size::new(natural.height, natural.width)
    } else {
        natural
    }
}
