//! Document identity and page list
//!
//! Pages are stacked top to bottom in document order. A page takes no room
//! until its image size is known.

use serde::{Deserialize, Serialize};

use crate::rotation::RotationAngle;
use crate::viewport::{Point, Size};
use crate::visibility::PageBand;

/// Identifies the document on screen. A change of either field means a new
/// document and a full viewer reset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    /// Modification time as reported by the document provider
    pub last_modified: i64,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, last_modified: i64) -> Self {
        Self {
            id: id.into(),
            last_modified,
        }
    }
}

/// One page image as supplied by the document provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Stable identity of the image within the document
    pub key: String,
}

impl PageImage {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Where and how large the host should draw one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Scaled image size before rotation
    pub image: Size,
    /// Height the page occupies in the vertical stack
    pub slot_height: f32,
    /// Image offset inside its slot that keeps a quarter-turned image aligned
    pub offset: Point,
    pub rotation_degrees: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    index: usize,
    key: String,
    natural: Option<Size>,
    applied_scale: f32,
}

impl Page {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Natural pixel size, known once the image has loaded
    pub fn natural(&self) -> Option<Size> {
        self.natural
    }

    pub fn applied_scale(&self) -> f32 {
        self.applied_scale
    }

    pub fn is_loaded(&self) -> bool {
        self.natural.is_some()
    }

    pub(crate) fn set_natural(&mut self, natural: Size) {
        self.natural = Some(natural);
    }

    pub(crate) fn set_applied_scale(&mut self, scale: f32) {
        self.applied_scale = scale;
    }

    /// Layout of the page at its applied scale, `None` until it has loaded
    pub fn placement(&self, rotation: RotationAngle) -> Option<PagePlacement> {
        let image = self.natural?.scaled(self.applied_scale);
        let placement = if rotation.is_quarter_turn() {
            // Rotation happens around the centre, so shift the box back
            // into the slot it was laid out for.
            let shift = (image.width - image.height) / 2.0;
            PagePlacement {
                image,
                slot_height: image.width,
                offset: Point::new(-shift, shift),
                rotation_degrees: rotation.degrees(),
            }
        } else {
            PagePlacement {
                image,
                slot_height: image.height,
                offset: Point::default(),
                rotation_degrees: rotation.degrees(),
            }
        };
        Some(placement)
    }
}

/// Manages the page list of the document being viewed
#[derive(Debug, Clone, Default)]
pub struct Document {
    reference: Option<DocumentRef>,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(reference: DocumentRef, images: Vec<PageImage>, initial_scale: f32) -> Self {
        let pages = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| Page {
                index,
                key: image.key,
                natural: None,
                applied_scale: initial_scale,
            })
            .collect();
        Self {
            reference: Some(reference),
            pages,
        }
    }

    pub fn reference(&self) -> Option<&DocumentRef> {
        self.reference.as_ref()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub(crate) fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub(crate) fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    /// Stack pages top to bottom. Pages that have not loaded take no height.
    pub fn layout(&self, rotations: &[RotationAngle], gap: f32) -> Vec<PageBand> {
        let mut top = 0.0;
        self.pages
            .iter()
            .map(|page| {
                let rotation = rotations.get(page.index).copied().unwrap_or_default();
                let height = page
                    .placement(rotation)
                    .map(|placement| placement.slot_height)
                    .unwrap_or(0.0);
                let band = PageBand::new(top, height);
                top += height + gap;
                band
            })
            .collect()
    }
}
