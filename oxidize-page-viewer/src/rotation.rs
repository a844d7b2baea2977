//! Per-page rotation with optimistic updates.
//!
//! A rotate request changes the table immediately and hands out a
//! [`RotationRequest`] the host sends to the document service. Each request
//! carries a ticket; reporting the outcome of that ticket back through
//! [`RotationStore::complete`] either confirms the optimistic angle or rolls
//! it back to the last angle that was not rejected.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::error::PersistenceError;

/// Position on the four-step rotation dial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotationAngle {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationAngle {
    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// Width and height swap at 90 and 270 degrees
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Next dial position. Going below 0 lands on 270 and going past 270
    /// lands on 0.
    pub fn turned(self, direction: RotationDirection) -> Self {
        let next = i32::from(self.degrees()) + direction.delta();
        if next < 0 {
            Self::Deg270
        } else if next > 270 {
            Self::Deg0
        } else {
            Self::from_degrees(next).unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationDirection {
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    pub fn delta(self) -> i32 {
        match self {
            Self::Clockwise => 90,
            Self::CounterClockwise => -90,
        }
    }

    /// Short marker shown on the toolbar button while a save is running
    pub fn label(self) -> &'static str {
        match self {
            Self::Clockwise => "CW",
            Self::CounterClockwise => "CCW",
        }
    }
}

/// Identifies one outstanding rotation save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RotationTicket(u64);

/// Save request handed to the host after an optimistic rotation
#[derive(Debug, Clone, PartialEq)]
pub struct RotationRequest {
    pub ticket: RotationTicket,
    pub document: DocumentRef,
    pub page_index: usize,
    pub angle: RotationAngle,
    pub previous: RotationAngle,
    pub direction: RotationDirection,
}

/// Last failed save, kept for the toolbar until dismissed
#[derive(Debug, Clone, PartialEq)]
pub struct RotationFailure {
    pub page_index: usize,
    /// Angle that could not be saved
    pub angle: RotationAngle,
    /// Angle the page went back to, `None` when a newer save still owns it
    pub restored: Option<RotationAngle>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationCompletion {
    /// The ticket is unknown, e.g. issued for a replaced document
    Stale,
    Saved,
    Failed { reverted: bool },
}

#[derive(Debug, Clone)]
struct PendingSave {
    ticket: RotationTicket,
    page_index: usize,
    angle: RotationAngle,
    previous: RotationAngle,
    direction: RotationDirection,
}

/// Rotation table plus the saves that have not been answered yet
#[derive(Debug, Default)]
pub struct RotationStore {
    angles: Vec<RotationAngle>,
    pending: Vec<PendingSave>,
    next_ticket: u64,
    last_failure: Option<RotationFailure>,
}

impl RotationStore {
    pub fn new(page_count: usize) -> Self {
        Self {
            angles: vec![RotationAngle::Deg0; page_count],
            ..Self::default()
        }
    }

    /// Back to all-zero for a new page set. Outstanding tickets become stale;
    /// the ticket counter keeps counting so they can never match again.
    pub fn reset(&mut self, page_count: usize) {
        self.angles = vec![RotationAngle::Deg0; page_count];
        self.pending.clear();
        self.last_failure = None;
    }

    pub fn angles(&self) -> &[RotationAngle] {
        &self.angles
    }

    pub fn angle(&self, page_index: usize) -> RotationAngle {
        self.angles.get(page_index).copied().unwrap_or_default()
    }

    /// Direction of the newest unanswered save
    pub fn in_flight(&self) -> Option<RotationDirection> {
        self.pending.last().map(|save| save.direction)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn last_failure(&self) -> Option<&RotationFailure> {
        self.last_failure.as_ref()
    }

    pub fn dismiss_failure(&mut self) -> Option<RotationFailure> {
        self.last_failure.take()
    }

    /// Apply a rotation optimistically and return the save request for it.
    pub fn rotate(
        &mut self,
        document: &DocumentRef,
        page_index: usize,
        direction: RotationDirection,
    ) -> Option<RotationRequest> {
        let slot = self.angles.get_mut(page_index)?;
        let previous = *slot;
        let angle = previous.turned(direction);
        *slot = angle;

        self.next_ticket += 1;
        let ticket = RotationTicket(self.next_ticket);
        self.pending.push(PendingSave {
            ticket,
            page_index,
            angle,
            previous,
            direction,
        });

        tracing::debug!(
            page_index,
            from = previous.degrees(),
            to = angle.degrees(),
            ?ticket,
            "optimistic rotation"
        );

        Some(RotationRequest {
            ticket,
            document: document.clone(),
            page_index,
            angle,
            previous,
            direction,
        })
    }

    /// Record the outcome of a save.
    pub fn complete(
        &mut self,
        ticket: RotationTicket,
        result: Result<(), PersistenceError>,
    ) -> RotationCompletion {
        let Some(position) = self.pending.iter().position(|save| save.ticket == ticket) else {
            tracing::debug!(?ticket, "ignoring completion of unknown rotation save");
            return RotationCompletion::Stale;
        };
        let save = self.pending.remove(position);

        let error = match result {
            Ok(()) => {
                tracing::info!(
                    page_index = save.page_index,
                    angle = save.angle.degrees(),
                    "rotation saved"
                );
                return RotationCompletion::Saved;
            }
            Err(error) => error,
        };

        // A newer save of the same page decides the final angle; it inherits
        // our rollback target in case it fails too.
        let newer = self
            .pending
            .iter_mut()
            .find(|other| other.page_index == save.page_index && other.ticket > save.ticket);

        let restored = match newer {
            Some(newer) => {
                newer.previous = save.previous;
                None
            }
            None => match self.angles.get_mut(save.page_index) {
                Some(slot) if *slot == save.angle => {
                    *slot = save.previous;
                    Some(save.previous)
                }
                _ => None,
            },
        };

        tracing::warn!(
            page_index = save.page_index,
            angle = save.angle.degrees(),
            restored = ?restored.map(RotationAngle::degrees),
            "rotation save failed: {error}"
        );

        self.last_failure = Some(RotationFailure {
            page_index: save.page_index,
            angle: save.angle,
            restored,
            message: error.to_string(),
        });

        RotationCompletion::Failed {
            reverted: restored.is_some(),
        }
    }
}

/// Document service that stores page rotations
pub trait RotationPersistence {
    fn save_rotation(
        &self,
        document: &DocumentRef,
        page_index: usize,
        angle: RotationAngle,
    ) -> impl Future<Output = Result<(), PersistenceError>>;
}

/// Run a save request against `persistence`, giving up after `timeout`.
///
/// Must be polled inside a tokio runtime with the time driver enabled.
pub async fn persist_rotation<P: RotationPersistence>(
    persistence: &P,
    request: &RotationRequest,
    timeout: Duration,
) -> Result<(), PersistenceError> {
    let save = persistence.save_rotation(&request.document, request.page_index, request.angle);
    match tokio::time::timeout(timeout, save).await {
        Ok(result) => result,
        Err(_) => Err(PersistenceError::TimedOut(timeout)),
    }
}
