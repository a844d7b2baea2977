//! Discrete zoom steps
//!
//! Zoom-in/zoom-out walk a fixed geometric table of levels. Scales that came
//! from a fit mode usually sit between two levels; stepping snaps them to the
//! neighbouring level in the requested direction so every step feels the
//! same size.

use crate::config::ZoomConfig;
use crate::error::ConfigError;

/// Relative tolerance below which two scales count as the same level
const LEVEL_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomStepper {
    levels: Vec<f32>,
}

impl Default for ZoomStepper {
    fn default() -> Self {
        Self::build(&ZoomConfig::default())
    }
}

impl ZoomStepper {
    /// Build the level table. Bounds that cannot form a finite table of
    /// positive levels are rejected.
    pub fn new(config: &ZoomConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: &ZoomConfig) -> Self {
        let steps = f64::from(config.steps_per_doubling.max(1));
        let (min, max) = (f64::from(config.min), f64::from(config.max));
        let count = ((max / min).log2() * steps).round().max(1.0) as usize;

        let mut levels: Vec<f32> = (0..count)
            .map(|k| (min * 2f64.powf(k as f64 / steps)) as f32)
            .filter(|level| *level < config.max)
            .collect();
        levels.push(config.max);

        Self { levels }
    }

    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn min(&self) -> f32 {
        self.levels[0]
    }

    pub fn max(&self) -> f32 {
        self.levels[self.levels.len() - 1]
    }

    /// Smallest level strictly above `current`, or the maximum
    pub fn zoom_in(&self, current: f32) -> f32 {
        let current = self.sanitize(current);
        let threshold = current * (1.0 + LEVEL_TOLERANCE);
        self.levels
            .iter()
            .copied()
            .find(|level| *level > threshold)
            .unwrap_or_else(|| self.max())
    }

    /// Largest level strictly below `current`, or the minimum
    pub fn zoom_out(&self, current: f32) -> f32 {
        let current = self.sanitize(current);
        let threshold = current * (1.0 - LEVEL_TOLERANCE);
        self.levels
            .iter()
            .rev()
            .copied()
            .find(|level| *level < threshold)
            .unwrap_or_else(|| self.min())
    }

    fn sanitize(&self, current: f32) -> f32 {
        if current.is_finite() && current > 0.0 {
            current
        } else {
            1.0
        }
    }
}
