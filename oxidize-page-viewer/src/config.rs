//! Viewer configuration
//!
//! Everything has a default, so an empty JSON object is a valid
//! configuration. Values are validated at load time and again by the
//! constructors that consume them.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Discrete zoom table bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub min: f32,
    pub max: f32,
    /// Number of levels per doubling of the scale
    pub steps_per_doubling: u32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.25,
            max: 4.0,
            steps_per_doubling: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Quiet interval before a burst of scroll events is evaluated
    pub scroll_debounce_ms: u64,
    /// Fraction of the viewport width reserved for scrollbar and padding
    pub viewport_margin: f32,
    /// Vertical gap between stacked pages
    pub page_gap: f32,
    pub rotation_save_timeout_ms: u64,
    pub zoom: ZoomConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scroll_debounce_ms: 300,
            viewport_margin: 0.03,
            page_gap: 0.0,
            rotation_save_timeout_ms: 10_000,
            zoom: ZoomConfig::default(),
        }
    }
}

impl ZoomConfig {
    const MAX_STEPS_PER_DOUBLING: u32 = 64;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.min > 0.0) {
            return Err(invalid("zoom.min", "must be positive"));
        }
        if !(self.max.is_finite() && self.max > self.min) {
            return Err(invalid("zoom.max", "must be greater than zoom.min"));
        }
        if !(1..=Self::MAX_STEPS_PER_DOUBLING).contains(&self.steps_per_doubling) {
            return Err(invalid(
                "zoom.steps_per_doubling",
                format!("must be within 1..={}", Self::MAX_STEPS_PER_DOUBLING),
            ));
        }
        Ok(())
    }
}

impl ViewerConfig {
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn rotation_save_timeout(&self) -> Duration {
        Duration::from_millis(self.rotation_save_timeout_ms)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("Failed to read viewer config {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("Failed to load viewer config {}", path.display()))?;
        tracing::info!("Loaded viewer configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport_margin.is_finite() && (0.0..1.0).contains(&self.viewport_margin)) {
            return Err(invalid("viewport_margin", "must be within [0, 1)"));
        }
        if !(self.page_gap.is_finite() && self.page_gap >= 0.0) {
            return Err(invalid("page_gap", "must be a non-negative number"));
        }
        self.zoom.validate()
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    let reason = reason.into();
    tracing::warn!("Rejected viewer configuration: {field} {reason}");
    ConfigError::Invalid { field, reason }
}
