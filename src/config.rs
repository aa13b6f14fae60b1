//! # Configuration
//!
//! JSON description of the panel, the clock patch and the refresh policy.
//! Every field is optional; missing fields take the Waveshare 7.5" V2
//! defaults (800 × 480 native, mounted CW90 under a portrait dashboard).
//!
//! ## Example
//!
//! ```
//! use tableau::config::DashboardConfig;
//!
//! let json = r#"{
//!     "panel": {"rotation": "cw270"},
//!     "refresh": {"max_partial_updates": 5}
//! }"#;
//!
//! let config = DashboardConfig::from_json(json).unwrap();
//! assert_eq!(config.panel.width, 800);
//! assert_eq!(config.policy().unwrap().max_partial_updates, 5);
//! ```

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableauError};
use crate::panel::geometry::{ClockPatch, DEFAULT_NATIVE_HEIGHT, DEFAULT_NATIVE_WIDTH, PanelGeometry};
use crate::panel::policy::{DEFAULT_MAX_FULL_INTERVAL_HOURS, DEFAULT_MAX_PARTIAL_UPDATES, RefreshPolicy};
use crate::render::rotation::{Rect, Rotation};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub panel: PanelSection,
    pub clock: ClockSection,
    pub refresh: RefreshSection,
}

/// Native panel resolution and mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSection {
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

impl Default for PanelSection {
    fn default() -> Self {
        Self {
            width: DEFAULT_NATIVE_WIDTH,
            height: DEFAULT_NATIVE_HEIGHT,
            rotation: Rotation::Cw90,
        }
    }
}

/// Clock patch in logical (dashboard) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockSection {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub align_to_bytes: bool,
}

impl Default for ClockSection {
    fn default() -> Self {
        let patch = ClockPatch::default();
        Self {
            x: patch.rect.x0,
            y: patch.rect.y0,
            width: patch.rect.width(),
            height: patch.rect.height(),
            align_to_bytes: patch.align_to_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSection {
    pub max_partial_updates: u32,
    pub max_full_interval_hours: u32,
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            max_partial_updates: DEFAULT_MAX_PARTIAL_UPDATES,
            max_full_interval_hours: DEFAULT_MAX_FULL_INTERVAL_HOURS as u32,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TableauError::Config(e.to_string()))
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| TableauError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TableauError::Config(e.to_string()))
    }

    /// Validated panel geometry.
    pub fn geometry(&self) -> Result<PanelGeometry> {
        let clock = ClockPatch {
            rect: Rect::from_size(self.clock.x, self.clock.y, self.clock.width, self.clock.height)?,
            align_to_bytes: self.clock.align_to_bytes,
        };
        PanelGeometry::new(self.panel.width, self.panel.height, self.panel.rotation, clock)
    }

    /// Validated refresh policy.
    pub fn policy(&self) -> Result<RefreshPolicy> {
        if self.refresh.max_full_interval_hours == 0 {
            return Err(TableauError::Config(
                "max_full_interval_hours must be at least 1".into(),
            ));
        }
        Ok(RefreshPolicy {
            max_partial_updates: self.refresh.max_partial_updates,
            max_full_interval: TimeDelta::hours(i64::from(self.refresh.max_full_interval_hours)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = DashboardConfig::from_json("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.geometry().unwrap(), PanelGeometry::default());
        assert_eq!(config.policy().unwrap(), RefreshPolicy::default());
    }

    #[test]
    fn test_default_clock_section() {
        let clock = ClockSection::default();
        assert_eq!((clock.x, clock.y, clock.width, clock.height), (190, 60, 100, 30));
    }

    #[test]
    fn test_partial_override() {
        let config = DashboardConfig::from_json(
            r#"{"panel": {"width": 296, "height": 128, "rotation": "none"}, "clock": {"x": 0, "y": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.panel.rotation, Rotation::None);
        assert_eq!(config.clock.width, 100);
        let geometry = config.geometry().unwrap();
        assert_eq!(geometry.logical_size(), (296, 128));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_json(r#"{"panel": {"rotation": "cw45"}}"#),
            Err(TableauError::Config(_))
        ));

        let zero_interval = DashboardConfig::from_json(r#"{"refresh": {"max_full_interval_hours": 0}}"#).unwrap();
        assert!(zero_interval.policy().is_err());

        let off_panel = DashboardConfig::from_json(r#"{"clock": {"x": 450}}"#).unwrap();
        assert!(matches!(off_panel.geometry(), Err(TableauError::InvalidGeometry(_))));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tableau.json");
        let mut config = DashboardConfig::default();
        config.refresh.max_partial_updates = 3;
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        assert_eq!(DashboardConfig::load(&path).unwrap(), config);
        assert!(DashboardConfig::load(dir.path().join("missing.json")).is_err());
    }
}
