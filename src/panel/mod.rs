//! # Panel Control
//!
//! Everything between a packed frame and the glass.
//!
//! ## Modules
//!
//! - [`driver`]: The [`PanelDriver`](driver::PanelDriver) facade over a hardware SDK
//! - [`controller`]: Refresh-mode state machine gating every driver call
//! - [`policy`]: Chooses full, fast or partial refreshes over time
//! - [`geometry`]: Native resolution, mounting rotation and clock placement
//! - [`shared`]: Mutex-guarded access for multi-threaded schedulers
//! - [`mock`]: Recording driver for tests and dry runs
//! - [`snapshot`]: Simulated panel that saves PNG snapshots
//!
//! ## Refresh Modes
//!
//! | Mode | Flashing | Duration | Use |
//! |------|----------|----------|-----|
//! | Full | several flashes | ~4 s | Periodic ghost cleanup, major content changes |
//! | Fast | one flash | ~1.5 s | Minor content changes |
//! | Partial | none | ~0.4 s | Clock patch |
//!
//! Switching modes reloads waveform tables and is as slow as a refresh, so
//! the controller only switches when the requested mode differs.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableauError};
use crate::render::rotation::Rect;

pub mod controller;
pub mod driver;
pub mod geometry;
pub mod mock;
pub mod policy;
pub mod shared;
pub mod snapshot;

pub use controller::RefreshController;
pub use driver::PanelDriver;
pub use geometry::PanelGeometry;
pub use policy::{ContentChanges, RefreshPolicy, RefreshTracker};

/// The hardware mode the controller believes the panel is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PanelMode {
    /// Powered down, asleep, or never initialized
    #[default]
    Uninitialized,
    Full,
    Fast,
    Partial,
}

impl std::fmt::Display for PanelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PanelMode::Uninitialized => "uninitialized",
            PanelMode::Full => "full",
            PanelMode::Fast => "fast",
            PanelMode::Partial => "partial",
        };
        f.write_str(name)
    }
}

impl From<RefreshMode> for PanelMode {
    fn from(mode: RefreshMode) -> Self {
        match mode {
            RefreshMode::Full => PanelMode::Full,
            RefreshMode::Fast => PanelMode::Fast,
            RefreshMode::Partial => PanelMode::Partial,
        }
    }
}

/// A mode the panel can be switched into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Full waveform, clears ghosting
    Full,
    /// Single-flash update
    Fast,
    /// Flicker-free update of a sub-rectangle
    Partial,
}

impl std::fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        PanelMode::from(*self).fmt(f)
    }
}

/// A half-open rectangle `[x0, x1) × [y0, y1)` in panel-native coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateRegion {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl UpdateRegion {
    /// Build a region, rejecting empty or inverted rectangles.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Self> {
        let rect = Rect::new(x0, y0, x1, y1)?;
        Ok(rect.into())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// True for empty or inverted corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to_rect().is_empty()
    }

    /// Whether the region is non-empty and lies inside a `width × height` panel.
    #[inline]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.to_rect().fits_within(width, height)
    }

    /// Clamp to a `width × height` panel.
    ///
    /// Fails when nothing of the region remains on the panel.
    pub fn clamp_to(self, width: u32, height: u32) -> Result<Self> {
        Self::new(
            self.x0.min(width),
            self.y0.min(height),
            self.x1.min(width),
            self.y1.min(height),
        )
        .map_err(|_| {
            TableauError::InvalidGeometry(format!(
                "region ({}, {})..({}, {}) lies outside {}x{} panel",
                self.x0, self.y0, self.x1, self.y1, width, height
            ))
        })
    }

    /// Widen outward so both x edges fall on byte boundaries, never past
    /// `panel_width`.
    ///
    /// Many controllers address partial windows in whole bytes on the x axis.
    ///
    /// ```
    /// use tableau::panel::UpdateRegion;
    ///
    /// let region = UpdateRegion::new(60, 190, 90, 290).unwrap();
    /// assert_eq!(region.align_x_to_bytes(800), UpdateRegion::new(56, 190, 96, 290).unwrap());
    /// ```
    pub fn align_x_to_bytes(self, panel_width: u32) -> Self {
        let x0 = self.x0 & !7;
        let x1 = self.x1.div_ceil(8).saturating_mul(8).min(panel_width.max(self.x1));
        Self { x0, x1, ..self }
    }

    pub fn to_rect(self) -> Rect {
        Rect {
            x0: self.x0,
            y0: self.y0,
            x1: self.x1,
            y1: self.y1,
        }
    }
}

impl From<Rect> for UpdateRegion {
    fn from(rect: Rect) -> Self {
        Self {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        }
    }
}

impl std::fmt::Display for UpdateRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})..({}, {}) [{}x{}]",
            self.x0,
            self.y0,
            self.x1,
            self.y1,
            self.width(),
            self.height()
        )
    }
}
