//! # Refresh-Mode Controller
//!
//! Tracks the panel's hardware mode and gates every call into the driver.
//!
//! ## State Machine
//!
//! ```text
//!                   init()
//!  ┌─────────────┐ ───────► ┌──────┐ ensure_mode ┌──────┐
//!  │Uninitialized│          │ Full │ ◄─────────► │ Fast │
//!  └─────────────┘ ◄─────── └──────┘             └──────┘
//!         ▲         sleep()     ▲                    ▲
//!         │                     │    ensure_mode     │
//!         │                     ▼                    ▼
//!         │                  ┌─────────┐             │
//!         └──── sleep() ──── │ Partial │ ◄───────────┘
//!                            └─────────┘
//! ```
//!
//! - A mode switch only reaches the driver when the requested mode differs
//!   from the current one.
//! - The recorded mode changes only after the driver reports success, so a
//!   failed call leaves the last known-good estimate in place.
//! - Writes in the wrong mode are rejected before any driver call; the
//!   controller never switches modes on its own.

use tracing::{debug, info, warn};

use crate::error::{Result, TableauError};
use crate::panel::driver::PanelDriver;
use crate::panel::{PanelMode, RefreshMode, UpdateRegion};
use crate::protocol::bmp::PackedBitmap;

/// Owns a [`PanelDriver`] and the controller's belief about its mode.
#[derive(Debug)]
pub struct RefreshController<D: PanelDriver> {
    driver: D,
    mode: PanelMode,
    width: u32,
    height: u32,
}

impl<D: PanelDriver> RefreshController<D> {
    /// Wrap a driver. The panel is assumed uninitialized.
    pub fn new(driver: D) -> Self {
        let (width, height) = driver.native_size();
        Self {
            driver,
            mode: PanelMode::Uninitialized,
            width,
            height,
        }
    }

    /// Current mode estimate.
    #[inline]
    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.mode != PanelMode::Uninitialized
    }

    /// Native panel resolution.
    #[inline]
    pub fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Forget the mode estimate so the next cycle re-initializes.
    pub fn invalidate(&mut self) {
        if self.mode != PanelMode::Uninitialized {
            warn!(mode = %self.mode, "Panel mode estimate invalidated");
        }
        self.mode = PanelMode::Uninitialized;
    }

    /// Initialize and clear the panel, leaving it in full mode.
    pub fn init(&mut self) -> Result<()> {
        self.mode = PanelMode::Uninitialized;

        self.driver
            .init()
            .map_err(|e| TableauError::hardware("init", e))?;
        self.driver
            .clear()
            .map_err(|e| TableauError::hardware("clear", e))?;

        self.mode = PanelMode::Full;
        info!(width = self.width, height = self.height, "Panel initialized");
        Ok(())
    }

    /// Make sure the panel is in `target` mode.
    ///
    /// Returns `true` when a mode switch was issued to the driver.
    pub fn ensure_mode(&mut self, target: RefreshMode) -> Result<bool> {
        if self.mode == PanelMode::Uninitialized {
            return Err(TableauError::NotInitialized);
        }
        if self.mode == PanelMode::from(target) {
            debug!(mode = %target, "Panel already in requested mode");
            return Ok(false);
        }

        debug!(from = %self.mode, to = %target, "Switching refresh mode");
        self.driver
            .enter_mode(target)
            .map_err(|e| TableauError::hardware("enter_mode", e))?;
        self.mode = target.into();
        Ok(true)
    }

    /// Write a whole frame. The panel must be in full or fast mode.
    pub fn write_full(&mut self, buffer: &PackedBitmap) -> Result<()> {
        match self.mode {
            PanelMode::Full | PanelMode::Fast => {}
            PanelMode::Uninitialized => return Err(TableauError::NotInitialized),
            actual => {
                return Err(TableauError::ModeMismatch {
                    expected: "full or fast",
                    actual,
                });
            }
        }

        if (buffer.width(), buffer.height()) != (self.width, self.height) {
            return Err(TableauError::InvalidGeometry(format!(
                "frame is {}x{}, panel is {}x{}",
                buffer.width(),
                buffer.height(),
                self.width,
                self.height
            )));
        }

        self.driver
            .write_full(buffer)
            .map_err(|e| TableauError::hardware("write_full", e))?;
        debug!(mode = %self.mode, "Full frame written");
        Ok(())
    }

    /// Write `buffer` into `region`. The panel must be in partial mode.
    pub fn write_region(&mut self, buffer: &PackedBitmap, region: UpdateRegion) -> Result<()> {
        match self.mode {
            PanelMode::Partial => {}
            PanelMode::Uninitialized => return Err(TableauError::NotInitialized),
            actual => {
                return Err(TableauError::ModeMismatch {
                    expected: "partial",
                    actual,
                });
            }
        }

        if region.is_empty() {
            return Err(TableauError::InvalidGeometry(format!(
                "empty region ({}, {})..({}, {})",
                region.x0, region.y0, region.x1, region.y1
            )));
        }
        if !region.fits_within(self.width, self.height) {
            return Err(TableauError::InvalidGeometry(format!(
                "region {} outside {}x{} panel",
                region, self.width, self.height
            )));
        }
        if (buffer.width(), buffer.height()) != (region.width(), region.height()) {
            return Err(TableauError::InvalidGeometry(format!(
                "buffer is {}x{}, region {} differs",
                buffer.width(),
                buffer.height(),
                region
            )));
        }

        self.driver
            .write_region(buffer, region)
            .map_err(|e| TableauError::hardware("write_region", e))?;
        debug!(%region, "Region written");
        Ok(())
    }

    /// Put the panel to sleep. The next use requires [`init`](Self::init).
    pub fn sleep(&mut self) -> Result<()> {
        let result = self
            .driver
            .sleep()
            .map_err(|e| TableauError::hardware("sleep", e));
        // After a failed sleep the panel state is unknown either way.
        self.mode = PanelMode::Uninitialized;
        result?;
        info!("Panel asleep");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
