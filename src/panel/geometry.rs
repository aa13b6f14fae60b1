//! Panel geometry: native resolution, mounting rotation and where the clock
//! patch sits.
//!
//! The dashboard is drawn in logical coordinates (portrait for a landscape
//! panel turned on its side). Every native coordinate, including the clock's
//! partial-update window, is derived from the rotation transform.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableauError};
use crate::panel::UpdateRegion;
use crate::render::rotation::{Rect, Rotation};

/// Waveshare 7.5" V2 native width.
pub const DEFAULT_NATIVE_WIDTH: u32 = 800;

/// Waveshare 7.5" V2 native height.
pub const DEFAULT_NATIVE_HEIGHT: u32 = 480;

/// Placement of the clock patch on the logical raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockPatch {
    /// Rectangle in logical coordinates
    pub rect: Rect,
    /// Widen the native window to whole bytes on the x axis
    pub align_to_bytes: bool,
}

impl Default for ClockPatch {
    fn default() -> Self {
        Self {
            rect: Rect {
                x0: 190,
                y0: 60,
                x1: 290,
                y1: 90,
            },
            align_to_bytes: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    native_width: u32,
    native_height: u32,
    rotation: Rotation,
    clock: ClockPatch,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            native_width: DEFAULT_NATIVE_WIDTH,
            native_height: DEFAULT_NATIVE_HEIGHT,
            rotation: Rotation::Cw90,
            clock: ClockPatch::default(),
        }
    }
}

impl PanelGeometry {
    /// Describe a panel of `native_width × native_height` mounted with
    /// `rotation` relative to the logical raster.
    pub fn new(native_width: u32, native_height: u32, rotation: Rotation, clock: ClockPatch) -> Result<Self> {
        if native_width == 0 || native_height == 0 {
            return Err(TableauError::InvalidGeometry(format!(
                "panel dimensions must be non-zero, got {}x{}",
                native_width, native_height
            )));
        }
        let geometry = Self {
            native_width,
            native_height,
            rotation,
            clock,
        };

        let (lw, lh) = geometry.logical_size();
        if !clock.rect.fits_within(lw, lh) {
            return Err(TableauError::InvalidGeometry(format!(
                "clock patch ({}, {})..({}, {}) outside {}x{} logical raster",
                clock.rect.x0, clock.rect.y0, clock.rect.x1, clock.rect.y1, lw, lh
            )));
        }
        Ok(geometry)
    }

    #[inline]
    pub fn native_size(&self) -> (u32, u32) {
        (self.native_width, self.native_height)
    }

    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[inline]
    pub fn clock(&self) -> ClockPatch {
        self.clock
    }

    /// Size of the raster the renderer must produce.
    pub fn logical_size(&self) -> (u32, u32) {
        // Axis-aligned rotations are their own size inverse.
        self.rotation.target_size(self.native_width, self.native_height)
    }

    /// Fail unless a `width × height` surface matches the logical size.
    pub fn check_surface(&self, width: u32, height: u32) -> Result<()> {
        let (lw, lh) = self.logical_size();
        if (width, height) != (lw, lh) {
            return Err(TableauError::InvalidGeometry(format!(
                "surface is {}x{}, panel expects {}x{} ({} rotation)",
                width, height, lw, lh, self.rotation
            )));
        }
        Ok(())
    }

    /// The clock rectangle in native coordinates, before byte alignment.
    pub fn clock_native_rect(&self) -> Result<Rect> {
        let (lw, lh) = self.logical_size();
        self.rotation.map_rect_to_target(self.clock.rect, lw, lh)
    }

    /// Native partial-update window for the clock patch.
    pub fn clock_region(&self) -> Result<UpdateRegion> {
        let native = UpdateRegion::from(self.clock_native_rect()?)
            .clamp_to(self.native_width, self.native_height)?;
        if self.clock.align_to_bytes {
            Ok(native.align_x_to_bytes(self.native_width))
        } else {
            Ok(native)
        }
    }

    /// Logical rectangle covered by [`clock_region`](Self::clock_region).
    ///
    /// Equal to the clock rectangle unless byte alignment widened it.
    pub fn clock_source_rect(&self) -> Result<Rect> {
        let (lw, lh) = self.logical_size();
        self.rotation
            .map_rect_to_source(self.clock_region()?.to_rect(), lw, lh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_portrait_on_landscape() {
        let geometry = PanelGeometry::default();
        assert_eq!(geometry.native_size(), (800, 480));
        assert_eq!(geometry.logical_size(), (480, 800));
        assert!(geometry.check_surface(480, 800).is_ok());
        assert!(geometry.check_surface(800, 480).is_err());
    }

    #[test]
    fn test_clock_region_from_rotation() {
        let unaligned = ClockPatch {
            align_to_bytes: false,
            ..ClockPatch::default()
        };
        let geometry = PanelGeometry::new(800, 480, Rotation::Cw90, unaligned).unwrap();
        assert_eq!(
            geometry.clock_region().unwrap(),
            UpdateRegion::new(60, 190, 90, 290).unwrap()
        );
        assert_eq!(geometry.clock_source_rect().unwrap(), unaligned.rect);
        assert_eq!(geometry.clock_native_rect().unwrap(), Rect::new(60, 190, 90, 290).unwrap());
    }

    #[test]
    fn test_aligned_clock_region() {
        let geometry = PanelGeometry::default();
        let region = geometry.clock_region().unwrap();
        assert_eq!(region, UpdateRegion::new(56, 190, 96, 290).unwrap());

        // logical y widens to cover native x 56..96
        let source = geometry.clock_source_rect().unwrap();
        assert_eq!(source, Rect::new(190, 56, 290, 96).unwrap());
    }

    #[test]
    fn test_unrotated_clock_region() {
        let clock = ClockPatch {
            rect: Rect::new(10, 20, 30, 25).unwrap(),
            align_to_bytes: false,
        };
        let geometry = PanelGeometry::new(64, 32, Rotation::None, clock).unwrap();
        assert_eq!(geometry.clock_region().unwrap(), UpdateRegion::new(10, 20, 30, 25).unwrap());
    }

    #[test]
    fn test_clock_outside_raster_rejected() {
        let clock = ClockPatch {
            rect: Rect::new(470, 0, 500, 10).unwrap(),
            align_to_bytes: false,
        };
        assert!(PanelGeometry::new(800, 480, Rotation::Cw90, clock).is_err());
        assert!(PanelGeometry::new(0, 480, Rotation::Cw90, ClockPatch::default()).is_err());
    }
}
