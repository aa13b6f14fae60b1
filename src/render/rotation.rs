//! # Rotation Mapper
//!
//! Maps pixel coordinates between the logical raster (what the dashboard
//! renderer draws) and the panel's native frame (how the glass is mounted).
//!
//! ## Transforms
//!
//! For a source raster of `W × H`:
//!
//! | Rotation | Target size | `target(x, y)` reads |
//! |----------|-------------|----------------------|
//! | `None`   | `W × H`     | `raster(x, y)` |
//! | `Cw90`   | `H × W`     | `raster(W-1-y, x)` |
//! | `Cw180`  | `W × H`     | `raster(W-1-x, H-1-y)` |
//! | `Cw270`  | `H × W`     | `raster(y, H-1-x)` |
//!
//! A portrait `480 × 800` dashboard on a landscape `800 × 480` panel uses
//! `Cw90`:
//!
//! ```text
//!   raster (480 × 800)            panel (800 × 480)
//!   (0,0) ────────► x             (0,0) ───────────────► x
//!     │  A ········ B               │  B ············· C
//!     │  :         :                │  :               :
//!     │  D ········ C               │  A ············· D
//!     ▼ y                           ▼ y
//! ```
//!
//! All arithmetic is integer and exact; corners map to corners.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableauError};

/// Axis-aligned rotation between the raster and the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Parse a rotation name as used on the command line and in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "0" => Some(Rotation::None),
            "cw90" | "90" => Some(Rotation::Cw90),
            "cw180" | "180" => Some(Rotation::Cw180),
            "cw270" | "270" => Some(Rotation::Cw270),
            _ => None,
        }
    }

    /// Whether width and height trade places.
    #[inline]
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Cw270)
    }

    /// Dimensions of the rotated frame for a `src_w × src_h` raster.
    #[inline]
    pub fn target_size(self, src_w: u32, src_h: u32) -> (u32, u32) {
        if self.swaps_axes() {
            (src_h, src_w)
        } else {
            (src_w, src_h)
        }
    }

    /// Map a half-open source rectangle to the target rectangle covering
    /// exactly the same pixels.
    pub fn map_rect_to_target(self, rect: Rect, src_w: u32, src_h: u32) -> Result<Rect> {
        rect.check_within(src_w, src_h)?;
        let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
        let mapped = match self {
            Rotation::None => Rect { x0, y0, x1, y1 },
            Rotation::Cw90 => Rect {
                x0: y0,
                y0: src_w - x1,
                x1: y1,
                y1: src_w - x0,
            },
            Rotation::Cw180 => Rect {
                x0: src_w - x1,
                y0: src_h - y1,
                x1: src_w - x0,
                y1: src_h - y0,
            },
            Rotation::Cw270 => Rect {
                x0: src_h - y1,
                y0: x0,
                x1: src_h - y0,
                y1: x1,
            },
        };
        Ok(mapped)
    }

    /// Map a half-open target rectangle back to the source rectangle.
    pub fn map_rect_to_source(self, rect: Rect, src_w: u32, src_h: u32) -> Result<Rect> {
        let (tw, th) = self.target_size(src_w, src_h);
        rect.check_within(tw, th)?;
        let (x0, y0, x1, y1) = (rect.x0, rect.y0, rect.x1, rect.y1);
        let mapped = match self {
            Rotation::None => Rect { x0, y0, x1, y1 },
            Rotation::Cw90 => Rect {
                x0: src_w - y1,
                y0: x0,
                x1: src_w - y0,
                y1: x1,
            },
            Rotation::Cw180 => Rect {
                x0: src_w - x1,
                y0: src_h - y1,
                x1: src_w - x0,
                y1: src_h - y0,
            },
            Rotation::Cw270 => Rect {
                x0: y0,
                y0: src_h - x1,
                x1: y1,
                y1: src_h - x0,
            },
        };
        Ok(mapped)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rotation::None => "none",
            Rotation::Cw90 => "cw90",
            Rotation::Cw180 => "cw180",
            Rotation::Cw270 => "cw270",
        };
        f.write_str(name)
    }
}

/// A half-open pixel rectangle `[x0, x1) × [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    /// Build a non-empty rectangle from its corners.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Self> {
        if x1 <= x0 || y1 <= y0 {
            return Err(TableauError::InvalidGeometry(format!(
                "empty rectangle ({}, {})..({}, {})",
                x0, y0, x1, y1
            )));
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    /// Build a rectangle from its origin and size.
    pub fn from_size(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        let x1 = x.checked_add(width);
        let y1 = y.checked_add(height);
        match (x1, y1) {
            (Some(x1), Some(y1)) => Self::new(x, y, x1, y1),
            _ => Err(TableauError::InvalidGeometry(format!(
                "rectangle at ({}, {}) of {}x{} overflows",
                x, y, width, height
            ))),
        }
    }

    /// Rectangle covering a whole `width × height` frame.
    pub fn full(width: u32, height: u32) -> Result<Self> {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// True for empty or inverted corners, which deserialized values can carry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Whether the rectangle is non-empty and lies inside `[0, width] × [0, height]`.
    #[inline]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.x1 <= width && self.y1 <= height
    }

    fn check_within(&self, width: u32, height: u32) -> Result<()> {
        if self.fits_within(width, height) {
            Ok(())
        } else {
            Err(TableauError::InvalidGeometry(format!(
                "rectangle ({}, {})..({}, {}) outside {}x{} frame",
                self.x0, self.y0, self.x1, self.y1, width, height
            )))
        }
    }
}

/// Resolve the source pixel that feeds target pixel `(target_x, target_y)`.
///
/// Returns `None` when the target coordinate has no source pixel, which
/// callers render as white background.
///
/// ## Example
///
/// ```
/// use tableau::render::rotation::{map, Rotation};
///
/// // Top-left of the panel reads the top-right of a 480 × 800 raster.
/// assert_eq!(map(0, 0, Rotation::Cw90, 480, 800), Some((479, 0)));
/// assert_eq!(map(799, 479, Rotation::Cw90, 480, 800), Some((0, 799)));
/// ```
pub fn map(
    target_x: u32,
    target_y: u32,
    rotation: Rotation,
    src_w: u32,
    src_h: u32,
) -> Option<(u32, u32)> {
    let (tx, ty) = (i64::from(target_x), i64::from(target_y));
    let (w, h) = (i64::from(src_w), i64::from(src_h));

    let (sx, sy) = match rotation {
        Rotation::None => (tx, ty),
        Rotation::Cw90 => (w - 1 - ty, tx),
        Rotation::Cw180 => (w - 1 - tx, h - 1 - ty),
        Rotation::Cw270 => (ty, h - 1 - tx),
    };

    if (0..w).contains(&sx) && (0..h).contains(&sy) {
        Some((sx as u32, sy as u32))
    } else {
        None
    }
}

/// Inverse of [`map`]: the target pixel that source pixel `(src_x, src_y)`
/// lands on.
pub fn inverse(
    src_x: u32,
    src_y: u32,
    rotation: Rotation,
    src_w: u32,
    src_h: u32,
) -> Option<(u32, u32)> {
    if src_x >= src_w || src_y >= src_h {
        return None;
    }

    let target = match rotation {
        Rotation::None => (src_x, src_y),
        Rotation::Cw90 => (src_y, src_w - 1 - src_x),
        Rotation::Cw180 => (src_w - 1 - src_x, src_h - 1 - src_y),
        Rotation::Cw270 => (src_h - 1 - src_y, src_x),
    };
    Some(target)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 480;
    const H: u32 = 800;

    #[test]
    fn test_cw90_corners() {
        let (w_rot, h_rot) = Rotation::Cw90.target_size(W, H);
        assert_eq!((w_rot, h_rot), (H, W));

        assert_eq!(map(0, 0, Rotation::Cw90, W, H), Some((W - 1, 0)));
        assert_eq!(map(w_rot - 1, h_rot - 1, Rotation::Cw90, W, H), Some((0, H - 1)));
        assert_eq!(map(w_rot - 1, 0, Rotation::Cw90, W, H), Some((W - 1, H - 1)));
        assert_eq!(map(0, h_rot - 1, Rotation::Cw90, W, H), Some((0, 0)));
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(map(H, 0, Rotation::Cw90, W, H), None);
        assert_eq!(map(0, W, Rotation::Cw90, W, H), None);
        assert_eq!(map(W, 0, Rotation::None, W, H), None);
        assert_eq!(map(0, H, Rotation::Cw180, W, H), None);
        assert_eq!(inverse(W, 0, Rotation::Cw90, W, H), None);
    }

    #[test]
    fn test_identity() {
        assert_eq!(map(17, 33, Rotation::None, W, H), Some((17, 33)));
        assert_eq!(inverse(17, 33, Rotation::None, W, H), Some((17, 33)));
    }

    #[test]
    fn test_cw180_and_cw270_corners() {
        assert_eq!(map(0, 0, Rotation::Cw180, W, H), Some((W - 1, H - 1)));
        assert_eq!(map(0, 0, Rotation::Cw270, W, H), Some((0, H - 1)));
        assert_eq!(map(H - 1, W - 1, Rotation::Cw270, W, H), Some((W - 1, 0)));
    }

    #[test]
    fn test_inverse_undoes_map_on_corners() {
        for rotation in [Rotation::None, Rotation::Cw90, Rotation::Cw180, Rotation::Cw270] {
            let (tw, th) = rotation.target_size(W, H);
            for (tx, ty) in [(0, 0), (tw - 1, 0), (0, th - 1), (tw - 1, th - 1)] {
                let (sx, sy) = map(tx, ty, rotation, W, H).unwrap();
                assert_eq!(inverse(sx, sy, rotation, W, H), Some((tx, ty)), "{}", rotation);
            }
        }
    }

    #[test]
    fn test_rect_cw90_clock_patch() {
        // Clock patch of the portrait dashboard lands on panel x 60..90
        let logical = Rect::from_size(190, 60, 100, 30).unwrap();
        let native = Rotation::Cw90.map_rect_to_target(logical, W, H).unwrap();
        assert_eq!(native, Rect::new(60, 190, 90, 290).unwrap());
        assert_eq!(Rotation::Cw90.map_rect_to_source(native, W, H).unwrap(), logical);
    }

    #[test]
    fn test_rect_mapping_covers_same_pixels() {
        let logical = Rect::from_size(3, 5, 4, 2).unwrap();
        for rotation in [Rotation::None, Rotation::Cw90, Rotation::Cw180, Rotation::Cw270] {
            let target = rotation.map_rect_to_target(logical, 10, 12).unwrap();
            assert_eq!(target.width() * target.height(), 8);
            for ty in target.y0..target.y1 {
                for tx in target.x0..target.x1 {
                    let (sx, sy) = map(tx, ty, rotation, 10, 12).unwrap();
                    assert!((logical.x0..logical.x1).contains(&sx), "{}", rotation);
                    assert!((logical.y0..logical.y1).contains(&sy), "{}", rotation);
                }
            }
        }
    }

    #[test]
    fn test_rect_validation() {
        assert!(Rect::new(5, 5, 5, 10).is_err());
        assert!(Rect::from_size(u32::MAX, 0, 2, 2).is_err());
        let outside = Rect::from_size(470, 0, 20, 10).unwrap();
        assert!(Rotation::Cw90.map_rect_to_target(outside, W, H).is_err());
    }

    #[test]
    fn test_inverted_rect_rejected_by_mapping() {
        let inverted = Rect { x0: 90, y0: 190, x1: 60, y1: 290 };
        assert!(inverted.is_empty());
        assert_eq!(inverted.width(), 0);
        assert!(!inverted.fits_within(W, H));
        assert!(matches!(
            Rotation::Cw90.map_rect_to_target(inverted, W, H),
            Err(TableauError::InvalidGeometry(_))
        ));
        assert!(Rotation::None.map_rect_to_source(inverted, W, H).is_err());
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(Rotation::from_name("CW90"), Some(Rotation::Cw90));
        assert_eq!(Rotation::from_name("270"), Some(Rotation::Cw270));
        assert_eq!(Rotation::from_name("sideways"), None);
        assert_eq!(Rotation::Cw180.to_string(), "cw180");
    }
}
