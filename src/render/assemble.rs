//! # Frame Assembler
//!
//! Turns a raster surface into a packed panel buffer in two passes:
//!
//! 1. **Dither** each touched source scanline along its natural horizontal
//!    axis into a decision plane, with a fresh [`ErrorRow`] per row.
//! 2. **Remap** every target cell through the rotation mapper and pack the
//!    result bottom-up.
//!
//! Dithering happens before rotation so error always travels along the
//! renderer's rows, which keeps the output of a rotated panel identical to the
//! unrotated one turned on its side.
//!
//! ```text
//!   surface (W × H) ──dither rows──► decisions (W × rows) ──map──► PackedBitmap
//!                                                                 (rotated rect)
//! ```
//!
//! A region is a rectangle in target (panel-native) coordinates. Only the
//! source rows it covers are dithered, each across the full surface width,
//! so the region's bits equal the same cells of a full-frame conversion.

use crate::error::{Result, TableauError};
use crate::protocol::bmp::{PackedBitmap, pack};
use crate::render::dither::{ErrorRow, MonoBit, quantize_row};
use crate::render::rotation::{Rect, Rotation, map};
use crate::render::surface::RasterSurface;

/// Convert the whole surface into a panel-native frame.
///
/// ## Example
///
/// ```
/// use image::RgbImage;
/// use tableau::render::assemble::assemble_full;
/// use tableau::render::rotation::Rotation;
///
/// let portrait = RgbImage::from_pixel(48, 80, image::Rgb([255, 255, 255]));
/// let frame = assemble_full(&portrait, Rotation::Cw90).unwrap();
/// assert_eq!((frame.width(), frame.height()), (80, 48));
/// ```
pub fn assemble_full<S>(surface: &S, rotation: Rotation) -> Result<PackedBitmap>
where
    S: RasterSurface + ?Sized,
{
    check_surface(surface)?;
    let (tw, th) = rotation.target_size(surface.width(), surface.height());
    assemble_region(surface, rotation, Rect::full(tw, th)?)
}

/// Convert the target-space rectangle `region` of the rotated surface.
///
/// The result is exactly `region.width() × region.height()`.
pub fn assemble_region<S>(surface: &S, rotation: Rotation, region: Rect) -> Result<PackedBitmap>
where
    S: RasterSurface + ?Sized,
{
    check_surface(surface)?;
    let (src_w, src_h) = (surface.width(), surface.height());
    let source = rotation.map_rect_to_source(region, src_w, src_h)?;

    let plane = DecisionPlane::dither(surface, source.y0, source.y1)?;

    pack(
        |x, y| match map(region.x0 + x, region.y0 + y, rotation, src_w, src_h) {
            Some((sx, sy)) => plane.get(sx, sy),
            None => MonoBit::White,
        },
        region.width(),
        region.height(),
    )
}

fn check_surface<S: RasterSurface + ?Sized>(surface: &S) -> Result<()> {
    if surface.width() == 0 || surface.height() == 0 {
        return Err(TableauError::InvalidGeometry(format!(
            "surface dimensions must be non-zero, got {}x{}",
            surface.width(),
            surface.height()
        )));
    }
    Ok(())
}

/// Source-space decisions for rows `y0..y1`, full width.
struct DecisionPlane {
    width: u32,
    y0: u32,
    y1: u32,
    bits: Vec<MonoBit>,
}

impl DecisionPlane {
    fn dither<S: RasterSurface + ?Sized>(surface: &S, y0: u32, y1: u32) -> Result<Self> {
        let width = surface.width();
        let len = (width as usize)
            .checked_mul((y1 - y0) as usize)
            .ok_or_else(|| TableauError::Allocation("decision plane size overflows".into()))?;

        let mut bits = Vec::new();
        bits.try_reserve_exact(len)?;

        let mut scanline = Vec::new();
        scanline.try_reserve_exact(width as usize)?;
        let mut errors = ErrorRow::new(width as usize);

        for y in y0..y1 {
            surface.read_row(y, &mut scanline);
            errors.reset();
            bits.extend(quantize_row(&scanline, &mut errors));
        }

        Ok(Self { width, y0, y1, bits })
    }

    #[inline]
    fn get(&self, x: u32, y: u32) -> MonoBit {
        if x >= self.width || !(self.y0..self.y1).contains(&y) {
            return MonoBit::White;
        }
        self.bits[(y - self.y0) as usize * self.width as usize + x as usize]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb as ImageRgb, RgbImage};

    /// Deterministic test card: gradients plus a black bar.
    fn test_card(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (4..8).contains(&y) {
                ImageRgb([0, 0, 0])
            } else {
                let v = ((x * 255) / width.max(1)) as u8;
                ImageRgb([v, v.wrapping_add(y as u8 * 3), 255 - v])
            }
        })
    }

    #[test]
    fn test_cw90_swaps_dimensions() {
        let frame = assemble_full(&test_card(24, 40), Rotation::Cw90).unwrap();
        assert_eq!(frame.width(), 40);
        assert_eq!(frame.height(), 24);
        assert_eq!(frame.row_stride_bytes(), 8);
        assert_eq!(frame.data().len(), 8 * 24);
    }

    #[test]
    fn test_identity_matches_row_dither() {
        let card = test_card(16, 12);
        let frame = assemble_full(&card, Rotation::None).unwrap();

        let mut errors = ErrorRow::new(16);
        let mut row = Vec::new();
        for y in 0..12 {
            card.read_row(y, &mut row);
            errors.reset();
            let bits = quantize_row(&row, &mut errors);
            for (x, bit) in bits.into_iter().enumerate() {
                assert_eq!(frame.get(x as u32, y), Some(bit), "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_rotated_cells_follow_mapper() {
        let card = test_card(16, 12);
        let upright = assemble_full(&card, Rotation::None).unwrap();
        for rotation in [Rotation::Cw90, Rotation::Cw180, Rotation::Cw270] {
            let frame = assemble_full(&card, rotation).unwrap();
            for ty in 0..frame.height() {
                for tx in 0..frame.width() {
                    let (sx, sy) = map(tx, ty, rotation, 16, 12).unwrap();
                    assert_eq!(frame.get(tx, ty), upright.get(sx, sy), "{}", rotation);
                }
            }
        }
    }

    #[test]
    fn test_region_equals_full_frame_cells() {
        let card = test_card(24, 40);
        let full = assemble_full(&card, Rotation::Cw90).unwrap();
        let region = Rect::from_size(5, 3, 13, 9).unwrap();
        let patch = assemble_region(&card, Rotation::Cw90, region).unwrap();

        assert_eq!((patch.width(), patch.height()), (13, 9));
        for y in 0..9 {
            for x in 0..13 {
                assert_eq!(patch.get(x, y), full.get(region.x0 + x, region.y0 + y));
            }
        }
    }

    #[test]
    fn test_white_surface_packs_white() {
        let white = RgbImage::from_pixel(10, 3, ImageRgb([255, 255, 255]));
        let frame = assemble_full(&white, Rotation::None).unwrap();
        for row in frame.data().chunks(4) {
            assert_eq!(row, &[0xFF, 0xC0, 0x00, 0x00]);
        }
    }

    #[test]
    fn test_region_outside_target_rejected() {
        let card = test_card(24, 40);
        let region = Rect::from_size(30, 0, 20, 4).unwrap();
        assert!(matches!(
            assemble_region(&card, Rotation::Cw90, region),
            Err(TableauError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let card = test_card(33, 17);
        let a = assemble_full(&card, Rotation::Cw270).unwrap();
        let b = assemble_full(&card, Rotation::Cw270).unwrap();
        assert_eq!(a.to_bmp_bytes(), b.to_bmp_bytes());
    }
}
