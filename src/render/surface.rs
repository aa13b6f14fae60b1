//! # Raster Surfaces
//!
//! Read-only views over the RGB raster the dashboard renderer produces.
//!
//! The pipeline never owns the raster: it borrows a [`RasterSurface`] for one
//! conversion call and reads pixels through [`RasterSurface::pixel`], so the
//! underlying byte layout is irrelevant to the quantizer.
//!
//! Two layouts ship with the crate:
//!
//! | Type | Layout | Typical producer |
//! |------|--------|------------------|
//! | [`image::RgbImage`] | packed `R G B`, stride `3 × W` | image files, tests |
//! | [`Argb32Surface`] | native-endian 32-bit `0xAARRGGBB`, stride ≥ `4 × W` | Cairo `ARGB32`/`RGB24` |

use std::path::Path;

use image::{Rgb as ImageRgb, RgbImage, RgbaImage};

use crate::error::{Result, TableauError};
use crate::render::dither::Rgb;

/// A borrowed RGB raster with known width, height and row stride.
pub trait RasterSurface {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Bytes between the starts of consecutive rows.
    fn stride(&self) -> usize;

    /// Pixel at `(x, y)`; callers guarantee `x < width` and `y < height`.
    fn pixel(&self, x: u32, y: u32) -> Rgb;

    /// Copy row `y` into `out`, replacing its contents.
    fn read_row(&self, y: u32, out: &mut Vec<Rgb>) {
        out.clear();
        out.extend((0..self.width()).map(|x| self.pixel(x, y)));
    }
}

impl RasterSurface for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn stride(&self) -> usize {
        self.dimensions().0 as usize * 3
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        let ImageRgb([r, g, b]) = *self.get_pixel(x, y);
        Rgb::new(r, g, b)
    }
}

/// A Cairo-style 32-bit surface borrowed from the renderer.
///
/// Each pixel is a native-endian `u32` holding `0xAARRGGBB`; on
/// little-endian hosts the bytes read `B G R A`. The alpha byte is ignored:
/// the producer composites onto white before handing the surface over.
#[derive(Debug, Clone, Copy)]
pub struct Argb32Surface<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> Argb32Surface<'a> {
    /// Wrap renderer memory.
    ///
    /// Fails when a dimension is zero, the stride cannot hold a row, or the
    /// buffer is shorter than the last row.
    pub fn new(data: &'a [u8], width: u32, height: u32, stride: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TableauError::InvalidGeometry(format!(
                "surface dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let row_bytes = width as usize * 4;
        if stride < row_bytes {
            return Err(TableauError::InvalidGeometry(format!(
                "stride {} too small for {} pixels",
                stride, width
            )));
        }

        let required = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes));
        match required {
            Some(required) if data.len() >= required => Ok(Self {
                data,
                width,
                height,
                stride,
            }),
            _ => Err(TableauError::InvalidGeometry(format!(
                "buffer of {} bytes too short for {}x{} surface with stride {}",
                data.len(),
                width,
                height,
                stride
            ))),
        }
    }
}

impl RasterSurface for Argb32Surface<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn pixel(&self, x: u32, y: u32) -> Rgb {
        let offset = y as usize * self.stride + x as usize * 4;
        let word = u32::from_ne_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]);
        Rgb::new((word >> 16) as u8, (word >> 8) as u8, word as u8)
    }
}

/// Load an image file as RGB, compositing any alpha channel onto white.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|e| TableauError::Image(format!("Failed to load {}: {}", path.display(), e)))?;
    Ok(flatten_onto_white(&img.to_rgba8()))
}

/// Composite an RGBA image onto an opaque white background.
pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        ImageRgb([blend(r), blend(g), blend(b)])
    })
}

// ============================================================================
// TESTS
// ============================================================================
