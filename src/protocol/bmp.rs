//! # 1-bit Bitmap Packer
//!
//! This module serializes black/white decisions into the Windows BMP
//! container that e-paper SDKs accept as a frame buffer.
//!
//! ## File Layout
//!
//! | Offset | Size | Content |
//! |--------|------|---------|
//! | 0 | 14 | File header: `BM`, file size, reserved, data offset (62) |
//! | 14 | 40 | Info header: size 40, width, height, planes 1, 1 bpp, no compression |
//! | 54 | 8 | Color table: index 0 black, index 1 white |
//! | 62 | `stride × height` | Pixel rows, bottom row first |
//!
//! All integers are little-endian.
//!
//! ## Bit Packing
//!
//! Each byte holds 8 pixels, most significant bit leftmost. A set bit selects
//! color index 1 (white); a clear bit is black. Rows are padded with zero
//! bytes to a multiple of 4 bytes:
//!
//! ```text
//! width = 2, both white
//! byte:  C0         00 00 00
//!        11000000   └ padding ┘
//!        ││
//!        │└ x=1
//!        └─ x=0
//! ```
//!
//! ## Example
//!
//! ```
//! use tableau::protocol::bmp::{pack, row_stride_bytes};
//! use tableau::render::dither::MonoBit;
//!
//! let bitmap = pack(|_, _| MonoBit::White, 2, 2).unwrap();
//! assert_eq!(row_stride_bytes(2), 4);
//! assert_eq!(bitmap.data(), &[0xC0, 0, 0, 0, 0xC0, 0, 0, 0]);
//! ```

use std::path::Path;

use image::{GrayImage, Luma};

use crate::error::{Result, TableauError};
use crate::render::dither::MonoBit;
use crate::render::rotation::Rect;

/// Length of the `BITMAPFILEHEADER`.
pub const FILE_HEADER_LEN: usize = 14;

/// Length of the `BITMAPINFOHEADER`.
pub const INFO_HEADER_LEN: usize = 40;

/// Two RGBQUAD entries.
pub const COLOR_TABLE_LEN: usize = 8;

/// Offset of the first pixel byte from the start of the file.
pub const PIXEL_DATA_OFFSET: usize = FILE_HEADER_LEN + INFO_HEADER_LEN + COLOR_TABLE_LEN;

/// Color table: index 0 black, index 1 white (B, G, R, reserved).
const COLOR_TABLE: [u8; COLOR_TABLE_LEN] = [0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00];

/// Bytes per stored row: `ceil(width / 8)` rounded up to a multiple of 4.
///
/// ```
/// use tableau::protocol::bmp::row_stride_bytes;
///
/// assert_eq!(row_stride_bytes(1), 4);
/// assert_eq!(row_stride_bytes(32), 4);
/// assert_eq!(row_stride_bytes(33), 8);
/// assert_eq!(row_stride_bytes(800), 100);
/// ```
#[inline]
pub const fn row_stride_bytes(width: u32) -> usize {
    (width as usize).div_ceil(8).div_ceil(4) * 4
}

/// A packed 1-bpp image in bottom-up BMP row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl PackedBitmap {
    /// All-white bitmap of the given size.
    pub fn white(width: u32, height: u32) -> Result<Self> {
        pack(|_, _| MonoBit::White, width, height)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn row_stride_bytes(&self) -> usize {
        self.stride
    }

    /// Pixel data without headers, bottom row first, rows padded.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decision at visual coordinate `(x, y)`, `y = 0` being the top row.
    pub fn get(&self, x: u32, y: u32) -> Option<MonoBit> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let (idx, shift) = self.locate(x, y);
        Some(MonoBit::from_bit(self.data[idx] >> shift))
    }

    /// Overwrite the decision at visual coordinate `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, bit: MonoBit) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(TableauError::InvalidGeometry(format!(
                "pixel ({}, {}) outside {}x{} bitmap",
                x, y, self.width, self.height
            )));
        }
        let (idx, shift) = self.locate(x, y);
        self.data[idx] = (self.data[idx] & !(1 << shift)) | (bit.bit() << shift);
        Ok(())
    }

    /// Copy `patch` into this bitmap with its top-left corner at `(x, y)`.
    ///
    /// The patch must fit entirely; nothing is written otherwise.
    pub fn blit(&mut self, patch: &PackedBitmap, x: u32, y: u32) -> Result<()> {
        let fits = x
            .checked_add(patch.width)
            .zip(y.checked_add(patch.height))
            .is_some_and(|(x1, y1)| x1 <= self.width && y1 <= self.height);
        if !fits {
            return Err(TableauError::InvalidGeometry(format!(
                "{}x{} patch at ({}, {}) exceeds {}x{} bitmap",
                patch.width, patch.height, x, y, self.width, self.height
            )));
        }

        for py in 0..patch.height {
            for px in 0..patch.width {
                let (src_idx, src_shift) = patch.locate(px, py);
                let (dst_idx, dst_shift) = self.locate(x + px, y + py);
                let bit = (patch.data[src_idx] >> src_shift) & 1;
                self.data[dst_idx] = (self.data[dst_idx] & !(1 << dst_shift)) | (bit << dst_shift);
            }
        }
        Ok(())
    }

    /// Copy out the visual rectangle `rect`.
    pub fn crop(&self, rect: Rect) -> Result<PackedBitmap> {
        if !rect.fits_within(self.width, self.height) {
            return Err(TableauError::InvalidGeometry(format!(
                "crop ({}, {})..({}, {}) exceeds {}x{} bitmap",
                rect.x0, rect.y0, rect.x1, rect.y1, self.width, self.height
            )));
        }
        pack(
            |x, y| {
                self.get(rect.x0 + x, rect.y0 + y)
                    .unwrap_or(MonoBit::White)
            },
            rect.width(),
            rect.height(),
        )
    }

    /// Rows in visual order without stride padding, as most panel
    /// transports expect them.
    pub fn rows_top_down(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let used = (self.width as usize).div_ceil(8);
        self.data
            .chunks_exact(self.stride)
            .rev()
            .map(move |row| &row[..used])
    }

    /// Complete BMP file: headers, color table and pixel data.
    pub fn to_bmp_bytes(&self) -> Vec<u8> {
        // Sizes were validated against u32/i32 in `pack`.
        let image_size = self.data.len() as u32;
        let file_size = PIXEL_DATA_OFFSET as u32 + image_size;

        let mut out = Vec::with_capacity(PIXEL_DATA_OFFSET + self.data.len());

        // BITMAPFILEHEADER
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved
        out.extend_from_slice(&(PIXEL_DATA_OFFSET as u32).to_le_bytes());

        // BITMAPINFOHEADER
        out.extend_from_slice(&(INFO_HEADER_LEN as u32).to_le_bytes());
        out.extend_from_slice(&(self.width as i32).to_le_bytes());
        out.extend_from_slice(&(self.height as i32).to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // planes
        out.extend_from_slice(&1u16.to_le_bytes()); // bits per pixel
        out.extend_from_slice(&0u32.to_le_bytes()); // BI_RGB
        out.extend_from_slice(&image_size.to_le_bytes());
        out.extend_from_slice(&0i32.to_le_bytes()); // x pixels per meter
        out.extend_from_slice(&0i32.to_le_bytes()); // y pixels per meter
        out.extend_from_slice(&2u32.to_le_bytes()); // colors used
        out.extend_from_slice(&2u32.to_le_bytes()); // colors important

        out.extend_from_slice(&COLOR_TABLE);
        out.extend_from_slice(&self.data);
        out
    }

    /// Write the BMP file to disk.
    pub fn write_bmp(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_bmp_bytes())?;
        Ok(())
    }

    /// Expand to an 8-bit grayscale image for previews and snapshots.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let (idx, shift) = self.locate(x, y);
            Luma([MonoBit::from_bit(self.data[idx] >> shift).level()])
        })
    }

    /// Byte index and bit shift of visual pixel `(x, y)`.
    #[inline]
    fn locate(&self, x: u32, y: u32) -> (usize, u32) {
        let row = (self.height - 1 - y) as usize;
        let idx = row * self.stride + x as usize / 8;
        (idx, 7 - (x % 8))
    }
}

/// Pack decisions for a `width × height` image.
///
/// `image(x, y)` is queried in visual coordinates (`y = 0` is the top row).
/// Rows are stored from `height - 1` down to `0`.
///
/// ## Errors
///
/// - [`TableauError::InvalidGeometry`] for a zero dimension or one that does
///   not fit the header's signed 32-bit fields
/// - [`TableauError::Allocation`] when the buffer cannot be reserved
pub fn pack<F>(image: F, width: u32, height: u32) -> Result<PackedBitmap>
where
    F: Fn(u32, u32) -> MonoBit,
{
    if width == 0 || height == 0 {
        return Err(TableauError::InvalidGeometry(format!(
            "bitmap dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(TableauError::InvalidGeometry(format!(
            "bitmap dimensions {}x{} exceed header range",
            width, height
        )));
    }

    let stride = row_stride_bytes(width);
    let len = stride
        .checked_mul(height as usize)
        .filter(|&len| len <= (u32::MAX as usize) - PIXEL_DATA_OFFSET)
        .ok_or_else(|| {
            TableauError::InvalidGeometry(format!(
                "bitmap of {}x{} does not fit a BMP file",
                width, height
            ))
        })?;

    let mut data = Vec::new();
    data.try_reserve_exact(len)?;
    data.resize(len, 0u8);

    for y in (0..height).rev() {
        let row_start = (height - 1 - y) as usize * stride;
        let row = &mut data[row_start..row_start + stride];
        for x in 0..width {
            if image(x, y) == MonoBit::White {
                row[x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
    }

    Ok(PackedBitmap {
        width,
        height,
        stride,
        data,
    })
}

// ============================================================================
// TESTS
// ============================================================================
