//! # Horizontal Error-Diffusion Quantizer
//!
//! This module converts one RGB scanline into a row of black/white decisions
//! suitable for a 1-bit e-paper panel.
//!
//! ## Algorithm
//!
//! For each pixel, left to right:
//!
//! 1. Compute luma: `gray = 0.299 R + 0.587 G + 0.114 B`
//! 2. Add the error carried in from the left neighbor
//! 3. Clamp to `[0, 255]` and threshold: `gray > 128` is white, otherwise black
//! 4. Carry `7/16` of the residual (`gray - quantized`) to the right neighbor
//!
//! ```text
//!            x      x+1
//!         ┌──────┬──────┐
//!  row y  │  *   │ 7/16 │
//!         └──────┴──────┘
//! ```
//!
//! Only the right-hand Floyd–Steinberg weight is applied and nothing is carried
//! to the next row. The panel's look in the field is calibrated against this
//! exact behavior, so it must not be "completed" into 2-D diffusion.
//!
//! ## Error Row Layout
//!
//! The accumulator has one padding slot on each side so diffusion never needs
//! a bounds check:
//!
//! ```text
//! index:   0     1     2    ...   W    W+1
//!        [pad] [x=0] [x=1] ... [x=W-1] [pad]
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use tableau::render::dither::{quantize_row, ErrorRow, MonoBit, Rgb};
//!
//! let row = [Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)];
//! let mut errors = ErrorRow::new(row.len());
//! assert_eq!(quantize_row(&row, &mut errors), vec![MonoBit::White, MonoBit::Black]);
//! ```

/// Luma threshold; values strictly above it become white.
pub const THRESHOLD: f32 = 128.0;

/// Share of the residual carried to the right neighbor.
pub const RIGHT_WEIGHT: f32 = 7.0 / 16.0;

/// An 8-bit RGB pixel read from a raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Same value on all three channels.
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }
}

/// A single black/white decision.
///
/// The discriminants match the 1-bit bitmap color table: index 0 is black,
/// index 1 is white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonoBit {
    Black = 0,
    White = 1,
}

impl MonoBit {
    /// Bit value as stored in a packed buffer.
    #[inline]
    pub fn bit(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            MonoBit::White
        } else {
            MonoBit::Black
        }
    }

    /// 8-bit luma of this decision (0 or 255).
    #[inline]
    pub fn level(self) -> u8 {
        match self {
            MonoBit::Black => 0,
            MonoBit::White => 255,
        }
    }
}

/// Per-row error accumulator, `W + 2` slots wide.
///
/// Callers reset it at the start of every row; the quantizer never remembers
/// earlier rows.
#[derive(Debug, Clone)]
pub struct ErrorRow {
    slots: Vec<f32>,
}

impl ErrorRow {
    /// Allocate a zeroed accumulator for rows of `width` pixels.
    pub fn new(width: usize) -> Self {
        Self {
            slots: vec![0.0; width + 2],
        }
    }

    /// Zero every slot, including the padding.
    pub fn reset(&mut self) {
        self.slots.fill(0.0);
    }

    /// Number of pixels this row covers.
    pub fn width(&self) -> usize {
        self.slots.len() - 2
    }

    /// Error currently carried into column `x`.
    pub fn carried(&self, x: usize) -> f32 {
        self.slots[x + 1]
    }
}

/// Luma of an RGB pixel using BT.601 weights.
///
/// Computed in integer per-mille so equal channels produce exactly the
/// channel value.
#[inline]
pub fn luma(px: Rgb) -> f32 {
    let weighted = 299 * px.r as u32 + 587 * px.g as u32 + 114 * px.b as u32;
    weighted as f32 / 1000.0
}

/// Quantize one scanline.
///
/// ## Parameters
///
/// - `pixels`: The scanline, `W` pixels in natural left-to-right order
/// - `error_row`: A freshly reset accumulator at least `W` pixels wide
///
/// ## Returns
///
/// `W` decisions, order preserved.
///
/// ## Panics
///
/// If `error_row` is narrower than the scanline.
///
/// ## Example
///
/// ```
/// use tableau::render::dither::{quantize_row, ErrorRow, MonoBit, Rgb};
///
/// // Mid gray at exactly 128 is not above the threshold.
/// let mut errors = ErrorRow::new(1);
/// assert_eq!(quantize_row(&[Rgb::gray(128)], &mut errors), vec![MonoBit::Black]);
/// ```
pub fn quantize_row(pixels: &[Rgb], error_row: &mut ErrorRow) -> Vec<MonoBit> {
    assert!(
        error_row.width() >= pixels.len(),
        "error row holds {} pixels, scanline has {}",
        error_row.width(),
        pixels.len()
    );

    let width = pixels.len();
    let mut out = Vec::with_capacity(width);

    for (x, &px) in pixels.iter().enumerate() {
        let gray = (luma(px) + error_row.slots[x + 1]).clamp(0.0, 255.0);
        let (bit, quantized) = if gray > THRESHOLD {
            (MonoBit::White, 255.0)
        } else {
            (MonoBit::Black, 0.0)
        };

        if x + 1 < width {
            error_row.slots[x + 2] += (gray - quantized) * RIGHT_WEIGHT;
        }

        out.push(bit);
    }

    out
}

// ============================================================================
// TESTS
// ============================================================================
