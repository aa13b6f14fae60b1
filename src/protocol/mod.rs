//! # Frame Buffer Formats
//!
//! Byte layouts handed to panel drivers.
//!
//! ## Module Structure
//!
//! - [`bmp`]: 1-bpp Windows bitmap, the format e-paper SDKs load frames from
//!
//! ## Usage Example
//!
//! ```
//! use tableau::protocol::bmp;
//! use tableau::render::dither::MonoBit;
//!
//! // A 16 × 2 checkerboard
//! let bitmap = bmp::pack(|x, y| MonoBit::from_bit(((x + y) % 2) as u8), 16, 2).unwrap();
//! let file = bitmap.to_bmp_bytes();
//!
//! assert_eq!(&file[..2], b"BM");
//! assert_eq!(file.len(), bmp::PIXEL_DATA_OFFSET + 2 * 4);
//! ```
//!
//! ## Format Reference
//!
//! `BITMAPFILEHEADER` followed by `BITMAPINFOHEADER` with a two-entry
//! palette, as documented for the Windows GDI bitmap format.

pub mod bmp;
