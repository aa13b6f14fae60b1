//! # Rendering Module
//!
//! Converts the dashboard raster into panel-native 1-bit frames.
//!
//! ## Modules
//!
//! - [`surface`]: Read-only raster views (RGB images, Cairo ARGB32 memory)
//! - [`dither`]: Horizontal error-diffusion quantizer
//! - [`rotation`]: Raster ↔ panel coordinate mapping
//! - [`assemble`]: Full-frame and sub-rectangle conversion
//!
//! ## Usage Example
//!
//! ```
//! use image::RgbImage;
//! use tableau::render::{assemble, rotation::Rotation};
//!
//! // A portrait dashboard for a landscape panel
//! let raster = RgbImage::from_pixel(480, 800, image::Rgb([255, 255, 255]));
//! let frame = assemble::assemble_full(&raster, Rotation::Cw90).unwrap();
//!
//! assert_eq!((frame.width(), frame.height()), (800, 480));
//! assert_eq!(frame.row_stride_bytes(), 100);
//! ```

pub mod assemble;
pub mod dither;
pub mod rotation;
pub mod surface;
