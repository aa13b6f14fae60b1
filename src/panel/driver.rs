//! # Panel Driver Facade
//!
//! The six primitives a hardware SDK must provide. Implementations forward
//! to their transport and report failures through their own error type; they
//! do not track modes or validate geometry, which is the controller's job.
//!
//! ## Contract
//!
//! | Call | Precondition | Effect |
//! |------|--------------|--------|
//! | `init` | none | Power up, load the full waveform |
//! | `clear` | initialized | Drive the whole panel white |
//! | `enter_mode` | initialized | Load the waveform for `mode` |
//! | `write_full` | full or fast mode | Replace the whole frame and refresh |
//! | `write_region` | partial mode | Replace `region` and refresh it |
//! | `sleep` | none | Power down; `init` is required afterwards |
//!
//! Buffers are 1-bpp [`PackedBitmap`]s in panel-native orientation; for
//! `write_region` the buffer covers exactly the region.

use std::error::Error as StdError;

use crate::panel::{RefreshMode, UpdateRegion};
use crate::protocol::bmp::PackedBitmap;

/// A driver for one physical (or simulated) e-paper panel.
pub trait PanelDriver {
    type Error: StdError + Send + Sync + 'static;

    /// Native resolution `(width, height)` of the panel.
    fn native_size(&self) -> (u32, u32);

    /// Power up and initialize the controller.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Clear the panel to white.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Switch the panel's refresh waveform.
    fn enter_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error>;

    /// Write and display a whole frame.
    fn write_full(&mut self, buffer: &PackedBitmap) -> Result<(), Self::Error>;

    /// Write and display a sub-rectangle.
    fn write_region(&mut self, buffer: &PackedBitmap, region: UpdateRegion) -> Result<(), Self::Error>;

    /// Put the panel into deep sleep.
    fn sleep(&mut self) -> Result<(), Self::Error>;
}
