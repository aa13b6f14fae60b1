//! # Tableau - E-Paper Dashboard Pipeline
//!
//! Tableau takes the RGB raster of a rendered dashboard and keeps a 1-bit
//! e-paper panel showing it. It provides:
//!
//! - **Dithering**: Horizontal error diffusion to black and white
//! - **Rotation**: Portrait dashboards on landscape-mounted panels
//! - **Packing**: 1-bpp BMP frame buffers, bottom-up and row-padded
//! - **Refresh control**: A mode state machine that never switches twice
//! - **Refresh policy**: Fast, full and partial refreshes chosen over time
//!
//! ## Quick Start
//!
//! ```
//! use chrono::Utc;
//! use image::RgbImage;
//! use tableau::{
//!     dashboard::{Dashboard, RefreshOutcome},
//!     panel::{ContentChanges, PanelGeometry, RefreshMode, RefreshPolicy, mock::RecordingPanel},
//! };
//!
//! // A recording driver standing in for the Waveshare 7.5" panel
//! let geometry = PanelGeometry::default();
//! let (width, height) = geometry.native_size();
//! let mut dashboard = Dashboard::new(RecordingPanel::new(width, height), geometry, RefreshPolicy::default())?;
//! dashboard.start()?;
//!
//! // Render the dashboard in portrait orientation
//! let (lw, lh) = geometry.logical_size();
//! let raster = RgbImage::from_pixel(lw, lh, image::Rgb([255, 255, 255]));
//!
//! let outcome = dashboard.present(&raster, ContentChanges::all(), Utc::now())?;
//! assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Full));
//!
//! # Ok::<(), tableau::TableauError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`render`] | Surfaces, dithering, rotation, frame assembly |
//! | [`protocol`] | 1-bit BMP packing |
//! | [`panel`] | Driver facade, refresh controller, policy, geometry |
//! | [`dashboard`] | One-call refresh cycles |
//! | [`config`] | JSON configuration |
//! | [`error`] | Error types |
//!
//! ## Supported Panels
//!
//! Defaults target the Waveshare 7.5" V2 (800 × 480, black/white). Any
//! 1-bit panel with full and partial refresh works through a
//! [`PanelDriver`](panel::PanelDriver) implementation.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod panel;
pub mod protocol;
pub mod render;

// Re-exports for convenience
pub use dashboard::{Dashboard, RefreshOutcome};
pub use error::{Result, TableauError};
pub use panel::{PanelDriver, PanelGeometry, RefreshController};
