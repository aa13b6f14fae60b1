//! # Dashboard Presenter
//!
//! Runs one refresh cycle per call: convert the raster, ask the policy which
//! mode to use, and drive the controller through it.
//!
//! ## Cycles
//!
//! ```text
//! present(surface, changes, now)
//!   policy ──► Skipped | Fast | Full
//!   assemble_full ──► ensure_mode ──► write_full ──► retain frame
//!
//! present_clock(clock_surface, now)
//!   assemble clock patch ──► blit into retained frame
//!   policy ──► Partial: ensure_mode(Partial) ──► write_region(clock window)
//!          └─► Full:    ensure_mode(Full)    ──► write_full(retained frame)
//! ```
//!
//! The presenter keeps the last frame it put on the glass. Clock patches are
//! blitted into it, so a policy-forced full refresh redraws the current time
//! instead of the one from the last dashboard regeneration.
//!
//! ## Failures
//!
//! Every error is logged and returned. Geometry problems surface before any
//! hardware call. After a hardware failure the panel keeps showing the
//! previous image; the next cycle simply tries again, re-initializing the
//! panel first if it is no longer initialized.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{Result, TableauError};
use crate::panel::controller::RefreshController;
use crate::panel::driver::PanelDriver;
use crate::panel::geometry::PanelGeometry;
use crate::panel::policy::{ContentChanges, RefreshPolicy, RefreshTracker};
use crate::panel::{RefreshMode, UpdateRegion};
use crate::protocol::bmp::PackedBitmap;
use crate::render::assemble::{assemble_full, assemble_region};
use crate::render::surface::RasterSurface;

/// What a presentation did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing changed, the panel was left alone
    Skipped,
    /// A whole frame was written in the given mode
    Frame(RefreshMode),
    /// Only the clock window was rewritten
    Region(UpdateRegion),
}

/// Owns the panel and everything needed to keep it current.
#[derive(Debug)]
pub struct Dashboard<D: PanelDriver> {
    controller: RefreshController<D>,
    geometry: PanelGeometry,
    tracker: RefreshTracker,
    last_frame: Option<PackedBitmap>,
}

impl<D: PanelDriver> Dashboard<D> {
    /// Fails when the driver's native size disagrees with `geometry`.
    pub fn new(driver: D, geometry: PanelGeometry, policy: RefreshPolicy) -> Result<Self> {
        if driver.native_size() != geometry.native_size() {
            let (dw, dh) = driver.native_size();
            let (gw, gh) = geometry.native_size();
            return Err(TableauError::InvalidGeometry(format!(
                "driver is {}x{}, geometry says {}x{}",
                dw, dh, gw, gh
            )));
        }

        Ok(Self {
            controller: RefreshController::new(driver),
            geometry,
            tracker: RefreshTracker::new(policy),
            last_frame: None,
        })
    }

    pub fn controller(&self) -> &RefreshController<D> {
        &self.controller
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    pub fn tracker(&self) -> &RefreshTracker {
        &self.tracker
    }

    /// The frame currently on the glass, as far as the presenter knows.
    pub fn last_frame(&self) -> Option<&PackedBitmap> {
        self.last_frame.as_ref()
    }

    pub fn driver(&self) -> &D {
        self.controller.driver()
    }

    pub fn into_driver(self) -> D {
        self.controller.into_driver()
    }

    /// Initialize and clear the panel.
    pub fn start(&mut self) -> Result<()> {
        self.logged("start", |this| this.reinit())
    }

    /// Present a freshly rendered dashboard.
    ///
    /// `surface` must have the panel's logical size.
    pub fn present<S>(&mut self, surface: &S, changes: ContentChanges, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.logged("present", |this| {
            let needs_init = !this.controller.is_initialized();
            let mode = match this.tracker.dashboard_mode(changes, now) {
                Some(mode) if needs_init => {
                    debug!(requested = %mode, "Panel needs init, using full refresh");
                    RefreshMode::Full
                }
                Some(mode) => mode,
                None if needs_init => RefreshMode::Full,
                None => {
                    debug!("Dashboard unchanged, skipping refresh");
                    return Ok(RefreshOutcome::Skipped);
                }
            };

            this.geometry.check_surface(surface.width(), surface.height())?;
            let frame = assemble_full(surface, this.geometry.rotation())?;

            this.write_frame(frame, mode, now)?;
            info!(%mode, ?changes, "Dashboard presented");
            Ok(RefreshOutcome::Frame(mode))
        })
    }

    /// Present a clock rendered on its own surface the size of the clock
    /// rectangle.
    pub fn present_clock<S>(&mut self, clock: &S, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.logged("present_clock", |this| {
            let rect = this.geometry.clock().rect;
            if (clock.width(), clock.height()) != (rect.width(), rect.height()) {
                return Err(TableauError::InvalidGeometry(format!(
                    "clock surface is {}x{}, clock patch is {}x{}",
                    clock.width(),
                    clock.height(),
                    rect.width(),
                    rect.height()
                )));
            }

            let patch = assemble_full(clock, this.geometry.rotation())?;
            let origin = this.geometry.clock_native_rect()?;
            this.present_patch(&patch, origin.x0, origin.y0, now)
        })
    }

    /// Present the clock by cropping it out of a full dashboard raster.
    ///
    /// Only the rows under the clock window are dithered, and the bits match
    /// what a full conversion of `surface` would produce there.
    pub fn present_clock_from_frame<S>(&mut self, surface: &S, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.logged("present_clock_from_frame", |this| {
            this.geometry.check_surface(surface.width(), surface.height())?;
            let region = this.geometry.clock_region()?;
            let patch = assemble_region(surface, this.geometry.rotation(), region.to_rect())?;
            this.present_patch(&patch, region.x0, region.y0, now)
        })
    }

    /// Put the panel to sleep. The next presentation re-initializes it.
    pub fn shutdown(&mut self) -> Result<()> {
        self.logged("shutdown", |this| this.controller.sleep())
    }

    /// Forget the panel's mode so the next cycle starts from `init`.
    pub fn invalidate(&mut self) {
        self.controller.invalidate();
    }

    fn reinit(&mut self) -> Result<()> {
        self.controller.init()?;
        self.tracker.reset();
        let (width, height) = self.geometry.native_size();
        self.last_frame = Some(PackedBitmap::white(width, height)?);
        Ok(())
    }

    fn ensure_ready(&mut self) -> Result<()> {
        if self.controller.is_initialized() {
            return Ok(());
        }
        info!("Panel not initialized, initializing before refresh");
        self.reinit()
    }

    fn write_frame(&mut self, frame: PackedBitmap, mode: RefreshMode, now: DateTime<Utc>) -> Result<()> {
        self.ensure_ready()?;
        self.controller.ensure_mode(mode)?;
        self.controller.write_full(&frame)?;
        self.tracker.record(mode, now);
        self.last_frame = Some(frame);
        Ok(())
    }

    /// Blit a native patch at `(x, y)` into the retained frame and push it
    /// with whichever mode the policy picks.
    fn present_patch(&mut self, patch: &PackedBitmap, x: u32, y: u32, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let mut frame = match &self.last_frame {
            Some(frame) => frame.clone(),
            None => {
                let (width, height) = self.geometry.native_size();
                PackedBitmap::white(width, height)?
            }
        };
        frame.blit(patch, x, y)?;

        let mode = if self.controller.is_initialized() {
            self.tracker.clock_mode(now)
        } else {
            RefreshMode::Full
        };

        if mode != RefreshMode::Partial {
            info!(partials = self.tracker.partials_since_full(), "Full refresh for clock update");
            self.write_frame(frame, mode, now)?;
            return Ok(RefreshOutcome::Frame(mode));
        }

        let region = self.geometry.clock_region()?;
        let buffer = frame.crop(region.to_rect())?;
        self.controller.ensure_mode(RefreshMode::Partial)?;
        self.controller.write_region(&buffer, region)?;
        self.tracker.record(RefreshMode::Partial, now);
        self.last_frame = Some(frame);
        debug!(%region, "Clock updated");
        Ok(RefreshOutcome::Region(region))
    }

    fn logged<T>(&mut self, what: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = f(self);
        if let Err(e) = &result {
            if e.is_recoverable() {
                warn!(error = %e, "{} failed, previous image stays on the panel", what);
            } else {
                error!(error = %e, "{} rejected", what);
            }
        }
        result
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelMode;
    use crate::panel::geometry::ClockPatch;
    use crate::panel::mock::{CallKind, DriverCall, RecordingPanel};
    use crate::render::rotation::{Rect, Rotation};
    use chrono::{TimeDelta, TimeZone};
    use image::{Rgb as ImageRgb, RgbImage};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn geometry() -> PanelGeometry {
        let clock = ClockPatch {
            rect: Rect::new(4, 8, 20, 12).unwrap(),
            align_to_bytes: true,
        };
        PanelGeometry::new(32, 24, Rotation::Cw90, clock).unwrap()
    }

    fn dashboard() -> Dashboard<RecordingPanel> {
        let mut dashboard = Dashboard::new(RecordingPanel::new(32, 24), geometry(), RefreshPolicy::default()).unwrap();
        dashboard.start().unwrap();
        dashboard
    }

    fn raster(v: u8) -> RgbImage {
        RgbImage::from_pixel(24, 32, ImageRgb([v, v, v]))
    }

    fn clock_surface() -> RgbImage {
        RgbImage::from_pixel(16, 4, ImageRgb([0, 0, 0]))
    }

    #[test]
    fn test_driver_size_must_match_geometry() {
        let result = Dashboard::new(RecordingPanel::new(24, 32), geometry(), RefreshPolicy::default());
        assert!(matches!(result, Err(TableauError::InvalidGeometry(_))));
    }

    #[test]
    fn test_first_present_is_full() {
        let mut dashboard = dashboard();
        let outcome = dashboard.present(&raster(255), ContentChanges::WEATHER, t0()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Full));
        assert_eq!(
            dashboard.driver().calls(),
            &[
                DriverCall::Init,
                DriverCall::Clear,
                DriverCall::WriteFull { width: 32, height: 24 }
            ]
        );
    }

    #[test]
    fn test_weather_only_uses_fast() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        let outcome = dashboard
            .present(&raster(0), ContentChanges::WEATHER, t0() + TimeDelta::minutes(30))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Fast));
        assert_eq!(dashboard.controller().mode(), PanelMode::Fast);
    }

    #[test]
    fn test_unchanged_dashboard_skipped() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        let calls = dashboard.driver().calls().len();
        let outcome = dashboard.present(&raster(255), ContentChanges::empty(), t0()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Skipped);
        assert_eq!(dashboard.driver().calls().len(), calls);
    }

    #[test]
    fn test_wrong_surface_size_rejected_before_hardware() {
        let mut dashboard = dashboard();
        let calls = dashboard.driver().calls().len();
        let wrong = RgbImage::new(32, 24);
        assert!(matches!(
            dashboard.present(&wrong, ContentChanges::MENU, t0()),
            Err(TableauError::InvalidGeometry(_))
        ));
        assert_eq!(dashboard.driver().calls().len(), calls);
    }

    #[test]
    fn test_clock_uses_partial_region() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();

        let outcome = dashboard
            .present_clock(&clock_surface(), t0() + TimeDelta::minutes(1))
            .unwrap();
        let region = dashboard.geometry().clock_region().unwrap();
        assert_eq!(outcome, RefreshOutcome::Region(region));
        assert_eq!(dashboard.controller().mode(), PanelMode::Partial);
        assert_eq!(dashboard.driver().calls().last(), Some(&DriverCall::WriteRegion(region)));

        // clock is now part of the retained frame
        let native = dashboard.geometry().clock_native_rect().unwrap();
        let frame = dashboard.last_frame().unwrap();
        assert_eq!(frame.get(native.x0, native.y0), Some(crate::render::dither::MonoBit::Black));
    }

    #[test]
    fn test_clock_forces_full_after_budget() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();

        for minute in 1..=10 {
            let outcome = dashboard
                .present_clock(&clock_surface(), t0() + TimeDelta::minutes(minute))
                .unwrap();
            assert!(matches!(outcome, RefreshOutcome::Region(_)));
        }
        let outcome = dashboard
            .present_clock(&clock_surface(), t0() + TimeDelta::minutes(11))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Full));
        assert_eq!(dashboard.driver().count(CallKind::WriteRegion), 10);
        // one switch into partial, one back to full
        assert_eq!(dashboard.driver().count(CallKind::EnterMode), 2);
    }

    #[test]
    fn test_clock_from_frame_matches_full_conversion() {
        let mut dashboard = dashboard();
        let card = RgbImage::from_fn(24, 32, |x, y| {
            let v = ((x * 11 + y * 7) % 256) as u8;
            ImageRgb([v, v, v])
        });
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        dashboard
            .present_clock_from_frame(&card, t0() + TimeDelta::minutes(1))
            .unwrap();

        let full = assemble_full(&card, Rotation::Cw90).unwrap();
        let region = dashboard.geometry().clock_region().unwrap();
        let frame = dashboard.last_frame().unwrap();
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                assert_eq!(frame.get(x, y), full.get(x, y));
            }
        }
    }

    #[test]
    fn test_hardware_failure_keeps_previous_frame() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        let before = dashboard.last_frame().cloned();

        dashboard.controller.driver_mut().fail_next(CallKind::WriteFull);
        let err = dashboard.present(&raster(0), ContentChanges::MENU, t0()).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(dashboard.last_frame().cloned(), before);
        assert_eq!(dashboard.controller().mode(), PanelMode::Full);
    }

    #[test]
    fn test_reinit_after_shutdown() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        dashboard.shutdown().unwrap();
        assert_eq!(dashboard.controller().mode(), PanelMode::Uninitialized);

        // even an unchanged dashboard is redrawn after re-init
        let outcome = dashboard.present(&raster(255), ContentChanges::empty(), t0()).unwrap();
        assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Full));
        assert_eq!(dashboard.driver().count(CallKind::Init), 2);
    }

    #[test]
    fn test_clock_after_shutdown_is_full() {
        let mut dashboard = dashboard();
        dashboard.present(&raster(255), ContentChanges::MENU, t0()).unwrap();
        dashboard.shutdown().unwrap();
        let outcome = dashboard
            .present_clock(&clock_surface(), t0() + TimeDelta::minutes(1))
            .unwrap();
        assert_eq!(outcome, RefreshOutcome::Frame(RefreshMode::Full));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frame_crop_failures_log_their_own_label() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut dashboard = dashboard();
            // wrong size for the logical frame
            let err = dashboard
                .present_clock_from_frame(&RgbImage::new(5, 5), t0())
                .unwrap_err();
            assert!(matches!(err, TableauError::InvalidGeometry(_)));
        });

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("present_clock_from_frame rejected"), "{}", text);
    }
}
