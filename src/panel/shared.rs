//! Serialized panel access for multi-threaded schedulers.
//!
//! A dashboard thread and a clock thread may both want the panel. Wrapping
//! the [`Dashboard`] in one mutex makes "check the mode, switch, write" a
//! single critical section, so two refresh cycles never interleave.
//!
//! If a thread panics mid-refresh the lock is poisoned. The next caller
//! recovers it and invalidates the mode estimate, forcing a fresh `init`.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::dashboard::{Dashboard, RefreshOutcome};
use crate::error::Result;
use crate::panel::driver::PanelDriver;
use crate::panel::policy::ContentChanges;
use crate::render::surface::RasterSurface;

/// Cloneable handle to a mutex-guarded [`Dashboard`].
#[derive(Debug)]
pub struct SharedPanel<D: PanelDriver> {
    inner: Arc<Mutex<Dashboard<D>>>,
}

impl<D: PanelDriver> Clone for SharedPanel<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: PanelDriver> SharedPanel<D> {
    pub fn new(dashboard: Dashboard<D>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dashboard)),
        }
    }

    /// Run `f` with exclusive access to the dashboard.
    pub fn with<R>(&self, f: impl FnOnce(&mut Dashboard<D>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    pub fn start(&self) -> Result<()> {
        self.with(|dashboard| dashboard.start())
    }

    pub fn present<S>(&self, surface: &S, changes: ContentChanges, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.with(|dashboard| dashboard.present(surface, changes, now))
    }

    pub fn present_clock<S>(&self, clock: &S, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.with(|dashboard| dashboard.present_clock(clock, now))
    }

    pub fn present_clock_from_frame<S>(&self, surface: &S, now: DateTime<Utc>) -> Result<RefreshOutcome>
    where
        S: RasterSurface + ?Sized,
    {
        self.with(|dashboard| dashboard.present_clock_from_frame(surface, now))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.with(|dashboard| dashboard.shutdown())
    }

    fn lock(&self) -> MutexGuard<'_, Dashboard<D>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Panel lock poisoned by a failed refresh, forcing re-init");
                let mut guard = poisoned.into_inner();
                guard.invalidate();
                self.inner.clear_poison();
                guard
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::PanelMode;
    use crate::panel::geometry::PanelGeometry;
    use crate::panel::mock::{CallKind, RecordingPanel};
    use crate::panel::policy::RefreshPolicy;

    fn shared() -> SharedPanel<RecordingPanel> {
        let dashboard = Dashboard::new(
            RecordingPanel::new(800, 480),
            PanelGeometry::default(),
            RefreshPolicy::default(),
        )
        .unwrap();
        SharedPanel::new(dashboard)
    }

    #[test]
    fn test_clones_share_state() {
        let panel = shared();
        let other = panel.clone();
        panel.start().unwrap();
        assert_eq!(other.with(|d| d.controller().mode()), PanelMode::Full);
    }

    #[test]
    fn test_poisoned_lock_forces_reinit() {
        let panel = shared();
        panel.start().unwrap();

        let worker = panel.clone();
        let result = std::thread::spawn(move || {
            let _: () = worker.with(|_| panic!("renderer crashed mid-refresh"));
        })
        .join();
        assert!(result.is_err());

        assert_eq!(panel.with(|d| d.controller().mode()), PanelMode::Uninitialized);
        panel.start().unwrap();
        assert_eq!(panel.with(|d| d.driver().count(CallKind::Init)), 2);
    }
}
