//! Recording panel driver.
//!
//! Logs every facade call instead of touching hardware, and can be told to
//! fail specific calls. Used by the test suite and by `--dry-run`.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use crate::panel::driver::PanelDriver;
use crate::panel::{RefreshMode, UpdateRegion};
use crate::protocol::bmp::PackedBitmap;

/// Which facade operation a call was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Init,
    Clear,
    EnterMode,
    WriteFull,
    WriteRegion,
    Sleep,
}

/// One recorded facade call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Init,
    Clear,
    EnterMode(RefreshMode),
    WriteFull { width: u32, height: u32 },
    WriteRegion(UpdateRegion),
    Sleep,
}

impl DriverCall {
    pub fn kind(&self) -> CallKind {
        match self {
            DriverCall::Init => CallKind::Init,
            DriverCall::Clear => CallKind::Clear,
            DriverCall::EnterMode(_) => CallKind::EnterMode,
            DriverCall::WriteFull { .. } => CallKind::WriteFull,
            DriverCall::WriteRegion(_) => CallKind::WriteRegion,
            DriverCall::Sleep => CallKind::Sleep,
        }
    }
}

/// Failure produced on request by [`RecordingPanel::fail_next`].
#[derive(Debug, Error)]
#[error("injected {0:?} failure")]
pub struct InjectedFailure(pub CallKind);

/// A driver that records calls.
///
/// Failed calls are recorded too, so a test can tell a rejected request
/// (never reached the driver) from a failed one.
#[derive(Debug, Clone)]
pub struct RecordingPanel {
    width: u32,
    height: u32,
    calls: Vec<DriverCall>,
    failures: VecDeque<CallKind>,
}

impl RecordingPanel {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            failures: VecDeque::new(),
        }
    }

    /// Fail the next call of `kind`. Queued failures are consumed in order.
    pub fn fail_next(&mut self, kind: CallKind) {
        self.failures.push_back(kind);
    }

    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of recorded calls of `kind`.
    pub fn count(&self, kind: CallKind) -> usize {
        self.calls.iter().filter(|c| c.kind() == kind).count()
    }

    fn record(&mut self, call: DriverCall) -> Result<(), InjectedFailure> {
        let kind = call.kind();
        debug!(?call, "Panel call");
        self.calls.push(call);

        if let Some(pos) = self.failures.iter().position(|&k| k == kind) {
            self.failures.remove(pos);
            return Err(InjectedFailure(kind));
        }
        Ok(())
    }
}

impl PanelDriver for RecordingPanel {
    type Error = InjectedFailure;

    fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        self.record(DriverCall::Init)
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.record(DriverCall::Clear)
    }

    fn enter_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        self.record(DriverCall::EnterMode(mode))
    }

    fn write_full(&mut self, buffer: &PackedBitmap) -> Result<(), Self::Error> {
        self.record(DriverCall::WriteFull {
            width: buffer.width(),
            height: buffer.height(),
        })
    }

    fn write_region(&mut self, _buffer: &PackedBitmap, region: UpdateRegion) -> Result<(), Self::Error> {
        self.record(DriverCall::WriteRegion(region))
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.record(DriverCall::Sleep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut panel = RecordingPanel::new(4, 4);
        panel.init().unwrap();
        panel.enter_mode(RefreshMode::Partial).unwrap();
        panel.sleep().unwrap();
        assert_eq!(
            panel.calls(),
            &[
                DriverCall::Init,
                DriverCall::EnterMode(RefreshMode::Partial),
                DriverCall::Sleep
            ]
        );
    }

    #[test]
    fn test_injected_failure_is_one_shot() {
        let mut panel = RecordingPanel::new(4, 4);
        panel.fail_next(CallKind::Init);
        assert!(panel.clear().is_ok());
        assert!(panel.init().is_err());
        assert!(panel.init().is_ok());
        assert_eq!(panel.count(CallKind::Init), 2);
        assert_eq!(panel.take_calls().len(), 3);
        assert!(panel.calls().is_empty());
    }
}
