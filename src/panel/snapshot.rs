//! Simulated panel.
//!
//! Keeps a native-resolution framebuffer, applies full and region writes to
//! it the way the glass would, and optionally saves a PNG after every
//! refresh. Handy for working on dashboard layouts without hardware.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::panel::driver::PanelDriver;
use crate::panel::{RefreshMode, UpdateRegion};
use crate::protocol::bmp::PackedBitmap;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("panel is asleep")]
    Asleep,

    #[error("{0}")]
    Geometry(String),

    #[error("snapshot encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// A simulated e-paper panel backed by a [`PackedBitmap`].
#[derive(Debug)]
pub struct SnapshotPanel {
    frame: PackedBitmap,
    awake: bool,
    mode: Option<RefreshMode>,
    output_dir: Option<PathBuf>,
    refreshes: u32,
}

impl SnapshotPanel {
    /// A white `width × height` panel, powered down.
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        Ok(Self {
            frame: PackedBitmap::white(width, height)?,
            awake: false,
            mode: None,
            output_dir: None,
            refreshes: 0,
        })
    }

    /// Save `NNNN-<mode>.png` into `dir` after every refresh.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// What the glass currently shows.
    pub fn frame(&self) -> &PackedBitmap {
        &self.frame
    }

    /// Waveform most recently loaded, if any.
    pub fn mode(&self) -> Option<RefreshMode> {
        self.mode
    }

    /// Number of refreshes (clear, full and region writes) so far.
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// Save the current frame as a grayscale PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.frame.to_gray_image().save(path.as_ref())?;
        Ok(())
    }

    fn check_awake(&self) -> Result<(), SnapshotError> {
        if self.awake {
            Ok(())
        } else {
            Err(SnapshotError::Asleep)
        }
    }

    fn refreshed(&mut self, label: &str) -> Result<(), SnapshotError> {
        self.refreshes += 1;
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("{:04}-{}.png", self.refreshes, label));
            self.save_png(&path)?;
            info!(path = %path.display(), "Saved panel snapshot");
        }
        Ok(())
    }
}

impl PanelDriver for SnapshotPanel {
    type Error = SnapshotError;

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width(), self.frame.height())
    }

    fn init(&mut self) -> Result<(), Self::Error> {
        self.awake = true;
        self.mode = Some(RefreshMode::Full);
        debug!("Simulated panel awake");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.check_awake()?;
        self.frame = PackedBitmap::white(self.frame.width(), self.frame.height())
            .map_err(|e| SnapshotError::Geometry(e.to_string()))?;
        self.refreshed("clear")
    }

    fn enter_mode(&mut self, mode: RefreshMode) -> Result<(), Self::Error> {
        self.check_awake()?;
        self.mode = Some(mode);
        Ok(())
    }

    fn write_full(&mut self, buffer: &PackedBitmap) -> Result<(), Self::Error> {
        self.check_awake()?;
        if (buffer.width(), buffer.height()) != self.native_size() {
            return Err(SnapshotError::Geometry(format!(
                "frame is {}x{}, panel is {}x{}",
                buffer.width(),
                buffer.height(),
                self.frame.width(),
                self.frame.height()
            )));
        }
        self.frame = buffer.clone();
        let label = match self.mode {
            Some(RefreshMode::Fast) => "fast",
            _ => "full",
        };
        self.refreshed(label)
    }

    fn write_region(&mut self, buffer: &PackedBitmap, region: UpdateRegion) -> Result<(), Self::Error> {
        self.check_awake()?;
        if (buffer.width(), buffer.height()) != (region.width(), region.height()) {
            return Err(SnapshotError::Geometry(format!(
                "buffer is {}x{}, region {} differs",
                buffer.width(),
                buffer.height(),
                region
            )));
        }
        self.frame
            .blit(buffer, region.x0, region.y0)
            .map_err(|e| SnapshotError::Geometry(e.to_string()))?;
        self.refreshed("partial")
    }

    fn sleep(&mut self) -> Result<(), Self::Error> {
        self.awake = false;
        self.mode = None;
        debug!("Simulated panel asleep");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::dither::MonoBit;

    #[test]
    fn test_region_write_preserves_surroundings() {
        let mut panel = SnapshotPanel::new(16, 8).unwrap();
        panel.init().unwrap();
        let black = crate::protocol::bmp::pack(|_, _| MonoBit::Black, 16, 8).unwrap();
        panel.write_full(&black).unwrap();

        let patch = PackedBitmap::white(8, 2).unwrap();
        panel
            .write_region(&patch, UpdateRegion::new(4, 3, 12, 5).unwrap())
            .unwrap();

        assert_eq!(panel.frame().get(3, 3), Some(MonoBit::Black));
        assert_eq!(panel.frame().get(4, 3), Some(MonoBit::White));
        assert_eq!(panel.frame().get(11, 4), Some(MonoBit::White));
        assert_eq!(panel.frame().get(12, 4), Some(MonoBit::Black));
        assert_eq!(panel.frame().get(4, 5), Some(MonoBit::Black));
        assert_eq!(panel.refreshes(), 2);
    }

    #[test]
    fn test_writes_while_asleep_fail() {
        let mut panel = SnapshotPanel::new(8, 8).unwrap();
        let frame = PackedBitmap::white(8, 8).unwrap();
        assert!(matches!(panel.write_full(&frame), Err(SnapshotError::Asleep)));
        panel.init().unwrap();
        panel.write_full(&frame).unwrap();
        panel.sleep().unwrap();
        assert!(matches!(panel.clear(), Err(SnapshotError::Asleep)));
    }

    #[test]
    fn test_snapshots_written_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut panel = SnapshotPanel::new(8, 4).unwrap().with_output_dir(dir.path());
        panel.init().unwrap();
        panel.clear().unwrap();
        panel.enter_mode(RefreshMode::Fast).unwrap();
        panel.write_full(&PackedBitmap::white(8, 4).unwrap()).unwrap();

        assert!(dir.path().join("0001-clear.png").exists());
        assert!(dir.path().join("0002-fast.png").exists());
    }
}
