//! # Error Types
//!
//! This module defines the error type used throughout the tableau library.
//!
//! ## Categories
//!
//! | Variant | Cause | Orchestrator action |
//! |---------|-------|---------------------|
//! | `InvalidGeometry` | Zero/oversized dimensions, out-of-bounds regions | Fix the caller |
//! | `Allocation` | Frame buffer could not be reserved | Skip this cycle |
//! | `Hardware` | The panel driver reported a failure | Skip this cycle |
//! | `ModeMismatch` | Write issued in the wrong refresh mode | Fix the caller |
//! | `NotInitialized` | Mode switch or write before `init` | Fix the caller |
//!
//! A failed refresh leaves the previous image on the panel, which is bistable,
//! so skipping a cycle never loses what the user sees.

use std::error::Error as StdError;

use thiserror::Error;

use crate::panel::PanelMode;

/// Boxed error produced by a panel driver implementation.
pub type DriverError = Box<dyn StdError + Send + Sync + 'static>;

/// Main error type for tableau operations
#[derive(Debug, Error)]
pub enum TableauError {
    /// Zero or negative dimensions, or a region outside the panel
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A frame buffer could not be allocated
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// The panel driver failed while executing a hardware call
    #[error("Panel {operation} failed: {source}")]
    Hardware {
        /// Facade operation that failed (`init`, `enter_mode`, ...)
        operation: &'static str,
        /// Error reported by the driver
        #[source]
        source: DriverError,
    },

    /// A write was issued while the panel was in an incompatible mode
    #[error("Panel is in {actual} mode, {expected} required")]
    ModeMismatch {
        /// Mode(s) the operation requires
        expected: &'static str,
        /// Mode the controller believes the panel is in
        actual: PanelMode,
    },

    /// A mode switch or write was attempted before `init`
    #[error("Panel is not initialized")]
    NotInitialized,

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableauError {
    /// Wrap a driver failure for the given facade operation.
    pub fn hardware<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<DriverError>,
    {
        Self::Hardware {
            operation,
            source: source.into(),
        }
    }

    /// Whether the orchestrator should log and skip this refresh cycle.
    ///
    /// Programmer errors (geometry, mode mismatch, missing init) are not
    /// recoverable by retrying later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Hardware { .. } | Self::Allocation(_) | Self::Io(_) | Self::Image(_)
        )
    }
}

impl From<std::collections::TryReserveError> for TableauError {
    fn from(e: std::collections::TryReserveError) -> Self {
        Self::Allocation(e.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, TableauError>;
