//! # RF Task Error Handling
//!
//! Errors that can occur at the boundaries of the RF task: the transceiver
//! HAL, chip bring-up, and the telemetry sinks. Per the error handling
//! design, none of these are allowed to unwind out of the per-second cycle —
//! `RfTask::run` logs and absorbs them. They remain a proper `Result` type at
//! the narrower boundaries (bring-up, HAL calls) so those call sites keep
//! using `?`.

use thiserror::Error;

/// Errors surfaced at the RF task's external boundaries.
#[derive(Debug, Error)]
pub enum RfError {
    /// SPI/GPIO transport failure talking to the transceiver.
    #[error("transceiver HAL error: {0}")]
    Hal(String),

    /// Chip bring-up could not read a sane version byte (0x00 or 0xFF).
    #[error("transceiver chip absent or dead (version byte 0x{0:02X})")]
    ChipAbsent(u8),

    /// A telemetry sink (console/log) failed to accept a line.
    #[error("telemetry sink error: {0}")]
    Sink(String),

    /// Catch-all for conditions that don't fit the above but must still be
    /// representable (e.g. malformed configuration supplied at startup).
    #[error("{0}")]
    Other(String),
}

impl From<crate::transceiver::hal::HalError> for RfError {
    fn from(e: crate::transceiver::hal::HalError) -> Self {
        RfError::Hal(e.to_string())
    }
}
