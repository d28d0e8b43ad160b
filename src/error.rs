use std::io;

use thiserror::Error;

/// Error taxonomy for the monitor. Every variant is fatal: this is a
/// foreground diagnostic tool, the operator observes and restarts manually,
/// so nothing is retried.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The GPU driver could not be initialized or the requested device
    /// index does not exist. Raised at startup, before the loop runs.
    #[error("GPU device {index} unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    /// A single poll's read from the GPU failed. Treated as fatal rather
    /// than skip-and-continue.
    #[error("GPU query failed: {0}")]
    Query(String),

    /// Writing or flushing the CSV log failed. Fatal: every sample must be
    /// durably recorded before the tick proceeds.
    #[error("CSV log write failed")]
    Persistence(#[source] io::Error),

    /// Terminal draw or input I/O failed.
    #[error("terminal I/O failed")]
    Terminal(#[source] io::Error),
}
