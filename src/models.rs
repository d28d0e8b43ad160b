use chrono::Utc;

/// One GPU reading. Immutable once created; owned by the window buffer
/// after insertion and dropped on eviction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Epoch seconds, sub-second precision.
    pub epoch: f64,
    /// GPU processor utilization, percent of capacity.
    pub processor_pct: f64,
    /// GPU memory in use, percent of total.
    pub memory_pct: f64,
}

impl Sample {
    pub fn new(epoch: f64, processor_pct: f64, memory_pct: f64) -> Self {
        Self {
            epoch,
            processor_pct,
            memory_pct,
        }
    }
}

/// Current wall-clock time as fractional epoch seconds.
pub fn epoch_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
