use std::collections::VecDeque;

use crate::models::Sample;

/// Bar-chart geometry derived from the buffer contents. Recomputed every
/// tick, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Per-sample x position relative to the window's left edge, so x
    /// ranges over [0, W] with the newest sample nearest W.
    pub x_positions: Vec<f64>,
    /// Uniform bar width: mean inter-sample spacing, chosen so adjacent
    /// bars touch without gaps under regular sampling.
    pub width: f64,
}

/// Sliding window of samples covering the last `window_secs` seconds.
///
/// Samples arrive in timestamp order (the source is polled synchronously),
/// so insertion keeps the deque sorted by construction and eviction only
/// ever removes from the head.
#[derive(Debug)]
pub struct WindowBuffer {
    samples: VecDeque<Sample>,
    window_secs: f64,
    /// Width fallback when fewer than two samples exist: the nominal poll
    /// interval.
    default_width: f64,
}

impl WindowBuffer {
    pub fn new(window_secs: f64, default_width: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_secs,
            default_width,
        }
    }

    /// Appends a sample at the tail. The caller guarantees timestamps are
    /// non-decreasing; an out-of-order sample would simply ride along until
    /// eviction reaches it.
    pub fn insert(&mut self, sample: Sample) {
        self.samples.push_back(sample);
    }

    /// Drops head entries older than `now - W`. Entries expire in arrival
    /// order, so this stops at the first survivor.
    pub fn evict(&mut self, now: f64) {
        let cutoff = now - self.window_secs;
        while let Some(front) = self.samples.front() {
            if front.epoch < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Derives x positions and the uniform bar width for the current
    /// contents. With fewer than two samples there is no spacing to
    /// average, so the width falls back to the nominal poll interval.
    pub fn geometry(&self, now: f64) -> Geometry {
        let left = now - self.window_secs;
        let x_positions: Vec<f64> = self.samples.iter().map(|s| s.epoch - left).collect();

        let width = if x_positions.len() >= 2 {
            let spans: f64 = x_positions.windows(2).map(|w| w[1] - w[0]).sum();
            spans / (x_positions.len() - 1) as f64
        } else {
            self.default_width
        };

        Geometry { x_positions, width }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
