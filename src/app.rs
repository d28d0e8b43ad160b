use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::csvlog::PersistenceSink;
use crate::error::MonitorError;
use crate::nvidia::SampleSource;
use crate::theme::{load_color, Rgb};
use crate::ui::{RenderSink, Series};
use crate::window::WindowBuffer;

/// Poll loop lifecycle. `Stopped` is terminal; no further ticks occur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

/// Orchestrates one device: read, persist, buffer, render, sleep.
///
/// Owns the window buffer and all three collaborator handles for the
/// process lifetime; they are released when the poller drops.
pub struct Poller<S, P, R> {
    source: S,
    sink: P,
    render: R,
    window: WindowBuffer,
    interval: Duration,
    state: LoopState,
}

impl<S, P, R> Poller<S, P, R>
where
    S: SampleSource,
    P: PersistenceSink,
    R: RenderSink,
{
    pub fn new(source: S, sink: P, render: R, window: WindowBuffer, interval: Duration) -> Self {
        Self {
            source,
            sink,
            render,
            window,
            interval,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One tick. The CSV append flushes before the sample reaches the
    /// buffer or the screen, so every rendered sample is already durable.
    /// Returns `false` when the operator asked to quit via the UI.
    fn tick(&mut self) -> Result<bool, MonitorError> {
        let sample = self.source.read()?;
        self.sink.append(&sample)?;

        self.window.insert(sample);
        self.window.evict(sample.epoch);

        let geometry = self.window.geometry(sample.epoch);
        let processor: Vec<f64> = self.window.iter().map(|s| s.processor_pct).collect();
        let memory: Vec<f64> = self.window.iter().map(|s| s.memory_pct).collect();
        let processor_colors: Vec<Rgb> = processor.iter().map(|&p| load_color(p)).collect();
        let memory_colors: Vec<Rgb> = memory.iter().map(|&p| load_color(p)).collect();

        self.render.update(
            Series::Processor,
            &geometry.x_positions,
            &processor,
            &processor_colors,
            geometry.width,
        );
        self.render.update(
            Series::Memory,
            &geometry.x_positions,
            &memory,
            &memory_colors,
            geometry.width,
        );
        self.render.refresh()
    }

    /// Runs ticks until cancelled or a tick fails. Cancellation is
    /// cooperative: the flag and the UI quit request are checked between
    /// ticks only, so an interrupt during a tick's I/O takes effect after
    /// that tick's writes complete.
    pub async fn run(&mut self, cancel: Arc<AtomicBool>) -> Result<(), MonitorError> {
        self.state = LoopState::Running;

        while self.state == LoopState::Running {
            match self.tick() {
                Ok(true) => {}
                Ok(false) => {
                    debug!("quit requested from the terminal");
                    self.state = LoopState::Stopping;
                    break;
                }
                Err(e) => {
                    self.state = LoopState::Stopped;
                    return Err(e);
                }
            }

            if cancel.load(Ordering::Relaxed) {
                debug!("interrupt received");
                self.state = LoopState::Stopping;
                break;
            }

            // Sole suspension point of the loop.
            tokio::time::sleep(self.interval).await;

            if cancel.load(Ordering::Relaxed) {
                self.state = LoopState::Stopping;
            }
        }

        self.state = LoopState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use crate::window::WindowBuffer;

    struct ScriptedSource {
        samples: Vec<Sample>,
        cursor: usize,
    }

    impl ScriptedSource {
        fn new(samples: Vec<Sample>) -> Self {
            Self { samples, cursor: 0 }
        }
    }

    impl SampleSource for ScriptedSource {
        fn read(&mut self) -> Result<Sample, MonitorError> {
            let sample = self
                .samples
                .get(self.cursor)
                .copied()
                .ok_or_else(|| MonitorError::Query("script exhausted".to_string()))?;
            self.cursor += 1;
            Ok(sample)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Vec<Sample>,
        fail: bool,
    }

    impl PersistenceSink for MemorySink {
        fn append(&mut self, sample: &Sample) -> Result<(), MonitorError> {
            if self.fail {
                return Err(MonitorError::Persistence(std::io::Error::other("disk full")));
            }
            self.rows.push(*sample);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingRender {
        updates: Vec<(Series, Vec<f64>, Vec<f64>, f64)>,
        refreshes: usize,
        quit_after: Option<usize>,
    }

    impl RenderSink for RecordingRender {
        fn update(&mut self, series: Series, x: &[f64], heights: &[f64], _colors: &[Rgb], width: f64) {
            self.updates.push((series, x.to_vec(), heights.to_vec(), width));
        }

        fn set_title(&mut self, _title: String) {}

        fn refresh(&mut self) -> Result<bool, MonitorError> {
            self.refreshes += 1;
            Ok(self.quit_after.map_or(true, |n| self.refreshes < n))
        }
    }

    fn poller_with(
        samples: Vec<Sample>,
        sink: MemorySink,
        render: RecordingRender,
    ) -> Poller<ScriptedSource, MemorySink, RecordingRender> {
        Poller::new(
            ScriptedSource::new(samples),
            sink,
            render,
            WindowBuffer::new(60.0, 0.5),
            Duration::from_millis(0),
        )
    }

    #[test]
    fn tick_persists_then_renders_both_series() {
        let mut poller = poller_with(
            vec![Sample::new(100.0, 40.0, 80.0)],
            MemorySink::default(),
            RecordingRender::default(),
        );

        assert!(poller.tick().unwrap());

        assert_eq!(poller.sink.rows, vec![Sample::new(100.0, 40.0, 80.0)]);
        assert_eq!(poller.render.refreshes, 1);
        assert_eq!(poller.render.updates.len(), 2);

        let (series, x, heights, width) = &poller.render.updates[0];
        assert_eq!(*series, Series::Processor);
        assert_eq!(x, &vec![60.0]);
        assert_eq!(heights, &vec![40.0]);
        assert_eq!(*width, 0.5);

        let (series, x, heights, _) = &poller.render.updates[1];
        assert_eq!(*series, Series::Memory);
        assert_eq!(x, &vec![60.0]);
        assert_eq!(heights, &vec![80.0]);
    }

    #[test]
    fn query_failure_is_fatal_and_renders_nothing() {
        let mut poller = poller_with(vec![], MemorySink::default(), RecordingRender::default());

        let err = poller.tick().unwrap_err();
        assert!(matches!(err, MonitorError::Query(_)));
        assert!(poller.sink.rows.is_empty());
        assert_eq!(poller.render.refreshes, 0);
    }

    #[test]
    fn persistence_failure_stops_the_tick_before_rendering() {
        let sink = MemorySink {
            fail: true,
            ..Default::default()
        };
        let mut poller = poller_with(
            vec![Sample::new(100.0, 40.0, 80.0)],
            sink,
            RecordingRender::default(),
        );

        let err = poller.tick().unwrap_err();
        assert!(matches!(err, MonitorError::Persistence(_)));
        assert_eq!(poller.render.refreshes, 0);
        assert!(poller.window.is_empty());
    }

    #[test]
    fn window_stays_bounded_across_ticks() {
        let samples: Vec<Sample> = (0..200)
            .map(|i| Sample::new(i as f64, 50.0, 50.0))
            .collect();
        let mut poller = poller_with(samples, MemorySink::default(), RecordingRender::default());

        for _ in 0..200 {
            poller.tick().unwrap();
        }

        // 60s window at 1s spacing: the buffer holds at most W + 1 samples.
        assert!(poller.window.len() <= 61);
        assert_eq!(poller.sink.rows.len(), 200);
    }

    #[tokio::test]
    async fn interrupt_drives_running_to_stopped() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 1.0, 1.0)).collect();
        let mut poller = poller_with(samples, MemorySink::default(), RecordingRender::default());

        let cancel = Arc::new(AtomicBool::new(false));
        cancel.store(true, Ordering::Relaxed);

        poller.run(cancel).await.unwrap();

        assert_eq!(poller.state(), LoopState::Stopped);
        // The in-flight tick completed its write before shutdown.
        assert_eq!(poller.sink.rows.len(), 1);
    }

    #[tokio::test]
    async fn ui_quit_request_stops_the_loop_cleanly() {
        let samples: Vec<Sample> = (0..10).map(|i| Sample::new(i as f64, 1.0, 1.0)).collect();
        let render = RecordingRender {
            quit_after: Some(3),
            ..Default::default()
        };
        let mut poller = poller_with(samples, MemorySink::default(), render);

        poller.run(Arc::new(AtomicBool::new(false))).await.unwrap();

        assert_eq!(poller.state(), LoopState::Stopped);
        assert_eq!(poller.render.refreshes, 3);
        assert_eq!(poller.sink.rows.len(), 3);
    }
}
