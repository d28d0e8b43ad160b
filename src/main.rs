use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod csvlog;
mod error;
mod models;
mod nvidia;
mod theme;
mod ui;
mod window;

use app::Poller;
use config::Config;
use csvlog::CsvLog;
use nvidia::{NvidiaSmiSource, SampleSource};
use ui::{RenderSink, Tui};
use window::WindowBuffer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();
    if !(cfg.poll_interval_seconds > 0.0) {
        anyhow::bail!("--poll-interval-seconds must be positive");
    }

    // Stdout belongs to the alternate screen; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let source = NvidiaSmiSource::open(cfg.device_index)?;
    let sink = CsvLog::open(&cfg.csv_path)?;
    info!(
        device = source.name(),
        csv = %cfg.csv_path.display(),
        "starting GPU monitor"
    );

    let mut tui = Tui::new(cfg.window_seconds as f64)?;
    tui.set_title(format!(
        "GPU monitor - {} - last {}s",
        source.name(),
        cfg.window_seconds
    ));

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let window = WindowBuffer::new(cfg.window_seconds as f64, cfg.poll_interval_seconds);
    let mut poller = Poller::new(
        source,
        sink,
        tui,
        window,
        Duration::from_secs_f64(cfg.poll_interval_seconds),
    );

    let outcome = poller.run(cancel).await;
    // Restores the terminal (Tui::drop) before any error is printed.
    drop(poller);

    outcome?;
    info!("stopped by the operator");
    Ok(())
}
