use std::path::PathBuf;

use clap::Parser;

/// NVIDIA GPU monitor: rolling bar charts of processor and memory load in
/// the terminal, with every sample appended to a CSV log.
#[derive(Parser, Debug)]
#[command(name = "gpu-pressure", version)]
pub struct Config {
    /// GPU device index to monitor.
    #[arg(long, default_value_t = 0)]
    pub device_index: u32,

    /// Seconds between samples.
    #[arg(long, default_value_t = 0.5)]
    pub poll_interval_seconds: f64,

    /// Visible history window in seconds.
    #[arg(long, default_value_t = 60)]
    pub window_seconds: u64,

    /// CSV log file; created with a header if missing, appended otherwise.
    #[arg(long, default_value = "gpu_log.csv")]
    pub csv_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_options() {
        let cfg = Config::parse_from(["gpu-pressure"]);
        assert_eq!(cfg.device_index, 0);
        assert_eq!(cfg.poll_interval_seconds, 0.5);
        assert_eq!(cfg.window_seconds, 60);
        assert_eq!(cfg.csv_path, PathBuf::from("gpu_log.csv"));
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::parse_from([
            "gpu-pressure",
            "--device-index",
            "1",
            "--poll-interval-seconds",
            "2",
            "--window-seconds",
            "120",
            "--csv-path",
            "/tmp/other.csv",
        ]);
        assert_eq!(cfg.device_index, 1);
        assert_eq!(cfg.poll_interval_seconds, 2.0);
        assert_eq!(cfg.window_seconds, 120);
        assert_eq!(cfg.csv_path, PathBuf::from("/tmp/other.csv"));
    }
}
