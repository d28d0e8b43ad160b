use std::process::Command;

use crate::error::MonitorError;
use crate::models::{epoch_now, Sample};

/// Source of GPU readings, polled once per tick.
pub trait SampleSource {
    fn read(&mut self) -> Result<Sample, MonitorError>;
    fn name(&self) -> &str;
}

/// Queries one NVIDIA device through `nvidia-smi`. Stateless between calls:
/// each read spawns the tool, so there is no driver handle to close.
pub struct NvidiaSmiSource {
    index: u32,
    name: String,
}

impl NvidiaSmiSource {
    /// Resolves the device at `index`, failing with `DeviceUnavailable`
    /// when `nvidia-smi` is missing, errors out, or does not list the
    /// requested index.
    pub fn open(index: u32) -> Result<Self, MonitorError> {
        let output = Command::new("nvidia-smi")
            .arg("--query-gpu=index,name")
            .arg("--format=csv,noheader")
            .output()
            .map_err(|e| MonitorError::DeviceUnavailable {
                index,
                reason: format!("cannot run nvidia-smi: {e}"),
            })?;

        if !output.status.success() {
            return Err(MonitorError::DeviceUnavailable {
                index,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        for line in listing.lines() {
            let mut parts = line.splitn(2, ',').map(str::trim);
            if parts.next().and_then(|s| s.parse::<u32>().ok()) == Some(index) {
                let name = parts.next().unwrap_or("NVIDIA GPU").to_string();
                return Ok(Self { index, name });
            }
        }

        Err(MonitorError::DeviceUnavailable {
            index,
            reason: "device index not reported by nvidia-smi".to_string(),
        })
    }

    fn parse_reading(line: &str) -> Option<(f64, f64, f64)> {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 3 {
            return None;
        }
        let util: f64 = parts[0].parse().ok()?;
        let used: f64 = parts[1].parse().ok()?;
        let total: f64 = parts[2].parse().ok()?;
        Some((util, used, total))
    }
}

impl SampleSource for NvidiaSmiSource {
    fn read(&mut self) -> Result<Sample, MonitorError> {
        let output = Command::new("nvidia-smi")
            .arg("-i")
            .arg(self.index.to_string())
            .arg("--query-gpu=utilization.gpu,memory.used,memory.total")
            .arg("--format=csv,noheader,nounits")
            .output()
            .map_err(|e| MonitorError::Query(e.to_string()))?;

        if !output.status.success() {
            return Err(MonitorError::Query(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let line = text.lines().next().unwrap_or("");
        let (util, used, total) = Self::parse_reading(line)
            .ok_or_else(|| MonitorError::Query(format!("unexpected nvidia-smi output: {line:?}")))?;

        let memory_pct = if total > 0.0 {
            used / total * 100.0
        } else {
            0.0
        };

        Ok(Sample::new(
            epoch_now(),
            util.clamp(0.0, 100.0),
            memory_pct.clamp(0.0, 100.0),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_normal_reading() {
        let (util, used, total) = NvidiaSmiSource::parse_reading("42, 3072, 8192").unwrap();
        assert_eq!(util, 42.0);
        assert_eq!(used, 3072.0);
        assert_eq!(total, 8192.0);
    }

    #[test]
    fn rejects_truncated_output() {
        assert!(NvidiaSmiSource::parse_reading("42, 3072").is_none());
        assert!(NvidiaSmiSource::parse_reading("").is_none());
        assert!(NvidiaSmiSource::parse_reading("N/A, N/A, N/A").is_none());
    }
}
