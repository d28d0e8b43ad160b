use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Local, TimeZone};

use crate::error::MonitorError;
use crate::models::Sample;

pub const CSV_HEADER: &str = "epoch,fecha_completa,carga_procesador,carga_memoria";

/// Durable destination for every sample the loop produces.
pub trait PersistenceSink {
    fn append(&mut self, sample: &Sample) -> Result<(), MonitorError>;
}

/// Append-only CSV log. The header is written once, when the file is
/// created; every row is flushed before the tick proceeds, so a kill
/// mid-run never corrupts prior rows.
pub struct CsvLog {
    writer: BufWriter<File>,
}

impl CsvLog {
    pub fn open(path: &Path) -> Result<Self, MonitorError> {
        let existed = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(MonitorError::Persistence)?;
        let mut writer = BufWriter::new(file);

        if !existed {
            writeln!(writer, "{CSV_HEADER}").map_err(MonitorError::Persistence)?;
            writer.flush().map_err(MonitorError::Persistence)?;
        }

        Ok(Self { writer })
    }
}

impl PersistenceSink for CsvLog {
    fn append(&mut self, sample: &Sample) -> Result<(), MonitorError> {
        let stamp = Local
            .timestamp_opt(sample.epoch.trunc() as i64, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .ok_or_else(|| {
                MonitorError::Persistence(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("epoch {} is not a representable time", sample.epoch),
                ))
            })?;

        writeln!(
            self.writer,
            "{:.3},{},{:.2},{:.2}",
            sample.epoch, stamp, sample.processor_pct, sample.memory_pct
        )
        .map_err(MonitorError::Persistence)?;
        self.writer.flush().map_err(MonitorError::Persistence)
    }
}
