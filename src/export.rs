//! CSV export of demultiplexed serial records
//!
//! A serial capture `<name>.log` exports to `<name>.env.csv` and
//! `<name>.gps.csv`, next to the capture or under `output_dir`.

use crate::error::{Result, TelemetryError};
use crate::mux::RecordSink;
use crate::types::{EnvReading, GpsRecord, SensorValue, TaggedRecord, UNAVAILABLE_PLACEHOLDER};
use log::info;
use std::path::{Path, PathBuf};

/// Export options for controlling output formats
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub csv: bool,
    pub output_dir: Option<String>,
}

/// Files written by one export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub env_csv_path: Option<PathBuf>,
    pub gps_csv_path: Option<PathBuf>,
}

/// Records kept in arrival order for export
#[derive(Debug, Default, Clone)]
pub struct RecordLog {
    pub records: Vec<TaggedRecord>,
}

impl RecordSink for RecordLog {
    fn on_environmental(&mut self, reading: &EnvReading) -> Result<()> {
        self.records.push(TaggedRecord::Env(*reading));
        Ok(())
    }

    fn on_positional(&mut self, record: &GpsRecord) -> Result<()> {
        self.records.push(TaggedRecord::Gps(record.clone()));
        Ok(())
    }
}

fn cell(value: SensorValue) -> String {
    match value.value() {
        Some(v) => v.to_string(),
        None => UNAVAILABLE_PLACEHOLDER.to_string(),
    }
}

fn output_base(input_path: &Path, options: &ExportOptions) -> Result<(PathBuf, String)> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| TelemetryError::Export(format!("no file name in {}", input_path.display())))?;

    let dir = match &options.output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    std::fs::create_dir_all(&dir)?;
    Ok((dir, stem.to_string()))
}

/// Write environmental and positional records to separate CSV files
///
/// Rows keep their position in the serial stream in the `index` column, so
/// the two files can be merged back in order.
pub fn export_records_csv(
    records: &[TaggedRecord],
    input_path: &Path,
    options: &ExportOptions,
) -> Result<ExportReport> {
    if !options.csv {
        return Ok(ExportReport::default());
    }

    let (dir, stem) = output_base(input_path, options)?;
    let env_path = dir.join(format!("{stem}.env.csv"));
    let gps_path = dir.join(format!("{stem}.gps.csv"));

    let mut env = csv::Writer::from_path(&env_path)?;
    env.write_record(["index", "temperature", "humidity", "air_quality", "noise_level"])?;
    let mut gps = csv::Writer::from_path(&gps_path)?;
    gps.write_record(["index", "latitude", "longitude", "status"])?;

    for (index, record) in records.iter().enumerate() {
        let index = index.to_string();
        match record {
            TaggedRecord::Env(reading) => env.write_record([
                index,
                cell(reading.temperature),
                cell(reading.humidity),
                cell(reading.air_quality),
                cell(reading.noise_level),
            ])?,
            TaggedRecord::Gps(GpsRecord::Position { latitude, longitude }) => gps.write_record([
                index,
                format!("{latitude:.6}"),
                format!("{longitude:.6}"),
                String::new(),
            ])?,
            TaggedRecord::Gps(GpsRecord::Status { .. }) => {
                gps.write_record([index, String::new(), String::new(), "no_data".to_string()])?
            }
        }
    }

    env.flush()?;
    gps.flush()?;
    info!("Exported records to: {} and {}", env_path.display(), gps_path.display());

    Ok(ExportReport {
        env_csv_path: Some(env_path),
        gps_csv_path: Some(gps_path),
    })
}
