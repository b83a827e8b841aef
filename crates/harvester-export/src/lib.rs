mod writer;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use harvester_core::{pause, BusinessRecord, Stop};
use serde::{Deserialize, Serialize};

pub use writer::{CsvTerminator, CsvWriterConfig, FileMode};

pub const HEADER: [&str; 8] = [
    "name",
    "category",
    "owner",
    "email",
    "phone",
    "address",
    "url",
    "postal_code",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    #[serde(default)]
    pub csv: CsvWriterConfig,

    #[serde(default)]
    pub file_mode: FileMode,

    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            file_prefix: default_file_prefix(),
            csv: CsvWriterConfig::default(),
            file_mode: FileMode::default(),
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_prefix() -> String {
    "business_data".into()
}

fn default_latency_ms() -> u64 {
    1500
}

impl ExportConfig {
    /// `<output_dir>/<prefix>_<YYYY-MM-DD>.csv`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.csv", self.file_prefix, date.format("%Y-%m-%d")))
    }
}

/// Writes `records` to today's export file.
///
/// Returns false when anything went wrong, the reason is logged.
pub async fn export_records(records: &[BusinessRecord], config: &ExportConfig, stop: &Stop) -> bool {
    if let Err(e) = pause(config.latency_ms, stop).await {
        log::warn!("Export aborted: {e}");
        return false;
    }

    let path = config.path_for(Local::now().date_naive());
    match write_export(records, config, &path) {
        Ok(()) => {
            log::info!(
                "Exported {} businesses to {}",
                records.len(),
                path.display()
            );
            true
        }
        Err(e) => {
            log::error!("Couldn't export businesses got: {e:#}");
            false
        }
    }
}

/// Writes the header, unless appending to a non-empty file, then one row
/// per record.
pub fn write_export(
    records: &[BusinessRecord],
    config: &ExportConfig,
    path: &Path,
) -> anyhow::Result<()> {
    let builder = csv::WriterBuilder::try_from(&config.csv)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs_err::create_dir_all(dir)?;
    }

    let opts: fs_err::OpenOptions = config.file_mode.into();
    let file = opts.open(path)?;
    let write_header = file.metadata()?.len() == 0;

    let mut wtr = builder.from_writer(file);
    if write_header {
        wtr.write_record(HEADER)?;
    }
    for record in records {
        wtr.write_record(row(record))
            .with_context(|| format!("Couldn't write business {}", record.id))?;
    }
    wtr.flush()?;

    Ok(())
}

fn row(record: &BusinessRecord) -> [&str; 8] {
    [
        record.name.as_str(),
        record.category.label(),
        cell(&record.owner),
        cell(&record.email),
        cell(&record.phone),
        cell(&record.address),
        cell(&record.url),
        cell(&record.postal_code),
    ]
}

fn cell(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}
