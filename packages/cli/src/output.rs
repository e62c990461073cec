//! Writing merged collections to disk.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use police_map_aggregate_models::AggregateOutput;
use police_map_records_models::{CrimeRecord, StopSearchRecord};
use serde::Serialize;

/// File name stem for the crime collection.
pub const CRIMES_STEM: &str = "street_crimes";

/// File name stem for the stop-and-search collection.
pub const STOP_SEARCH_STEM: &str = "stop_and_search";

/// Errors that can occur writing output files.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// I/O error (directory creation, file write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// On-disk format for the merged collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array per collection.
    #[default]
    Json,
    /// One CSV file per collection, with a header row.
    Csv,
}

impl OutputFormat {
    const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Writes both collections into `dir`, returning the paths written.
///
/// # Errors
///
/// Returns [`OutputError`] if the directory or a file cannot be written.
pub fn write_output(
    dir: &Path,
    format: OutputFormat,
    output: &AggregateOutput,
) -> Result<Vec<PathBuf>, OutputError> {
    std::fs::create_dir_all(dir)?;

    let crimes = dir.join(format!("{CRIMES_STEM}.{}", format.extension()));
    write_records(&crimes, format, &output.crimes)?;

    let stops = dir.join(format!("{STOP_SEARCH_STEM}.{}", format.extension()));
    write_records(&stops, format, &output.stop_searches)?;

    Ok(vec![crimes, stops])
}

fn write_records<R: Serialize>(
    path: &Path,
    format: OutputFormat,
    records: &[R],
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => {
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            serde_json::to_writer_pretty(file, records)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
    }

    log::info!("Wrote {} record(s) to {}", records.len(), path.display());
    Ok(())
}

/// Both collections as one pretty-printed JSON object.
///
/// # Errors
///
/// Returns [`OutputError::Json`] if a record cannot be serialized.
pub fn records_json(output: &AggregateOutput) -> Result<String, OutputError> {
    #[derive(Serialize)]
    struct Records<'a> {
        crimes: &'a [CrimeRecord],
        stop_searches: &'a [StopSearchRecord],
    }

    Ok(serde_json::to_string_pretty(&Records {
        crimes: &output.crimes,
        stop_searches: &output.stop_searches,
    })?)
}
