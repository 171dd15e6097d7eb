//! Persisted reports
//!
//! A report is written as `<prefix>_<YYYYmmdd_HHMMSS>.json` and/or `.csv`.
//! Each file is written to a temporary file in the destination directory and
//! renamed into place, so readers never see a partial report. A format that
//! fails to write is recorded and the remaining formats are still written.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::json::{JsonOutput, Metadata};
use super::tabular::{TabularRecord, write_csv};
use crate::error::Result;

/// Which report files to write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSelection {
    /// Structured JSON envelope
    #[default]
    Json,
    /// Flat CSV table
    Tabular,
    /// Both files
    Both,
}

impl ReportSelection {
    pub fn formats(&self) -> &'static [ReportFormat] {
        match self {
            ReportSelection::Json => &[ReportFormat::Json],
            ReportSelection::Tabular => &[ReportFormat::Csv],
            ReportSelection::Both => &[ReportFormat::Json, ReportFormat::Csv],
        }
    }
}

/// A single report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Records plus the context they were produced in.
#[derive(Debug, Clone)]
pub struct Report<T> {
    pub kind: String,
    pub group_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub records: Vec<T>,
    pub summary: Option<serde_json::Value>,
}

impl<T> Report<T> {
    pub fn new(kind: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            kind: kind.into(),
            group_id: None,
            generated_at: Utc::now(),
            records,
            summary: None,
        }
    }

    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn summary<S: Serialize>(mut self, summary: &S) -> Result<Self> {
        self.summary = Some(serde_json::to_value(summary)?);
        Ok(self)
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            generated_at: self.generated_at.to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            kind: Some(self.kind.clone()),
            group_id: self.group_id.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// A format that could not be written
#[derive(Debug, Clone)]
pub struct ReportFailure {
    pub format: ReportFormat,
    pub path: PathBuf,
    pub message: String,
}

/// Files written by [`render`] and the formats that failed.
#[derive(Debug, Clone, Default)]
pub struct RenderOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ReportFailure>,
}

/// Write `report` in every selected format.
pub fn render<T>(report: &Report<T>, selection: ReportSelection, prefix: &Path) -> RenderOutcome
where
    T: Serialize + TabularRecord,
{
    let stamp = report.generated_at.format("%Y%m%d_%H%M%S").to_string();
    let mut outcome = RenderOutcome::default();

    for &format in selection.formats() {
        let path = report_path(prefix, &stamp, format);
        let result = match format {
            ReportFormat::Json => write_atomic(&path, |w| {
                let output = JsonOutput::with_meta(&report.records, report.metadata());
                serde_json::to_writer_pretty(&mut *w, &output)?;
                writeln!(w)?;
                Ok(())
            }),
            ReportFormat::Csv => write_atomic(&path, |w| write_csv(&report.records, w)),
        };

        match result {
            Ok(()) => {
                debug!("Wrote {} report to {}", format, path.display());
                outcome.written.push(path);
            }
            Err(e) => {
                warn!("Failed to write {} report {}: {}", format, path.display(), e);
                outcome.failures.push(ReportFailure {
                    format,
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// `<prefix>_<stamp>.<ext>`; the prefix may include directories.
pub fn report_path(prefix: &Path, stamp: &str, format: ReportFormat) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!("_{}.{}", stamp, format.extension()));
    PathBuf::from(name)
}

/// Write through a temporary file in the destination directory, then rename.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
