// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Append-only CSV log writer
//!
//! The file is reopened in append mode for every row and closed right after
//! the row is flushed, so a crash never loses rows that were already written.

use chrono::{DateTime, Local};
use log::{debug, info};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::acquisition::Reading;

/// Format of the `datetime` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Errors raised while writing the data log
#[derive(Error, Debug)]
pub enum DatalogError {
    #[error("I/O error on log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error on log file {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Row has {found} columns but the log header has {expected}")]
    ColumnMismatch { expected: usize, found: usize },
}

/// Build the header row for the given controller names, in order.
///
/// ```
/// use mfc_control::datalog::header_for;
///
/// let header = header_for(["A", "B"]);
/// assert_eq!(
///     header.join(","),
///     "datetime,A_setpoint,A_flowrate,B_setpoint,B_flowrate"
/// );
/// ```
pub fn header_for<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut header = vec!["datetime".to_string()];
    for name in names {
        let name = name.as_ref();
        header.push(format!("{}_setpoint", name));
        header.push(format!("{}_flowrate", name));
    }
    header
}

/// Path of the log file of a run started at `start`:
/// `<root>/<YYYY-MM-DD>/<prefix>_<YYYYMMDD_HHMMSS>.csv`
pub fn log_file_path(root: &Path, prefix: &str, start: &DateTime<Local>) -> PathBuf {
    root.join(start.format("%Y-%m-%d").to_string()).join(format!(
        "{}_{}.csv",
        prefix,
        start.format("%Y%m%d_%H%M%S")
    ))
}

/// Writer of one run's CSV log
#[derive(Debug, Clone)]
pub struct CsvLogWriter {
    path: PathBuf,
    columns: usize,
}

impl CsvLogWriter {
    /// Create the log file and its directories, and write the header once.
    ///
    /// If the file already exists and is not empty it is reused as is: rows
    /// are appended after the existing content and the header is not
    /// written again.
    pub fn open_log<P: AsRef<Path>>(path: P, header: &[String]) -> Result<Self, DatalogError> {
        let path = path.as_ref().to_path_buf();
        let io_error = |source| DatalogError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_error)?;
        let existing = file.metadata().map_err(io_error)?.len();

        let writer = Self {
            path: path.clone(),
            columns: header.len(),
        };

        if existing == 0 {
            writer.write_record(file, header)?;
            info!("Created data log {:?}", path);
        } else {
            info!("Appending to existing data log {:?}", path);
        }

        Ok(writer)
    }

    /// Append one reading as a row, then flush and close the file
    pub fn append(&self, reading: &Reading) -> Result<(), DatalogError> {
        let record = reading.to_record();
        if record.len() != self.columns {
            return Err(DatalogError::ColumnMismatch {
                expected: self.columns,
                found: record.len(),
            });
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| DatalogError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.write_record(file, &record)?;
        debug!("Appended reading to {:?}", self.path);
        Ok(())
    }

    fn write_record<W: Write>(&self, out: W, record: &[String]) -> Result<(), DatalogError> {
        let csv_error = |source| DatalogError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(record).map_err(csv_error)?;
        let mut out = writer
            .into_inner()
            .map_err(|e| DatalogError::Io {
                path: self.path.clone(),
                source: e.into_error(),
            })?;
        out.flush().map_err(|source| DatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Location of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of columns of every row, header included
    pub fn columns(&self) -> usize {
        self.columns
    }
}
