// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data logging
//!
//! Appends one CSV row per poll cycle to a per-run file stored under a
//! directory named after the day the run started.

mod writer;

pub use writer::{header_for, log_file_path, CsvLogWriter, DatalogError, TIMESTAMP_FORMAT};
