// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the mfc-control project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data log configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location and naming of the per-run CSV log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatalogConfig {
    /// Root directory of the logs, relative paths are resolved from the
    /// working directory. One sub-directory per day is created inside.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File name prefix, followed by the run start timestamp
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_file_prefix() -> String {
    "MFC".to_string()
}

impl Default for DatalogConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file_prefix: default_file_prefix(),
        }
    }
}
