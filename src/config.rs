//! Runtime configuration for the review-scheduler binary.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding review states
    pub database_path: PathBuf,
    /// `tracing` filter directive, overridden by RUST_LOG
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("reviews.sqlite3"),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Reads a JSON config file; missing fields keep their defaults.
    /// Without a path the defaults are returned as is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let data = fs::read_to_string(path)?;
                Ok(serde_json::from_str(&data)?)
            }
            None => Ok(Self::default()),
        }
    }
}
