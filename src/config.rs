use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pip::DEFAULT_BBOX_FILE;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub index: IndexConfig,
}

/// When level1 detail records are read from the source.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// On first bbox hit, then memoized.
    #[default]
    Lazy,
    /// All records at index build time.
    Eager,
}

/// What the resolver does when a candidate's detail record cannot be read.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailErrorPolicy {
    /// Return the error to the caller.
    #[default]
    Propagate,
    /// Log and move on to the next candidate.
    Skip,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    pub data_dir: PathBuf,
    pub bbox_file: String,
    pub load_mode: LoadMode,
    pub on_detail_error: DetailErrorPolicy,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/gis"),
            bbox_file: DEFAULT_BBOX_FILE.to_string(),
            load_mode: LoadMode::default(),
            on_detail_error: DetailErrorPolicy::default(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
