use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "privatehealth-04-apr-2019";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_FUNDS_FILE: &str = "Funds 04-Apr-2019.xml";
pub const DEFAULT_DOWNLOAD_BASE: &str = "www.privatehealth.gov.au/dynamic/Download/";

/// Run settings: built-in defaults, overridden by `DBN_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub funds_file: String,
    pub download_base: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_config(Config::builder().add_source(Environment::with_prefix("DBN")))
    }

    fn from_config(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .set_default("data_dir", DEFAULT_DATA_DIR)?
            .set_default("results_dir", DEFAULT_RESULTS_DIR)?
            .set_default("funds_file", DEFAULT_FUNDS_FILE)?
            .set_default("download_base", DEFAULT_DOWNLOAD_BASE)?
            .build()
            .context("Failed to build settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn funds_path(&self) -> PathBuf {
        self.data_dir.join(&self.funds_file)
    }
}
