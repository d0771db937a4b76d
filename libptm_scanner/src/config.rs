use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::{DEFAULT_SIGNAL_CONVERSION, DEFAULT_TOTAL_SIGNAL_ERR};
use super::error::ConfigError;

/// Structure representing the plot-maker configuration. Contains pathing, the
/// per-channel ntuple selectors, and the signal model parameters.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub job_name: String,
    pub make_target_hists: bool,
    pub make_ptm_virtual_hists: bool,
    pub make_scanner_plots: bool,
    pub retain_hists: bool,
    pub print_accounting: bool,
    pub signal_conversion_const: f64,
    pub total_signal_err: f64,
    pub target_front_ntuple: PathBuf,
    pub target_back_ntuple: PathBuf,
    pub near_pwc_ntuple: PathBuf,
    pub far_pwc_ntuple: PathBuf,
    pub scanner_ntuple: PathBuf,
}

impl Default for Config {
    /// Generate a new Config object. Paths will be empty/invalid, selectors
    /// and signal parameters get the standard values.
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("None"),
            output_path: PathBuf::from("."),
            job_name: String::from(""),
            make_target_hists: false,
            make_ptm_virtual_hists: false,
            make_scanner_plots: false,
            retain_hists: false,
            print_accounting: false,
            signal_conversion_const: DEFAULT_SIGNAL_CONVERSION,
            total_signal_err: DEFAULT_TOTAL_SIGNAL_ERR,
            target_front_ntuple: PathBuf::from("readvdPTFront/ntvd"),
            target_back_ntuple: PathBuf::from("readvdPTBack/ntvd"),
            near_pwc_ntuple: PathBuf::from("readvdNr/ntvd"),
            far_pwc_ntuple: PathBuf::from("readvdFr/ntvd"),
            scanner_ntuple: PathBuf::from("readPTM/ntPTM"),
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check that the fields required before any chain can be assembled have
    /// been given real values. Never silently proceeds with the placeholders.
    pub fn check_required_fields(&self) -> Result<(), ConfigError> {
        if self.job_name.is_empty() {
            return Err(ConfigError::MissingField("job_name"));
        }
        if !self.is_data_path_set() {
            return Err(ConfigError::MissingField("data_path"));
        }
        Ok(())
    }

    pub fn is_data_path_set(&self) -> bool {
        !self.data_path.as_os_str().is_empty() && self.data_path != PathBuf::from("None")
    }

    pub fn any_plots_enabled(&self) -> bool {
        self.make_target_hists || self.make_ptm_virtual_hists || self.make_scanner_plots
    }
}
