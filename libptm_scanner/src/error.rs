use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config field {0} must be set before use")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("ChainAssembler requires a job directory path before assembling a chain")]
    NoJobDir,
    #[error("ChainAssembler requires an ntuple selector path before assembling a chain")]
    NoNtuplePath,
    #[error("ChainAssembler did not find any matching ntuple files under {0:?}")]
    NoMatchingFiles(PathBuf),
    #[error("Chain failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Chain failed due to polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Reader failed due to chain error: {0}")]
    ChainError(#[from] ChainError),
    #[error("Reader failed due to polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Ntuple column {0} contains null entries")]
    NullColumn(&'static str),
    #[error("Cannot derive a histogram range from an empty hit stream")]
    EmptyStream,
}

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Failed to render plot {0}: {1}")]
    Render(String, String),
}

#[derive(Debug, Error)]
pub enum PlotMakerError {
    #[error("PlotMaker failed due to configuration error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("PlotMaker failed due to chain error: {0}")]
    ChainError(#[from] ChainError),
    #[error("PlotMaker failed due to reader error: {0}")]
    ReaderError(#[from] ReaderError),
    #[error("PlotMaker failed due to plot error: {0}")]
    PlotError(#[from] PlotError),
    #[error("PlotMaker failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("PlotMaker has no chain for the {0}; was gather_chains run with the matching flag enabled?")]
    MissingChain(&'static str),
}
