use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config requested {0} edge bins per side; at least three interior drift-time bins are required")]
    InvalidEdgeBins(usize),
    #[error("Config has an invalid histogram axis -- bins: {0}, min: {1}, max: {2}")]
    InvalidAxis(usize, f64, f64),
}

#[derive(Debug, Error)]
pub enum TrackFileError {
    #[error("Could not open TrackFile because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("TrackFile failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("TrackFile is missing the expected field {0}")]
    MissingField(String),
    #[error("TrackFile has mismatched hit arrays in {0} -- x: {1}, y: {2}, t: {3}, c: {4}")]
    MismatchedHitArrays(String, usize, usize, usize, usize),
    #[error("TrackFile was asked for track {0} which is outside of the stored range")]
    TrackOutOfRange(usize),
}

#[derive(Debug, Clone, Error)]
pub enum TrackError {
    #[error("Track {1} of event {0} has zero drift-time span and should have been rejected by the track filter")]
    ZeroTimeSpan(i32, i32),
}

#[derive(Debug, Clone, Error)]
pub enum FitError {
    #[error("Exponential fit needs at least {1} populated profile bins, found {0}")]
    TooFewPoints(usize, usize),
    #[error("Exponential fit failed to converge after {0} iterations")]
    NotConverged(usize),
    #[error("Exponential fit produced a singular curvature matrix")]
    Singular,
    #[error("Exponential fit found a zero decay rate; the lifetime is undefined")]
    ZeroDecayRate,
}

#[derive(Debug, Error)]
pub enum HistogramWriterError {
    #[error("HistogramWriter failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("HistogramWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("HistogramWriter failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to TrackFile error: {0}")]
    TrackFileError(#[from] TrackFileError),
    #[error("Processor failed due to an internal consistency error: {0}")]
    TrackError(#[from] TrackError),
    #[error("Processor failed to extract the electron lifetime: {0}")]
    FitError(#[from] FitError),
    #[error("Processor failed due to HistogramWriter error: {0}")]
    WriterError(#[from] HistogramWriterError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
