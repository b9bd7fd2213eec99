use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::NUM_BINS;
use super::error::ConfigError;

/// Fewest populated profile bins the exponential fit accepts
pub const MIN_INTERIOR_BINS: usize = 3;

/// Binning of one histogram axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl AxisConfig {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.bins > 0 && self.min.is_finite() && self.max.is_finite() && self.max > self.min
    }
}

/// Structure representing the analysis configuration. Contains pathing and the analysis
/// choices which are not physical constants.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Number of drift-time bins dropped at each end of a track in the lifetime fit
    /// and the aggregate dE/dx distribution
    pub edge_bins: usize,
    /// Charge-per-length axis of the lifetime map (ke-/cm)
    pub charge_density_axis: AxisConfig,
    /// dE/dx axis of the corrected distributions (MeV/cm)
    pub dedx_axis: AxisConfig,
}

impl Default for Config {
    /// Generate a new Config reproducing the reference analysis. The input path is empty.
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("results.h5"),
            edge_bins: 1,
            charge_density_axis: AxisConfig::new(50, 0.0, 160.0),
            dedx_axis: AxisConfig::new(50, 0.0, 6.0),
        }
    }
}

impl Config {
    /// Make a default Config reading from the given input path
    pub fn with_input(input_path: &Path) -> Self {
        Self {
            input_path: input_path.to_path_buf(),
            ..Default::default()
        }
    }

    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check that enough interior bins survive the edge exclusion to fit
    pub fn is_edge_bins_valid(&self) -> bool {
        NUM_BINS >= 2 * self.edge_bins + MIN_INTERIOR_BINS
    }

    /// Run all of the checks, returning the first failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_edge_bins_valid() {
            return Err(ConfigError::InvalidEdgeBins(self.edge_bins));
        }
        for axis in [&self.charge_density_axis, &self.dedx_axis] {
            if !axis.is_valid() {
                return Err(ConfigError::InvalidAxis(axis.bins, axis.min, axis.max));
            }
        }
        Ok(())
    }

    /// The range of drift-time bins which are not at a track edge
    pub fn interior_bins(&self) -> std::ops::Range<usize> {
        self.edge_bins..(NUM_BINS - self.edge_bins)
    }

    /// Get the path to the YAML summary written next to the output file
    pub fn get_summary_path(&self) -> PathBuf {
        self.output_path.with_extension("yml")
    }
}
