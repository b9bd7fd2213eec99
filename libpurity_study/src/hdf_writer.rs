use hdf5::types::VarLenUnicode;
use hdf5::{File, Group, Location};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::constants::{
    DEDX_2D_NAME, DEDX_NAME, FORMAT_VERSION, HISTOGRAMS_NAME, LIFETIME_2D_NAME, LIFETIME_NAME,
    LIFETIME_PROFILE_NAME,
};
use super::correction::DedxHistograms;
use super::error::HistogramWriterError;
use super::histogram::{Axis, Hist1D, Hist2D, Histogram, Profile};
use super::lifetime::LifetimeResult;
use super::process::AnalysisSummary;

// Structure
// lifetime - value, uncertainty, chi_square, ndf, accepted_tracks, version
// histograms
// |---- lifetime_2d(dset) - x_bins, x_min, x_max, y_bins, y_min, y_max, entries
// |---- lifetime_profile - x_bins, x_min, x_max, entries
// |    |---- mean(dset)
// |    |---- error(dset)
// |    |---- counts(dset)
// |---- dedx(dset) - x_bins, x_min, x_max, entries, underflow, overflow
// |---- dedx_2d(dset) - x_bins, x_min, x_max, y_bins, y_min, y_max, entries

/// A simple struct which wraps around the hdf5-rust library.
///
/// Writes the histograms of both passes, and the lifetime they were corrected with, to a
/// single HDF5 file for later use. A YAML summary is written next to it.
#[derive(Debug)]
pub struct HistogramWriter {
    file_handle: File,
    summary_path: PathBuf,
    histograms_group: Group,
}

impl HistogramWriter {
    /// Create the writer, opening a file at path and creating the data groups
    pub fn new(path: &Path, summary_path: &Path) -> Result<Self, HistogramWriterError> {
        let file_handle = File::create(path)?;
        let histograms_group = file_handle.create_group(HISTOGRAMS_NAME)?;
        Ok(Self {
            file_handle,
            summary_path: summary_path.to_path_buf(),
            histograms_group,
        })
    }

    /// Write the lifetime, its fit and the first pass histograms
    pub fn write_lifetime(&self, result: &LifetimeResult) -> Result<(), HistogramWriterError> {
        let version = format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION);
        let lifetime_group = self.file_handle.create_group(LIFETIME_NAME)?;
        write_scalar(&lifetime_group, "value", result.lifetime.value)?;
        write_scalar(&lifetime_group, "uncertainty", result.lifetime.uncertainty)?;
        write_scalar(&lifetime_group, "chi_square", result.fit.chi_square)?;
        write_scalar(&lifetime_group, "ndf", result.fit.ndf as u64)?;
        write_scalar(&lifetime_group, "accepted_tracks", result.accepted_tracks)?;
        let version =
            VarLenUnicode::from_str(&version).map_err(|e| hdf5::Error::from(e.to_string()))?;
        lifetime_group
            .new_attr::<VarLenUnicode>()
            .create("version")?
            .write_scalar(&version)?;

        self.write_hist2d(LIFETIME_2D_NAME, &result.histograms.charge_density)?;
        self.write_profile(LIFETIME_PROFILE_NAME, &result.histograms.profile)?;
        Ok(())
    }

    /// Write the second pass histograms
    pub fn write_dedx(&self, histograms: &DedxHistograms) -> Result<(), HistogramWriterError> {
        self.write_hist1d(DEDX_NAME, &histograms.dedx)?;
        self.write_hist2d(DEDX_2D_NAME, &histograms.dedx_vs_drift_time)?;
        Ok(())
    }

    fn write_hist1d(&self, name: &str, hist: &Hist1D) -> Result<(), HistogramWriterError> {
        let dataset = self
            .histograms_group
            .new_dataset_builder()
            .with_data(&hist.counts)
            .create(name)?;
        write_axis(&dataset, "x", &hist.axis)?;
        write_scalar(&dataset, "entries", hist.entries())?;
        write_scalar(&dataset, "underflow", hist.underflow)?;
        write_scalar(&dataset, "overflow", hist.overflow)?;
        Ok(())
    }

    fn write_hist2d(&self, name: &str, hist: &Hist2D) -> Result<(), HistogramWriterError> {
        let dataset = self
            .histograms_group
            .new_dataset_builder()
            .with_data(&hist.counts)
            .create(name)?;
        write_axis(&dataset, "x", &hist.x_axis)?;
        write_axis(&dataset, "y", &hist.y_axis)?;
        write_scalar(&dataset, "entries", hist.entries())?;
        Ok(())
    }

    fn write_profile(&self, name: &str, profile: &Profile) -> Result<(), HistogramWriterError> {
        let profile_group = self.histograms_group.create_group(name)?;
        write_axis(&profile_group, "x", &profile.axis)?;
        write_scalar(&profile_group, "entries", profile.entries())?;
        profile_group
            .new_dataset_builder()
            .with_data(&profile.means())
            .create("mean")?;
        profile_group
            .new_dataset_builder()
            .with_data(&profile.errors())
            .create("error")?;
        profile_group
            .new_dataset_builder()
            .with_data(profile.counts())
            .create("counts")?;
        Ok(())
    }

    /// Write the human readable summary in a separate yaml file
    pub fn write_summary(&self, summary: &AnalysisSummary) -> Result<(), HistogramWriterError> {
        let mut summary_file = std::fs::File::create(&self.summary_path)?;
        summary_file.write_all(serde_yaml::to_string(summary)?.as_bytes())?;
        Ok(())
    }

    /// Flush everything to disk, consuming the writer
    pub fn close(self) -> Result<(), HistogramWriterError> {
        self.file_handle.flush()?;
        spdlog::info!(
            "Histograms written to {} and summary to {}",
            self.file_handle.filename(),
            self.summary_path.to_string_lossy()
        );
        Ok(())
    }
}

fn write_scalar<T: hdf5::H5Type>(
    location: &Location,
    name: &str,
    value: T,
) -> Result<(), HistogramWriterError> {
    location.new_attr::<T>().create(name)?.write_scalar(&value)?;
    Ok(())
}

fn write_axis(location: &Location, prefix: &str, axis: &Axis) -> Result<(), HistogramWriterError> {
    write_scalar(location, &format!("{prefix}_bins"), axis.bins as u64)?;
    write_scalar(location, &format!("{prefix}_min"), axis.min)?;
    write_scalar(location, &format!("{prefix}_max"), axis.max)?;
    Ok(())
}
