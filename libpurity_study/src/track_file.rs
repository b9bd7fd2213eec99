use hdf5::{File, Group};
use std::path::{Path, PathBuf};

use super::constants::{HIT_C_NAME, HIT_T_NAME, HIT_X_NAME, HIT_Y_NAME, TRACKS_NAME};
use super::error::TrackFileError;
use super::track::{Endpoint, Hit, Track, TrackSource};

// Structure
// tracks - min_track, max_track
// |---- track_# - event_num, track_num, min_t_x, min_t_y, min_t_t, max_t_x, max_t_y, max_t_t
// |    |---- hit_x(dset)
// |    |---- hit_y(dset)
// |    |---- hit_t(dset)
// |    |---- hit_c(dset)

/// A simple struct which wraps around the hdf5-rust library.
///
/// Opens an HDF5 file of reconstructed tracks for reading. Tracks are read lazily, one
/// at a time, so the file can be walked once per pass without holding it in memory.
#[derive(Debug)]
pub struct TrackFile {
    #[allow(dead_code)]
    file_handle: File,
    path: PathBuf,
    tracks_group: Group,
    min_track: u64,
    max_track: u64,
}

impl TrackFile {
    /// Open the file at path and read the track range
    pub fn new(path: &Path) -> Result<Self, TrackFileError> {
        if !path.exists() {
            return Err(TrackFileError::BadFilePath(path.to_path_buf()));
        }
        let file_handle = File::open(path)?;
        let tracks_group = file_handle
            .group(TRACKS_NAME)
            .map_err(|_| TrackFileError::MissingField(String::from(TRACKS_NAME)))?;
        let min_track = read_attr::<u64>(&tracks_group, "min_track")?;
        let max_track = read_attr::<u64>(&tracks_group, "max_track")?;

        Ok(Self {
            file_handle,
            path: path.to_path_buf(),
            tracks_group,
            min_track,
            max_track,
        })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Size of the file on disk, for reporting
    pub fn get_size_bytes(&self) -> u64 {
        self.path.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl TrackSource for TrackFile {
    fn number_of_tracks(&self) -> usize {
        if self.max_track < self.min_track {
            0
        } else {
            (self.max_track - self.min_track + 1) as usize
        }
    }

    fn read_track(&self, index: usize) -> Result<Track, TrackFileError> {
        if index >= self.number_of_tracks() {
            return Err(TrackFileError::TrackOutOfRange(index));
        }
        let track_name = format!("track_{}", self.min_track + index as u64);
        let track_group = self
            .tracks_group
            .group(&track_name)
            .map_err(|_| TrackFileError::MissingField(track_name.clone()))?;

        let min_t = Endpoint::new(
            read_attr(&track_group, "min_t_x")?,
            read_attr(&track_group, "min_t_y")?,
            read_attr(&track_group, "min_t_t")?,
        );
        let max_t = Endpoint::new(
            read_attr(&track_group, "max_t_x")?,
            read_attr(&track_group, "max_t_y")?,
            read_attr(&track_group, "max_t_t")?,
        );

        let hit_x = read_dataset(&track_group, HIT_X_NAME)?;
        let hit_y = read_dataset(&track_group, HIT_Y_NAME)?;
        let hit_t = read_dataset(&track_group, HIT_T_NAME)?;
        let hit_c = read_dataset(&track_group, HIT_C_NAME)?;
        let n_hits = hit_t.len();
        if hit_x.len() != n_hits || hit_y.len() != n_hits || hit_c.len() != n_hits {
            return Err(TrackFileError::MismatchedHitArrays(
                track_name,
                hit_x.len(),
                hit_y.len(),
                n_hits,
                hit_c.len(),
            ));
        }
        let hits = (0..n_hits)
            .map(|k| Hit::new(hit_x[k], hit_y[k], hit_t[k], hit_c[k]))
            .collect();

        Ok(Track::new(
            read_attr(&track_group, "event_num")?,
            read_attr(&track_group, "track_num")?,
            min_t,
            max_t,
            hits,
        ))
    }
}

/// Read a scalar attribute, reporting its name if absent
fn read_attr<T: hdf5::H5Type>(group: &Group, name: &str) -> Result<T, TrackFileError> {
    let attr = group
        .attr(name)
        .map_err(|_| TrackFileError::MissingField(format!("{}/{}", group.name(), name)))?;
    Ok(attr.read_scalar::<T>()?)
}

/// Read a 1-D f64 dataset, reporting its name if absent
fn read_dataset(group: &Group, name: &str) -> Result<Vec<f64>, TrackFileError> {
    let dataset = group
        .dataset(name)
        .map_err(|_| TrackFileError::MissingField(format!("{}/{}", group.name(), name)))?;
    Ok(dataset.read_raw::<f64>()?)
}
