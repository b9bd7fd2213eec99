//! # purity_study
//!
//! purity_study measures the free-electron lifetime of a liquid argon TPC from a set of
//! reconstructed tracks, and uses it to build a lifetime corrected dE/dx distribution.
//!
//! Electrons drifting through the argon are captured by impurities, so the charge seen
//! at the anode falls off exponentially with drift time. Tracks which cross the full
//! drift region (anode to cathode) sample every drift time, which makes them a good
//! measure of that attenuation.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for installation instructions.
//!
//! ### HDF5
//!
//! Both the input tracks and the output histograms are HDF5 files, so HDF5 must be
//! installed. Typically this will be installed using a package manager (homebrew, apt,
//! etc), and the Rust libraries will auto detect the location of the HDF install. If it
//! lives somewhere custom, write the following into `.cargo/config.toml`:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./purity_study_cli` from the
//! top level repository.
//!
//! ## The analysis
//!
//! The analysis makes two passes over the same tracks.
//!
//! 1. Every track whose drift-time span is within 6 us of the full 186 us drift time is
//!    split into 15 drift-time slices. The pedestal subtracted charge of each slice is
//!    converted to charge per unit length using the track pitch (the 3-D length of one
//!    slice). The interior slices are histogrammed against drift time, and the mean
//!    charge per length is fit with `exp(p0 + p1 t)`. The lifetime is `|1/p1|`.
//! 2. The same tracks are sliced again, each slice is corrected by
//!    `exp(t / lifetime)` and converted to dE/dx, and the results are histogrammed.
//!
//! The number of slices dropped at each end of a track (1 by default) is configurable;
//! everything else is a physical constant (see [`constants`]).
//!
//! ## Input
//!
//! ```text
//! tracks.h5
//! tracks - min_track, max_track
//! |---- track_# - event_num, track_num, min_t_x, min_t_y, min_t_t, max_t_x, max_t_y, max_t_t
//! |    |---- hit_x(dset)
//! |    |---- hit_y(dset)
//! |    |---- hit_t(dset)
//! |    |---- hit_c(dset)
//! ```
//!
//! Hit times are in detector ticks (tenths of us), charges are raw amplitudes.
//!
//! ## Output
//!
//! ```text
//! results.h5
//! lifetime - value, uncertainty, chi_square, ndf, accepted_tracks, version
//! histograms
//! |---- lifetime_2d(dset) - x_bins, x_min, x_max, y_bins, y_min, y_max, entries
//! |---- lifetime_profile - x_bins, x_min, x_max, entries
//! |    |---- mean(dset)
//! |    |---- error(dset)
//! |    |---- counts(dset)
//! |---- dedx(dset) - x_bins, x_min, x_max, entries, underflow, overflow
//! |---- dedx_2d(dset) - x_bins, x_min, x_max, y_bins, y_min, y_max, entries
//! ```
//!
//! A `results.yml` summary with the lifetime and track counts is written alongside.
pub mod charge;
pub mod config;
pub mod constants;
pub mod correction;
pub mod error;
pub mod fit;
pub mod hdf_writer;
pub mod histogram;
pub mod lifetime;
pub mod process;
pub mod track;
pub mod track_file;
pub mod worker_status;
