use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use super::config::Config;
use super::correction::{DedxAggregator, DedxHistograms};
use super::error::ProcessorError;
use super::fit::ExponentialFit;
use super::hdf_writer::HistogramWriter;
use super::lifetime::{Lifetime, LifetimeEstimator, LifetimeResult};
use super::track::TrackSource;
use super::track_file::TrackFile;
use super::worker_status::{Pass, WorkerStatus};

/// Fraction of a pass between progress messages
const FLUSH_FRAC: f32 = 0.01;

/// Reduced chi2 of a believable lifetime fit
const REDUCED_CHI2_RANGE: std::ops::RangeInclusive<f64> = 0.1..=10.0;

/// The human readable report of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub input_path: PathBuf,
    pub total_tracks: u64,
    pub lifetime_pass_tracks: u64,
    pub correction_pass_tracks: u64,
    pub lifetime_ms: f64,
    pub lifetime_uncertainty_ms: f64,
    pub fit_chi_square: f64,
    pub fit_ndf: usize,
}

/// Everything both passes produce
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub total_tracks: u64,
    pub lifetime: LifetimeResult,
    pub dedx: DedxHistograms,
    pub correction_pass_tracks: u64,
}

impl Analysis {
    pub fn summary(&self, config: &Config) -> AnalysisSummary {
        AnalysisSummary {
            input_path: config.input_path.clone(),
            total_tracks: self.total_tracks,
            lifetime_pass_tracks: self.lifetime.accepted_tracks,
            correction_pass_tracks: self.correction_pass_tracks,
            lifetime_ms: self.lifetime.lifetime.value,
            lifetime_uncertainty_ms: self.lifetime.lifetime.uncertainty,
            fit_chi_square: self.lifetime.fit.chi_square,
            fit_ndf: self.lifetime.fit.ndf,
        }
    }
}

/// Reports pass progress every FLUSH_FRAC of the tracks
struct ProgressReporter<'a> {
    tx: &'a Sender<WorkerStatus>,
    pass: Pass,
    flush_val: usize,
    total: usize,
}

impl<'a> ProgressReporter<'a> {
    fn new(tx: &'a Sender<WorkerStatus>, pass: Pass, total: usize) -> Self {
        Self {
            tx,
            pass,
            flush_val: ((total as f32 * FLUSH_FRAC) as usize).max(1),
            total,
        }
    }

    fn update(&self, done: usize) -> Result<(), ProcessorError> {
        if done % self.flush_val == 0 {
            self.tx
                .send(WorkerStatus::new(done as f32 / self.total as f32, self.pass))?;
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), ProcessorError> {
        self.tx.send(WorkerStatus::new(1.0, self.pass))?;
        Ok(())
    }
}

/// The first pass: extract the electron lifetime from every accepted track
pub fn run_lifetime_pass<S: TrackSource + ?Sized>(
    source: &S,
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<LifetimeResult, ProcessorError> {
    let n_tracks = source.number_of_tracks();
    let progress = ProgressReporter::new(tx, Pass::Lifetime, n_tracks);
    let mut estimator = LifetimeEstimator::new(config);
    tx.send(WorkerStatus::new(0.0, Pass::Lifetime))?;
    for index in 0..n_tracks {
        let track = source.read_track(index)?;
        estimator.fill_track(&track)?;
        progress.update(index + 1)?;
    }
    progress.finish()?;
    if estimator.accepted_tracks() == 0 {
        spdlog::warn!("Lifetime pass accepted none of the {} tracks!", n_tracks);
    } else {
        spdlog::info!(
            "Lifetime pass accepted {} of {} tracks.",
            estimator.accepted_tracks(),
            n_tracks
        );
    }

    let result = estimator.finish()?;
    spdlog::info!("Electron Lifetime: {}", result.lifetime);
    spdlog::info!(
        "Fit chi2/ndf: {}/{} after {} iterations",
        result.fit.chi_square,
        result.fit.ndf,
        result.fit.iterations
    );
    if !is_good_fit(&result.fit) {
        spdlog::warn!(
            "Lifetime fit has chi2/ndf = {}, the lifetime and its error may not be trustworthy",
            result.fit.reduced_chi_square()
        );
    }
    Ok(result)
}

/// Whether the lifetime fit describes the drift-time profile
pub fn is_good_fit(fit: &ExponentialFit) -> bool {
    REDUCED_CHI2_RANGE.contains(&fit.reduced_chi_square())
}

/// The second pass: histogram the lifetime corrected dE/dx of every accepted track
pub fn run_correction_pass<S: TrackSource + ?Sized>(
    source: &S,
    config: &Config,
    lifetime: Lifetime,
    tx: &Sender<WorkerStatus>,
) -> Result<(DedxHistograms, u64), ProcessorError> {
    let n_tracks = source.number_of_tracks();
    let progress = ProgressReporter::new(tx, Pass::Correction, n_tracks);
    let mut aggregator = DedxAggregator::new(config, lifetime);
    tx.send(WorkerStatus::new(0.0, Pass::Correction))?;
    for index in 0..n_tracks {
        let track = source.read_track(index)?;
        aggregator.fill_track(&track)?;
        progress.update(index + 1)?;
    }
    progress.finish()?;
    let accepted = aggregator.accepted_tracks();
    if accepted == 0 {
        spdlog::warn!("Correction pass accepted none of the {} tracks!", n_tracks);
    } else {
        spdlog::info!("Correction pass accepted {} of {} tracks.", accepted, n_tracks);
    }
    Ok((aggregator.finish(), accepted))
}

/// Run both passes over a source. The second pass only starts once the lifetime exists.
pub fn analyze<S: TrackSource + ?Sized>(
    source: &S,
    config: &Config,
    tx: &Sender<WorkerStatus>,
) -> Result<Analysis, ProcessorError> {
    config.validate()?;
    let lifetime = run_lifetime_pass(source, config, tx)?;
    let (dedx, correction_pass_tracks) =
        run_correction_pass(source, config, lifetime.lifetime, tx)?;
    if correction_pass_tracks != lifetime.accepted_tracks {
        spdlog::warn!(
            "The passes disagree on the number of accepted tracks! Lifetime pass saw {}, correction pass saw {}",
            lifetime.accepted_tracks,
            correction_pass_tracks
        );
    }
    Ok(Analysis {
        total_tracks: source.number_of_tracks() as u64,
        lifetime,
        dedx,
        correction_pass_tracks,
    })
}

/// The main entry point of the analysis.
///
/// Opens the track file named in the config, runs both passes (which validate the config)
/// and writes the histograms and summary. Meant to be called from a separate thread,
/// reporting progress on tx.
pub fn process(
    config: Config,
    tx: Sender<WorkerStatus>,
) -> Result<AnalysisSummary, ProcessorError> {
    let track_file = TrackFile::new(&config.input_path)?;
    spdlog::info!(
        "Opened {} ({}) with {} tracks",
        track_file.get_path().to_string_lossy(),
        human_bytes::human_bytes(track_file.get_size_bytes() as f64),
        track_file.number_of_tracks()
    );

    let analysis = analyze(&track_file, &config, &tx)?;
    let summary = analysis.summary(&config);

    let writer = HistogramWriter::new(&config.output_path, &config.get_summary_path())?;
    writer.write_lifetime(&analysis.lifetime)?;
    writer.write_dedx(&analysis.dedx)?;
    writer.write_summary(&summary)?;
    writer.close()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NUM_BINS, PEDESTAL};
    use crate::error::FitError;
    use crate::histogram::Histogram;
    use crate::track::{Endpoint, Hit, Track};
    use std::sync::mpsc;

    fn track(span: f64, tau: f64) -> Track {
        let hits = (0..(NUM_BINS * 4))
            .map(|k| {
                let dt = (k as f64 + 0.5) * 31.0;
                Hit::new(0.0, 0.0, 300.0 + dt, PEDESTAL + 40.0 * (-dt / 10.0 / tau).exp())
            })
            .collect();
        Track::new(
            0,
            0,
            Endpoint::new(0.0, 0.0, 300.0),
            Endpoint::new(0.0, 0.0, 300.0 + span),
            hits,
        )
    }

    #[test]
    fn test_analyze_both_passes() {
        let tracks: Vec<Track> = vec![
            track(1810.0, 2000.0),
            track(1500.0, 2000.0),
            track(1850.0, 2000.0),
            track(1900.0, 2000.0),
        ];
        let (tx, rx) = mpsc::channel();
        let analysis = analyze(&tracks, &Config::default(), &tx).unwrap();
        assert_eq!(analysis.total_tracks, 4);
        assert_eq!(analysis.lifetime.accepted_tracks, 3);
        assert_eq!(analysis.correction_pass_tracks, 3);
        assert!((analysis.lifetime.lifetime.value - 2.0).abs() < 1e-6);
        assert_eq!(analysis.dedx.dedx.entries(), 3 * (NUM_BINS as u64 - 2));

        let statuses: Vec<WorkerStatus> = rx.try_iter().collect();
        assert_eq!(statuses.first().map(|s| s.pass), Some(Pass::Lifetime));
        assert_eq!(statuses.last().map(|s| s.pass), Some(Pass::Correction));
        assert_eq!(statuses.last().map(|s| s.progress), Some(1.0));

        let summary = analysis.summary(&Config::default());
        assert_eq!(summary.lifetime_pass_tracks, 3);
        assert_eq!(summary.lifetime_ms, analysis.lifetime.lifetime.value);
    }

    #[test]
    fn test_fit_failure_stops_before_second_pass() {
        let tracks: Vec<Track> = vec![track(1000.0, 2000.0), track(2500.0, 2000.0)];
        let (tx, rx) = mpsc::channel();
        let result = analyze(&tracks, &Config::default(), &tx);
        assert!(matches!(
            result,
            Err(ProcessorError::FitError(FitError::TooFewPoints(0, _)))
        ));
        assert!(rx.try_iter().all(|s| s.pass == Pass::Lifetime));
    }

    #[test]
    fn test_fit_quality() {
        let fit = |chi_square: f64, ndf: usize| ExponentialFit {
            constant: 4.0,
            slope: -1.0 / 3000.0,
            constant_error: 0.01,
            slope_error: 1.0e-5,
            chi_square,
            ndf,
            iterations: 5,
        };
        assert!(is_good_fit(&fit(11.0, 11)));
        assert!(is_good_fit(&fit(2.0, 11)));
        assert!(!is_good_fit(&fit(500.0, 11)));
        assert!(!is_good_fit(&fit(1.0e-6, 11)));
        assert!(!is_good_fit(&fit(3.0, 0)));
    }

    #[test]
    fn test_empty_correction_pass() {
        let tracks: Vec<Track> = vec![track(1000.0, 2000.0), track(2500.0, 2000.0)];
        let (tx, rx) = mpsc::channel();
        let lifetime = Lifetime::new(2.0, 0.1);
        let (dedx, accepted) =
            run_correction_pass(&tracks, &Config::default(), lifetime, &tx).unwrap();
        assert_eq!(accepted, 0);
        assert_eq!(dedx.dedx.entries(), 0);
        assert_eq!(rx.try_iter().last().map(|s| s.progress), Some(1.0));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.edge_bins = 7;
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            analyze(&Vec::<Track>::new(), &config, &tx),
            Err(ProcessorError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_input_file() {
        let config = Config::with_input(std::path::Path::new("/not/a/real/tracks.h5"));
        let (tx, _rx) = mpsc::channel();
        assert!(matches!(
            process(config, tx),
            Err(ProcessorError::TrackFileError(_))
        ));
    }
}
