use super::charge::{drift_time_axis, TrackSlices};
use super::config::Config;
use super::constants::{ENG_CONV, GAIN, NUM_BINS};
use super::error::TrackError;
use super::histogram::{Axis, Hist1D, Hist2D, Histogram};
use super::lifetime::Lifetime;
use super::track::Track;

/// The second pass histograms
#[derive(Debug, Clone, PartialEq)]
pub struct DedxHistograms {
    /// Corrected dE/dx of the interior drift-time bins
    pub dedx: Hist1D,
    /// Corrected dE/dx against drift time, every bin
    pub dedx_vs_drift_time: Hist2D,
}

/// The second pass of the analysis.
///
/// Applies the lifetime correction to the charge in each drift-time bin of every
/// accepted track and histograms the resulting dE/dx.
#[derive(Debug, Clone)]
pub struct DedxAggregator {
    lifetime: Lifetime,
    time_axis: Axis,
    interior: std::ops::Range<usize>,
    histograms: DedxHistograms,
    accepted_tracks: u64,
}

impl DedxAggregator {
    pub fn new(config: &Config, lifetime: Lifetime) -> Self {
        let time_axis = drift_time_axis();
        let dedx_axis = Axis::from(&config.dedx_axis);
        Self {
            lifetime,
            time_axis,
            interior: config.interior_bins(),
            histograms: DedxHistograms {
                dedx: Hist1D::new(dedx_axis),
                dedx_vs_drift_time: Hist2D::new(time_axis, dedx_axis),
            },
            accepted_tracks: 0,
        }
    }

    /// Corrected dE/dx of every drift-time bin of a track
    pub fn corrected_dedx(&self, slices: &TrackSlices) -> [f64; NUM_BINS] {
        let mut dedx = [0.0; NUM_BINS];
        for (i, value) in dedx.iter_mut().enumerate() {
            let correction = self.lifetime.correction(self.time_axis.bin_center(i));
            *value = ENG_CONV * GAIN * correction * slices.charge[i] / slices.pitch;
        }
        dedx
    }

    /// Add a track. Returns false, touching nothing, if the track filter rejects it.
    pub fn fill_track(&mut self, track: &Track) -> Result<bool, TrackError> {
        if !track.crosses_full_drift() {
            return Ok(false);
        }
        let slices = TrackSlices::new(track, &self.time_axis)?;
        let dedx = self.corrected_dedx(&slices);
        for (i, value) in dedx.into_iter().enumerate() {
            self.histograms
                .dedx_vs_drift_time
                .fill((self.time_axis.bin_center(i), value));
            if self.interior.contains(&i) {
                self.histograms.dedx.fill(value);
            }
        }
        self.accepted_tracks += 1;
        Ok(true)
    }

    pub fn accepted_tracks(&self) -> u64 {
        self.accepted_tracks
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn histograms(&self) -> &DedxHistograms {
        &self.histograms
    }

    pub fn finish(self) -> DedxHistograms {
        self.histograms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DRIFT_VEL, PEDESTAL};
    use crate::track::{Endpoint, Hit};

    /// A vertical track with one hit of raw charge `c` at the center of each slice
    fn flat_track(span: f64, c: f64) -> Track {
        let hits = (0..NUM_BINS)
            .map(|i| Hit::new(0.0, 0.0, 100.0 + 124.0 * (i as f64 + 0.5), c))
            .collect();
        Track::new(
            3,
            1,
            Endpoint::new(0.0, 0.0, 100.0),
            Endpoint::new(0.0, 0.0, 100.0 + span),
            hits,
        )
    }

    #[test]
    fn test_correction_values() {
        let config = Config::default();
        let lifetime = Lifetime::new(2.0, 0.1);
        let aggregator = DedxAggregator::new(&config, lifetime);
        let track = flat_track(1860.0, PEDESTAL + 10.0);
        let slices = TrackSlices::new(&track, &drift_time_axis()).unwrap();
        let dedx = aggregator.corrected_dedx(&slices);
        let pitch = 12.4 * DRIFT_VEL;
        for (i, value) in dedx.iter().enumerate() {
            let drift_time = 12.4 * (i as f64 + 0.5);
            let expected = ENG_CONV * GAIN * (drift_time / 2000.0).exp() * 10.0 / pitch;
            assert!((value - expected).abs() < 1e-9);
        }
        assert!(dedx[NUM_BINS - 1] > dedx[0]);
    }

    #[test]
    fn test_edge_bins_excluded_from_aggregate() {
        let config = Config::default();
        let mut aggregator = DedxAggregator::new(&config, Lifetime::new(3.0, 0.1));
        let n_tracks = 25;
        for k in 0..n_tracks {
            let track = flat_track(1800.0 + 2.0 * k as f64, PEDESTAL + 20.0);
            assert!(aggregator.fill_track(&track).unwrap());
        }
        let short = flat_track(1500.0, PEDESTAL + 20.0);
        assert!(!aggregator.fill_track(&short).unwrap());
        let histograms = aggregator.histograms();
        assert_eq!(aggregator.accepted_tracks(), n_tracks);
        assert_eq!(histograms.dedx.entries(), (NUM_BINS as u64 - 2) * n_tracks);
        assert_eq!(
            histograms.dedx_vs_drift_time.entries(),
            NUM_BINS as u64 * n_tracks
        );
    }

    #[test]
    fn test_wider_edge_exclusion() {
        let mut config = Config::default();
        config.edge_bins = 3;
        let mut aggregator = DedxAggregator::new(&config, Lifetime::new(3.0, 0.1));
        aggregator
            .fill_track(&flat_track(1860.0, PEDESTAL + 20.0))
            .unwrap();
        assert_eq!(aggregator.histograms().dedx.entries(), NUM_BINS as u64 - 6);
    }

    #[test]
    fn test_rejected_tracks_leave_histograms_alone() {
        let config = Config::default();
        let mut aggregator = DedxAggregator::new(&config, Lifetime::new(3.0, 0.1));
        let before = aggregator.histograms().clone();
        for span in [2500.0, 0.0] {
            let track = flat_track(span, PEDESTAL + 20.0);
            assert!(!aggregator.fill_track(&track).unwrap());
        }
        assert_eq!(*aggregator.histograms(), before);
    }

    #[test]
    fn test_second_pass_is_deterministic() {
        let config = Config::default();
        let lifetime = Lifetime::new(2.7, 0.2);
        let tracks: Vec<Track> = (0..40)
            .map(|k| flat_track(1790.0 + 4.0 * k as f64, PEDESTAL + 5.0 + k as f64))
            .collect();
        let run = || {
            let mut aggregator = DedxAggregator::new(&config, lifetime);
            for track in tracks.iter() {
                aggregator.fill_track(track).unwrap();
            }
            aggregator.finish()
        };
        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert!(first.dedx.entries() > 0);
    }
}
