use super::charge::{drift_time_axis, TrackSlices};
use super::config::Config;
use super::constants::{CHARGE_SCALE, GAIN, LIFETIME_SCALE};
use super::error::{FitError, TrackError};
use super::fit::{fit_exponential, ExponentialFit, FitPoint};
use super::histogram::{Axis, Hist2D, Histogram, Profile};
use super::track::Track;

/// The electron lifetime and its uncertainty, in ms.
///
/// Created once from the first pass and handed by value to the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    pub value: f64,
    pub uncertainty: f64,
}

impl Lifetime {
    pub fn new(value: f64, uncertainty: f64) -> Self {
        Self { value, uncertainty }
    }

    /// Convert the decay rate of an exponential fit in drift time (1/us)
    pub fn from_fit(fit: &ExponentialFit) -> Result<Self, FitError> {
        if fit.slope == 0.0 || !fit.slope.is_finite() {
            return Err(FitError::ZeroDecayRate);
        }
        let value = (1.0 / fit.slope).abs() / LIFETIME_SCALE;
        let uncertainty = (fit.slope_error / fit.slope).abs() * value;
        Ok(Self { value, uncertainty })
    }

    /// Charge attenuation correction at a drift time in us
    pub fn correction(&self, drift_time: f64) -> f64 {
        (drift_time / (LIFETIME_SCALE * self.value)).exp()
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} +- {} ms", self.value, self.uncertainty)
    }
}

/// The first pass histograms: charge per length against drift time, and its profile
#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeHistograms {
    pub charge_density: Hist2D,
    pub profile: Profile,
}

/// The first pass of the analysis.
///
/// Accumulates the charge per unit length of the interior drift-time bins of every
/// accepted track, then fits the mean against drift time with an exponential.
#[derive(Debug, Clone)]
pub struct LifetimeEstimator {
    time_axis: Axis,
    interior: std::ops::Range<usize>,
    histograms: LifetimeHistograms,
    accepted_tracks: u64,
}

impl LifetimeEstimator {
    pub fn new(config: &Config) -> Self {
        let time_axis = drift_time_axis();
        Self {
            time_axis,
            interior: config.interior_bins(),
            histograms: LifetimeHistograms {
                charge_density: Hist2D::new(
                    time_axis,
                    Axis::from(&config.charge_density_axis),
                ),
                profile: Profile::new(time_axis),
            },
            accepted_tracks: 0,
        }
    }

    /// Add a track. Returns false, touching nothing, if the track filter rejects it.
    pub fn fill_track(&mut self, track: &Track) -> Result<bool, TrackError> {
        if !track.crosses_full_drift() {
            return Ok(false);
        }
        let slices = TrackSlices::new(track, &self.time_axis)?;
        for i in self.interior.clone() {
            let drift_time = self.time_axis.bin_center(i);
            let density = GAIN * slices.charge[i] / slices.pitch / CHARGE_SCALE;
            self.histograms.charge_density.fill((drift_time, density));
            self.histograms.profile.fill((drift_time, density));
        }
        self.accepted_tracks += 1;
        Ok(true)
    }

    pub fn accepted_tracks(&self) -> u64 {
        self.accepted_tracks
    }

    pub fn histograms(&self) -> &LifetimeHistograms {
        &self.histograms
    }

    /// Fit the profile and extract the lifetime, consuming the estimator
    pub fn finish(self) -> Result<LifetimeResult, FitError> {
        let points: Vec<FitPoint> = self
            .histograms
            .profile
            .populated_bins()
            .into_iter()
            .map(|bin| FitPoint::new(bin.center, bin.mean, Some(bin.error)))
            .collect();
        let fit = fit_exponential(&points)?;
        let lifetime = Lifetime::from_fit(&fit)?;
        Ok(LifetimeResult {
            lifetime,
            fit,
            histograms: self.histograms,
            accepted_tracks: self.accepted_tracks,
        })
    }
}

/// Everything the first pass produces
#[derive(Debug, Clone, PartialEq)]
pub struct LifetimeResult {
    pub lifetime: Lifetime,
    pub fit: ExponentialFit,
    pub histograms: LifetimeHistograms,
    pub accepted_tracks: u64,
}
