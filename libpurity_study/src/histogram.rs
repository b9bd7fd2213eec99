use ndarray::{Array1, Array2};

use super::config::AxisConfig;

/// Common interface of the binned accumulators.
///
/// Every histogram in the analysis is filled through `accumulate`; insertion order never
/// matters, only the fixed binning.
pub trait Histogram {
    type Point;

    /// Add weight at the given point
    fn accumulate(&mut self, point: Self::Point, weight: f64);

    /// Add a unit weight at the given point
    fn fill(&mut self, point: Self::Point) {
        self.accumulate(point, 1.0);
    }

    /// Number of accumulate calls, including those outside the axis range
    fn entries(&self) -> u64;
}

/// Uniform binning over [min, max)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    pub bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Axis {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Self { bins, min, max }
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Center of bin `index` (0 based)
    pub fn bin_center(&self, index: usize) -> f64 {
        self.min + (index as f64 + 0.5) * self.bin_width()
    }

    /// Find the bin containing value. None for underflow, overflow and NaN.
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        if !(value >= self.min && value < self.max) {
            return None;
        }
        let index = ((value - self.min) * self.bins as f64 / (self.max - self.min)) as usize;
        Some(index.min(self.bins - 1))
    }

    pub fn bin_centers(&self) -> Array1<f64> {
        Array1::from_iter((0..self.bins).map(|i| self.bin_center(i)))
    }
}

impl From<&AxisConfig> for Axis {
    fn from(config: &AxisConfig) -> Self {
        Self::new(config.bins, config.min, config.max)
    }
}

/// One dimensional histogram with underflow and overflow
#[derive(Debug, Clone, PartialEq)]
pub struct Hist1D {
    pub axis: Axis,
    pub counts: Array1<f64>,
    pub underflow: f64,
    pub overflow: f64,
    entries: u64,
}

impl Hist1D {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            counts: Array1::zeros(axis.bins),
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
        }
    }

    /// Sum of the in-range bins
    pub fn integral(&self) -> f64 {
        self.counts.sum()
    }
}

impl Histogram for Hist1D {
    type Point = f64;

    fn accumulate(&mut self, x: f64, weight: f64) {
        self.entries += 1;
        match self.axis.find_bin(x) {
            Some(bin) => self.counts[bin] += weight,
            None if x < self.axis.min => self.underflow += weight,
            None => self.overflow += weight,
        }
    }

    fn entries(&self) -> u64 {
        self.entries
    }
}

/// Two dimensional histogram. Counts are indexed [x bin, y bin].
#[derive(Debug, Clone, PartialEq)]
pub struct Hist2D {
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub counts: Array2<f64>,
    /// Weight which fell outside of either axis
    pub outside: f64,
    entries: u64,
}

impl Hist2D {
    pub fn new(x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            x_axis,
            y_axis,
            counts: Array2::zeros([x_axis.bins, y_axis.bins]),
            outside: 0.0,
            entries: 0,
        }
    }

    pub fn integral(&self) -> f64 {
        self.counts.sum()
    }
}

impl Histogram for Hist2D {
    type Point = (f64, f64);

    fn accumulate(&mut self, (x, y): (f64, f64), weight: f64) {
        self.entries += 1;
        match (self.x_axis.find_bin(x), self.y_axis.find_bin(y)) {
            (Some(xb), Some(yb)) => self.counts[[xb, yb]] += weight,
            _ => self.outside += weight,
        }
    }

    fn entries(&self) -> u64 {
        self.entries
    }
}

/// A populated bin of a Profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileBin {
    pub center: f64,
    pub mean: f64,
    /// Error on the mean: spread / sqrt(sum of weights)
    pub error: f64,
    pub count: u64,
}

/// Mean of y in bins of x.
///
/// Keeps raw weighted sums so the means are exact rather than taken from the bin
/// centers of a two dimensional histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub axis: Axis,
    sum_w: Array1<f64>,
    sum_wy: Array1<f64>,
    sum_wy2: Array1<f64>,
    counts: Array1<u64>,
    entries: u64,
}

impl Profile {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            sum_w: Array1::zeros(axis.bins),
            sum_wy: Array1::zeros(axis.bins),
            sum_wy2: Array1::zeros(axis.bins),
            counts: Array1::zeros(axis.bins),
            entries: 0,
        }
    }

    /// Get the contents of bin `index`, or None if nothing landed there
    pub fn bin(&self, index: usize) -> Option<ProfileBin> {
        let sum_w = self.sum_w[index];
        if self.counts[index] == 0 || sum_w <= 0.0 {
            return None;
        }
        let mean = self.sum_wy[index] / sum_w;
        let variance = (self.sum_wy2[index] / sum_w - mean * mean).max(0.0);
        Some(ProfileBin {
            center: self.axis.bin_center(index),
            mean,
            error: variance.sqrt() / sum_w.sqrt(),
            count: self.counts[index],
        })
    }

    /// All populated bins in axis order
    pub fn populated_bins(&self) -> Vec<ProfileBin> {
        (0..self.axis.bins).filter_map(|i| self.bin(i)).collect()
    }

    /// Per-bin means, zero for empty bins
    pub fn means(&self) -> Array1<f64> {
        (0..self.axis.bins)
            .map(|i| self.bin(i).map_or(0.0, |b| b.mean))
            .collect()
    }

    /// Per-bin errors on the mean, zero for empty bins
    pub fn errors(&self) -> Array1<f64> {
        (0..self.axis.bins)
            .map(|i| self.bin(i).map_or(0.0, |b| b.error))
            .collect()
    }

    pub fn counts(&self) -> &Array1<u64> {
        &self.counts
    }
}

impl Histogram for Profile {
    type Point = (f64, f64);

    fn accumulate(&mut self, (x, y): (f64, f64), weight: f64) {
        self.entries += 1;
        if let Some(bin) = self.axis.find_bin(x) {
            self.sum_w[bin] += weight;
            self.sum_wy[bin] += weight * y;
            self.sum_wy2[bin] += weight * y * y;
            self.counts[bin] += 1;
        }
    }

    fn entries(&self) -> u64 {
        self.entries
    }
}
