use super::constants::{DRIFT_TIME_MAX, DRIFT_TIME_RANGE, TIME_TICKS_PER_UNIT};
use super::error::TrackFileError;

/// A single detector reading along a track
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hit {
    pub x: f64,
    pub y: f64,
    /// Drift time in detector ticks (tenths of us)
    pub t: f64,
    /// Raw charge amplitude
    pub c: f64,
}

impl Hit {
    pub fn new(x: f64, y: f64, t: f64, c: f64) -> Self {
        Self { x, y, t, c }
    }
}

/// Endpoint of a track in (x, y, t)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Endpoint {
    pub x: f64,
    pub y: f64,
    pub t: f64,
}

impl Endpoint {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }
}

/// A reconstructed track: its hits and the hits with earliest and latest drift time.
///
/// Tracks are input data. No stage of the analysis mutates them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub event_num: i32,
    pub track_num: i32,
    pub min_t: Endpoint,
    pub max_t: Endpoint,
    pub hits: Vec<Hit>,
}

impl Track {
    pub fn new(
        event_num: i32,
        track_num: i32,
        min_t: Endpoint,
        max_t: Endpoint,
        hits: Vec<Hit>,
    ) -> Self {
        Self {
            event_num,
            track_num,
            min_t,
            max_t,
            hits,
        }
    }

    /// Drift-time span of the track in detector ticks
    pub fn time_span(&self) -> f64 {
        self.max_t.t - self.min_t.t
    }

    /// The track filter. A track is kept only if it crosses the full drift region,
    /// anode to cathode, within the drift time tolerance.
    pub fn crosses_full_drift(&self) -> bool {
        let span = self.time_span();
        let lower = TIME_TICKS_PER_UNIT * (DRIFT_TIME_MAX - DRIFT_TIME_RANGE);
        let upper = TIME_TICKS_PER_UNIT * (DRIFT_TIME_MAX + DRIFT_TIME_RANGE);
        (lower..=upper).contains(&span)
    }
}

/// Anything that can hand out tracks by index.
///
/// Each pass of the analysis walks the source once from 0 to `number_of_tracks()`.
pub trait TrackSource {
    fn number_of_tracks(&self) -> usize;
    fn read_track(&self, index: usize) -> Result<Track, TrackFileError>;
}

impl TrackSource for [Track] {
    fn number_of_tracks(&self) -> usize {
        self.len()
    }

    fn read_track(&self, index: usize) -> Result<Track, TrackFileError> {
        self.get(index)
            .cloned()
            .ok_or(TrackFileError::TrackOutOfRange(index))
    }
}

impl TrackSource for Vec<Track> {
    fn number_of_tracks(&self) -> usize {
        self.as_slice().number_of_tracks()
    }

    fn read_track(&self, index: usize) -> Result<Track, TrackFileError> {
        self.as_slice().read_track(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_with_span(span: f64) -> Track {
        Track::new(
            0,
            0,
            Endpoint::new(0.0, 0.0, 200.0),
            Endpoint::new(0.0, 0.0, 200.0 + span),
            vec![],
        )
    }

    #[test]
    fn test_filter_window() {
        assert!(track_with_span(1800.0).crosses_full_drift());
        assert!(track_with_span(1860.0).crosses_full_drift());
        assert!(track_with_span(1920.0).crosses_full_drift());
        assert!(!track_with_span(1799.9).crosses_full_drift());
        assert!(!track_with_span(1920.1).crosses_full_drift());
        assert!(!track_with_span(0.0).crosses_full_drift());
        assert!(!track_with_span(-1860.0).crosses_full_drift());
    }

    #[test]
    fn test_slice_source() {
        let tracks = vec![track_with_span(1.0), track_with_span(2.0)];
        assert_eq!(tracks.number_of_tracks(), 2);
        assert_eq!(tracks.read_track(1).unwrap().time_span(), 2.0);
        assert!(matches!(
            tracks.read_track(2),
            Err(TrackFileError::TrackOutOfRange(2))
        ));
    }
}
