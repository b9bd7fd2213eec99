use super::constants::{DRIFT_TIME_MAX, DRIFT_VEL, NUM_BINS, PEDESTAL, TIME_TICKS_PER_UNIT};
use super::error::TrackError;
use super::histogram::Axis;
use super::track::Track;

/// Pedestal-subtracted charge summed per drift-time slice of one track
pub type ChargeProfile = [f64; NUM_BINS];

/// The drift-time axis shared by every histogram binned in drift time (us)
pub fn drift_time_axis() -> Axis {
    Axis::new(NUM_BINS, 0.0, DRIFT_TIME_MAX)
}

/// Map a hit time onto a drift-time slice, measured from the start of the track.
///
/// Hits before the track start or past the full drift time are clamped into the first
/// or last slice.
pub fn slice_index(hit_t: f64, track_min_t: f64) -> usize {
    let index = ((NUM_BINS as f64 / DRIFT_TIME_MAX / TIME_TICKS_PER_UNIT) * (hit_t - track_min_t)
        - 0.5)
        .round();
    if index <= 0.0 {
        0
    } else if index >= (NUM_BINS - 1) as f64 {
        NUM_BINS - 1
    } else {
        index as usize
    }
}

/// Sum the pedestal-subtracted charge of every hit into its drift-time slice
pub fn bin_charge(track: &Track) -> ChargeProfile {
    let mut charge: ChargeProfile = [0.0; NUM_BINS];
    for hit in track.hits.iter() {
        charge[slice_index(hit.t, track.min_t.t)] += hit.c - PEDESTAL;
    }
    charge
}

/// The 3-D path length covered by one drift-time bin, treating the track as a straight
/// line crossed at constant speed.
///
/// `bin_width` is the spacing of the drift-time bin centers in us.
pub fn pitch(track: &Track, bin_width: f64) -> Result<f64, TrackError> {
    let dt = track.time_span();
    if dt == 0.0 {
        return Err(TrackError::ZeroTimeSpan(track.event_num, track.track_num));
    }
    let dx = track.max_t.x - track.min_t.x;
    let dy = track.max_t.y - track.min_t.y;
    let length = (dx.powi(2) + dy.powi(2) + (DRIFT_VEL * dt).powi(2)).sqrt();
    Ok((TIME_TICKS_PER_UNIT * bin_width / dt) * length / TIME_TICKS_PER_UNIT)
}

/// Everything either pass needs from an accepted track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSlices {
    pub charge: ChargeProfile,
    pub pitch: f64,
}

impl TrackSlices {
    pub fn new(track: &Track, time_axis: &Axis) -> Result<Self, TrackError> {
        Ok(Self {
            charge: bin_charge(track),
            pitch: pitch(track, time_axis.bin_width())?,
        })
    }
}
