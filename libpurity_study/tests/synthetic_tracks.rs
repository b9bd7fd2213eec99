use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc;

use libpurity_study::charge::{drift_time_axis, TrackSlices};
use libpurity_study::config::Config;
use libpurity_study::constants::{DRIFT_VEL, NUM_BINS, PEDESTAL};
use libpurity_study::correction::DedxAggregator;
use libpurity_study::histogram::Histogram;
use libpurity_study::lifetime::Lifetime;
use libpurity_study::process::analyze;
use libpurity_study::track::{Endpoint, Hit, Track};

const TAU_US: f64 = 3000.0;
const Q0: f64 = 1.5;
const N_ACCEPTED: usize = 1000;
const N_REJECTED: usize = 50;

/// A vertical track starting at min_t with one hit per tick, charge attenuated by TAU_US
/// and smeared by up to `noise` (relative)
fn make_track(rng: &mut StdRng, id: i32, span: f64, noise: f64) -> Track {
    let min_t = rng.gen_range(100.0..400.0);
    let hits = (0..span as usize)
        .map(|k| {
            let dt = k as f64 + 0.5;
            let smear = 1.0 + noise * rng.gen_range(-1.0..1.0);
            Hit::new(
                5.0,
                -5.0,
                min_t + dt,
                PEDESTAL + Q0 * (-dt / 10.0 / TAU_US).exp() * smear,
            )
        })
        .collect();
    Track::new(
        id,
        0,
        Endpoint::new(5.0, -5.0, min_t),
        Endpoint::new(5.0, -5.0, min_t + span),
        hits,
    )
}

fn make_dataset(seed: u64) -> Vec<Track> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tracks = Vec::with_capacity(N_ACCEPTED + N_REJECTED);
    for id in 0..(N_ACCEPTED + N_REJECTED) {
        let span = if id % 21 == 20 && id / 21 < N_REJECTED {
            rng.gen_range(900.0..1700.0)
        } else {
            rng.gen_range(1800.0..=1860.0)
        };
        tracks.push(make_track(&mut rng, id as i32, span, 0.05));
    }
    tracks
}

/// Every synthetic track is vertical, so its pitch is the shortest one possible: the drift
/// length of one slice, 12.4 us * DRIFT_VEL (about 1.92). A pitch of 1.0 cannot be built,
/// as any transverse offset only lengthens the slice. The pitch divides out of the fitted
/// slope, so the recovered lifetime does not depend on it.
#[test]
fn test_recovers_injected_lifetime() {
    for seed in [7, 1234] {
        let tracks = make_dataset(seed);
        let time_axis = drift_time_axis();
        let slices = TrackSlices::new(&tracks[0], &time_axis).unwrap();
        assert!((slices.pitch - time_axis.bin_width() * DRIFT_VEL).abs() < 1.0e-12);

        let (tx, _rx) = mpsc::channel();
        let analysis = analyze(&tracks, &Config::default(), &tx).unwrap();

        let lifetime = analysis.lifetime.lifetime;
        let expected = TAU_US / 1000.0;
        assert_eq!(analysis.lifetime.accepted_tracks, N_ACCEPTED as u64);
        assert!(lifetime.uncertainty > 0.0 && lifetime.uncertainty < 0.05);
        assert!(
            (lifetime.value - expected).abs() < 5.0 * lifetime.uncertainty,
            "lifetime {} is not compatible with {} ms",
            lifetime,
            expected
        );

        // Edge bins never reach the aggregate distribution
        assert_eq!(
            analysis.dedx.dedx.entries(),
            (NUM_BINS as u64 - 2) * analysis.correction_pass_tracks
        );
        assert_eq!(
            analysis.dedx.dedx_vs_drift_time.entries(),
            NUM_BINS as u64 * analysis.correction_pass_tracks
        );
    }
}

#[test]
fn test_correction_flattens_charge() {
    let mut rng = StdRng::seed_from_u64(99);
    let track = make_track(&mut rng, 0, 1830.0, 0.0);
    let slices = TrackSlices::new(&track, &drift_time_axis()).unwrap();
    let lifetime = Lifetime::new(TAU_US / 1000.0, 0.0);
    let aggregator = DedxAggregator::new(&Config::default(), lifetime);
    let dedx = aggregator.corrected_dedx(&slices);
    let reference = dedx[1];
    for value in &dedx[1..(NUM_BINS - 1)] {
        assert!(((value - reference) / reference).abs() < 1.0e-9);
    }
}
