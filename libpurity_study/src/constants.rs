// Analysis constants. These are fixed at build time; the analysis choices that are
// allowed to vary live in Config.

/// Number of drift-time slices a track is divided into
pub const NUM_BINS: usize = 15;
/// Drift velocity in position units per drift-time unit
pub const DRIFT_VEL: f64 = 0.155;
/// Full drift time (anode to cathode) in microseconds
pub const DRIFT_TIME_MAX: f64 = 186.0;
/// Tolerance on the full drift time in microseconds
pub const DRIFT_TIME_RANGE: f64 = 6.0;
/// Raw charge to electrons
pub const GAIN: f64 = 250.0 * 3.9;
/// Electrons to deposited energy (MeV)
pub const ENG_CONV: f64 = 0.0000236 / 0.66;
/// Baseline subtracted from every raw charge reading
pub const PEDESTAL: f64 = 78.0;

/// Track times are recorded in tenths of the histogram time unit (us)
pub const TIME_TICKS_PER_UNIT: f64 = 10.0;
/// Histogram charge-per-length unit is ke-/cm
pub const CHARGE_SCALE: f64 = 1000.0;
/// Lifetimes are reported in ms while drift times are in us
pub const LIFETIME_SCALE: f64 = 1000.0;

// Input layout
pub const TRACKS_NAME: &str = "tracks";
pub const HIT_X_NAME: &str = "hit_x";
pub const HIT_Y_NAME: &str = "hit_y";
pub const HIT_T_NAME: &str = "hit_t";
pub const HIT_C_NAME: &str = "hit_c";

// Output layout
pub const LIFETIME_NAME: &str = "lifetime";
pub const HISTOGRAMS_NAME: &str = "histograms";
pub const LIFETIME_2D_NAME: &str = "lifetime_2d";
pub const LIFETIME_PROFILE_NAME: &str = "lifetime_profile";
pub const DEDX_NAME: &str = "dedx";
pub const DEDX_2D_NAME: &str = "dedx_2d";

/// This is the version of the output format
pub const FORMAT_VERSION: &str = "1.0";
