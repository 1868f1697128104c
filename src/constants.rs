//! Model constants

/// Escape velocity of the disk, km/s
pub const ESCAPE_VELOCITY_DISK: f64 = 550.0;
/// Escape velocity of the bar, bulge and nuclear disk, km/s
pub const ESCAPE_VELOCITY_BULGE: f64 = 600.0;
/// Largest circular velocity assumed when seeding the peak finder, km/s
pub const VC_MAX: f64 = 240.0;
/// Coefficient of the height-dependent rotation correction,
/// 1 + a (|z| / kpc)^b, from Sharma et al. 2014, eq. (22)
pub const THICKENING_COEFF: f64 = 0.0374;
/// Exponent of the height-dependent rotation correction
pub const THICKENING_POWER: f64 = 1.34;
/// Default seed of the physical sampling stream
pub const DEFAULT_SEED: u64 = 12304357;
/// Default seed of the solver-jitter stream
pub const DEFAULT_JITTER_SEED: u64 = 1;
/// Default cap on escape-velocity rejection retries
pub const DEFAULT_MAX_REJECTIONS: usize = 100_000;
