/* # physics */

pub const GRAVITY: f64 = 9.81; // m/s²
pub const YOUNG_MODULUS: f64 = 5.0e10; // Pa, average upper crust
pub const POISSON_RATIO: f64 = 0.25;
pub const MANTLE_DENSITY: f64 = 3300.0; // kg/m³, restoring density under a flexed plate

/* # densities */

pub const ICE_DENSITY: f64 = 900.0;
pub const SEAWATER_DENSITY: f64 = 1025.0;
pub const FRESHWATER_DENSITY: f64 = 1000.0;
pub const LAVA_DENSITY: f64 = 2700.0;

/* # geometry */

// equirectangular approximation, only sound up to a few hundred kilometres
pub const KM_PER_DEGREE: f64 = 111.0;
pub const MIN_DISTANCE_KM: f64 = 1.0e-3; // keeps kernels away from r = 0
pub const DIFF_STEP_KM: f64 = 1.0e-3; // radial step for kernel gradients
pub const MIN_PLATE_THICKNESS_KM: f64 = 1.0; // thinner plates fall back to the half-space
pub const MAX_ABS_LATITUDE: f64 = 89.0;

/* # limits */

pub const MAX_CELLS: usize = 10_000_000; // grid nodes × time steps

/* # reservoirs */

pub const ANNUAL_PERIOD_YEARS: f64 = 1.0;
pub const SEASONAL_PERIOD_YEARS: f64 = 0.25;
pub const CYCLE_AMPLITUDE: f64 = 0.5; // fraction of the level change

/* # analysis */

pub const DISPLACEMENT_THRESHOLD_M: f64 = 0.01;
pub const STRAIN_THRESHOLD_MICRO: f64 = 1.0;

/* # hazard */

// heuristic policy, each score saturates at HAZARD_SCORE_CAP
pub const HAZARD_SCORE_CAP: f64 = 5.0;
pub const PRESSURE_SCALE_M: f64 = 1.0; // displacement giving ~76% of the cap
pub const STABILITY_SCALE_MICRO: f64 = 100.0;
pub const DILATION_SCALE_MICRO: f64 = 100.0;
pub const PRESSURE_WEIGHT: f64 = 1.0;
pub const STABILITY_WEIGHT: f64 = 1.0;
pub const DILATION_WEIGHT: f64 = 1.0;
pub const RISK_INDEX_MAX: f64 = 15.0;
pub const RISK_MEDIUM: f64 = 5.0;
pub const RISK_HIGH: f64 = 10.0;
