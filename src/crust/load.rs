use crate::{
    error::{finite, positive, DeformError, DeformResult},
    vars::*,
};
use log::trace;
use serde::{Deserialize, Serialize};
use splines::{Interpolation, Key, Spline};
use std::{f64::consts::TAU, fmt, str::FromStr};

/* # load types */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadType {
    GlacialUnloading,
    SeaLevelRise,
    LavaFlow,
    ReservoirChange,
}

impl LoadType {
    pub fn array() -> [LoadType; 4] {
        [
            LoadType::GlacialUnloading,
            LoadType::SeaLevelRise,
            LoadType::LavaFlow,
            LoadType::ReservoirChange,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            LoadType::GlacialUnloading => "glacial_unloading",
            LoadType::SeaLevelRise => "sea_level_rise",
            LoadType::LavaFlow => "lava_flow",
            LoadType::ReservoirChange => "reservoir_change",
        }
    }
}

impl fmt::Display for LoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadType {
    type Err = DeformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        LoadType::array()
            .into_iter()
            .find(|load_type| load_type.name() == value)
            .ok_or_else(|| DeformError::Unsupported {
                kind: "load_type",
                value: value.to_string(),
            })
    }
}

/// periodic oscillation layered on a reservoir level change
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cycle {
    OneTime,
    Annual,
    Seasonal,
}

impl Default for Cycle {
    fn default() -> Self {
        Cycle::OneTime
    }
}

impl Cycle {
    pub fn period_years(&self) -> Option<f64> {
        match self {
            Cycle::OneTime => None,
            Cycle::Annual => Some(ANNUAL_PERIOD_YEARS),
            Cycle::Seasonal => Some(SEASONAL_PERIOD_YEARS),
        }
    }

    /// oscillation in units of the full level change
    fn wave(&self, t_years: f64) -> f64 {
        match self.period_years() {
            Some(period) => CYCLE_AMPLITUDE * (TAU * t_years / period).sin(),
            None => 0.0,
        }
    }
}

/* # parameters */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoadParameters {
    pub load_type: LoadType,
    pub radius_km: f64,
    pub initial_height_m: f64,
    pub final_height_m: f64,
    pub density_kg_m3: f64,
    pub change_duration_years: f64,
    #[serde(default)]
    pub decay_time_years: Option<f64>,
    /// the change lowers the load instead of raising it
    #[serde(default)]
    pub is_removal: bool,
    #[serde(default)]
    pub cycle: Cycle,
}

impl LoadParameters {
    /// ice thinning from `initial_height_m` to `final_fraction` of it
    pub fn glacial_unloading(
        radius_km: f64,
        initial_height_m: f64,
        final_fraction: f64,
        change_duration_years: f64,
    ) -> DeformResult<Self> {
        if !(0.0..=1.0).contains(&final_fraction) {
            return Err(DeformError::invalid(
                "final_fraction",
                format!("must lie within [0, 1], got {}", final_fraction),
            ));
        }
        Self {
            load_type: LoadType::GlacialUnloading,
            radius_km,
            initial_height_m,
            final_height_m: initial_height_m * final_fraction,
            density_kg_m3: ICE_DENSITY,
            change_duration_years,
            decay_time_years: None,
            is_removal: false,
            cycle: Cycle::OneTime,
        }
        .validated()
    }

    /// seawater rising by `rise_m` over the disc
    pub fn sea_level_rise(
        radius_km: f64,
        rise_m: f64,
        change_duration_years: f64,
    ) -> DeformResult<Self> {
        Self {
            load_type: LoadType::SeaLevelRise,
            radius_km,
            initial_height_m: 0.0,
            final_height_m: rise_m,
            density_kg_m3: SEAWATER_DENSITY,
            change_duration_years,
            decay_time_years: None,
            is_removal: false,
            cycle: Cycle::OneTime,
        }
        .validated()
    }

    /// lava emplaced to `height_m` during `eruption_time_years`
    pub fn lava_flow(
        radius_km: f64,
        height_m: f64,
        density_kg_m3: f64,
        eruption_time_years: f64,
    ) -> DeformResult<Self> {
        Self {
            load_type: LoadType::LavaFlow,
            radius_km,
            initial_height_m: 0.0,
            final_height_m: height_m,
            density_kg_m3,
            change_duration_years: eruption_time_years,
            decay_time_years: None,
            is_removal: false,
            cycle: Cycle::OneTime,
        }
        .validated()
    }

    /// water level moving by `level_change_m`, negative for a drawdown
    pub fn reservoir_change(
        radius_km: f64,
        level_change_m: f64,
        change_duration_years: f64,
        cycle: Cycle,
    ) -> DeformResult<Self> {
        Self {
            load_type: LoadType::ReservoirChange,
            radius_km,
            initial_height_m: 0.0,
            final_height_m: level_change_m.abs(),
            density_kg_m3: FRESHWATER_DENSITY,
            change_duration_years,
            decay_time_years: None,
            is_removal: level_change_m < 0.0,
            cycle,
        }
        .validated()
    }

    pub fn with_decay_time(mut self, decay_time_years: f64) -> DeformResult<Self> {
        self.decay_time_years = Some(decay_time_years);
        self.validated()
    }

    /// remaining share of the initial load, meaningful for unloading
    pub fn final_fraction(&self) -> Option<f64> {
        if self.initial_height_m != 0.0 {
            Some(self.final_height_m / self.initial_height_m)
        } else {
            None
        }
    }

    pub fn validate(&self) -> DeformResult<()> {
        positive("radius_km", self.radius_km)?;
        positive("density_kg_m3", self.density_kg_m3)?;
        positive("change_duration_years", self.change_duration_years)?;
        finite("initial_height_m", self.initial_height_m)?;
        finite("final_height_m", self.final_height_m)?;
        if let Some(decay) = self.decay_time_years {
            positive("decay_time_years", decay)?;
        }
        if self.is_removal {
            // a drawdown is carried by the flag, the level change itself stays positive
            if self.load_type != LoadType::ReservoirChange {
                return Err(DeformError::invalid(
                    "is_removal",
                    format!("only a reservoir can be drawn down, not {}", self.load_type),
                ));
            }
            if self.final_height_m < self.initial_height_m {
                return Err(DeformError::invalid(
                    "is_removal",
                    "a drawdown takes a rising level change",
                ));
            }
        }
        Ok(())
    }

    fn validated(self) -> DeformResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

/* # load model */

fn melt_ease_curve() -> Spline<f64, f64> {
    // quadratic ease-out, fast thinning that slows towards the end
    Spline::from_vec(vec![
        Key::new(0.0, 0.0, Interpolation::Linear),
        Key::new(0.1, 0.19, Interpolation::Linear),
        Key::new(0.2, 0.36, Interpolation::Linear),
        Key::new(0.3, 0.51, Interpolation::Linear),
        Key::new(0.4, 0.64, Interpolation::Linear),
        Key::new(0.5, 0.75, Interpolation::Linear),
        Key::new(0.6, 0.84, Interpolation::Linear),
        Key::new(0.7, 0.91, Interpolation::Linear),
        Key::new(0.8, 0.96, Interpolation::Linear),
        Key::new(0.9, 0.99, Interpolation::Linear),
        Key::new(1.0, 1.0, Interpolation::Linear),
    ])
}

/// time evolution of a disc-shaped surface load
#[derive(Clone, Debug)]
pub struct LoadModel {
    params: LoadParameters,
    ease: Spline<f64, f64>,
}

impl LoadModel {
    pub fn new(params: LoadParameters) -> DeformResult<Self> {
        trace!("preparing {} load model", params.load_type);
        params.validate()?;
        Ok(Self {
            params,
            ease: melt_ease_curve(),
        })
    }

    pub fn parameters(&self) -> &LoadParameters {
        &self.params
    }

    /// share of the total change that has happened by `t_years`
    pub fn load_fraction(&self, t_years: f64) -> f64 {
        let progress = (t_years / self.params.change_duration_years).clamp(0.0, 1.0);
        match self.params.load_type {
            LoadType::GlacialUnloading => self
                .ease
                .clamped_sample(progress)
                .unwrap_or(progress)
                .clamp(0.0, 1.0),
            LoadType::SeaLevelRise | LoadType::LavaFlow | LoadType::ReservoirChange => progress,
        }
    }

    fn wave(&self, t_years: f64) -> f64 {
        match self.params.load_type {
            LoadType::ReservoirChange => self.params.cycle.wave(t_years),
            _ => 0.0,
        }
    }

    /// signed load height change relative to the start of the simulation
    pub fn load_change(&self, t_years: f64) -> f64 {
        let sign = if self.params.is_removal { -1.0 } else { 1.0 };
        sign * (self.params.final_height_m - self.params.initial_height_m)
            * (self.load_fraction(t_years) + self.wave(t_years))
    }

    /// instantaneous load height and density
    pub fn load_magnitude(&self, t_years: f64) -> (f64, f64) {
        (
            self.params.initial_height_m + self.load_change(t_years),
            self.params.density_kg_m3,
        )
    }

    /// mass added to (positive) or removed from (negative) the disc
    pub fn mass_change_kg(&self, t_years: f64) -> f64 {
        let radius_m = self.params.radius_km * 1000.0;
        self.load_change(t_years) * self.params.density_kg_m3 * std::f64::consts::PI * radius_m.powi(2)
    }
}
