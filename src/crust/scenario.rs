use crate::{
    crust::{
        kernel::EarthModel,
        load::{Cycle, LoadParameters, LoadType},
        memo::ResultsCache,
        solver::{simulate, Results, SimulationParameters},
    },
    error::{DeformError, DeformResult},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DAYS_PER_YEAR: f64 = 365.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/* # regions */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// volcanic regions offered as simulation centres
pub fn regions() -> Vec<Region> {
    [
        ("Iceland", 64.9, -19.0),
        ("Hawaii", 19.4, -155.3),
        ("Alaska", 61.4, -152.0),
        ("Andes", -23.5, -67.8),
        ("Cascades", 46.2, -121.5),
        ("Indonesia", -7.5, 110.0),
        ("Japan", 35.6, 138.2),
        ("Kamchatka", 56.0, 160.0),
        ("Mediterranean", 37.7, 14.9),
    ]
    .into_iter()
    .map(|(name, lat, lon)| Region {
        name: name.to_string(),
        lat,
        lon,
    })
    .collect()
}

pub fn region(name: &str) -> DeformResult<Region> {
    regions()
        .into_iter()
        .find(|region| region.name == name)
        .ok_or_else(|| DeformError::Unsupported {
            kind: "region",
            value: name.to_string(),
        })
}

/* # earth settings */

/// choices shared by every scenario type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EarthSettings {
    pub earth_model: EarthModel,
    pub elastic_thickness_km: f64,
    pub time_steps: usize,
    /// only attached to the load when the model decays
    pub decay_time_years: f64,
}

impl Default for EarthSettings {
    fn default() -> Self {
        Self {
            earth_model: EarthModel::Elastic,
            elastic_thickness_km: 30.0,
            time_steps: 20,
            decay_time_years: 10.0,
        }
    }
}

/* # scenarios */

/// a named, ready to run parameter pair
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub load: LoadParameters,
    pub simulation: SimulationParameters,
}

impl Scenario {
    fn assemble(
        region: &Region,
        load: LoadParameters,
        earth: &EarthSettings,
        duration_years: f64,
        extent_km: f64,
        resolution_km: f64,
    ) -> DeformResult<Self> {
        let load = match earth.earth_model {
            EarthModel::ExponentialDecay => load.with_decay_time(earth.decay_time_years)?,
            _ => load,
        };
        let simulation = SimulationParameters {
            earth_model: earth.earth_model,
            elastic_thickness_km: earth.elastic_thickness_km,
            time_steps: earth.time_steps,
            duration_years,
            center_lat: region.lat,
            center_lon: region.lon,
            region_width_km: extent_km,
            region_height_km: extent_km,
            resolution_km,
        };
        simulation.validate()?;
        Ok(Self {
            name: format!("{}_{}", load.load_type, region.name),
            load,
            simulation,
        })
    }

    /// glacier of `radius_km` thinning to `remaining_fraction` of `ice_thickness_m`
    pub fn glacial_unloading(
        region: &Region,
        radius_km: f64,
        ice_thickness_m: f64,
        remaining_fraction: f64,
        melt_years: f64,
        earth: &EarthSettings,
    ) -> DeformResult<Self> {
        let load = LoadParameters::glacial_unloading(
            radius_km,
            ice_thickness_m,
            remaining_fraction,
            melt_years,
        )?;
        Self::assemble(
            region,
            load,
            earth,
            melt_years,
            (radius_km * 10.0).max(50.0),
            (radius_km / 10.0).max(0.5),
        )
    }

    /// sea rising by `rise_m` along a coast, its width taken as the load radius
    pub fn sea_level_rise(
        region: &Region,
        coastline_width_km: f64,
        rise_m: f64,
        rise_years: f64,
        earth: &EarthSettings,
    ) -> DeformResult<Self> {
        let load = LoadParameters::sea_level_rise(coastline_width_km, rise_m, rise_years)?;
        Self::assemble(
            region,
            load,
            earth,
            rise_years,
            (coastline_width_km * 4.0).max(100.0),
            (coastline_width_km / 20.0).max(1.0),
        )
    }

    /// lava flow emplaced over `eruption_days`, followed for five eruption lengths
    pub fn lava_flow(
        region: &Region,
        radius_km: f64,
        thickness_m: f64,
        density_kg_m3: f64,
        eruption_days: f64,
        earth: &EarthSettings,
    ) -> DeformResult<Self> {
        let eruption_years = eruption_days / DAYS_PER_YEAR;
        let load = LoadParameters::lava_flow(radius_km, thickness_m, density_kg_m3, eruption_years)?;
        Self::assemble(
            region,
            load,
            earth,
            (eruption_years * 5.0).max(1.0),
            (radius_km * 10.0).max(30.0),
            (radius_km / 10.0).max(0.2),
        )
    }

    /// reservoir level moving by `level_change_m` over `change_months`
    pub fn reservoir_change(
        region: &Region,
        radius_km: f64,
        level_change_m: f64,
        change_months: f64,
        cycle: Cycle,
        earth: &EarthSettings,
    ) -> DeformResult<Self> {
        let change_years = change_months / MONTHS_PER_YEAR;
        let load = LoadParameters::reservoir_change(radius_km, level_change_m, change_years, cycle)?;
        Self::assemble(
            region,
            load,
            earth,
            (change_years * 5.0).max(1.0),
            (radius_km * 10.0).max(40.0),
            (radius_km / 10.0).max(0.5),
        )
    }

    /// a typical case of each load type
    pub fn preset(load_type: LoadType, region: &Region, earth: &EarthSettings) -> DeformResult<Self> {
        match load_type {
            LoadType::GlacialUnloading => Self::glacial_unloading(region, 10.0, 500.0, 0.1, 100.0, earth),
            LoadType::SeaLevelRise => Self::sea_level_rise(region, 50.0, 1.0, 80.0, earth),
            LoadType::LavaFlow => Self::lava_flow(region, 5.0, 50.0, 2700.0, 30.0, earth),
            LoadType::ReservoirChange => {
                Self::reservoir_change(region, 10.0, 20.0, 12.0, Cycle::OneTime, earth)
            }
        }
    }

    pub fn run(&self) -> DeformResult<Results> {
        info!("running scenario {}", self.name);
        simulate(&self.load, &self.simulation)
    }

    pub fn run_cached(&self, cache: &mut ResultsCache) -> DeformResult<Arc<Results>> {
        cache.get_or_solve(&self.load, &self.simulation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.000_001;

    fn iceland() -> Region {
        region("Iceland").unwrap()
    }

    #[test]
    fn region_lookup() {
        assert_eq!(regions().len(), 9);
        assert_float_eq!(region("Hawaii").unwrap().lon, -155.3, abs <= EPSILON);
        assert!(matches!(
            region("Atlantis"),
            Err(DeformError::Unsupported { kind: "region", .. })
        ));
    }

    #[test]
    fn glacier_preset_extent() {
        let scenario =
            Scenario::preset(LoadType::GlacialUnloading, &iceland(), &EarthSettings::default()).unwrap();
        assert_eq!(scenario.name, "glacial_unloading_Iceland");
        assert_float_eq!(scenario.simulation.region_width_km, 100.0, abs <= EPSILON);
        assert_float_eq!(scenario.simulation.resolution_km, 1.0, abs <= EPSILON);
        assert_float_eq!(scenario.simulation.duration_years, 100.0, abs <= EPSILON);
        assert_float_eq!(scenario.load.final_height_m, 50.0, abs <= EPSILON);
        assert_eq!(scenario.load.decay_time_years, None);
    }

    #[test]
    fn small_glacier_keeps_minimum_extent() {
        let scenario =
            Scenario::glacial_unloading(&iceland(), 2.0, 300.0, 0.5, 50.0, &EarthSettings::default())
                .unwrap();
        assert_float_eq!(scenario.simulation.region_width_km, 50.0, abs <= EPSILON);
        assert_float_eq!(scenario.simulation.resolution_km, 0.5, abs <= EPSILON);
    }

    #[test]
    fn coast_width_sets_the_map() {
        let scenario =
            Scenario::sea_level_rise(&iceland(), 60.0, 2.0, 80.0, &EarthSettings::default()).unwrap();
        assert_float_eq!(scenario.load.radius_km, 60.0, abs <= EPSILON);
        assert_float_eq!(scenario.simulation.region_height_km, 240.0, abs <= EPSILON);
        assert_float_eq!(scenario.simulation.resolution_km, 3.0, abs <= EPSILON);
    }

    #[test]
    fn short_events_run_at_least_a_year() {
        let earth = EarthSettings::default();
        let lava = Scenario::preset(LoadType::LavaFlow, &iceland(), &earth).unwrap();
        assert_float_eq!(lava.load.change_duration_years, 30.0 / 365.0, abs <= EPSILON);
        assert_float_eq!(lava.simulation.duration_years, 1.0, abs <= EPSILON);
        assert_float_eq!(lava.simulation.resolution_km, 0.5, abs <= EPSILON);

        let reservoir = Scenario::reservoir_change(&iceland(), 4.0, -10.0, 24.0, Cycle::Annual, &earth)
            .unwrap();
        assert!(reservoir.load.is_removal);
        assert_float_eq!(reservoir.simulation.duration_years, 10.0, abs <= EPSILON);
        assert_float_eq!(reservoir.simulation.region_width_km, 40.0, abs <= EPSILON);
        assert_eq!(reservoir.name, "reservoir_change_Iceland");
    }

    #[test]
    fn decay_time_follows_the_model() {
        let earth = EarthSettings {
            earth_model: EarthModel::ExponentialDecay,
            decay_time_years: 15.0,
            ..EarthSettings::default()
        };
        let scenario = Scenario::preset(LoadType::SeaLevelRise, &iceland(), &earth).unwrap();
        assert_eq!(scenario.load.decay_time_years, Some(15.0));
    }

    #[test]
    fn bad_inputs_are_reported() {
        let earth = EarthSettings {
            time_steps: 1,
            ..EarthSettings::default()
        };
        assert!(Scenario::preset(LoadType::LavaFlow, &iceland(), &earth).is_err());
        assert!(Scenario::lava_flow(&iceland(), -1.0, 50.0, 2700.0, 30.0, &EarthSettings::default())
            .is_err());
    }

    #[test]
    fn presets_run() {
        let earth = EarthSettings {
            time_steps: 3,
            ..EarthSettings::default()
        };
        let scenario = Scenario::reservoir_change(&iceland(), 2.0, 10.0, 6.0, Cycle::Seasonal, &earth)
            .unwrap();
        let results = scenario.run().unwrap();
        assert_eq!(results.steps(), 3);
        let mut cache = ResultsCache::new();
        let cached = scenario.run_cached(&mut cache).unwrap();
        assert_eq!(*cached, results);
    }
}
