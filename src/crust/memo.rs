use crate::{
    crust::{
        load::LoadParameters,
        solver::{simulate, Results, SimulationParameters},
    },
    error::DeformResult,
};
use log::trace;
use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// 64-bit digest of a parameter pair, floats hashed by their bit patterns
pub fn fingerprint(load: &LoadParameters, simulation: &SimulationParameters) -> u64 {
    let mut hasher = DefaultHasher::new();
    load.load_type.hash(&mut hasher);
    for value in [
        load.radius_km,
        load.initial_height_m,
        load.final_height_m,
        load.density_kg_m3,
        load.change_duration_years,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    load.decay_time_years.map(f64::to_bits).hash(&mut hasher);
    load.is_removal.hash(&mut hasher);
    load.cycle.period_years().map(f64::to_bits).hash(&mut hasher);

    simulation.earth_model.hash(&mut hasher);
    simulation.time_steps.hash(&mut hasher);
    for value in [
        simulation.elastic_thickness_km,
        simulation.duration_years,
        simulation.center_lat,
        simulation.center_lon,
        simulation.region_width_km,
        simulation.region_height_km,
        simulation.resolution_km,
    ] {
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// results of earlier runs, kept by whoever drives the simulations
#[derive(Debug, Default)]
pub struct ResultsCache {
    entries: HashMap<u64, Arc<Results>>,
}

impl ResultsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// stored results for exactly these parameters
    pub fn get(
        &self,
        load: &LoadParameters,
        simulation: &SimulationParameters,
    ) -> Option<Arc<Results>> {
        self.entries
            .get(&fingerprint(load, simulation))
            .filter(|results| results.load == *load && results.simulation == *simulation)
            .cloned()
    }

    /// stored results, or a fresh run that is stored before being returned
    pub fn get_or_solve(
        &mut self,
        load: &LoadParameters,
        simulation: &SimulationParameters,
    ) -> DeformResult<Arc<Results>> {
        if let Some(results) = self.get(load, simulation) {
            trace!("reusing cached results");
            return Ok(results);
        }
        let results = Arc::new(simulate(load, simulation)?);
        self.entries
            .insert(fingerprint(load, simulation), Arc::clone(&results));
        Ok(results)
    }
}
