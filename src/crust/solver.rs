use crate::{
    carto::{
        brane::Brane,
        datum::DatumZa,
        grid::{build_grid_capped, nearest_node, node_count, validate_center, Grid},
        section::{self, SectionPoint},
    },
    crust::{
        field::{Component, DeformationField},
        kernel::{kernel_for, EarthModel, EarthResponseKernel},
        load::{LoadModel, LoadParameters},
        summary::FieldSummary,
    },
    error::{positive, DeformError, DeformResult, Warning},
    vars::*,
};
use log::{info, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/* # parameters */

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub earth_model: EarthModel,
    pub elastic_thickness_km: f64,
    pub time_steps: usize,
    pub duration_years: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub region_width_km: f64,
    pub region_height_km: f64,
    pub resolution_km: f64,
}

impl SimulationParameters {
    pub fn validate(&self) -> DeformResult<()> {
        positive("elastic_thickness_km", self.elastic_thickness_km)?;
        positive("duration_years", self.duration_years)?;
        if self.time_steps < 2 {
            return Err(DeformError::invalid(
                "time_steps",
                format!("at least 2 time steps are needed, got {}", self.time_steps),
            ));
        }
        validate_center(self.center_lat, self.center_lon)?;
        node_count(
            self.region_width_km,
            self.region_height_km,
            self.resolution_km,
        )?;
        Ok(())
    }

    /// evenly spaced instants from the start to the end of the run
    pub fn times(&self) -> Vec<f64> {
        let last = (self.time_steps.max(2) - 1) as f64;
        (0..self.time_steps)
            .map(|j| self.duration_years * j as f64 / last)
            .collect()
    }

    /// grid node count times time step count
    pub fn cell_count(&self) -> DeformResult<u128> {
        Ok(node_count(
            self.region_width_km,
            self.region_height_km,
            self.resolution_km,
        )?
        .saturating_mul(self.time_steps as u128))
    }
}

/* # results */

/// everything a run produced, along with the inputs it was produced from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub times: Vec<f64>,
    /// grid axes, both increasing
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub fields: Vec<DeformationField>,
    pub load: LoadParameters,
    pub simulation: SimulationParameters,
    /// kernel actually evaluated, which differs from the requested one after a fallback
    pub earth_model: EarthModel,
    pub warnings: Vec<Warning>,
    pub spacing_km: f64,
    pub effective_width_km: f64,
    pub effective_height_km: f64,
}

impl Results {
    pub fn steps(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> usize {
        self.lons.len()
    }

    pub fn rows(&self) -> usize {
        self.lats.len()
    }

    pub fn field(&self, time_index: usize) -> DeformResult<&DeformationField> {
        self.fields.get(time_index).ok_or(DeformError::TimeIndex {
            index: time_index,
            steps: self.fields.len(),
        })
    }

    /// nearest grid node to a coordinate
    pub fn locate(&self, lat: f64, lon: f64) -> DeformResult<DatumZa> {
        nearest_node(&self.lats, &self.lons, lat, lon)
    }

    /// node under the centre of the load
    pub fn center(&self) -> DatumZa {
        DatumZa::new((self.columns() / 2) as i32, (self.rows() / 2) as i32)
    }

    /// value of a component at the node nearest to a coordinate, for every time step
    pub fn time_series(
        &self,
        lat: f64,
        lon: f64,
        component: Component,
    ) -> DeformResult<Vec<(f64, f64)>> {
        let datum = self.locate(lat, lon)?;
        self.times
            .iter()
            .zip(self.fields.iter())
            .map(|(time, field)| {
                field
                    .value(component, &datum)
                    .map(|value| (*time, value))
                    .ok_or(DeformError::OutOfDomain { lat, lon })
            })
            .collect()
    }

    /// profile of a component along the line between two (lat, lon) coordinates
    pub fn cross_section(
        &self,
        start: (f64, f64),
        end: (f64, f64),
        time_index: usize,
        component: Component,
        samples: usize,
    ) -> DeformResult<Vec<SectionPoint>> {
        let brane = self.field(time_index)?.component(component);
        section::cross_section(&brane, &self.lats, &self.lons, start, end, samples)
    }

    /// component raster scaled for drawing as relief
    pub fn surface(
        &self,
        time_index: usize,
        component: Component,
        exaggeration: f64,
    ) -> DeformResult<Brane<f64>> {
        let exaggeration = positive("exaggeration", exaggeration)?;
        Ok((self.field(time_index)?.component(component) * exaggeration)
            .rename(&format!("{}-surface", component)))
    }

    pub fn summary(&self, time_index: usize) -> DeformResult<FieldSummary> {
        Ok(FieldSummary::from_field(
            self.field(time_index)?,
            self.spacing_km,
        ))
    }
}

/* # solver */

fn solve_step(
    model: &LoadModel,
    kernel: &dyn EarthResponseKernel,
    grid: &Grid,
    elastic_thickness_km: f64,
    t_years: f64,
) -> DeformationField {
    trace!("solving time step at {:.3} years", t_years);
    let height = model.load_change(t_years);
    let density = model.parameters().density_kg_m3;
    let radius = model.parameters().radius_km;
    let factor = kernel.time_factor(t_years);
    if height == 0.0 || factor == 0.0 {
        let still = || Brane::zeros(grid.columns, grid.rows);
        return DeformationField::from_displacement(
            t_years,
            still(),
            still(),
            still(),
            grid.spacing_km,
        );
    }

    let nodes = grid
        .points
        .par_iter()
        .map(|point| {
            let vertical = factor
                * kernel.vertical_response(height, density, radius, point.r_km, elastic_thickness_km);
            let radial = factor
                * kernel.horizontal_response(height, density, radius, point.r_km, elastic_thickness_km);
            // split the radial motion along the local axes
            [
                vertical,
                radial * point.x_km / point.r_km,
                radial * point.y_km / point.r_km,
            ]
        })
        .collect::<Vec<[f64; 3]>>();
    let layer = |k: usize, variable: &str| {
        Brane::new(nodes.iter().map(|node| node[k]).collect(), grid.columns, variable)
    };

    DeformationField::from_displacement(
        t_years,
        layer(0, "vertical"),
        layer(1, "east"),
        layer(2, "north"),
        grid.spacing_km,
    )
}

/// run a simulation on a prepared grid
pub fn solve(
    load: &LoadParameters,
    simulation: &SimulationParameters,
    grid: &Grid,
) -> DeformResult<Results> {
    solve_capped(load, simulation, grid, MAX_CELLS)
}

/// run a simulation, refusing more than `cap` grid nodes times time steps
pub fn solve_capped(
    load: &LoadParameters,
    simulation: &SimulationParameters,
    grid: &Grid,
    cap: usize,
) -> DeformResult<Results> {
    let model = LoadModel::new(load.clone())?;
    simulation.validate()?;
    if (grid.spacing_km - simulation.resolution_km).abs() > 1.0e-9 * simulation.resolution_km {
        return Err(DeformError::invalid(
            "resolution_km",
            format!(
                "grid spacing is {} km but {} km was requested",
                grid.spacing_km, simulation.resolution_km
            ),
        ));
    }
    let cells = (grid.len() as u128).saturating_mul(simulation.time_steps as u128);
    if cells > cap as u128 {
        return Err(DeformError::TooManyCells { cells, cap });
    }

    let (kernel, warnings) = kernel_for(
        simulation.earth_model,
        load,
        simulation.elastic_thickness_km,
    )?;
    info!(
        "solving {} load with {} kernel over {} nodes and {} time steps",
        load.load_type,
        kernel.model(),
        grid.len(),
        simulation.time_steps
    );

    let times = simulation.times();
    let fields = times
        .par_iter()
        .map(|t_years| {
            solve_step(
                &model,
                kernel.as_ref(),
                grid,
                simulation.elastic_thickness_km,
                *t_years,
            )
        })
        .collect::<Vec<DeformationField>>();
    info!("simulation completed");

    Ok(Results {
        times,
        lats: grid.lats.clone(),
        lons: grid.lons.clone(),
        fields,
        load: load.clone(),
        simulation: simulation.clone(),
        earth_model: kernel.model(),
        warnings,
        spacing_km: grid.spacing_km,
        effective_width_km: grid.effective_width_km,
        effective_height_km: grid.effective_height_km,
    })
}

/// validate the inputs, build the grid they describe and solve on it
pub fn simulate(load: &LoadParameters, simulation: &SimulationParameters) -> DeformResult<Results> {
    simulate_capped(load, simulation, MAX_CELLS)
}

pub fn simulate_capped(
    load: &LoadParameters,
    simulation: &SimulationParameters,
    cap: usize,
) -> DeformResult<Results> {
    load.validate()?;
    simulation.validate()?;
    let cells = simulation.cell_count()?;
    if cells > cap as u128 {
        return Err(DeformError::TooManyCells { cells, cap });
    }
    let grid = build_grid_capped(
        simulation.center_lat,
        simulation.center_lon,
        simulation.region_width_km,
        simulation.region_height_km,
        simulation.resolution_km,
        cap,
    )?;
    solve_capped(load, simulation, &grid, cap)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crust::load::{Cycle, LoadType};
    use float_eq::assert_float_eq;
    use itertools::Itertools;
    const EPSILON: f64 = 0.000_001;

    fn scenario_a() -> (LoadParameters, SimulationParameters) {
        (
            LoadParameters::glacial_unloading(10.0, 500.0, 0.1, 100.0).unwrap(),
            SimulationParameters {
                earth_model: EarthModel::Elastic,
                elastic_thickness_km: 30.0,
                time_steps: 10,
                duration_years: 100.0,
                center_lat: 64.0,
                center_lon: -19.0,
                region_width_km: 50.0,
                region_height_km: 50.0,
                resolution_km: 1.0,
            },
        )
    }

    fn small(earth_model: EarthModel) -> SimulationParameters {
        SimulationParameters {
            earth_model,
            region_width_km: 20.0,
            region_height_km: 20.0,
            time_steps: 4,
            ..scenario_a().1
        }
    }

    fn center_series(results: &Results) -> Vec<f64> {
        let centre = results.center();
        results
            .fields
            .iter()
            .map(|field| field.vertical_displacement.read(&centre))
            .collect()
    }

    #[test]
    fn times_are_evenly_spaced() {
        let (_, simulation) = scenario_a();
        let times = simulation.times();
        assert_eq!(times.len(), 10);
        assert_float_eq!(times[0], 0.0, abs <= EPSILON);
        assert_float_eq!(times[9], 100.0, abs <= EPSILON);
        assert_float_eq!(times[3], 100.0 / 3.0, abs <= EPSILON);
    }

    #[test]
    fn scenario_a_centre_grows_and_edge_stays_small() {
        let (load, simulation) = scenario_a();
        let results = simulate(&load, &simulation).unwrap();
        assert_eq!(results.steps(), 10);
        assert_eq!((results.columns(), results.rows()), (51, 51));

        let magnitudes = center_series(&results)
            .into_iter()
            .map(f64::abs)
            .collect::<Vec<f64>>();
        assert_eq!(magnitudes[0], 0.0);
        assert!(magnitudes.iter().tuple_windows().all(|(a, b)| b > a));

        let last = results.field(9).unwrap();
        let centre = last.vertical_displacement.read(&results.center()).abs();
        let edge = last.vertical_displacement.read(&DatumZa::new(50, 25)).abs();
        assert!(edge * 10.0 < centre);
    }

    #[test]
    fn melting_ice_lowers_and_filling_raises() {
        let (load, simulation) = scenario_a();
        let melt = simulate(&load, &small(EarthModel::Elastic)).unwrap();
        assert!(center_series(&melt).iter().all(|w| *w <= 0.0));
        assert!(*center_series(&melt).last().unwrap() < 0.0);

        let fill = LoadParameters::reservoir_change(5.0, 30.0, 50.0, Cycle::OneTime).unwrap();
        let fill = simulate(&fill, &simulation).unwrap();
        assert!(center_series(&fill).iter().all(|w| *w >= 0.0));
        assert!(*center_series(&fill).last().unwrap() > 0.0);
    }

    #[test]
    fn no_net_load_gives_zero_fields() {
        for (load_type, earth_model) in LoadType::array()
            .into_iter()
            .cartesian_product(EarthModel::array())
        {
            let load = LoadParameters {
                load_type,
                radius_km: 5.0,
                initial_height_m: 40.0,
                final_height_m: 40.0,
                density_kg_m3: 1000.0,
                change_duration_years: 10.0,
                decay_time_years: Some(5.0),
                is_removal: false,
                cycle: Cycle::OneTime,
            };
            let results = simulate(&load, &small(earth_model)).unwrap();
            for field in results.fields.iter() {
                assert!(field.vertical_displacement.is_zero());
                assert!(field.horizontal_displacement_e.is_zero());
                assert!(field.horizontal_displacement_n.is_zero());
                assert!(field.strain_xx.is_zero());
                assert!(field.strain_yy.is_zero());
                assert!(field.strain_xy.is_zero());
            }
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let load = LoadParameters::sea_level_rise(8.0, 1.5, 40.0).unwrap();
        let simulation = small(EarthModel::ThickPlate);
        assert_eq!(
            simulate(&load, &simulation).unwrap(),
            simulate(&load, &simulation).unwrap()
        );
    }

    #[test]
    fn decay_reaches_relaxed_state() {
        let load = LoadParameters::sea_level_rise(8.0, 2.0, 1.0)
            .unwrap()
            .with_decay_time(10.0)
            .unwrap();
        let simulation = SimulationParameters {
            time_steps: 11,
            duration_years: 100.0,
            ..small(EarthModel::ExponentialDecay)
        };
        let decaying = simulate(&load, &simulation).unwrap();
        let relaxed = simulate(
            &load,
            &SimulationParameters {
                earth_model: EarthModel::Relaxed,
                ..simulation.clone()
            },
        )
        .unwrap();

        let centre = decaying.center();
        assert_float_eq!(
            decaying.fields[0].vertical_displacement.read(&centre),
            0.0,
            abs <= EPSILON
        );
        let settled = decaying.fields[10].vertical_displacement.read(&centre);
        let target = relaxed.fields[10].vertical_displacement.read(&centre);
        assert!(target > 0.0);
        assert_float_eq!(settled, target, rmax <= 0.01);
    }

    #[test]
    fn decay_needs_a_time_constant() {
        let load = LoadParameters::sea_level_rise(8.0, 2.0, 1.0).unwrap();
        assert_eq!(
            simulate(&load, &small(EarthModel::ExponentialDecay)),
            Err(DeformError::MissingParameter("decay_time_years"))
        );
    }

    #[test]
    fn thin_plate_falls_back_with_warning() {
        let (load, _) = scenario_a();
        let simulation = SimulationParameters {
            elastic_thickness_km: 0.5,
            ..small(EarthModel::ThickPlate)
        };
        let results = simulate(&load, &simulation).unwrap();
        assert_eq!(results.earth_model, EarthModel::Elastic);
        assert_eq!(results.warnings.len(), 1);
        assert_eq!(results.simulation.earth_model, EarthModel::ThickPlate);
    }

    #[test]
    fn oversized_runs_are_refused() {
        let (load, simulation) = scenario_a();
        // 51 × 51 nodes over 10 steps
        assert_eq!(
            simulate_capped(&load, &simulation, 20_000),
            Err(DeformError::TooManyCells {
                cells: 26_010,
                cap: 20_000
            })
        );
        let fine = SimulationParameters {
            resolution_km: 0.001,
            ..simulation
        };
        assert!(matches!(
            simulate(&load, &fine),
            Err(DeformError::TooManyCells { .. })
        ));
    }

    #[test]
    fn enormous_cell_counts_saturate() {
        let (load, simulation) = scenario_a();
        let enormous = SimulationParameters {
            region_width_km: 1.0e6,
            region_height_km: 1.0e6,
            resolution_km: 1.0e-14,
            time_steps: 1_000_000,
            center_lat: 0.0,
            center_lon: 0.0,
            ..simulation
        };
        assert_eq!(enormous.cell_count(), Ok(u128::MAX));
        assert!(matches!(
            simulate(&load, &enormous),
            Err(DeformError::TooManyCells { cells: u128::MAX, .. })
        ));
    }

    #[test]
    fn still_steps_are_exactly_zero() {
        let (load, _) = scenario_a();
        let results = simulate(&load, &small(EarthModel::Elastic)).unwrap();
        let first = results.field(0).unwrap();
        assert!(first.vertical_displacement.is_zero());
        assert!(first.horizontal_magnitude().is_zero());
        assert!(first.strain_xx.is_zero());
        assert_eq!(first.len(), results.field(1).unwrap().len());
    }

    #[test]
    fn invalid_simulation_parameters() {
        let (load, simulation) = scenario_a();
        let cases = [
            (
                SimulationParameters {
                    time_steps: 1,
                    ..simulation.clone()
                },
                "time_steps",
            ),
            (
                SimulationParameters {
                    resolution_km: 0.0,
                    ..simulation.clone()
                },
                "resolution_km",
            ),
            (
                SimulationParameters {
                    elastic_thickness_km: -1.0,
                    ..simulation.clone()
                },
                "elastic_thickness_km",
            ),
            (
                SimulationParameters {
                    duration_years: 0.0,
                    ..simulation.clone()
                },
                "duration_years",
            ),
        ];
        for (simulation, parameter) in cases {
            match simulate(&load, &simulation) {
                Err(DeformError::InvalidParameter { name, .. }) => assert_eq!(name, parameter),
                other => panic!("expected invalid {}, got {:?}", parameter, other),
            }
        }
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let (load, simulation) = scenario_a();
        let grid = build_grid_capped(64.0, -19.0, 50.0, 50.0, 2.0, MAX_CELLS).unwrap();
        assert!(matches!(
            solve(&load, &simulation, &grid),
            Err(DeformError::InvalidParameter { name: "resolution_km", .. })
        ));
    }

    #[test]
    fn horizontal_motion_is_radial() {
        let (load, simulation) = scenario_a();
        let results = simulate(&load, &small(simulation.earth_model)).unwrap();
        let field = results.field(3).unwrap();
        let centre = results.center();
        // due east of the centre the motion has no north component
        let east_of_centre = DatumZa::new(centre.x + 5, centre.y);
        assert_float_eq!(field.horizontal_displacement_n.read(&east_of_centre), 0.0, abs <= EPSILON);
        assert_float_eq!(field.horizontal_displacement_e.read(&centre), 0.0, abs <= EPSILON);
        // unloading pulls the surface towards the centre
        assert!(field.horizontal_displacement_e.read(&east_of_centre) < 0.0);
    }

    #[test]
    fn accessors() {
        let (load, simulation) = scenario_a();
        let results = simulate(&load, &small(simulation.earth_model)).unwrap();
        assert_eq!(
            results.field(4).unwrap_err(),
            DeformError::TimeIndex { index: 4, steps: 4 }
        );

        let series = results
            .time_series(64.0, -19.0, Component::VerticalDisplacement)
            .unwrap();
        assert_eq!(series.len(), 4);
        assert_float_eq!(series[3].0, 100.0, abs <= EPSILON);
        assert_eq!(series[3].1, results.fields[3].vertical_displacement.read(&results.center()));
        assert!(results
            .time_series(70.0, -19.0, Component::VerticalDisplacement)
            .is_err());

        let surface = results.surface(3, Component::VerticalDisplacement, 1000.0).unwrap();
        assert_float_eq!(
            surface.read(&results.center()),
            1000.0 * series[3].1,
            rmax <= EPSILON
        );
        assert!(results.surface(3, Component::VerticalDisplacement, 0.0).is_err());

        let profile = results
            .cross_section(
                (64.0, results.lons[0]),
                (64.0, *results.lons.last().unwrap()),
                3,
                Component::VerticalDisplacement,
                21,
            )
            .unwrap();
        assert_float_eq!(profile[10].value, series[3].1, rmax <= 0.001);
        assert!(profile[0].value.abs() < profile[10].value.abs());
    }
}
