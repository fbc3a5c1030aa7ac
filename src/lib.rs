pub mod carto {
    pub mod brane;
    pub mod datum;
    pub mod grid;
    pub mod section;
}

pub mod crust {
    pub mod field;
    pub mod kernel;
    pub mod load;
    pub mod memo;
    pub mod scenario;
    pub mod solver;
    pub mod strain;
    pub mod summary;
}

pub mod hazard {
    pub mod impact;
}

pub mod error;
pub mod units;
pub mod vars;

pub use crate::{
    carto::grid::{build_grid, Grid},
    crust::{
        kernel::EarthModel,
        load::{LoadParameters, LoadType},
        solver::{simulate, solve, Results, SimulationParameters},
    },
    error::{DeformError, DeformResult, Warning},
    hazard::impact::{assess, ImpactAssessment, RiskLevel},
};
