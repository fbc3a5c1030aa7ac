use crate::{crust::field::DeformationField, vars::*};
use serde::{Deserialize, Serialize};

/// headline statistics of one deformation field
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub time_years: f64,
    pub max_vertical_m: f64,
    /// largest positive vertical displacement, zero if nothing rose
    pub max_uplift_m: f64,
    /// most negative vertical displacement, zero if nothing sank
    pub max_subsidence_m: f64,
    pub max_horizontal_m: f64,
    pub max_strain_micro: f64,
    pub vertical_fraction_above_threshold: f64,
    pub horizontal_fraction_above_threshold: f64,
    pub strain_fraction_above_threshold: f64,
    /// net volume swept by the surface, cubic metres
    pub volume_change_m3: f64,
}

impl FieldSummary {
    pub fn from_field(field: &DeformationField, spacing_km: f64) -> Self {
        let vertical = &field.vertical_displacement;
        let horizontal = field.horizontal_magnitude();
        let strain = field.strain_magnitude();
        let cell_area_m2 = (spacing_km * 1000.0).powi(2);
        Self {
            time_years: field.time_years,
            max_vertical_m: vertical.max_abs().unwrap_or(0.0),
            max_uplift_m: vertical.max().unwrap_or(0.0).max(0.0),
            max_subsidence_m: vertical.min().unwrap_or(0.0).min(0.0),
            max_horizontal_m: horizontal.max().unwrap_or(0.0),
            max_strain_micro: strain.max().unwrap_or(0.0),
            vertical_fraction_above_threshold: vertical.fraction_above(DISPLACEMENT_THRESHOLD_M),
            horizontal_fraction_above_threshold: horizontal
                .fraction_above(DISPLACEMENT_THRESHOLD_M),
            strain_fraction_above_threshold: strain.fraction_above(STRAIN_THRESHOLD_MICRO),
            volume_change_m3: vertical.grid.iter().sum::<f64>() * cell_area_m2,
        }
    }
}
