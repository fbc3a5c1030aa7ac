use crate::{
    crust::{solver::Results, strain},
    error::DeformResult,
    units::{Microstrain, Unit},
    vars::*,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;

/* # levels */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn name(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// monitoring recommendation shown next to the level
    pub fn advice(&self) -> &'static str {
        match self {
            RiskLevel::High => "Further monitoring is strongly recommended.",
            RiskLevel::Medium => "Regular monitoring would be prudent.",
            RiskLevel::Low => "Standard monitoring protocols should be sufficient.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/* # policy */

/// heuristic mapping from deformation to hazard scores, not an operational model
///
/// Each partial score saturates at `HAZARD_SCORE_CAP` through a hyperbolic
/// tangent of its input over a characteristic scale, so it is monotonic and
/// bounded. The default weights and scales are read from `vars`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    pub score_cap: f64,
    pub pressure_scale_m: f64,
    pub stability_scale_micro: f64,
    pub dilation_scale_micro: f64,
    pub pressure_weight: f64,
    pub stability_weight: f64,
    pub dilation_weight: f64,
    pub risk_max: f64,
    pub medium_from: f64,
    pub high_from: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            score_cap: HAZARD_SCORE_CAP,
            pressure_scale_m: PRESSURE_SCALE_M,
            stability_scale_micro: STABILITY_SCALE_MICRO,
            dilation_scale_micro: DILATION_SCALE_MICRO,
            pressure_weight: PRESSURE_WEIGHT,
            stability_weight: STABILITY_WEIGHT,
            dilation_weight: DILATION_WEIGHT,
            risk_max: RISK_INDEX_MAX,
            medium_from: RISK_MEDIUM,
            high_from: RISK_HIGH,
        }
    }
}

impl RiskPolicy {
    /// signed, positive for uplift
    pub fn pressure_change(&self, vertical_m: f64) -> f64 {
        self.score_cap * (vertical_m / self.pressure_scale_m).tanh()
    }

    pub fn stability_impact(&self, strain_micro: f64) -> f64 {
        self.score_cap * (strain_micro.abs() / self.stability_scale_micro).tanh()
    }

    /// positive under areal dilation, negative under compression
    pub fn pathway_dilation(&self, strain_micro: f64, volumetric_micro: f64) -> f64 {
        let sign = if volumetric_micro > 0.0 {
            1.0
        } else if volumetric_micro < 0.0 {
            -1.0
        } else {
            0.0
        };
        sign * self.score_cap * (strain_micro.abs() / self.dilation_scale_micro).tanh()
    }

    /// weighted sum clipped to `[0, risk_max]`; compression does not lower the risk
    pub fn risk_index(&self, pressure: f64, stability: f64, dilation: f64) -> f64 {
        (self.pressure_weight * pressure.abs()
            + self.stability_weight * stability
            + self.dilation_weight * dilation.max(0.0))
        .clamp(0.0, self.risk_max)
    }

    pub fn level(&self, risk_index: f64) -> RiskLevel {
        if risk_index >= self.high_from {
            RiskLevel::High
        } else if risk_index >= self.medium_from {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/* # assessment */

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    pub time_years: f64,
    /// coordinates of the grid node the values were read from
    pub node_lat: f64,
    pub node_lon: f64,
    pub vertical_displacement: f64,
    pub horizontal_displacement: f64,
    /// microstrain
    pub strain_magnitude: f64,
    pub volumetric_strain: f64,
    pub max_shear: f64,
    pub pressure_change: f64,
    pub stability_impact: f64,
    pub pathway_dilation: f64,
    pub risk_index: f64,
    pub risk_level: RiskLevel,
}

/// hazard indices at the node nearest to a target, under the default policy
pub fn assess(
    results: &Results,
    target_lat: f64,
    target_lon: f64,
    time_index: usize,
) -> DeformResult<ImpactAssessment> {
    assess_with(
        results,
        target_lat,
        target_lon,
        time_index,
        &RiskPolicy::default(),
    )
}

pub fn assess_with(
    results: &Results,
    target_lat: f64,
    target_lon: f64,
    time_index: usize,
    policy: &RiskPolicy,
) -> DeformResult<ImpactAssessment> {
    trace!("assessing impact at ({}, {})", target_lat, target_lon);
    let field = results.field(time_index)?;
    let datum = results.locate(target_lat, target_lon)?;

    let vertical = field.vertical_displacement.read(&datum);
    let horizontal = field
        .horizontal_displacement_e
        .read(&datum)
        .hypot(field.horizontal_displacement_n.read(&datum));
    let (xx, yy, xy) = (
        field.strain_xx.read(&datum),
        field.strain_yy.read(&datum),
        field.strain_xy.read(&datum),
    );
    let magnitude = Microstrain::from_strain(strain::strain_magnitude(xx, yy, xy)).release();
    let volumetric = Microstrain::from_strain(strain::volumetric_strain(xx, yy)).release();
    let max_shear = Microstrain::from_strain(strain::principal(xx, yy, xy).max_shear).release();

    let pressure_change = policy.pressure_change(vertical);
    let stability_impact = policy.stability_impact(magnitude);
    let pathway_dilation = policy.pathway_dilation(magnitude, volumetric);
    let risk_index = policy.risk_index(pressure_change, stability_impact, pathway_dilation);

    Ok(ImpactAssessment {
        time_years: field.time_years,
        node_lat: results.lats[datum.y as usize],
        node_lon: results.lons[datum.x as usize],
        vertical_displacement: vertical,
        horizontal_displacement: horizontal,
        strain_magnitude: magnitude,
        volumetric_strain: volumetric,
        max_shear,
        pressure_change,
        stability_impact,
        pathway_dilation,
        risk_index,
        risk_level: policy.level(risk_index),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        crust::{
            kernel::EarthModel,
            load::LoadParameters,
            solver::{simulate, SimulationParameters},
        },
        error::DeformError,
    };
    use float_eq::assert_float_eq;
    use itertools::Itertools;
    const EPSILON: f64 = 0.000_001;

    fn scenario_a() -> Results {
        simulate(
            &LoadParameters::glacial_unloading(10.0, 500.0, 0.1, 100.0).unwrap(),
            &SimulationParameters {
                earth_model: EarthModel::Elastic,
                elastic_thickness_km: 30.0,
                time_steps: 10,
                duration_years: 100.0,
                center_lat: 64.6,
                center_lon: -17.5,
                region_width_km: 50.0,
                region_height_km: 50.0,
                resolution_km: 1.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn levels_and_advice() {
        let policy = RiskPolicy::default();
        assert_eq!(policy.level(0.0), RiskLevel::Low);
        assert_eq!(policy.level(4.999), RiskLevel::Low);
        assert_eq!(policy.level(5.0), RiskLevel::Medium);
        assert_eq!(policy.level(9.999), RiskLevel::Medium);
        assert_eq!(policy.level(10.0), RiskLevel::High);
        assert_eq!(policy.level(15.0), RiskLevel::High);
        assert_eq!(
            RiskLevel::Medium.advice(),
            "Regular monitoring would be prudent."
        );
        assert!(RiskLevel::Low < RiskLevel::High);
    }

    #[test]
    fn scores_are_monotonic_and_bounded() {
        let policy = RiskPolicy::default();
        let inputs = (0..50).map(|j| j as f64 * 0.2).collect::<Vec<f64>>();
        assert!(inputs
            .iter()
            .map(|v| policy.pressure_change(*v))
            .tuple_windows()
            .all(|(a, b)| b >= a));
        assert!(inputs
            .iter()
            .map(|s| policy.stability_impact(*s * 50.0))
            .tuple_windows()
            .all(|(a, b)| b >= a));
        assert!(policy.pressure_change(-2.0) < 0.0);
        assert!(policy.pressure_change(1.0e6) <= HAZARD_SCORE_CAP);
        assert!(policy.pathway_dilation(40.0, -1.0) < 0.0);
        assert_float_eq!(policy.pathway_dilation(40.0, 0.0), 0.0, abs <= EPSILON);
        assert_float_eq!(
            policy.risk_index(1.0e6, 1.0e6, 1.0e6),
            RISK_INDEX_MAX,
            abs <= EPSILON
        );
        // compression leaves the index alone
        assert_float_eq!(
            policy.risk_index(-2.0, 1.0, -3.0),
            3.0,
            abs <= EPSILON
        );
    }

    #[test]
    fn risk_grows_as_ice_melts() {
        let results = scenario_a();
        let risks = (0..results.steps())
            .map(|j| assess(&results, 64.6, -17.5, j).unwrap().risk_index)
            .collect::<Vec<f64>>();
        assert_float_eq!(risks[0], 0.0, abs <= EPSILON);
        assert!(risks[9] > risks[1]);
        assert!(risks.iter().tuple_windows().all(|(a, b)| b >= a));
    }

    #[test]
    fn melting_reads_as_pressure_loss() {
        let results = scenario_a();
        let impact = assess(&results, 64.6, -17.5, 9).unwrap();
        assert!(impact.vertical_displacement < 0.0);
        assert!(impact.pressure_change < 0.0);
        assert!(impact.stability_impact > 0.0);
        assert!((0.0..=RISK_INDEX_MAX).contains(&impact.risk_index));
        assert_float_eq!(impact.node_lat, 64.6, abs <= EPSILON);
        assert_float_eq!(impact.time_years, 100.0, abs <= EPSILON);
    }

    #[test]
    fn target_off_the_map() {
        let results = scenario_a();
        assert!(matches!(
            assess(&results, 66.0, -17.5, 9),
            Err(DeformError::OutOfDomain { .. })
        ));
        assert_eq!(
            assess(&results, 64.6, -17.5, 10),
            Err(DeformError::TimeIndex { index: 10, steps: 10 })
        );
    }

    #[test]
    fn nothing_happens_without_load() {
        let results = simulate(
            &LoadParameters::sea_level_rise(5.0, 0.0, 10.0).unwrap(),
            &SimulationParameters {
                earth_model: EarthModel::Relaxed,
                elastic_thickness_km: 25.0,
                time_steps: 3,
                duration_years: 10.0,
                center_lat: 19.4,
                center_lon: -155.3,
                region_width_km: 20.0,
                region_height_km: 20.0,
                resolution_km: 1.0,
            },
        )
        .unwrap();
        let impact = assess(&results, 19.45, -155.28, 2).unwrap();
        assert_eq!(impact.risk_index, 0.0);
        assert_eq!(impact.risk_level, RiskLevel::Low);
    }
}
