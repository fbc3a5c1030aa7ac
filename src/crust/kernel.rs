use crate::{
    crust::load::LoadParameters,
    error::{DeformError, DeformResult, Warning},
    units::{Pascal, Unit},
    vars::*,
};
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/* # earth models */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarthModel {
    Elastic,
    ThickPlate,
    Relaxed,
    ExponentialDecay,
}

impl EarthModel {
    pub fn array() -> [EarthModel; 4] {
        [
            EarthModel::Elastic,
            EarthModel::ThickPlate,
            EarthModel::Relaxed,
            EarthModel::ExponentialDecay,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EarthModel::Elastic => "elastic",
            EarthModel::ThickPlate => "thick_plate",
            EarthModel::Relaxed => "relaxed",
            EarthModel::ExponentialDecay => "exponential_decay",
        }
    }
}

impl fmt::Display for EarthModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EarthModel {
    type Err = DeformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EarthModel::array()
            .into_iter()
            .find(|model| model.name() == value)
            .ok_or_else(|| DeformError::Unsupported {
                kind: "earth_model",
                value: value.to_string(),
            })
    }
}

/* # kernel contract */

/// response of the crust to a disc load, signed like the load change
pub trait EarthResponseKernel: Send + Sync {
    fn model(&self) -> EarthModel;

    /// vertical displacement in metres at `r_km` from the disc centre
    fn vertical_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64;

    /// multiplier applied to the whole response at `t_years`
    fn time_factor(&self, _t_years: f64) -> f64 {
        1.0
    }

    /// length turning surface tilt into horizontal motion, in kilometres
    fn lever_km(&self, elastic_thickness_km: f64) -> f64 {
        elastic_thickness_km * (1.0 - 2.0 * POISSON_RATIO) / (2.0 * (1.0 - POISSON_RATIO))
    }

    /// radial derivative of the vertical response in metres per kilometre
    fn radial_gradient(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        // kernels are axisymmetric, so w(-r) = w(r)
        let step = DIFF_STEP_KM;
        let ahead = self.vertical_response(
            load_height_m,
            density_kg_m3,
            radius_km,
            r_km + step,
            elastic_thickness_km,
        );
        let behind = self.vertical_response(
            load_height_m,
            density_kg_m3,
            radius_km,
            (r_km - step).abs(),
            elastic_thickness_km,
        );
        (ahead - behind) / (2.0 * step)
    }

    /// outward radial horizontal displacement in metres
    fn horizontal_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        -self.lever_km(elastic_thickness_km)
            * self.radial_gradient(
                load_height_m,
                density_kg_m3,
                radius_km,
                r_km,
                elastic_thickness_km,
            )
    }

    /// radial and hoop strain at `r_km`
    fn strain_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> (f64, f64) {
        let step = DIFF_STEP_KM;
        let r_km = r_km.max(MIN_DISTANCE_KM);
        let radial = |r: f64| {
            self.horizontal_response(
                load_height_m,
                density_kg_m3,
                radius_km,
                r,
                elastic_thickness_km,
            )
        };
        // u_r is odd in r
        let behind = if r_km > step {
            radial(r_km - step)
        } else {
            -radial(step - r_km)
        };
        let err = (radial(r_km + step) - behind) / (2.0 * step * 1000.0);
        let ett = radial(r_km) / (r_km * 1000.0);
        (err, ett)
    }
}

/* # elastic half-space */

/// uniform disc on an elastic half-space
#[derive(Clone, Copy, Debug, Default)]
pub struct Elastic;

impl Elastic {
    /// distance over which the response falls by a factor e
    pub fn reach_km(radius_km: f64, elastic_thickness_km: f64) -> f64 {
        radius_km.hypot(elastic_thickness_km / 4.0)
    }

    /// displacement under the centre of the disc
    pub fn central_m(
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        let pressure = Pascal::from_column(load_height_m, density_kg_m3).release();
        let reach = Self::reach_km(radius_km, elastic_thickness_km);
        2.0 * (1.0 - POISSON_RATIO.powi(2)) * pressure * radius_km * 1000.0 / YOUNG_MODULUS
            * (radius_km / reach)
    }
}

impl EarthResponseKernel for Elastic {
    fn model(&self) -> EarthModel {
        EarthModel::Elastic
    }

    fn vertical_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        let reach = Self::reach_km(radius_km, elastic_thickness_km);
        Self::central_m(load_height_m, density_kg_m3, radius_km, elastic_thickness_km)
            * (-(r_km / reach).powi(2)).exp()
    }
}

/* # thick plate */

/// elastic plate of finite thickness flexing over the mantle
#[derive(Clone, Copy, Debug, Default)]
pub struct ThickPlate;

impl ThickPlate {
    /// flexural rigidity in N·m
    pub fn rigidity(elastic_thickness_km: f64) -> f64 {
        YOUNG_MODULUS * (elastic_thickness_km * 1000.0).powi(3)
            / (12.0 * (1.0 - POISSON_RATIO.powi(2)))
    }

    /// flexural parameter in kilometres
    pub fn flexural_length_km(elastic_thickness_km: f64) -> f64 {
        (4.0 * Self::rigidity(elastic_thickness_km) / (MANTLE_DENSITY * GRAVITY)).powf(0.25)
            / 1000.0
    }

    /// reasons the plate kernel cannot be trusted for this thickness
    pub fn check(elastic_thickness_km: f64) -> Result<(), String> {
        if !(elastic_thickness_km >= MIN_PLATE_THICKNESS_KM) {
            return Err(format!(
                "elastic thickness {} km is below {} km",
                elastic_thickness_km, MIN_PLATE_THICKNESS_KM
            ));
        }
        let rigidity = Self::rigidity(elastic_thickness_km);
        let length = Self::flexural_length_km(elastic_thickness_km);
        if !rigidity.is_finite() || rigidity <= 0.0 || !length.is_finite() || length <= 0.0 {
            return Err(format!("degenerate plate rigidity {:e} N·m", rigidity));
        }
        Ok(())
    }

    fn reach_km(radius_km: f64, elastic_thickness_km: f64) -> f64 {
        radius_km
            .hypot(Self::flexural_length_km(elastic_thickness_km))
            .max(Elastic::reach_km(radius_km, elastic_thickness_km))
    }
}

impl EarthResponseKernel for ThickPlate {
    fn model(&self) -> EarthModel {
        EarthModel::ThickPlate
    }

    fn vertical_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        // the displaced volume of the half-space bowl spread over the wider plate bulge
        let narrow = Elastic::reach_km(radius_km, elastic_thickness_km);
        let broad = Self::reach_km(radius_km, elastic_thickness_km);
        Elastic::central_m(load_height_m, density_kg_m3, radius_km, elastic_thickness_km)
            * (narrow / broad).powi(2)
            * (-(r_km / broad).powi(2)).exp()
    }

    fn lever_km(&self, elastic_thickness_km: f64) -> f64 {
        elastic_thickness_km / 2.0
    }
}

/* # relaxed */

/// long-term equilibrium of the half-space response
#[derive(Clone, Copy, Debug, Default)]
pub struct Relaxed;

impl EarthResponseKernel for Relaxed {
    fn model(&self) -> EarthModel {
        EarthModel::Relaxed
    }

    fn vertical_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        Elastic.vertical_response(
            load_height_m,
            density_kg_m3,
            radius_km,
            r_km,
            elastic_thickness_km,
        )
    }
}

/* # exponential decay */

/// half-space response growing towards equilibrium with time constant `decay_time_years`
#[derive(Clone, Copy, Debug)]
pub struct ExponentialDecay {
    pub decay_time_years: f64,
}

impl EarthResponseKernel for ExponentialDecay {
    fn model(&self) -> EarthModel {
        EarthModel::ExponentialDecay
    }

    fn vertical_response(
        &self,
        load_height_m: f64,
        density_kg_m3: f64,
        radius_km: f64,
        r_km: f64,
        elastic_thickness_km: f64,
    ) -> f64 {
        Elastic.vertical_response(
            load_height_m,
            density_kg_m3,
            radius_km,
            r_km,
            elastic_thickness_km,
        )
    }

    fn time_factor(&self, t_years: f64) -> f64 {
        1.0 - (-t_years.max(0.0) / self.decay_time_years).exp()
    }
}

/* # factory */

/// kernel for the requested model, falling back to the half-space when it would be unstable
pub fn kernel_for(
    model: EarthModel,
    load: &LoadParameters,
    elastic_thickness_km: f64,
) -> DeformResult<(Box<dyn EarthResponseKernel>, Vec<Warning>)> {
    trace!("selecting {} kernel", model);
    match model {
        EarthModel::Elastic => Ok((Box::new(Elastic), Vec::new())),
        EarthModel::Relaxed => Ok((Box::new(Relaxed), Vec::new())),
        EarthModel::ExponentialDecay => {
            let decay_time_years = load
                .decay_time_years
                .ok_or(DeformError::MissingParameter("decay_time_years"))?;
            Ok((
                Box::new(ExponentialDecay { decay_time_years }),
                Vec::new(),
            ))
        }
        EarthModel::ThickPlate => match ThickPlate::check(elastic_thickness_km) {
            Ok(()) => Ok((Box::new(ThickPlate), Vec::new())),
            Err(reason) => {
                let warning = Warning::KernelFallback {
                    requested: EarthModel::ThickPlate,
                    used: EarthModel::Elastic,
                    reason,
                };
                warn!("{}", warning);
                Ok((Box::new(Elastic), vec![warning]))
            }
        },
    }
}
