use crate::{
    carto::{brane::Brane, datum::DatumZa},
    crust::strain::{self, PrincipalStrain},
    error::DeformError,
    units::{Microstrain, Unit},
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/* # components */

/// scalar quantities a renderer can draw from a field
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    VerticalDisplacement,
    HorizontalDisplacement,
    StrainMagnitude,
}

impl Component {
    pub fn array() -> [Component; 3] {
        [
            Component::VerticalDisplacement,
            Component::HorizontalDisplacement,
            Component::StrainMagnitude,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Component::VerticalDisplacement => "vertical_displacement",
            Component::HorizontalDisplacement => "horizontal_displacement",
            Component::StrainMagnitude => "strain_magnitude",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Component::VerticalDisplacement | Component::HorizontalDisplacement => "m",
            Component::StrainMagnitude => "µε",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Component {
    type Err = DeformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Component::array()
            .into_iter()
            .find(|component| component.name() == value)
            .ok_or_else(|| DeformError::Unsupported {
                kind: "component",
                value: value.to_string(),
            })
    }
}

/* # fields */

/// surface deformation over the whole grid at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeformationField {
    pub time_years: f64,
    /// metres, positive up
    pub vertical_displacement: Brane<f64>,
    pub horizontal_displacement_e: Brane<f64>,
    pub horizontal_displacement_n: Brane<f64>,
    pub strain_xx: Brane<f64>,
    pub strain_yy: Brane<f64>,
    pub strain_xy: Brane<f64>,
}

impl DeformationField {
    /// assemble a field, deriving strain from the horizontal displacements
    pub fn from_displacement(
        time_years: f64,
        vertical: Brane<f64>,
        east: Brane<f64>,
        north: Brane<f64>,
        spacing_km: f64,
    ) -> Self {
        let strain = strain::strain_field(&east, &north, spacing_km);
        Self {
            time_years,
            vertical_displacement: vertical.rename("vertical-displacement"),
            horizontal_displacement_e: east.rename("horizontal-displacement-e"),
            horizontal_displacement_n: north.rename("horizontal-displacement-n"),
            strain_xx: strain.xx,
            strain_yy: strain.yy,
            strain_xy: strain.xy,
        }
    }

    pub fn len(&self) -> usize {
        self.vertical_displacement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertical_displacement.is_empty()
    }

    pub fn horizontal_magnitude(&self) -> Brane<f64> {
        self.horizontal_displacement_e
            .zip_with(&self.horizontal_displacement_n, |e, n| e.hypot(*n))
            .rename("horizontal-displacement")
    }

    /// strain intensity in microstrain
    pub fn strain_magnitude(&self) -> Brane<f64> {
        Brane::new(
            (0..self.len())
                .map(|j| {
                    Microstrain::from_strain(strain::strain_magnitude(
                        self.strain_xx.grid[j],
                        self.strain_yy.grid[j],
                        self.strain_xy.grid[j],
                    ))
                    .release()
                })
                .collect(),
            self.strain_xx.columns,
            "strain-magnitude",
        )
    }

    pub fn volumetric_strain(&self) -> Brane<f64> {
        self.strain_xx
            .zip_with(&self.strain_yy, |xx, yy| strain::volumetric_strain(*xx, *yy))
            .rename("volumetric-strain")
    }

    pub fn component(&self, component: Component) -> Brane<f64> {
        match component {
            Component::VerticalDisplacement => self.vertical_displacement.clone(),
            Component::HorizontalDisplacement => self.horizontal_magnitude(),
            Component::StrainMagnitude => self.strain_magnitude(),
        }
    }

    /// value of a component at one node, if the node lies on the grid
    pub fn value(&self, component: Component, datum: &DatumZa) -> Option<f64> {
        let vertical = self.vertical_displacement.get(datum)?;
        let (xx, yy, xy) = self.strain_at(datum)?;
        Some(match component {
            Component::VerticalDisplacement => vertical,
            Component::HorizontalDisplacement => self
                .horizontal_displacement_e
                .read(datum)
                .hypot(self.horizontal_displacement_n.read(datum)),
            Component::StrainMagnitude => {
                Microstrain::from_strain(strain::strain_magnitude(xx, yy, xy)).release()
            }
        })
    }

    /// strain tensor at one node
    pub fn strain_at(&self, datum: &DatumZa) -> Option<(f64, f64, f64)> {
        Some((
            self.strain_xx.get(datum)?,
            self.strain_yy.get(datum)?,
            self.strain_xy.get(datum)?,
        ))
    }

    pub fn principal_at(&self, datum: &DatumZa) -> Option<PrincipalStrain> {
        self.strain_at(datum)
            .map(|(xx, yy, xy)| strain::principal(xx, yy, xy))
    }
}
