use crate::carto::{brane::Brane, datum::DatumZa};
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

/* # finite differences */

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Axis {
    East,
    North,
}

/// derivative along an axis, central inside the grid and one-sided on its edges
pub fn partial(brane: &Brane<f64>, axis: Axis, spacing_m: f64) -> Brane<f64> {
    let columns = brane.columns;
    let values = &brane.grid;
    let grid = (0..values.len())
        .map(|jndex| {
            let datum = DatumZa::enravel(jndex, columns);
            let (position, extent, stride) = match axis {
                Axis::East => (datum.x as usize, columns, 1),
                Axis::North => (datum.y as usize, brane.rows, columns),
            };
            if extent < 2 {
                0.0
            } else if position == 0 {
                (values[jndex + stride] - values[jndex]) / spacing_m
            } else if position == extent - 1 {
                (values[jndex] - values[jndex - stride]) / spacing_m
            } else {
                (values[jndex + stride] - values[jndex - stride]) / (2.0 * spacing_m)
            }
        })
        .collect::<Vec<f64>>();
    Brane::new(grid, columns, &format!("d-{}", brane.variable))
}

/* # strain */

#[derive(Clone, Debug, PartialEq)]
pub struct Strain {
    pub xx: Brane<f64>,
    pub yy: Brane<f64>,
    pub xy: Brane<f64>,
}

/// horizontal strain tensor of a displacement field given in metres on a km grid
pub fn strain_field(east: &Brane<f64>, north: &Brane<f64>, spacing_km: f64) -> Strain {
    let spacing_m = spacing_km * 1000.0;
    let de_dy = partial(east, Axis::North, spacing_m);
    let dn_dx = partial(north, Axis::East, spacing_m);
    Strain {
        xx: partial(east, Axis::East, spacing_m).rename("strain-xx"),
        yy: partial(north, Axis::North, spacing_m).rename("strain-yy"),
        xy: de_dy
            .zip_with(&dn_dx, |a, b| 0.5 * (a + b))
            .rename("strain-xy"),
    }
}

/// scalar strain intensity, dimensionless
pub fn strain_magnitude(xx: f64, yy: f64, xy: f64) -> f64 {
    (0.5 * (xx.powi(2) + yy.powi(2) + 2.0 * xy.powi(2))).sqrt()
}

/// areal strain, positive for dilation
pub fn volumetric_strain(xx: f64, yy: f64) -> f64 {
    xx + yy
}

/* # principal strains */

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrincipalStrain {
    pub major: f64,
    pub minor: f64,
    pub max_shear: f64,
    /// direction of the major axis, degrees clockwise from north in [0, 180)
    pub azimuth_deg: f64,
}

pub fn principal(xx: f64, yy: f64, xy: f64) -> PrincipalStrain {
    let eigen = Matrix2::new(xx, xy, xy, yy).symmetric_eigen();
    let (major_index, minor_index) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let major = eigen.eigenvalues[major_index];
    let minor = eigen.eigenvalues[minor_index];
    let axis = eigen.eigenvectors.column(major_index);
    // x is east and y north
    let azimuth_deg = axis[0].atan2(axis[1]).to_degrees().rem_euclid(180.0);
    PrincipalStrain {
        major,
        minor,
        max_shear: 0.5 * (major - minor),
        azimuth_deg: if azimuth_deg >= 180.0 - 1.0e-9 { 0.0 } else { azimuth_deg },
    }
}
