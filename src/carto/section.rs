use crate::{
    carto::{brane::Brane, datum::DatumZa, grid::unwrap_longitude},
    error::{DeformError, DeformResult},
};
use geo::{algorithm::haversine_distance::HaversineDistance, Point};
use log::trace;
use serde::{Deserialize, Serialize};

/// one sample along a profile line
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionPoint {
    /// great-circle distance from the start of the line
    pub distance_km: f64,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// lower node and weight of the upper node enclosing a value on an increasing axis
fn bracket(axis: &[f64], value: f64) -> Option<(usize, f64)> {
    let (first, last) = (*axis.first()?, *axis.last()?);
    let slack = 1.0e-9 * (1.0 + first.abs().max(last.abs()));
    if !value.is_finite() || value < first - slack || value > last + slack {
        return None;
    }
    if axis.len() == 1 {
        return Some((0, 0.0));
    }
    let value = value.clamp(first, last);
    let upper = axis
        .partition_point(|node| *node <= value)
        .clamp(1, axis.len() - 1);
    let lower = upper - 1;
    Some((lower, (value - axis[lower]) / (axis[upper] - axis[lower])))
}

/// bilinear interpolation of a raster laid out on the given axes
pub fn bilinear(brane: &Brane<f64>, lats: &[f64], lons: &[f64], lat: f64, lon: f64) -> DeformResult<f64> {
    let middle = match (lons.first(), lons.last()) {
        (Some(first), Some(last)) => (first + last) / 2.0,
        _ => lon,
    };
    let unwrapped = unwrap_longitude(lon, middle);
    let ((column, wx), (row, wy)) = match (bracket(lons, unwrapped), bracket(lats, lat)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(DeformError::OutOfDomain { lat, lon }),
    };
    let east = (column + 1).min(brane.columns - 1);
    let north = (row + 1).min(brane.rows - 1);
    let at = |x: usize, y: usize| brane.read(&DatumZa::new(x as i32, y as i32));
    let south_edge = at(column, row) * (1.0 - wx) + at(east, row) * wx;
    let north_edge = at(column, north) * (1.0 - wx) + at(east, north) * wx;
    Ok(south_edge * (1.0 - wy) + north_edge * wy)
}

/// evenly spaced samples of a raster along the line between two coordinates
pub fn cross_section(
    brane: &Brane<f64>,
    lats: &[f64],
    lons: &[f64],
    start: (f64, f64),
    end: (f64, f64),
    samples: usize,
) -> DeformResult<Vec<SectionPoint>> {
    trace!("sampling {} along a profile", brane.variable);
    if samples < 2 {
        return Err(DeformError::invalid("samples", "at least 2 samples are needed"));
    }
    let origin = Point::new(start.1, start.0);
    // take the short way round
    let end_lon = unwrap_longitude(end.1, start.1);
    (0..samples)
        .map(|j| {
            let fraction = j as f64 / (samples - 1) as f64;
            let lat = start.0 + (end.0 - start.0) * fraction;
            let lon = start.1 + (end_lon - start.1) * fraction;
            Ok(SectionPoint {
                distance_km: origin.haversine_distance(&Point::new(lon, lat)) / 1000.0,
                lat,
                lon,
                value: bilinear(brane, lats, lons, lat, lon)?,
            })
        })
        .collect()
}
