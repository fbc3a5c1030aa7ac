use crate::{
    carto::{
        brane::Brane,
        datum::{DatumRe, DatumZa},
    },
    error::{finite, positive, DeformError, DeformResult},
    vars::*,
};
use itertools::iproduct;
use log::trace;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
    pub x_km: f64,
    pub y_km: f64,
    /// distance from the centre, never below `MIN_DISTANCE_KM`
    pub r_km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// nodes ordered row by row, south to north, west to east within a row
    pub points: Vec<GridPoint>,
    pub columns: usize,
    pub rows: usize,
    pub spacing_km: f64,
    pub center_lat: f64,
    pub center_lon: f64,
    /// width actually covered after rounding up to whole cells
    pub effective_width_km: f64,
    pub effective_height_km: f64,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

/// kilometres spanned by one degree of longitude at the given latitude
pub fn km_per_degree_lon(lat: f64) -> f64 {
    KM_PER_DEGREE * lat.to_radians().cos()
}

/// number of whole cells needed to cover a span, tolerating rounding noise
fn cells(span_km: f64, spacing_km: f64) -> usize {
    ((span_km / spacing_km) - 1.0e-9).ceil().max(1.0) as usize
}

/// nodes evenly spaced from `-cells/2` to `+cells/2` spacings around zero
fn axis(cells: usize, spacing_km: f64) -> Vec<f64> {
    let half = cells as f64 * spacing_km / 2.0;
    (0..=cells)
        .map(|j| j as f64 * spacing_km - half)
        .collect()
}

pub fn validate_center(center_lat: f64, center_lon: f64) -> DeformResult<()> {
    finite("center_lat", center_lat)?;
    finite("center_lon", center_lon)?;
    if center_lat.abs() > MAX_ABS_LATITUDE {
        return Err(DeformError::invalid(
            "center_lat",
            format!("must lie within ±{} degrees", MAX_ABS_LATITUDE),
        ));
    }
    if center_lon.abs() > 180.0 {
        return Err(DeformError::invalid(
            "center_lon",
            "must lie within ±180 degrees",
        ));
    }
    Ok(())
}

/// number of nodes a region would be sampled with, without allocating it
pub fn node_count(width_km: f64, height_km: f64, resolution_km: f64) -> DeformResult<u128> {
    let width_km = positive("region_width_km", width_km)?;
    let height_km = positive("region_height_km", height_km)?;
    let resolution_km = positive("resolution_km", resolution_km)?;
    // saturated counts stay above any cap
    let columns = cells(width_km, resolution_km) as u128 + 1;
    let rows = cells(height_km, resolution_km) as u128 + 1;
    Ok(columns.saturating_mul(rows))
}

/// build a grid centred on a point, refusing more nodes than `MAX_CELLS`
///
/// Offsets map to coordinates with an equirectangular approximation: a degree
/// of latitude spans `KM_PER_DEGREE` and a degree of longitude spans
/// `KM_PER_DEGREE * cos(center_lat)`. It holds for regions up to a few hundred
/// kilometres across. The region may not reach over a pole. Longitudes keep
/// increasing across the antimeridian, so an axis may run past ±180.
pub fn build_grid(
    center_lat: f64,
    center_lon: f64,
    width_km: f64,
    height_km: f64,
    resolution_km: f64,
) -> DeformResult<Grid> {
    build_grid_capped(
        center_lat,
        center_lon,
        width_km,
        height_km,
        resolution_km,
        MAX_CELLS,
    )
}

pub fn build_grid_capped(
    center_lat: f64,
    center_lon: f64,
    width_km: f64,
    height_km: f64,
    resolution_km: f64,
    cap: usize,
) -> DeformResult<Grid> {
    trace!("building grid");
    validate_center(center_lat, center_lon)?;
    let count = node_count(width_km, height_km, resolution_km)?;
    if count > cap as u128 {
        return Err(DeformError::TooManyCells { cells: count, cap });
    }

    let columns_cells = cells(width_km, resolution_km);
    let rows_cells = cells(height_km, resolution_km);
    let effective_width_km = columns_cells as f64 * resolution_km;
    let effective_height_km = rows_cells as f64 * resolution_km;
    if center_lat.abs() + effective_height_km / 2.0 / KM_PER_DEGREE > 90.0 {
        return Err(DeformError::invalid(
            "region_height_km",
            format!("region reaches over a pole from latitude {}", center_lat),
        ));
    }
    let lon_scale = km_per_degree_lon(center_lat);
    if effective_width_km / lon_scale > 360.0 {
        return Err(DeformError::invalid(
            "region_width_km",
            format!("region wraps more than once around latitude {}", center_lat),
        ));
    }

    let xs = axis(columns_cells, resolution_km);
    let ys = axis(rows_cells, resolution_km);
    let lats = ys
        .iter()
        .map(|y| center_lat + y / KM_PER_DEGREE)
        .collect::<Vec<f64>>();
    let lons = xs
        .iter()
        .map(|x| center_lon + x / lon_scale)
        .collect::<Vec<f64>>();

    let points = iproduct!(0..ys.len(), 0..xs.len())
        .map(|(row, column)| GridPoint {
            lat: lats[row],
            lon: lons[column],
            x_km: xs[column],
            y_km: ys[row],
            r_km: xs[column].hypot(ys[row]).max(MIN_DISTANCE_KM),
        })
        .collect::<Vec<GridPoint>>();

    if effective_width_km > width_km + 1.0e-9 || effective_height_km > height_km + 1.0e-9 {
        trace!(
            "region rounded up to {} × {} km",
            effective_width_km,
            effective_height_km
        );
    }

    Ok(Grid {
        points,
        columns: xs.len(),
        rows: ys.len(),
        spacing_km: resolution_km,
        center_lat,
        center_lon,
        effective_width_km,
        effective_height_km,
        lats,
        lons,
    })
}

/// shift a longitude by whole turns to lie within half a turn of `reference`
pub fn unwrap_longitude(lon: f64, reference: f64) -> f64 {
    lon + 360.0 * ((reference - lon) / 360.0).round()
}

/// nearest node along a monotonically increasing axis, if the value is covered
fn nearest_on_axis(axis: &[f64], value: f64) -> Option<usize> {
    let (first, last) = (*axis.first()?, *axis.last()?);
    let slack = 1.0e-9 * (1.0 + first.abs().max(last.abs()));
    if !value.is_finite() || value < first - slack || value > last + slack {
        return None;
    }
    axis.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (*a - value)
                .abs()
                .partial_cmp(&(*b - value).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(j, _)| j)
}

/// nearest grid node to a coordinate on the given axes
pub fn nearest_node(lats: &[f64], lons: &[f64], lat: f64, lon: f64) -> DeformResult<DatumZa> {
    let middle = match (lons.first(), lons.last()) {
        (Some(first), Some(last)) => (first + last) / 2.0,
        _ => lon,
    };
    let unwrapped = unwrap_longitude(lon, middle);
    match (nearest_on_axis(lons, unwrapped), nearest_on_axis(lats, lat)) {
        (Some(column), Some(row)) => Ok(DatumZa::new(column as i32, row as i32)),
        _ => Err(DeformError::OutOfDomain { lat, lon }),
    }
}

impl Grid {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, datum: &DatumZa) -> Option<&GridPoint> {
        if datum.within(self.columns, self.rows) {
            self.points.get(datum.unravel(self.columns))
        } else {
            None
        }
    }

    /// node closest to the given coordinate
    pub fn locate(&self, lat: f64, lon: f64) -> DeformResult<DatumZa> {
        nearest_node(&self.lats, &self.lons, lat, lon)
    }

    /// node at the centre of the region
    pub fn center(&self) -> DatumZa {
        DatumZa::new((self.columns / 2) as i32, (self.rows / 2) as i32)
    }

    /// local offset of a geographic coordinate from the centre
    pub fn offset(&self, lat: f64, lon: f64) -> DatumRe {
        DatumRe {
            x: (unwrap_longitude(lon, self.center_lon) - self.center_lon)
                * km_per_degree_lon(self.center_lat),
            y: (lat - self.center_lat) * KM_PER_DEGREE,
        }
    }

    /// raster of any per-point quantity, named after it
    pub fn brane<F>(&self, variable: &str, quantity: F) -> Brane<f64>
    where
        F: Fn(&GridPoint) -> f64,
    {
        Brane::new(
            self.points.iter().map(quantity).collect(),
            self.columns,
            variable,
        )
    }
}
