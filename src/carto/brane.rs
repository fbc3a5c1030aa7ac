use crate::carto::datum::DatumZa;
use num_traits::identities::Zero;
use ord_subset::OrdSubsetIterExt;
use serde::{Deserialize, Serialize};
use std::{
    iter::FromIterator,
    ops::{Add, Div, Mul, Sub},
};

/* # branes */

/// named rectangular raster stored row by row, southernmost row first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Brane<T> {
    pub grid: Vec<T>,
    pub columns: usize,
    pub rows: usize,
    pub variable: String,
}

impl<T> Brane<T> {
    pub fn new(grid: Vec<T>, columns: usize, variable: &str) -> Self {
        let rows = if columns == 0 { 0 } else { grid.len() / columns };
        debug_assert_eq!(rows * columns, grid.len());
        Brane {
            grid,
            columns,
            rows,
            variable: variable.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// whether the datum addresses a node of this brane
    pub fn contains(&self, datum: &DatumZa) -> bool {
        datum.within(self.columns, self.rows)
    }

    /// combine two branes of equal shape value by value
    pub fn zip_with<U, V, F>(&self, other: &Brane<U>, operation: F) -> Brane<V>
    where
        F: Fn(&T, &U) -> V,
    {
        debug_assert_eq!(self.grid.len(), other.grid.len());
        Brane {
            grid: self
                .grid
                .iter()
                .zip(other.grid.iter())
                .map(|(a, b)| operation(a, b))
                .collect(),
            columns: self.columns,
            rows: self.rows,
            variable: format!("zip-{}-{}", self.variable, other.variable),
        }
    }

    pub fn rename(mut self, variable: &str) -> Self {
        self.variable = variable.to_string();
        self
    }
}

impl<T: Clone> Brane<T> {
    /// read a value at given datum
    pub fn read(&self, datum: &DatumZa) -> T {
        self.grid[datum.unravel(self.columns)].clone()
    }

    /// read a value, or nothing when the datum is off the grid
    pub fn get(&self, datum: &DatumZa) -> Option<T> {
        if self.contains(datum) {
            Some(self.read(datum))
        } else {
            None
        }
    }
}

impl<T: Zero + Clone> Brane<T> {
    /// create a new brane filled with zeros
    pub fn zeros(columns: usize, rows: usize) -> Self {
        Brane {
            grid: vec![T::zero(); columns * rows],
            columns,
            rows,
            variable: "zeros".to_string(),
        }
    }
}

macro_rules! impl_op_internal {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: $trait> $trait for Brane<T>
        where
            Vec<T>: FromIterator<<T as $trait>::Output>,
        {
            type Output = Self;

            fn $method(self, other: Self) -> Self {
                Self {
                    grid: self
                        .grid
                        .into_iter()
                        .zip(other.grid.into_iter())
                        .map(|(x, y)| x $op y)
                        .collect::<Vec<T>>(),
                    columns: self.columns,
                    rows: self.rows,
                    variable: format!("op-{}-{}", self.variable, other.variable),
                }
            }
        }
    };
}

macro_rules! impl_op_external {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<T: $trait + Copy> $trait<T> for Brane<T>
        where
            Vec<T>: FromIterator<<T as $trait>::Output>,
        {
            type Output = Self;

            fn $method(self, other: T) -> Self {
                Self {
                    grid: self
                        .grid
                        .into_iter()
                        .map(|x| x $op other)
                        .collect::<Vec<T>>(),
                    columns: self.columns,
                    rows: self.rows,
                    variable: format!("op-{}", self.variable),
                }
            }
        }
    };
}

impl_op_internal!(Add, add, +);
impl_op_internal!(Sub, sub, -);
impl_op_external!(Add, add, +);
impl_op_external!(Sub, sub, -);
impl_op_external!(Mul, mul, *);
impl_op_external!(Div, div, /);

impl Brane<f64> {
    pub fn max(&self) -> Option<f64> {
        self.grid.iter().ord_subset_max().copied()
    }

    pub fn min(&self) -> Option<f64> {
        self.grid.iter().ord_subset_min().copied()
    }

    /// largest absolute value
    pub fn max_abs(&self) -> Option<f64> {
        self.grid.iter().map(|value| value.abs()).ord_subset_max()
    }

    /// share of values whose magnitude exceeds the threshold
    pub fn fraction_above(&self, threshold: f64) -> f64 {
        if self.grid.is_empty() {
            return 0.0;
        }
        self.grid
            .iter()
            .filter(|value| value.abs() > threshold)
            .count() as f64
            / self.grid.len() as f64
    }

    /// whether every value is exactly zero
    pub fn is_zero(&self) -> bool {
        self.grid.iter().all(|value| *value == 0.0)
    }
}
