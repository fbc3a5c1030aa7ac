use crate::vars::*;
use serde::{Deserialize, Serialize};

pub trait Unit<T> {
    fn confine(value: T) -> Self;
    fn release(self) -> T;
}

/// strain scaled by a million
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Microstrain(f64);

impl Microstrain {
    pub fn from_strain(strain: f64) -> Self {
        Self(strain * 1.0e6)
    }

    pub fn strain(self) -> f64 {
        self.0 * 1.0e-6
    }
}

impl Unit<f64> for Microstrain {
    fn confine(value: f64) -> Self {
        Self(value)
    }

    fn release(self) -> f64 {
        self.0
    }
}

/// normal stress exerted on the surface
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pascal(f64);

impl Pascal {
    /// pressure under a column of material
    pub fn from_column(height_m: f64, density_kg_m3: f64) -> Self {
        Self(height_m * density_kg_m3 * GRAVITY)
    }
}

impl Unit<f64> for Pascal {
    fn confine(value: f64) -> Self {
        Self(value)
    }

    fn release(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.000_001;

    #[test]
    fn microstrain_scaling() {
        assert_float_eq!(Microstrain::from_strain(2.0e-6).release(), 2.0, abs <= EPSILON);
        assert_float_eq!(Microstrain::confine(3.0).strain(), 3.0e-6, abs <= EPSILON);
    }

    #[test]
    fn ice_column_pressure() {
        assert_float_eq!(
            Pascal::from_column(100.0, ICE_DENSITY).release(),
            882_900.0,
            rmax <= EPSILON
        );
    }
}
