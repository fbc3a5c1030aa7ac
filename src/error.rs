use crate::crust::kernel::EarthModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// failures that abort a simulation or a query against its results
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeformError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("unsupported {kind} `{value}`")]
    Unsupported { kind: &'static str, value: String },

    #[error("missing parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("simulation of {cells} cells exceeds the cap of {cap} cells")]
    TooManyCells { cells: u128, cap: usize },

    #[error("target ({lat:.4}, {lon:.4}) lies outside the simulated region")]
    OutOfDomain { lat: f64, lon: f64 },

    #[error("time index {index} out of range for {steps} time steps")]
    TimeIndex { index: usize, steps: usize },
}

pub type DeformResult<T> = Result<T, DeformError>;

impl DeformError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        DeformError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// require a finite, strictly positive value
pub fn positive(name: &'static str, value: f64) -> DeformResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DeformError::invalid(
            name,
            format!("must be positive and finite, got {}", value),
        ))
    }
}

/// require a finite value
pub fn finite(name: &'static str, value: f64) -> DeformResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DeformError::invalid(name, format!("must be finite, got {}", value)))
    }
}

/// recoverable conditions attached to results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    KernelFallback {
        requested: EarthModel,
        used: EarthModel,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::KernelFallback {
                requested,
                used,
                reason,
            } => write!(f, "{} kernel replaced by {}: {}", requested, used, reason),
        }
    }
}
