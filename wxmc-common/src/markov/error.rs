//! Error types for the transition-model engine

use thiserror::Error;

/// Value-level failures raised by cleaning, estimation and projection.
///
/// None of these leave partial state behind: a model is either fully built
/// or the caller's previous model is untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    /// One or more labels are outside the allowed category set
    #[error("Invalid categories: {} (allowed: {})", labels.join(", "), allowed.join(", "))]
    InvalidCategory {
        labels: Vec<String>,
        allowed: Vec<String>,
    },

    /// Nothing to model
    #[error("Observation sequence contains no categories")]
    EmptySequence,

    /// Prediction requested for a state the model does not know
    #[error("Unknown category '{category}'. Must be one of: {}", known.join(", "))]
    UnknownCategory {
        category: String,
        known: Vec<String>,
    },

    /// Negative day count
    #[error("Invalid horizon: {0} (must be >= 0)")]
    InvalidHorizon(i64),

    /// Matrix/category shape or values violate the row-stochastic invariant
    #[error("Malformed transition model: {0}")]
    MalformedModel(String),
}
