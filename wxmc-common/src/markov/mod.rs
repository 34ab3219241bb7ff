//! First-order Markov transition engine
//!
//! Pipeline: raw labels → [`CategorySet::clean`] → [`ObservationSequence`]
//! → [`estimate`] → [`TransitionModel`] → [`predict`] → [`PredictionResult`].
//!
//! Everything here is pure and synchronous. Callers own persistence and
//! logging.

pub mod cleaner;
pub mod error;
pub mod estimator;
pub mod model;
pub mod projector;

pub use cleaner::{normalize_label, CategorySet, ObservationSequence, DEFAULT_CATEGORIES};
pub use error::ForecastError;
pub use estimator::{estimate, transition_counts};
pub use model::{PredictionResult, TransitionModel};
pub use projector::{matrix_power, predict};

/// Tolerance for row sums of a transition matrix
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;
