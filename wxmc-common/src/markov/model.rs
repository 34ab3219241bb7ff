//! Transition model and prediction result types

use serde::{Deserialize, Serialize};

use super::error::ForecastError;
use super::ROW_SUM_TOLERANCE;

/// First-order Markov transition model over a sorted category list.
///
/// `matrix[i][j]` = P(tomorrow = categories[j] | today = categories[i]).
///
/// # Invariants
///
/// - `categories` is sorted and distinct
/// - `matrix` is square, sized `categories.len()`
/// - every entry is finite and within [0, 1]
/// - every row sums to 1.0 within [`ROW_SUM_TOLERANCE`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionModel {
    categories: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

impl TransitionModel {
    /// Build a model from parts, checking every invariant.
    ///
    /// Used when a model comes from outside the estimator (e.g. a stored row),
    /// so a corrupt record is reported instead of silently used.
    pub fn new(categories: Vec<String>, matrix: Vec<Vec<f64>>) -> Result<Self, ForecastError> {
        if categories.is_empty() {
            return Err(ForecastError::EmptySequence);
        }

        if categories.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ForecastError::MalformedModel(
                "categories must be sorted and distinct".to_string(),
            ));
        }

        let k = categories.len();
        if matrix.len() != k {
            return Err(ForecastError::MalformedModel(format!(
                "expected {} rows, got {}",
                k,
                matrix.len()
            )));
        }

        for (i, row) in matrix.iter().enumerate() {
            if row.len() != k {
                return Err(ForecastError::MalformedModel(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    k
                )));
            }
            if row.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
                return Err(ForecastError::MalformedModel(format!(
                    "row {} has an entry outside [0, 1]",
                    i
                )));
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ForecastError::MalformedModel(format!(
                    "row {} sums to {} (expected 1.0)",
                    i, sum
                )));
            }
        }

        Ok(Self { categories, matrix })
    }

    /// Construct without validation. Caller guarantees the invariants.
    pub(crate) fn from_parts_unchecked(categories: Vec<String>, matrix: Vec<Vec<f64>>) -> Self {
        Self { categories, matrix }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Number of states (k)
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Index of a category in canonical order
    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .ok()
    }

    /// One-step transition probabilities out of `category`
    pub fn row(&self, category: &str) -> Option<&[f64]> {
        self.index_of(category).map(|i| self.matrix[i].as_slice())
    }
}

/// Probability of each state after N steps, plus the argmax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub categories: Vec<String>,
    pub probabilities: Vec<f64>,
    pub most_likely: String,
}
