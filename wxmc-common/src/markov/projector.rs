//! N-step projection of a transition model

use super::cleaner::normalize_label;
use super::error::ForecastError;
use super::model::{PredictionResult, TransitionModel};

/// k×k identity matrix (the 0th power of any transition matrix)
pub fn identity(k: usize) -> Vec<Vec<f64>> {
    (0..k)
        .map(|i| {
            let mut row = vec![0.0; k];
            row[i] = 1.0;
            row
        })
        .collect()
}

/// Square matrix product `a · b`
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = a.len();
    let mut out = vec![vec![0.0; k]; k];
    for i in 0..k {
        for (l, &a_il) in a[i].iter().enumerate() {
            if a_il == 0.0 {
                continue;
            }
            for j in 0..k {
                out[i][j] += a_il * b[l][j];
            }
        }
    }
    out
}

/// Raise a square matrix to the `n`th power by repeated squaring.
///
/// Entries of a row-stochastic matrix stay in [0, 1] under multiplication,
/// so large horizons do not overflow.
pub fn matrix_power(matrix: &[Vec<f64>], mut n: u64) -> Vec<Vec<f64>> {
    let mut result = identity(matrix.len());
    let mut base = matrix.to_vec();

    while n > 0 {
        if n & 1 == 1 {
            result = multiply(&result, &base);
        }
        n >>= 1;
        if n > 0 {
            base = multiply(&base, &base);
        }
    }

    result
}

/// Index of the largest value; ties go to the lowest index.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Probability of each state `n_days` steps after `current_state`.
///
/// `current_state` is normalized (trim + lowercase) before lookup. A horizon
/// of 0 yields a one-hot distribution at `current_state`.
pub fn predict(
    model: &TransitionModel,
    current_state: &str,
    n_days: i64,
) -> Result<PredictionResult, ForecastError> {
    let state = normalize_label(current_state);
    let index = model
        .index_of(&state)
        .ok_or_else(|| ForecastError::UnknownCategory {
            category: state.clone(),
            known: model.categories().to_vec(),
        })?;

    if n_days < 0 {
        return Err(ForecastError::InvalidHorizon(n_days));
    }

    let powered = matrix_power(model.matrix(), n_days as u64);
    let probabilities = powered[index].clone();
    let most_likely = model.categories()[argmax(&probabilities)].clone();

    Ok(PredictionResult {
        categories: model.categories().to_vec(),
        probabilities,
        most_likely,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::cleaner::CategorySet;
    use crate::markov::estimator::estimate;

    fn weather_model() -> TransitionModel {
        TransitionModel::new(
            vec!["fog".into(), "rain".into(), "sun".into()],
            vec![
                vec![0.2, 0.3, 0.5],
                vec![0.1, 0.6, 0.3],
                vec![0.05, 0.15, 0.8],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_horizon_zero_is_one_hot() {
        let model = weather_model();
        let result = predict(&model, "rain", 0).unwrap();

        assert_eq!(result.probabilities, vec![0.0, 1.0, 0.0]);
        assert_eq!(result.most_likely, "rain");
    }

    #[test]
    fn test_horizon_one_equals_matrix_row() {
        let seq = CategorySet::default()
            .clean(&["sun", "rain", "rain", "fog", "sun", "sun", "drizzle", "rain"])
            .unwrap();
        let model = estimate(&seq).unwrap();

        for category in model.categories() {
            let result = predict(&model, category, 1).unwrap();
            assert_eq!(result.probabilities.as_slice(), model.row(category).unwrap());
        }
    }

    #[test]
    fn test_horizon_two_matches_manual_product() {
        let model = weather_model();
        let result = predict(&model, "fog", 2).unwrap();

        let m = model.matrix();
        for j in 0..3 {
            let expected: f64 = (0..3).map(|l| m[0][l] * m[l][j]).sum();
            assert!((result.probabilities[j] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_long_horizon_stays_stochastic() {
        let model = weather_model();
        let result = predict(&model, "sun", 500).unwrap();

        let sum: f64 = result.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum = {}", sum);
        assert!(result.probabilities.iter().all(|p| p.is_finite() && *p >= 0.0));
        assert_eq!(result.most_likely, "sun");
    }

    #[test]
    fn test_matrix_power_matches_iterated_multiplication() {
        let model = weather_model();
        let mut iterated = identity(3);
        for _ in 0..13 {
            iterated = multiply(&iterated, model.matrix());
        }
        let squared = matrix_power(model.matrix(), 13);

        for i in 0..3 {
            for j in 0..3 {
                assert!((iterated[i][j] - squared[i][j]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_ties_break_to_first_category() {
        let model = TransitionModel::new(
            vec!["fog".into(), "rain".into(), "sun".into()],
            vec![
                vec![0.25, 0.5, 0.25],
                vec![0.0, 0.5, 0.5],
                vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
            ],
        )
        .unwrap();

        assert_eq!(predict(&model, "rain", 1).unwrap().most_likely, "rain");
        assert_eq!(predict(&model, "sun", 1).unwrap().most_likely, "fog");
    }

    #[test]
    fn test_negative_horizon_is_rejected() {
        let err = predict(&weather_model(), "rain", -1).unwrap_err();
        assert_eq!(err, ForecastError::InvalidHorizon(-1));
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let err = predict(&weather_model(), "hail", 3).unwrap_err();
        match err {
            ForecastError::UnknownCategory { category, known } => {
                assert_eq!(category, "hail");
                assert_eq!(known, vec!["fog", "rain", "sun"]);
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_state_lookup_is_normalized() {
        let result = predict(&weather_model(), "  Rain", 1).unwrap();
        assert_eq!(result.probabilities, vec![0.1, 0.6, 0.3]);
        assert_eq!(result.categories, vec!["fog", "rain", "sun"]);
    }
}
