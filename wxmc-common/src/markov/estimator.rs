//! Transition counting and row normalization
//!
//! Zero-row policy: a category never observed as the "from" side of a pair
//! gets a uniform row (1/k each) instead of an undefined one.

use super::cleaner::ObservationSequence;
use super::error::ForecastError;
use super::model::TransitionModel;
use super::ROW_SUM_TOLERANCE;

/// Count adjacent-pair transitions over `categories` (canonical order).
///
/// `counts[i][j]` is the number of times `categories[j]` directly follows
/// `categories[i]` in `sequence`.
pub fn transition_counts(sequence: &ObservationSequence) -> Vec<Vec<u64>> {
    let categories = sequence.categories();
    let k = categories.len();
    let mut counts = vec![vec![0u64; k]; k];

    let indices: Vec<usize> = sequence
        .labels()
        .iter()
        .filter_map(|label| categories.binary_search(label).ok())
        .collect();

    for pair in indices.windows(2) {
        counts[pair[0]][pair[1]] += 1;
    }

    counts
}

/// Estimate a row-stochastic transition model from a cleaned sequence.
///
/// A sequence with no adjacent pairs (length 1) yields all-uniform rows.
/// Fails with [`ForecastError::EmptySequence`] when there is nothing to model.
pub fn estimate(sequence: &ObservationSequence) -> Result<TransitionModel, ForecastError> {
    let categories = sequence.categories();
    if categories.is_empty() {
        return Err(ForecastError::EmptySequence);
    }

    let k = categories.len();
    let uniform = 1.0 / k as f64;

    let mut matrix: Vec<Vec<f64>> = transition_counts(sequence)
        .into_iter()
        .map(|row| {
            let total: u64 = row.iter().sum();
            if total == 0 {
                return vec![uniform; k];
            }
            row.into_iter()
                .map(|count| {
                    let p = count as f64 / total as f64;
                    if p.is_finite() {
                        p
                    } else {
                        uniform
                    }
                })
                .collect()
        })
        .collect();

    // Second pass: any row whose sum drifted is rescaled by its own sum
    for row in &mut matrix {
        let sum: f64 = row.iter().sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            if sum > 0.0 && sum.is_finite() {
                row.iter_mut().for_each(|p| *p /= sum);
            } else {
                row.iter_mut().for_each(|p| *p = uniform);
            }
        }
    }

    Ok(TransitionModel::from_parts_unchecked(
        categories.to_vec(),
        matrix,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::cleaner::CategorySet;

    fn clean(labels: &[&str]) -> ObservationSequence {
        CategorySet::default().clean(labels).unwrap()
    }

    fn assert_rows_stochastic(model: &TransitionModel) {
        for (i, row) in model.matrix().iter().enumerate() {
            let sum: f64 = row.iter().sum();
            assert!(
                (sum - 1.0).abs() < 1e-9,
                "row {} ({}) sums to {}",
                i,
                model.categories()[i],
                sum
            );
        }
    }

    #[test]
    fn test_counts_adjacent_pairs() {
        let seq = clean(&["rain", "rain", "sun", "rain", "fog"]);
        let counts = transition_counts(&seq);

        // categories: fog, rain, sun
        assert_eq!(counts, vec![vec![0, 0, 0], vec![1, 1, 1], vec![0, 1, 0]]);
    }

    #[test]
    fn test_mixed_case_scenario() {
        let cleaner = CategorySet::new(["rain", "sun", "fog"]);
        let seq = cleaner
            .clean(&["rain", "Rain ", "sun", "RAIN", "fog"])
            .unwrap();
        let model = estimate(&seq).unwrap();

        let third = 1.0 / 3.0;
        assert_eq!(model.categories(), &["fog", "rain", "sun"]);
        // fog never appears as a "from" state
        assert_eq!(model.row("fog").unwrap(), &[third, third, third]);
        assert_eq!(model.row("rain").unwrap(), &[third, third, third]);
        assert_eq!(model.row("sun").unwrap(), &[0.0, 1.0, 0.0]);
        assert_rows_stochastic(&model);
    }

    #[test]
    fn test_zero_rows_are_exactly_uniform() {
        // drizzle only appears as the final observation
        let seq = clean(&["sun", "sun", "rain", "sun", "drizzle"]);
        let model = estimate(&seq).unwrap();

        let k = model.len() as f64;
        assert_eq!(model.row("drizzle").unwrap(), &vec![1.0 / k; model.len()][..]);
        assert_rows_stochastic(&model);
    }

    #[test]
    fn test_rows_sum_to_one_on_longer_sequence() {
        let labels: Vec<&str> = ["sun", "rain", "drizzle", "fog", "snow", "sun", "sun"]
            .iter()
            .cycle()
            .take(211)
            .copied()
            .collect();
        let model = estimate(&clean(&labels)).unwrap();

        assert_eq!(model.len(), 5);
        assert_rows_stochastic(&model);
        for row in model.matrix() {
            assert!(row.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_single_observation_yields_uniform_model() {
        let model = estimate(&clean(&["Sun"])).unwrap();

        assert_eq!(model.categories(), &["sun"]);
        assert_eq!(model.matrix(), &[vec![1.0]]);
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let seq = CategorySet::default().clean::<&str>(&[]).unwrap();
        assert_eq!(estimate(&seq).unwrap_err(), ForecastError::EmptySequence);
    }

    #[test]
    fn test_estimated_model_passes_validation() {
        let model = estimate(&clean(&["sun", "rain", "rain", "fog", "sun"])).unwrap();
        let rebuilt =
            TransitionModel::new(model.categories().to_vec(), model.matrix().to_vec()).unwrap();
        assert_eq!(rebuilt, model);
    }
}
