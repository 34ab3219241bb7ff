//! Label normalization and validation against the allowed category set

use std::collections::BTreeSet;

use super::error::ForecastError;
use super::model::TransitionModel;

/// Categories accepted when no other set is configured
pub const DEFAULT_CATEGORIES: [&str; 5] = ["drizzle", "fog", "rain", "snow", "sun"];

/// Trim surrounding whitespace and lowercase a raw label.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A cleaned, validated, time-ordered sequence of categories.
///
/// Carries the canonical category ordering (sorted distinct labels) derived
/// from its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationSequence {
    labels: Vec<String>,
    categories: Vec<String>,
}

impl ObservationSequence {
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Sorted distinct labels
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The fixed set of labels a sequence may contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    allowed: BTreeSet<String>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl CategorySet {
    /// Build a set; entries are normalized the same way labels are.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|s| normalize_label(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.allowed.contains(category)
    }

    /// Allowed categories in sorted order
    pub fn to_vec(&self) -> Vec<String> {
        self.allowed.iter().cloned().collect()
    }

    /// Normalize every label, then validate the inferred category set.
    ///
    /// Fails with [`ForecastError::InvalidCategory`] naming every distinct
    /// offending label; no partial result is produced.
    pub fn clean<S: AsRef<str>>(&self, raw_labels: &[S]) -> Result<ObservationSequence, ForecastError> {
        let labels: Vec<String> = raw_labels
            .iter()
            .map(|l| normalize_label(l.as_ref()))
            .collect();

        let distinct: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
        self.check_all(distinct.iter().copied())?;

        let categories = distinct.into_iter().map(str::to_string).collect();

        Ok(ObservationSequence { labels, categories })
    }

    /// Reject a model built under a different (e.g. wider) category set.
    pub fn check_model(&self, model: &TransitionModel) -> Result<(), ForecastError> {
        self.check_all(model.categories().iter().map(String::as_str))
    }

    /// [`ForecastError::InvalidCategory`] listing every distinct outsider
    fn check_all<'a>(&self, categories: impl Iterator<Item = &'a str>) -> Result<(), ForecastError> {
        let invalid: BTreeSet<&str> = categories.filter(|c| !self.allowed.contains(*c)).collect();

        if invalid.is_empty() {
            return Ok(());
        }
        Err(ForecastError::InvalidCategory {
            labels: invalid.into_iter().map(str::to_string).collect(),
            allowed: self.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> CategorySet {
        CategorySet::new(names.iter().copied())
    }

    #[test]
    fn test_clean_trims_and_lowercases() {
        let cleaner = set(&["rain", "sun", "fog"]);
        let seq = cleaner
            .clean(&["rain", "Rain ", "sun", "RAIN", "fog"])
            .unwrap();

        assert_eq!(seq.labels(), &["rain", "rain", "sun", "rain", "fog"]);
        assert_eq!(seq.categories(), &["fog", "rain", "sun"]);
        assert_eq!(seq.len(), 5);
    }

    #[test]
    fn test_clean_rejects_unknown_label() {
        let cleaner = CategorySet::default();
        let err = cleaner.clean(&["rain", "cloudy"]).unwrap_err();

        match &err {
            ForecastError::InvalidCategory { labels, allowed } => {
                assert_eq!(labels, &["cloudy"]);
                assert_eq!(allowed, &["drizzle", "fog", "rain", "snow", "sun"]);
            }
            other => panic!("expected InvalidCategory, got {:?}", other),
        }

        let message = err.to_string();
        assert!(message.contains("cloudy"), "message: {}", message);
        assert!(message.contains("drizzle"), "message: {}", message);
    }

    #[test]
    fn test_clean_reports_every_offender_once() {
        let cleaner = CategorySet::default();
        let err = cleaner
            .clean(&["hail", "rain", " Hail", "cloudy", "sleet"])
            .unwrap_err();

        match err {
            ForecastError::InvalidCategory { labels, .. } => {
                assert_eq!(labels, vec!["cloudy", "hail", "sleet"]);
            }
            other => panic!("expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_is_idempotent_on_clean_input() {
        let cleaner = CategorySet::default();
        let once = cleaner.clean(&["sun", "rain", "rain", "fog"]).unwrap();
        let twice = cleaner.clean(once.labels()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.labels(), &["sun", "rain", "rain", "fog"]);
    }

    #[test]
    fn test_clean_empty_input() {
        let cleaner = CategorySet::default();
        let seq = cleaner.clean::<&str>(&[]).unwrap();

        assert!(seq.is_empty());
        assert!(seq.categories().is_empty());
    }

    #[test]
    fn test_blank_label_is_invalid() {
        let cleaner = CategorySet::default();
        let err = cleaner.clean(&["rain", "   "]).unwrap_err();

        match err {
            ForecastError::InvalidCategory { labels, .. } => assert_eq!(labels, vec![""]),
            other => panic!("expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_category_set_normalizes_entries() {
        let cleaner = CategorySet::new([" Sun", "RAIN", ""]);
        assert_eq!(cleaner.to_vec(), vec!["rain", "sun"]);
        assert!(cleaner.contains("sun"));
    }

    #[test]
    fn test_check_model_rejects_categories_outside_set() {
        let wide = set(&["hail", "sun", "rain"]);
        let model = crate::markov::estimate(&wide.clean(&["hail", "sun", "rain"]).unwrap()).unwrap();

        assert!(wide.check_model(&model).is_ok());

        match CategorySet::default().check_model(&model) {
            Err(ForecastError::InvalidCategory { labels, .. }) => assert_eq!(labels, vec!["hail"]),
            other => panic!("expected InvalidCategory, got {:?}", other),
        }
    }
}
