//! Weather observation CSV reader and dataset summary
//!
//! The upload format is a header row followed by one observation per line.
//! The label column is `weather` (any case); a single-column file may use
//! any header. An optional `date` column (`YYYY-MM-DD`) feeds the monthly
//! breakdown.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markov::ObservationSequence;

/// Bundled reference observations used to build the default model
pub const REFERENCE_DATASET: &str = include_str!("../data/reference-weather.csv");

const LABEL_COLUMN: &str = "weather";
const DATE_COLUMN: &str = "date";

/// CSV parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    /// No header row
    #[error("CSV file is empty")]
    Empty,

    /// No usable label column
    #[error("CSV file has no '{0}' column")]
    MissingColumn(String),

    /// Row shorter than the label/date column index
    #[error("Malformed CSV row at line {line}: expected at least {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

/// One row of an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub label: String,
    pub date: Option<NaiveDate>,
}

/// Split one CSV line into fields, honoring double-quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse CSV text into ordered observations.
///
/// The first non-blank line is a header when it names a `weather` column or
/// has more than one field. A single-column file with any other first line
/// is headerless: every line, the first included, is an observation.
///
/// Blank lines are skipped. Line numbers in errors are 1-based and count
/// every physical line, including the header.
pub fn parse_csv(text: &str) -> Result<Vec<Observation>, DatasetError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
        .peekable();

    let (_, first) = *lines.peek().ok_or(DatasetError::Empty)?;
    let columns: Vec<String> = split_fields(first)
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();

    let label_index = match columns.iter().position(|c| c == LABEL_COLUMN) {
        Some(index) => index,
        None if columns.len() == 1 => 0,
        None => return Err(DatasetError::MissingColumn(LABEL_COLUMN.to_string())),
    };
    let has_header = columns.len() > 1 || columns[label_index] == LABEL_COLUMN;
    if has_header {
        lines.next();
    }
    let date_index = if has_header {
        columns.iter().position(|c| c == DATE_COLUMN)
    } else {
        None
    };
    let required = label_index.max(date_index.unwrap_or(0)) + 1;

    lines
        .map(|(line_no, line)| {
            let fields = split_fields(line);
            if fields.len() < required {
                return Err(DatasetError::MalformedRow {
                    line: line_no,
                    expected: required,
                    found: fields.len(),
                });
            }
            let date = date_index
                .and_then(|i| NaiveDate::parse_from_str(fields[i].trim(), "%Y-%m-%d").ok());
            Ok(Observation {
                label: fields[label_index].clone(),
                date,
            })
        })
        .collect()
}

/// Counts shown alongside a model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub observation_count: u64,
    /// category → number of observations
    pub state_counts: BTreeMap<String, u64>,
    /// "YYYY-MM" → category → number of observations
    pub monthly_counts: BTreeMap<String, BTreeMap<String, u64>>,
}

impl DatasetSummary {
    /// Summarize a cleaned sequence. `dates` is aligned by index with the
    /// sequence; missing or short date lists only shrink the monthly table.
    pub fn build(sequence: &ObservationSequence, dates: &[Option<NaiveDate>]) -> Self {
        let mut summary = Self {
            observation_count: sequence.len() as u64,
            ..Self::default()
        };

        for category in sequence.categories() {
            summary.state_counts.insert(category.clone(), 0);
        }

        for (i, label) in sequence.labels().iter().enumerate() {
            *summary.state_counts.entry(label.clone()).or_insert(0) += 1;

            if let Some(Some(date)) = dates.get(i) {
                let month = date.format("%Y-%m").to_string();
                *summary
                    .monthly_counts
                    .entry(month)
                    .or_default()
                    .entry(label.clone())
                    .or_insert(0) += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markov::CategorySet;

    #[test]
    fn test_parse_weather_column_with_dates() {
        let csv = "date,precipitation,weather\n\
                   2012-01-01,0.0,drizzle\n\
                   2012-01-02,10.9,rain\n\
                   \n\
                   2012-02-01,0.0,Sun\n";
        let rows = parse_csv(csv).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, "drizzle");
        assert_eq!(rows[2].label, "Sun");
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2012, 1, 2));
    }

    #[test]
    fn test_parse_single_column_with_weather_header() {
        let rows = parse_csv("Weather\r\nrain\r\nsun\r\n").unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();

        assert_eq!(labels, vec!["rain", "sun"]);
        assert!(rows.iter().all(|r| r.date.is_none()));
    }

    #[test]
    fn test_parse_single_column_headerless_keeps_first_row() {
        let rows = parse_csv("rain\nsun\nsun\n").unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();

        assert_eq!(labels, vec!["rain", "sun", "sun"]);

        // Any other single-column first line is data too
        let rows = parse_csv("\nconditions\nrain\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "conditions");
    }

    #[test]
    fn test_parse_quoted_fields() {
        let rows = parse_csv("note,WEATHER\n\"windy, cold\",fog\n\"say \"\"hi\"\"\",rain\n").unwrap();

        assert_eq!(rows[0].label, "fog");
        assert_eq!(rows[1].label, "rain");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_csv("").unwrap_err(), DatasetError::Empty);
        assert_eq!(parse_csv("\n  \n").unwrap_err(), DatasetError::Empty);
        assert_eq!(
            parse_csv("date,temp\n2012-01-01,3\n").unwrap_err(),
            DatasetError::MissingColumn("weather".to_string())
        );
        assert_eq!(
            parse_csv("date,weather\n2012-01-01,rain\n2012-01-02\n").unwrap_err(),
            DatasetError::MalformedRow {
                line: 3,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_unparseable_date_is_ignored() {
        let rows = parse_csv("date,weather\nyesterday,rain\n").unwrap();
        assert_eq!(rows[0].date, None);
    }

    #[test]
    fn test_summary_counts() {
        let rows = parse_csv(
            "date,weather\n2012-01-30,rain\n2012-01-31,sun\n2012-02-01,rain\n,fog\n",
        )
        .unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        let dates: Vec<Option<NaiveDate>> = rows.iter().map(|r| r.date).collect();
        let seq = CategorySet::default().clean(&labels).unwrap();

        let summary = DatasetSummary::build(&seq, &dates);

        assert_eq!(summary.observation_count, 4);
        assert_eq!(summary.state_counts["rain"], 2);
        assert_eq!(summary.state_counts["fog"], 1);
        assert_eq!(summary.monthly_counts.len(), 2);
        assert_eq!(summary.monthly_counts["2012-01"]["sun"], 1);
        assert_eq!(summary.monthly_counts["2012-02"]["rain"], 1);
        assert!(!summary.monthly_counts["2012-01"].contains_key("fog"));
    }

    #[test]
    fn test_reference_dataset_is_valid() {
        let rows = parse_csv(REFERENCE_DATASET).unwrap();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        let seq = CategorySet::default().clean(&labels).unwrap();

        assert!(seq.len() > 100);
        assert_eq!(seq.categories().len(), 5);
        assert!(rows.iter().all(|r| r.date.is_some()));
    }
}
