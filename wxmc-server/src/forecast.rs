//! Forecast service: per-user models with a shared default fallback

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wxmc_common::dataset::{parse_csv, DatasetSummary};
use wxmc_common::db::{ModelRecord, ModelStore};
use wxmc_common::markov::{estimate, predict, CategorySet};
use wxmc_common::{PredictionResult, Result};

use crate::locks::UserLocks;

/// Where the model answering a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// The caller's own uploaded dataset
    User,
    /// The dataset loaded at startup
    Default,
}

/// A model record tagged with its provenance
#[derive(Debug, Clone)]
pub struct ActiveModel {
    pub record: ModelRecord,
    pub source: ModelSource,
}

/// Result of a successful upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub categories: Vec<String>,
    pub observations: u64,
}

/// N-step prediction with its provenance
#[derive(Debug, Clone)]
pub struct Forecast {
    pub result: PredictionResult,
    pub source: ModelSource,
}

/// Everything the dashboard shows about the active model
#[derive(Debug, Clone, Serialize)]
pub struct WeatherData {
    pub states: Vec<String>,
    pub state_counts: BTreeMap<String, u64>,
    pub monthly_counts: BTreeMap<String, BTreeMap<String, u64>>,
    /// from → to → probability
    pub transitions: BTreeMap<String, BTreeMap<String, f64>>,
    pub observation_count: u64,
    pub data_source: ModelSource,
}

/// Read CSV text, clean it against `categories` and estimate a model
pub fn build_model_record(csv: &str, categories: &CategorySet) -> Result<ModelRecord> {
    let rows = parse_csv(csv)?;
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();

    let sequence = categories.clean(&labels)?;
    let model = estimate(&sequence)?;
    let summary = DatasetSummary::build(&sequence, &dates);

    Ok(ModelRecord::new(model, summary))
}

/// Upload, clear, predict and summarize models for authenticated users
pub struct ForecastService {
    store: Arc<dyn ModelStore>,
    default_model: Arc<ModelRecord>,
    categories: CategorySet,
    locks: UserLocks,
}

impl ForecastService {
    pub fn new(
        store: Arc<dyn ModelStore>,
        default_model: ModelRecord,
        categories: CategorySet,
    ) -> Self {
        Self {
            store,
            default_model: Arc::new(default_model),
            categories,
            locks: UserLocks::new(),
        }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn default_model(&self) -> &ModelRecord {
        &self.default_model
    }

    /// Replace the user's model with one estimated from `csv`.
    ///
    /// On any error the previously stored model is left untouched.
    pub async fn upload(&self, user_id: Uuid, csv: &str) -> Result<UploadSummary> {
        let record = build_model_record(csv, &self.categories)?;
        let summary = UploadSummary {
            categories: record.model.categories().to_vec(),
            observations: record.summary.observation_count,
        };

        let _guard = self.locks.lock(user_id).await;
        self.store.save(user_id, &record).await?;

        info!(
            "Stored model for user {}: {} observations, categories [{}]",
            user_id,
            summary.observations,
            summary.categories.join(", ")
        );
        Ok(summary)
    }

    /// Drop the user's model; returns whether one existed
    pub async fn clear(&self, user_id: Uuid) -> Result<bool> {
        let _guard = self.locks.lock(user_id).await;
        let removed = self.store.delete(user_id).await?;

        if removed {
            info!("Cleared model for user {}", user_id);
        } else {
            debug!("No model to clear for user {}", user_id);
        }
        Ok(removed)
    }

    /// The user's model, or the default one when none was uploaded.
    ///
    /// A stored model naming categories the service no longer allows is
    /// rejected with `ForecastError::InvalidCategory`; re-upload or clear
    /// to recover.
    pub async fn active_model(&self, user_id: Uuid) -> Result<ActiveModel> {
        Ok(match self.store.load(user_id).await? {
            Some(record) => {
                if let Err(e) = self.categories.check_model(&record.model) {
                    warn!("Stored model for user {} is outside the allowed set: {}", user_id, e);
                    return Err(e.into());
                }
                ActiveModel {
                    record,
                    source: ModelSource::User,
                }
            }
            None => ActiveModel {
                record: (*self.default_model).clone(),
                source: ModelSource::Default,
            },
        })
    }

    pub async fn predict(&self, user_id: Uuid, current_state: &str, n_days: i64) -> Result<Forecast> {
        let active = {
            let _guard = self.locks.lock(user_id).await;
            self.active_model(user_id).await?
        };

        let result = predict(&active.record.model, current_state, n_days)?;
        debug!(
            "Predicted {} days from '{}' for user {} ({:?} model): {}",
            n_days, current_state, user_id, active.source, result.most_likely
        );

        Ok(Forecast {
            result,
            source: active.source,
        })
    }

    pub async fn weather_data(&self, user_id: Uuid) -> Result<WeatherData> {
        let ActiveModel { record, source } = self.active_model(user_id).await?;
        let model = &record.model;

        let transitions: BTreeMap<String, BTreeMap<String, f64>> = model
            .categories()
            .iter()
            .zip(model.matrix())
            .map(|(from, row)| {
                let targets: BTreeMap<String, f64> = model
                    .categories()
                    .iter()
                    .cloned()
                    .zip(row.iter().copied())
                    .collect();
                (from.clone(), targets)
            })
            .collect();

        Ok(WeatherData {
            states: model.categories().to_vec(),
            state_counts: record.summary.state_counts,
            monthly_counts: record.summary.monthly_counts,
            transitions,
            observation_count: record.summary.observation_count,
            data_source: source,
        })
    }
}
