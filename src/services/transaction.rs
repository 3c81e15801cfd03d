// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AccessLink transactions for bulk data pulls.
//!
//! A transaction goes through create → list → fetch (per resource) → commit.
//! `create` yields `None` when Polar has nothing new. `commit` takes the
//! transaction by value, so it can be committed at most once; dropping it
//! uncommitted abandons it and Polar will offer the same data again.

use std::marker::PhantomData;

use serde_json::Value;

use crate::error::AppError;
use crate::models::Record;
use crate::services::transport::{Payload, RequestDescriptor, Target, Transport};
use crate::time_utils::normalize_duration;

/// Per-resource details of a transaction.
pub trait TransactionKind {
    /// Used in logs.
    const NAME: &'static str;
    /// Key of the resource URL list in the transaction listing.
    const LIST_KEY: &'static str;
    /// Whether fetched records carry an ISO-8601 `duration` to normalize.
    const NORMALIZE_DURATION: bool;

    /// Endpoint that opens a transaction for `user_id`.
    fn create_endpoint(user_id: u64) -> String;
}

/// Daily activity summaries.
#[derive(Debug, Clone, Copy)]
pub struct DailyActivityKind;

impl TransactionKind for DailyActivityKind {
    const NAME: &'static str = "daily activity";
    const LIST_KEY: &'static str = "activity-log";
    const NORMALIZE_DURATION: bool = true;

    fn create_endpoint(user_id: u64) -> String {
        format!("/users/{}/activity-transactions", user_id)
    }
}

/// Training sessions (exercises).
#[derive(Debug, Clone, Copy)]
pub struct TrainingDataKind;

impl TransactionKind for TrainingDataKind {
    const NAME: &'static str = "training data";
    const LIST_KEY: &'static str = "exercises";
    const NORMALIZE_DURATION: bool = true;

    fn create_endpoint(user_id: u64) -> String {
        format!("/users/{}/exercise-transactions", user_id)
    }
}

/// Physical information (weight, heart rate limits, ...).
#[derive(Debug, Clone, Copy)]
pub struct PhysicalInfoKind;

impl TransactionKind for PhysicalInfoKind {
    const NAME: &'static str = "physical information";
    const LIST_KEY: &'static str = "physical-informations";
    const NORMALIZE_DURATION: bool = false;

    fn create_endpoint(user_id: u64) -> String {
        format!("/users/{}/physical-information-transactions", user_id)
    }
}

/// An open transaction.
#[derive(Debug)]
pub struct Transaction<K> {
    transport: Transport,
    transaction_url: String,
    user_id: u64,
    access_token: String,
    kind: PhantomData<K>,
}

impl<K: TransactionKind> Transaction<K> {
    /// Open a transaction. `Ok(None)` means there is no new data.
    pub async fn create(
        transport: &Transport,
        user_id: u64,
        access_token: &str,
    ) -> Result<Option<Self>, AppError> {
        let request = RequestDescriptor::post(Target::Endpoint(K::create_endpoint(user_id)))
            .bearer(access_token);
        let payload = transport.request(request).await?;

        if payload.is_empty() {
            tracing::debug!(user_id, kind = K::NAME, "No new data available");
            return Ok(None);
        }

        let record = payload.into_record()?;
        let transaction_url = record
            .get("resource-uri")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::Decode(format!("{} transaction without resource-uri", K::NAME))
            })?
            .to_string();

        tracing::info!(user_id, kind = K::NAME, url = %transaction_url, "Transaction created");

        Ok(Some(Self {
            transport: transport.clone(),
            transaction_url,
            user_id,
            access_token: access_token.to_string(),
            kind: PhantomData,
        }))
    }

    pub fn url(&self) -> &str {
        &self.transaction_url
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// URLs of the resources contained in this transaction.
    pub async fn list(&self) -> Result<Vec<String>, AppError> {
        let payload = self.get(&self.transaction_url).await?;
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let record = payload.into_record()?;
        let urls = match record.get(K::LIST_KEY) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        AppError::Decode(format!("non-string entry in {}", K::LIST_KEY))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(AppError::Decode(format!(
                    "{} should be a list, found {}",
                    K::LIST_KEY,
                    other
                )))
            }
            None => Vec::new(),
        };

        tracing::debug!(kind = K::NAME, count = urls.len(), "Transaction listed");
        Ok(urls)
    }

    /// Fetch one listed resource.
    pub async fn fetch(&self, resource_url: &str) -> Result<Record, AppError> {
        let record = self.get(resource_url).await?.into_record()?;
        if K::NORMALIZE_DURATION {
            normalize_duration_field(record)
        } else {
            Ok(record)
        }
    }

    /// Mark the transaction's data as consumed.
    pub async fn commit(self) -> Result<(), AppError> {
        let request = RequestDescriptor::put(Target::Url(self.transaction_url.clone()))
            .bearer(&self.access_token);
        self.transport.request(request).await?;

        tracing::info!(
            user_id = self.user_id,
            kind = K::NAME,
            "Transaction committed"
        );
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<Payload, AppError> {
        self.get_with_accept(url, None).await
    }

    async fn get_with_accept(&self, url: &str, accept: Option<&str>) -> Result<Payload, AppError> {
        let request =
            RequestDescriptor::get(Target::Url(url.to_string())).bearer(&self.access_token);
        let request = match accept {
            Some(accept) => request.header("Accept", accept),
            None => request,
        };
        self.transport.request(request).await
    }
}

impl Transaction<DailyActivityKind> {
    /// Step counts sampled over the day.
    pub async fn step_samples(&self, activity_url: &str) -> Result<Record, AppError> {
        self.get(&format!("{}/step-samples", activity_url))
            .await?
            .into_record()
    }

    /// Activity zone samples over the day.
    pub async fn zone_samples(&self, activity_url: &str) -> Result<Record, AppError> {
        self.get(&format!("{}/zone-samples", activity_url))
            .await?
            .into_record()
    }
}

impl Transaction<TrainingDataKind> {
    /// Exercise in GPX format.
    pub async fn gpx(&self, exercise_url: &str) -> Result<String, AppError> {
        let payload = self
            .get_with_accept(&format!("{}/gpx", exercise_url), Some("application/gpx+xml"))
            .await?;
        Ok(payload.into_text())
    }

    /// Exercise in TCX format.
    pub async fn tcx(&self, exercise_url: &str) -> Result<String, AppError> {
        let payload = self
            .get_with_accept(
                &format!("{}/tcx", exercise_url),
                Some("application/vnd.garmin.tcx+xml"),
            )
            .await?;
        Ok(payload.into_text())
    }

    pub async fn heart_rate_zones(&self, exercise_url: &str) -> Result<Record, AppError> {
        self.get(&format!("{}/heart-rate-zones", exercise_url))
            .await?
            .into_record()
    }

    /// URLs of the sample series recorded during the exercise.
    pub async fn available_samples(&self, exercise_url: &str) -> Result<Record, AppError> {
        self.get(&format!("{}/samples", exercise_url))
            .await?
            .into_record()
    }

    /// One sample series, by the URL from [`Self::available_samples`].
    pub async fn samples(&self, sample_url: &str) -> Result<Record, AppError> {
        self.get(sample_url).await?.into_record()
    }
}

/// Replace an ISO-8601 `duration` value with its clock form.
pub(crate) fn normalize_duration_field(mut record: Record) -> Result<Record, AppError> {
    let normalized = match record.get("duration") {
        Some(Value::String(raw)) => {
            Some(normalize_duration(raw).map_err(|e| AppError::Decode(e.to_string()))?)
        }
        _ => None,
    };
    if let Some(normalized) = normalized {
        record.insert("duration".to_string(), Value::String(normalized));
    }
    Ok(record)
}
