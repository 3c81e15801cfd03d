// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polar AccessLink API client.
//!
//! Handles:
//! - OAuth authorization URL and code exchange
//! - User registration, lookup and de-registration
//! - Pull notifications
//! - Transactions for daily activity, training data and physical information
//! - Exercise, sleep and nightly recharge lists, sorted newest first

use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::token::AvailableUserDataList;
use crate::models::{AvailableUserData, Record, TokenResponse};
use crate::services::oauth::OAuth2Client;
use crate::services::transaction::{
    normalize_duration_field, DailyActivityKind, PhysicalInfoKind, TrainingDataKind, Transaction,
};
use crate::services::transport::{Credentials, Payload, RequestDescriptor, Target, Transport};
use crate::time_utils::parse_polar_timestamp;

pub const ACCESSLINK_URL: &str = "https://www.polaraccesslink.com/v3";
pub const AUTHORIZATION_URL: &str = "https://flow.polar.com/oauth2/authorization";
pub const ACCESS_TOKEN_URL: &str = "https://polarremote.com/v2/oauth2/token";

/// Remote endpoints used by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolarUrls {
    pub api: String,
    pub authorization: String,
    pub token: String,
}

impl Default for PolarUrls {
    fn default() -> Self {
        Self {
            api: ACCESSLINK_URL.to_string(),
            authorization: AUTHORIZATION_URL.to_string(),
            token: ACCESS_TOKEN_URL.to_string(),
        }
    }
}

/// Outcome of registering a user with this client.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// Newly registered; carries Polar's user record.
    Registered(Record),
    /// Polar answered 409: the user was registered earlier.
    AlreadyRegistered,
}

/// User management.
#[derive(Clone, Debug)]
pub struct Users {
    transport: Transport,
}

impl Users {
    /// Register the user behind `access_token`.
    ///
    /// Without a `member_id` a fresh one is generated for this call.
    pub async fn register(
        &self,
        access_token: &str,
        member_id: Option<&str>,
    ) -> Result<Registration, AppError> {
        let member_id = member_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

        let request = RequestDescriptor::post(Target::Endpoint("/users".to_string()))
            .bearer(access_token)
            .json(json!({ "member-id": member_id }));

        let response = self.transport.execute(request).await?;
        if response.status == 409 {
            tracing::info!("User already registered with this client");
            return Ok(Registration::AlreadyRegistered);
        }

        let record = response.into_payload()?.into_record()?;
        tracing::info!(member_id = %member_id, "User registered");
        Ok(Registration::Registered(record))
    }

    /// De-register the user from this client.
    pub async fn delete(&self, user_id: u64, access_token: &str) -> Result<(), AppError> {
        let request = RequestDescriptor::delete(Target::Endpoint(format!("/users/{}", user_id)))
            .bearer(access_token);
        self.transport.request(request).await?;
        tracing::info!(user_id, "User de-registered");
        Ok(())
    }

    /// Basic user information (name, weight, height, ...).
    pub async fn get_information(
        &self,
        user_id: u64,
        access_token: &str,
    ) -> Result<Record, AppError> {
        let request = RequestDescriptor::get(Target::Endpoint(format!("/users/{}", user_id)))
            .bearer(access_token);
        self.transport.request(request).await?.into_record()
    }
}

/// Client-level notifications about new data.
#[derive(Clone, Debug)]
pub struct PullNotifications {
    transport: Transport,
}

impl PullNotifications {
    /// Data available for download across all registered users.
    pub async fn list(&self) -> Result<Vec<AvailableUserData>, AppError> {
        let request = RequestDescriptor::get(Target::Endpoint("/notifications".to_string()));
        let payload = self.transport.request(request).await?;

        let list: AvailableUserDataList = match payload {
            payload if payload.is_empty() => AvailableUserDataList::default(),
            Payload::Json(value) => serde_json::from_value(value)
                .map_err(|e| AppError::Decode(format!("notifications: {}", e)))?,
            other => {
                return Err(AppError::Decode(format!(
                    "notifications: unexpected body {:?}",
                    other.into_text()
                )))
            }
        };

        Ok(list.available_user_data)
    }
}

/// Training sessions.
#[derive(Clone, Debug)]
pub struct TrainingData {
    transport: Transport,
}

impl TrainingData {
    pub async fn create_transaction(
        &self,
        user_id: u64,
        access_token: &str,
    ) -> Result<Option<Transaction<TrainingDataKind>>, AppError> {
        Transaction::create(&self.transport, user_id, access_token).await
    }
}

/// Physical information.
#[derive(Clone, Debug)]
pub struct PhysicalInfo {
    transport: Transport,
}

impl PhysicalInfo {
    pub async fn create_transaction(
        &self,
        user_id: u64,
        access_token: &str,
    ) -> Result<Option<Transaction<PhysicalInfoKind>>, AppError> {
        Transaction::create(&self.transport, user_id, access_token).await
    }
}

/// Daily activity.
#[derive(Clone, Debug)]
pub struct DailyActivity {
    transport: Transport,
}

impl DailyActivity {
    pub async fn create_transaction(
        &self,
        user_id: u64,
        access_token: &str,
    ) -> Result<Option<Transaction<DailyActivityKind>>, AppError> {
        Transaction::create(&self.transport, user_id, access_token).await
    }
}

/// Entry point to the AccessLink API.
#[derive(Clone, Debug)]
pub struct AccessLink {
    oauth: OAuth2Client,
    pub users: Users,
    pub pull_notifications: PullNotifications,
    pub training_data: TrainingData,
    pub physical_info: PhysicalInfo,
    pub daily_activity: DailyActivity,
}

impl AccessLink {
    /// Client against the production Polar endpoints.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_url: Option<String>,
    ) -> Result<Self, AppError> {
        Self::with_urls(
            Credentials::new(client_id, client_secret, redirect_url)?,
            &PolarUrls::default(),
        )
    }

    pub fn with_urls(credentials: Credentials, urls: &PolarUrls) -> Result<Self, AppError> {
        let transport = Transport::new(&urls.api, credentials)?;

        Ok(Self {
            oauth: OAuth2Client::new(transport.clone(), &urls.authorization, &urls.token),
            users: Users {
                transport: transport.clone(),
            },
            pull_notifications: PullNotifications {
                transport: transport.clone(),
            },
            training_data: TrainingData {
                transport: transport.clone(),
            },
            physical_info: PhysicalInfo {
                transport: transport.clone(),
            },
            daily_activity: DailyActivity { transport },
        })
    }

    pub fn authorization_url(&self, state: Option<&str>) -> String {
        self.oauth.authorization_url(state)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.oauth.exchange_code(code).await
    }

    /// User information by ID.
    pub async fn get_userdata(&self, user_id: u64, access_token: &str) -> Result<Record, AppError> {
        self.users.get_information(user_id, access_token).await
    }

    /// Recent exercises with normalized durations, newest first.
    pub async fn get_exercises(&self, access_token: &str) -> Result<Vec<Record>, AppError> {
        let exercises = self
            .bearer_get("/exercises", access_token)
            .await?
            .into_records()?
            .into_iter()
            .map(normalize_duration_field)
            .collect::<Result<Vec<_>, _>>()?;

        newest_first(exercises, "start_time")
    }

    /// Recent nights of sleep, newest first.
    pub async fn get_sleep(&self, access_token: &str) -> Result<Vec<Record>, AppError> {
        let nights = self
            .bearer_get("/users/sleep/", access_token)
            .await?
            .into_nested_records("nights")?;
        newest_first(nights, "date")
    }

    /// Recent nightly recharge results, newest first.
    pub async fn get_recharge(&self, access_token: &str) -> Result<Vec<Record>, AppError> {
        let recharges = self
            .bearer_get("/users/nightly-recharge/", access_token)
            .await?
            .into_nested_records("recharges")?;
        newest_first(recharges, "date")
    }

    async fn bearer_get(&self, endpoint: &str, access_token: &str) -> Result<Payload, AppError> {
        let request =
            RequestDescriptor::get(Target::Endpoint(endpoint.to_string())).bearer(access_token);
        self.oauth.transport().request(request).await
    }
}

/// Sort records descending by a date/time field.
pub(crate) fn newest_first(records: Vec<Record>, field: &str) -> Result<Vec<Record>, AppError> {
    let mut keyed = records
        .into_iter()
        .map(|record| {
            let raw = record.get(field).and_then(Value::as_str).ok_or_else(|| {
                AppError::Decode(format!("record without a {:?} string", field))
            })?;
            let key = parse_polar_timestamp(raw)
                .map_err(|e| AppError::Decode(format!("bad {} {:?}: {}", field, raw, e)))?;
            Ok((key, record))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}
