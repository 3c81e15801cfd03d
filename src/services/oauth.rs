// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 client for Polar Flow authorization.

use crate::error::AppError;
use crate::models::TokenResponse;
use crate::services::transport::{Credentials, RequestDescriptor, Target, Transport};

/// OAuth2 wrapper around the AccessLink transport.
#[derive(Clone, Debug)]
pub struct OAuth2Client {
    transport: Transport,
    authorization_url: String,
    token_url: String,
}

impl OAuth2Client {
    pub fn new(transport: Transport, authorization_url: &str, token_url: &str) -> Self {
        Self {
            transport,
            authorization_url: authorization_url.to_string(),
            token_url: token_url.to_string(),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn credentials(&self) -> &Credentials {
        self.transport.credentials()
    }

    /// Build the URL the user is sent to in order to grant access.
    pub fn authorization_url(&self, state: Option<&str>) -> String {
        let credentials = self.credentials();

        let mut params = vec![
            ("client_id", credentials.client_id()),
            ("response_type", "code"),
        ];
        if let Some(state) = state.filter(|s| !s.is_empty()) {
            params.push(("state", state));
        }
        if let Some(redirect) = credentials.redirect_url() {
            params.push(("redirect_uri", redirect));
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.authorization_url, query)
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let mut fields = vec![("grant_type", "authorization_code"), ("code", code)];
        if let Some(redirect) = self.credentials().redirect_url() {
            fields.push(("redirect_uri", redirect));
        }

        tracing::debug!("Fetching access token from authorization code");

        let request = RequestDescriptor::post(Target::Url(self.token_url.clone()))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json;charset=UTF-8")
            .form(&fields);

        let payload = self.transport.request(request).await.map_err(|e| {
            tracing::error!(error = %e, "Polar token exchange failed");
            e
        })?;

        let record = payload.into_record()?;
        serde_json::from_value(serde_json::Value::Object(record))
            .map_err(|e| AppError::Decode(format!("Failed to parse token response: {}", e)))
    }
}
