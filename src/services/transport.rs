// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP transport for the Polar AccessLink API.
//!
//! Requests are described by a [`RequestDescriptor`] value and executed
//! one at a time. Responses with a status >= 400 become [`AppError::Http`]
//! with the raw body attached; 204 becomes [`Payload::Empty`]; a 2xx body
//! that is not JSON is returned as [`Payload::Text`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::error::AppError;
use crate::models::Record;

/// Fixed timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OAuth client credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
    redirect_url: Option<String>,
}

impl Credentials {
    /// Fails when the client ID or secret is empty.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: Option<String>,
    ) -> Result<Self, AppError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(AppError::Configuration(
                "Client id and secret must be provided".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            client_secret,
            redirect_url,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Where a request goes: a path under the API base URL, or an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Endpoint(String),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// User-level resources: `Authorization: Bearer <token>` plus JSON headers.
    Bearer(String),
    /// Client-level resources: HTTP Basic with the client credentials.
    Basic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Everything needed to issue one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub target: Target,
    pub auth: Auth,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestDescriptor {
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            auth: Auth::Basic,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(target: Target) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn post(target: Target) -> Self {
        Self::new(Method::Post, target)
    }

    pub fn put(target: Target) -> Self {
        Self::new(Method::Put, target)
    }

    pub fn delete(target: Target) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn bearer(self, access_token: &str) -> Self {
        Self {
            auth: Auth::Bearer(access_token.to_string()),
            ..self
        }
    }

    /// Extra header; overrides a default header of the same name.
    pub fn header(self, name: &str, value: &str) -> Self {
        let mut headers = self.headers;
        headers.push((name.to_string(), value.to_string()));
        Self { headers, ..self }
    }

    pub fn json(self, body: Value) -> Self {
        Self {
            body: RequestBody::Json(body),
            ..self
        }
    }

    pub fn form(self, fields: &[(&str, &str)]) -> Self {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            body: RequestBody::Form(fields),
            ..self
        }
    }
}

/// Status and body of a completed exchange, before status interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl RawResponse {
    /// Apply the status rules: >= 400 is an error, 204 is empty, otherwise
    /// JSON when it parses and text when it does not.
    pub fn into_payload(self) -> Result<Payload, AppError> {
        if self.status >= 400 {
            return Err(AppError::Http {
                status: self.status,
                reason: self.reason,
                body: self.body,
            });
        }

        if self.status == 204 {
            return Ok(Payload::Empty);
        }

        match serde_json::from_str(&self.body) {
            Ok(value) => Ok(Payload::Json(value)),
            Err(_) => Ok(Payload::Text(self.body)),
        }
    }
}

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Text(String),
}

impl Payload {
    /// True for "no content" in any of the shapes Polar uses for it.
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Empty => true,
            Payload::Json(Value::Null) => true,
            Payload::Json(Value::Object(map)) => map.is_empty(),
            Payload::Json(Value::Array(items)) => items.is_empty(),
            Payload::Json(_) => false,
            Payload::Text(text) => text.trim().is_empty(),
        }
    }

    /// A JSON object; an empty payload is an empty record.
    pub fn into_record(self) -> Result<Record, AppError> {
        match self {
            Payload::Json(Value::Object(map)) => Ok(map),
            other if other.is_empty() => Ok(Record::new()),
            other => Err(unexpected("a JSON object", &other)),
        }
    }

    /// A JSON array of objects; an empty payload is an empty list.
    pub fn into_records(self) -> Result<Vec<Record>, AppError> {
        match self {
            Payload::Json(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(AppError::Decode(format!(
                        "expected a list of objects, found element {}",
                        other
                    ))),
                })
                .collect(),
            other if other.is_empty() => Ok(Vec::new()),
            other => Err(unexpected("a JSON array", &other)),
        }
    }

    /// The list of objects stored under `key` of a JSON object.
    pub fn into_nested_records(self, key: &str) -> Result<Vec<Record>, AppError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let mut record = self.into_record()?;
        match record.remove(key) {
            Some(value) => Payload::Json(value).into_records(),
            None => Err(AppError::Decode(format!("missing {:?} in response", key))),
        }
    }

    /// Body text, for non-JSON formats such as GPX and TCX.
    pub fn into_text(self) -> String {
        match self {
            Payload::Empty => String::new(),
            Payload::Json(value) => value.to_string(),
            Payload::Text(text) => text,
        }
    }
}

fn unexpected(expected: &str, payload: &Payload) -> AppError {
    let found = match payload {
        Payload::Empty => "no content".to_string(),
        Payload::Json(value) => value.to_string(),
        Payload::Text(text) => format!("text {:?}", text),
    };
    AppError::Decode(format!("expected {}, found {}", expected, found))
}

/// Authenticated HTTP transport bound to one API base URL.
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<Credentials>,
}

impl Transport {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: Arc::new(credentials),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a request target.
    pub fn resolve(&self, target: &Target) -> String {
        match target {
            Target::Endpoint(path) => format!("{}{}", self.base_url, path),
            Target::Url(url) => url.clone(),
        }
    }

    /// Execute a request and interpret the status.
    pub async fn request(&self, request: RequestDescriptor) -> Result<Payload, AppError> {
        self.execute(request).await?.into_payload()
    }

    /// Execute a request and return status and body without interpreting them.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, AppError> {
        let url = self.resolve(&request.target);
        tracing::debug!(method = ?request.method, url = %url, "Polar request");

        let mut builder = self
            .http
            .request(request.method.as_reqwest(), &url)
            .headers(build_headers(&request.auth, &request.headers)?);

        if request.auth == Auth::Basic {
            builder = builder.basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            );
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{} {}: {}", request.method.as_reqwest(), url, e)))?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("reading body from {}: {}", url, e)))?;

        if status.as_u16() >= 400 {
            tracing::debug!(status = status.as_u16(), url = %url, body = %body, "Polar error response");
        }

        Ok(RawResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

/// Default headers for the auth mode, then caller headers on top.
fn build_headers(auth: &Auth, extra: &[(String, String)]) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();

    if let Auth::Bearer(token) = auth {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::BadRequest("access token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    }

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| AppError::BadRequest(format!("invalid header name {:?}", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| AppError::BadRequest(format!("invalid value for header {}", name)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            reason: "Reason".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_error_status_keeps_body() {
        let err = raw(500, "boom").into_payload().unwrap_err();
        match err {
            AppError::Http { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_content_is_empty() {
        assert_eq!(raw(204, "").into_payload().unwrap(), Payload::Empty);
    }

    #[test]
    fn test_non_json_body_is_text() {
        assert_eq!(
            raw(200, "<gpx/>").into_payload().unwrap(),
            Payload::Text("<gpx/>".to_string())
        );
    }

    #[test]
    fn test_json_body() {
        assert_eq!(
            raw(201, r#"{"a":1}"#).into_payload().unwrap(),
            Payload::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn test_empty_shapes() {
        assert!(Payload::Empty.is_empty());
        assert!(Payload::Json(json!({})).is_empty());
        assert!(Payload::Json(Value::Null).is_empty());
        assert!(Payload::Text(String::new()).is_empty());
        assert!(!Payload::Json(json!({"resource-uri": "x"})).is_empty());
    }

    #[test]
    fn test_nested_records_missing_key() {
        let payload = Payload::Json(json!({"other": []}));
        assert!(matches!(
            payload.into_nested_records("nights"),
            Err(AppError::Decode(_))
        ));
    }

    #[test]
    fn test_bearer_headers_overridable() {
        let headers = build_headers(
            &Auth::Bearer("tok".to_string()),
            &[("Accept".to_string(), "application/gpx+xml".to_string())],
        )
        .unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/gpx+xml");
    }

    #[test]
    fn test_descriptor_builder_defaults_to_basic() {
        let request = RequestDescriptor::get(Target::Endpoint("/notifications".to_string()));
        assert_eq!(request.auth, Auth::Basic);
        assert_eq!(request.body, RequestBody::Empty);

        let request = request.bearer("tok");
        assert_eq!(request.auth, Auth::Bearer("tok".to_string()));
    }

    #[test]
    fn test_credentials_require_id_and_secret() {
        assert!(matches!(
            Credentials::new("", "secret", None),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            Credentials::new("id", " ", None),
            Err(AppError::Configuration(_))
        ));
        assert!(Credentials::new("id", "secret", None).is_ok());
    }
}
