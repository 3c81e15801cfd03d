// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use polar_accesslink_sync::config::Config;
use polar_accesslink_sync::models::Record;
use polar_accesslink_sync::services::transport::Credentials;
use polar_accesslink_sync::services::{AccessLink, PolarUrls};
use polar_accesslink_sync::AppState;
use serde_json::{json, Value};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const CLIENT_ID: &str = "test_client_id";
#[allow(dead_code)]
pub const CLIENT_SECRET: &str = "test_secret";
#[allow(dead_code)]
pub const USER_ID: u64 = 12345;
#[allow(dead_code)]
pub const TOKEN: &str = "user_access_token";

/// Turn a `json!` object into a record.
#[allow(dead_code)]
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Endpoints all pointing at the mock server.
#[allow(dead_code)]
pub fn mock_urls(server: &MockServer) -> PolarUrls {
    PolarUrls {
        api: format!("{}/v3", server.uri()),
        authorization: format!("{}/oauth2/authorization", server.uri()),
        token: format!("{}/v2/oauth2/token", server.uri()),
    }
}

/// AccessLink client talking to the mock server.
#[allow(dead_code)]
pub fn accesslink(server: &MockServer, redirect_url: Option<&str>) -> AccessLink {
    let credentials =
        Credentials::new(CLIENT_ID, CLIENT_SECRET, redirect_url.map(str::to_string)).unwrap();
    AccessLink::with_urls(credentials, &mock_urls(server)).unwrap()
}

/// Application state backed by the mock server and a scratch storage dir.
#[allow(dead_code)]
pub fn test_state(server: &MockServer, storage_dir: &Path) -> AppState {
    let mut config = Config::test_default();
    config.storage_dir = storage_dir.to_path_buf();
    config.polar_urls = mock_urls(server);
    AppState::from_config(config).expect("state should build")
}

/// Mount the user, exercise, sleep and recharge endpoints with sample data.
#[allow(dead_code)]
pub async fn mount_datasets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v3/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "polar-user-id": USER_ID,
            "first-name": "Jane",
            "last-name": "Doe",
            "weight": 61.5
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/exercises"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "start_time": "2024-01-01T08:00:00", "duration": "PT45M", "sport": "RUNNING"},
            {"id": "b", "start_time": "2024-01-03T18:30:00", "duration": "PT1H30M", "sport": "CYCLING"},
            {"id": "c", "start_time": "2024-01-02T07:15:00", "duration": "PT20M10S", "sport": "WALKING"}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/users/sleep/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nights": [
                {"date": "2024-01-02", "sleep_score": 80},
                {"date": "2024-01-03", "sleep_score": 72},
                {"date": "2024-01-01", "sleep_score": 91}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v3/users/nightly-recharge/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recharges": [
                {"date": "2024-01-01", "nightly_recharge_status": 3},
                {"date": "2024-01-02", "nightly_recharge_status": 4}
            ]
        })))
        .mount(server)
        .await;
}

/// Daily activity: Polar has nothing new.
#[allow(dead_code)]
pub async fn mount_no_daily_transaction(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/v3/users/{}/activity-transactions", USER_ID)))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Daily activity: a transaction with two activities, committed exactly once.
#[allow(dead_code)]
pub async fn mount_daily_transaction(server: &MockServer) {
    let transaction_path = format!("/v3/users/{}/activity-transactions/99", USER_ID);
    let transaction_url = format!("{}{}", server.uri(), transaction_path);

    Mock::given(method("POST"))
        .and(path(format!("/v3/users/{}/activity-transactions", USER_ID)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "transaction-id": 99,
            "resource-uri": transaction_url
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(transaction_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activity-log": [
                format!("{}/activities/1", transaction_url),
                format!("{}/activities/2", transaction_url)
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/activities/1", transaction_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "date": "2024-01-01", "duration": "PT1H30M", "calories": 2100, "active-steps": 9000
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/activities/2", transaction_path)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "date": "2024-01-02", "duration": "PT2H", "calories": 2400, "active-steps": 12000
        })))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path(transaction_path))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}
