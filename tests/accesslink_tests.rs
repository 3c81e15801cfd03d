// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AccessLink client: OAuth exchange, users, notifications and dataset lists.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use polar_accesslink_sync::error::AppError;
use polar_accesslink_sync::services::Registration;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

mod common;
use common::{accesslink, mount_datasets, CLIENT_ID, CLIENT_SECRET, TOKEN, USER_ID};

const REDIRECT: &str = "http://localhost:8080/auth/polar/callback";

// ─── OAuth ───────────────────────────────────────────────────

#[tokio::test]
async fn test_exchange_code_posts_form_with_basic_auth() {
    let server = MockServer::start().await;
    let basic = format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", CLIENT_ID, CLIENT_SECRET))
    );
    Mock::given(method("POST"))
        .and(path("/v2/oauth2/token"))
        .and(header("authorization", basic.as_str()))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("accept", "application/json;charset=UTF-8"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "expires_in": 31535999,
            "x_user_id": USER_ID
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = accesslink(&server, Some(REDIRECT))
        .exchange_code("abc123")
        .await
        .unwrap();

    assert_eq!(token.access_token, TOKEN);
    assert_eq!(token.user_id, USER_ID);
    assert_eq!(token.expires_in, Some(31535999));
}

#[tokio::test]
async fn test_exchange_code_failure_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .mount(&server)
        .await;

    let err = accesslink(&server, None)
        .exchange_code("stale")
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(400));
    assert!(err.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn test_authorization_url_points_at_configured_endpoint() {
    let server = MockServer::start().await;
    let url = accesslink(&server, Some(REDIRECT)).authorization_url(Some("xyz"));

    assert!(url.starts_with(&format!("{}/oauth2/authorization?", server.uri())));
    assert!(url.contains("client_id=test_client_id"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("state=xyz"));
}

// ─── Users ───────────────────────────────────────────────────

#[tokio::test]
async fn test_register_new_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/users"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_string_contains("\"member-id\":\"member-1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "polar-user-id": USER_ID,
            "member-id": "member-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registration = accesslink(&server, None)
        .users
        .register(TOKEN, Some("member-1"))
        .await
        .unwrap();

    match registration {
        Registration::Registered(record) => assert_eq!(record["polar-user-id"], USER_ID),
        other => panic!("unexpected registration: {other:?}"),
    }
}

#[tokio::test]
async fn test_register_conflict_is_already_registered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/users"))
        .respond_with(ResponseTemplate::new(409).set_body_string("User already registered"))
        .mount(&server)
        .await;

    let registration = accesslink(&server, None)
        .users
        .register(TOKEN, None)
        .await
        .unwrap();

    assert_eq!(registration, Registration::AlreadyRegistered);
}

#[tokio::test]
async fn test_register_server_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = accesslink(&server, None)
        .users
        .register(TOKEN, None)
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(500));
}

#[tokio::test]
async fn test_register_generates_fresh_member_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let client = accesslink(&server, None);
    client.users.register(TOKEN, None).await.unwrap();
    client.users.register(TOKEN, None).await.unwrap();

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let member_ids: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["member-id"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(member_ids.len(), 2);
    assert!(!member_ids[0].is_empty());
    assert_ne!(member_ids[0], member_ids[1]);
}

#[tokio::test]
async fn test_delete_user() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/v3/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    accesslink(&server, None)
        .users
        .delete(USER_ID, TOKEN)
        .await
        .unwrap();
}

// ─── Notifications ───────────────────────────────────────────

#[tokio::test]
async fn test_notifications_listed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "available-user-data": [{
                "user-id": USER_ID,
                "data-type": "ACTIVITY_SUMMARY",
                "url": "https://www.polaraccesslink.com/v3/users/12345/activity-transactions"
            }]
        })))
        .mount(&server)
        .await;

    let available = accesslink(&server, None)
        .pull_notifications
        .list()
        .await
        .unwrap();

    assert_eq!(available.len(), 1);
    assert_eq!(available[0].user_id, USER_ID);
    assert_eq!(available[0].data_type, "ACTIVITY_SUMMARY");
}

#[tokio::test]
async fn test_no_notifications() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/notifications"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let available = accesslink(&server, None)
        .pull_notifications
        .list()
        .await
        .unwrap();

    assert!(available.is_empty());
}

// ─── Datasets ────────────────────────────────────────────────

#[tokio::test]
async fn test_exercises_sorted_with_clock_durations() {
    let server = MockServer::start().await;
    mount_datasets(&server).await;

    let exercises = accesslink(&server, None).get_exercises(TOKEN).await.unwrap();

    let ids: Vec<&str> = exercises.iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["b", "c", "a"]);
    assert_eq!(exercises[0]["duration"], "1:30:00");
    assert_eq!(exercises[1]["duration"], "0:20:10");
    assert_eq!(exercises[2]["duration"], "0:45:00");
}

#[tokio::test]
async fn test_sleep_and_recharge_sorted_newest_first() {
    let server = MockServer::start().await;
    mount_datasets(&server).await;
    let client = accesslink(&server, None);

    let sleep = client.get_sleep(TOKEN).await.unwrap();
    let dates: Vec<&str> = sleep.iter().map(|n| n["date"].as_str().unwrap()).collect();
    assert_eq!(dates, ["2024-01-03", "2024-01-02", "2024-01-01"]);

    let recharge = client.get_recharge(TOKEN).await.unwrap();
    assert_eq!(recharge[0]["date"], "2024-01-02");
    assert_eq!(recharge[1]["date"], "2024-01-01");
}

#[tokio::test]
async fn test_sleep_without_nights_key_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/users/sleep/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": []})))
        .mount(&server)
        .await;

    let err = accesslink(&server, None).get_sleep(TOKEN).await.unwrap_err();
    assert!(matches!(err, AppError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_empty_sleep_is_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/users/sleep/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let sleep = accesslink(&server, None).get_sleep(TOKEN).await.unwrap();
    assert!(sleep.is_empty());
}

#[tokio::test]
async fn test_unauthorized_token_detected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v3/users/{}", USER_ID)))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = accesslink(&server, None)
        .get_userdata(USER_ID, TOKEN)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
}
