//! End-to-end tests against a real listener.

use game_platform_mock::config::DEFAULT_API_TOKEN;
use game_platform_mock::{router, AppState, CallbackTargets, GameMockConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_app(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_notify_accepted_flow() {
    let callback = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cp/api/v1/new_server/callback"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "appId": "gamedemo",
            "callbackToken": "t1",
            "actionId": "a1",
            "success": true,
            "message": "oops"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&callback)
        .await;

    let state = AppState::new(
        GameMockConfig::startup("stg"),
        "gamedemo",
        CallbackTargets::fixed(format!("{}/cp/api/v1/new_server/callback", callback.uri())),
    )
    .unwrap();
    let dispatcher = state.dispatcher.clone();
    let addr = spawn_app(state).await;
    let client = reqwest::Client::new();

    let mut config: Value = client
        .get(format!("http://{}/api/config", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    config["notify_status"] = json!(202);
    config["notify_status_sleep"] = json!(0);

    let response = client
        .post(format!("http://{}/api/config", addr))
        .json(&config)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let started = std::time::Instant::now();
    let response = client
        .post(format!("http://{}/api/notify", addr))
        .header("Authorization", DEFAULT_API_TOKEN)
        .json(&json!({"actionId": "a1", "callbackToken": "t1"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    assert!(started.elapsed() < Duration::from_secs(5));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"message": "ok", "status": 202}));

    for _ in 0..200 {
        if dispatcher.stats().delivered() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(dispatcher.stats().delivered(), 1);
}

#[tokio::test]
async fn test_slow_request_does_not_block_others() {
    let mut config = GameMockConfig::startup("");
    config.zonelist_status_sleep = 2;
    let state = AppState::new(config, "gamedemo", CallbackTargets::fixed("http://127.0.0.1:1")).unwrap();
    let addr = spawn_app(state).await;
    let client = reqwest::Client::new();

    let slow = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .get(format!("http://{}/api/zonelist", addr))
                .header("Authorization", DEFAULT_API_TOKEN)
                .send()
                .await
                .unwrap()
                .status()
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = std::time::Instant::now();
    let response = client
        .get(format!("http://{}/ping", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(slow.await.unwrap(), 200);
}

#[tokio::test]
async fn test_server_rejects_invalid_json() {
    let state = AppState::new(
        GameMockConfig::startup(""),
        "gamedemo",
        CallbackTargets::fixed("http://127.0.0.1:1"),
    )
    .unwrap();
    let addr = spawn_app(state).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/server", addr))
        .header("Authorization", DEFAULT_API_TOKEN)
        .body("{\"actionId\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().is_empty());
}
