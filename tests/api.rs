//! Persistence API integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{build_test_router, create_test_user, setup_test_db};

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(setup_test_db());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = build_test_router(setup_test_db());

    let response = app.oneshot(get("/ready")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"]["status"], "ok");
}

#[tokio::test]
async fn test_save_user() {
    let app = build_test_router(setup_test_db());

    let response = app
        .oneshot(post_json(
            "/api/user/save",
            &json!({ "name": "Alex", "deviceId": "device-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "User saved successfully");
    assert_eq!(json["user"]["name"], "Alex");
    assert_eq!(json["user"]["deviceId"], "device-1");
    assert_eq!(json["user"]["commands"], json!([]));
}

#[tokio::test]
async fn test_save_user_renames() {
    let db = setup_test_db();
    create_test_user(&db, "device-1", "Alex");
    let app = build_test_router(db);

    let response = app
        .oneshot(post_json(
            "/api/user/save",
            &json!({ "name": "Sam", "deviceId": "device-1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["name"], "Sam");
}

#[tokio::test]
async fn test_save_user_requires_fields() {
    let app = build_test_router(setup_test_db());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/user/save",
            &json!({ "name": "  ", "deviceId": "device-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "name is required");

    let response = app
        .oneshot(post_json(
            "/api/user/save",
            &json!({ "name": "Alex", "deviceId": "" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_log_command_unknown_device() {
    let app = build_test_router(setup_test_db());

    let response = app
        .oneshot(post_json(
            "/api/user/log-command",
            &json!({ "deviceId": "nobody", "command": "open example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "User not found");
}

#[tokio::test]
async fn test_log_command_after_save() {
    let app = build_test_router(setup_test_db());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/user/save",
            &json!({ "name": "Alex", "deviceId": "device-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for command in ["open example.com", "play a song shape of you"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/user/log-command",
                &json!({ "deviceId": "device-1", "command": command }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Command logged");
    }

    let response = app.oneshot(get("/api/user/device-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["name"], "Alex");
    assert_eq!(json["lastCommand"], "play a song shape of you");
    assert_eq!(
        json["commands"],
        json!(["open example.com", "play a song shape of you"])
    );
}

#[tokio::test]
async fn test_get_unknown_user() {
    let app = build_test_router(setup_test_db());

    let response = app.oneshot(get("/api/user/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = build_test_router(setup_test_db());

    let response = app
        .oneshot(post_json("/api/user/save", &json!({ "name": "Alex" })))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
