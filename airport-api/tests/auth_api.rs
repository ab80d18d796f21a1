//! Registration and the token endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{build_test_app, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_then_obtain_tokens() {
    let app = build_test_app();

    let (status, user) = app
        .post(
            "/api/v1/users",
            None,
            json!({"email": "New@Example.COM", "password": "long-enough-1", "is_staff": true}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "New@example.com");
    assert_eq!(user["is_staff"], false);

    let (status, tokens) = app
        .post(
            "/api/v1/token",
            None,
            json!({"email": "New@example.com", "password": "long-enough-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = tokens["access"].as_str().unwrap();

    let (status, me) = app.get("/api/v1/users/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
async fn registration_validates_credentials() {
    let app = build_test_app();

    let (status, body) = app
        .post("/api/v1/users", None, json!({"email": "not-an-email", "password": "12345678"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["email"][0], "Enter a valid email address.");
    assert_eq!(body["fields"]["password"][0], "This password is entirely numeric.");

    app.user("taken@example.com", false).await;
    let (status, body) = app
        .post("/api/v1/users", None, json!({"email": "taken@example.com", "password": "long-enough-1"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = build_test_app();
    app.user("customer@example.com", false).await;

    let (status, body) = app
        .post("/api/v1/token", None, json!({"email": "customer@example.com", "password": "nope-nope"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No active account found with the given credentials");

    let (status, _) = app
        .post("/api/v1/token", None, json!({"email": "ghost@example.com", "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_token_only_refreshes() {
    let app = build_test_app();
    app.user("customer@example.com", false).await;

    let (_, tokens) = app
        .post("/api/v1/token", None, json!({"email": "customer@example.com", "password": PASSWORD}))
        .await;
    let access = tokens["access"].as_str().unwrap();
    let refresh = tokens["refresh"].as_str().unwrap();

    let (status, _) = app.get("/api/v1/users/me", Some(refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.post("/api/v1/token/refresh", None, json!({"refresh": refresh})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    let (status, _) = app.post("/api/v1/token/refresh", None, json!({"refresh": access})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_accepts_only_our_tokens() {
    let app = build_test_app();
    let token = app.token("customer@example.com", false).await;

    let (status, body) = app.post("/api/v1/token/verify", None, json!({"token": token})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = app.post("/api/v1/token/verify", None, json!({"token": "garbage"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_takes_effect() {
    let app = build_test_app();
    let token = app.token("customer@example.com", false).await;

    let (status, _) = app
        .send(
            Method::PATCH,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({"password": "a-new-password"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/v1/token", None, json!({"email": "customer@example.com", "password": PASSWORD}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/v1/token",
            None,
            json!({"email": "customer@example.com", "password": "a-new-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
