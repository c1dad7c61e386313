//! Integration tests for registration, login and session close.

mod helpers;

use axum::http::StatusCode;

use helpers::{ADMIN_TOKEN, PASSWORD, TestApp};

#[tokio::test]
async fn test_register_and_login() {
    let app = TestApp::new();

    let response = app.register("aliceuser", PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["login"], "aliceuser");

    let token = app.login("aliceuser", PASSWORD).await;
    assert!(!token.is_empty());

    let docs = app.request("GET", "/api/docs", None, Some(&token)).await;
    assert_eq!(docs.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_bad_admin_token() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/register",
            Some(serde_json::json!({
                "token": "not-the-admin-token",
                "login": "aliceuser",
                "pswd": PASSWORD,
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "ACCESS_DENIED");
}

#[tokio::test]
async fn test_register_disabled_without_admin_token() {
    let app = TestApp::with_config(|config| config.auth.admin_token.clear());
    let response = app
        .request(
            "POST",
            "/api/register",
            Some(serde_json::json!({ "token": "", "login": "aliceuser", "pswd": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_reports_every_violation() {
    let app = TestApp::new();
    let response = app.register("al!ce", "short").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_FAILED");
    let message = response.body["message"].as_str().unwrap();
    assert!(message.contains("login must be at least 8 characters long"));
    assert!(message.contains("latin letters and digits"));
    assert!(message.contains("at least 1 digit"));
}

#[tokio::test]
async fn test_register_duplicate_login_conflicts() {
    let app = TestApp::new();
    assert_eq!(app.register("aliceuser", PASSWORD).await.status, StatusCode::OK);

    let response = app.register("aliceuser", PASSWORD).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "USER_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_login_failures_look_the_same() {
    let app = TestApp::new();
    app.register("aliceuser", PASSWORD).await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth",
            Some(serde_json::json!({ "login": "aliceuser", "pswd": "Wr0ng!pass" })),
            None,
        )
        .await;
    let unknown_user = app
        .request(
            "POST",
            "/api/auth",
            Some(serde_json::json!({ "login": "nobodyhere", "pswd": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::FORBIDDEN);
    assert_eq!(wrong_password.status, unknown_user.status);
    assert_eq!(wrong_password.body, unknown_user.body);
}

#[tokio::test]
async fn test_malformed_json_body_is_invalid_input() {
    let app = TestApp::new();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), req)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_closes_the_session() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;

    let response = app
        .request("DELETE", &format!("/api/auth/{token}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"][token.as_str()], true);

    let after = app.request("GET", "/api/docs", None, Some(&token)).await;
    assert_eq!(after.status, StatusCode::FORBIDDEN);

    let again = app
        .request("DELETE", &format!("/api/auth/{token}"), None, Some(&token))
        .await;
    assert_eq!(again.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_keeps_other_sessions_open() {
    let app = TestApp::new();
    let first = app.user("aliceuser").await;
    let second = app.login("aliceuser", PASSWORD).await;
    assert_ne!(first, second);

    let response = app
        .request("DELETE", &format!("/api/auth/{first}"), None, Some(&second))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let still_open = app.request("GET", "/api/docs", None, Some(&second)).await;
    assert_eq!(still_open.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cannot_close_another_users_session() {
    let app = TestApp::new();
    let alice = app.user("aliceuser").await;
    let bob = app.user("bobbyuser").await;

    let response = app
        .request("DELETE", &format!("/api/auth/{alice}"), None, Some(&bob))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let alice_docs = app.request("GET", "/api/docs", None, Some(&alice)).await;
    assert_eq!(alice_docs.status, StatusCode::OK);
}

#[tokio::test]
async fn test_garbage_bearer_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .request("GET", "/api/docs", None, Some("garbage.token.value"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_admin_token_is_not_a_session() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/docs", None, Some(ADMIN_TOKEN)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
