//! Integration tests for document upload, listing, download and delete.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, TestResponse};

fn doc_id(response: &TestResponse) -> String {
    assert_eq!(
        response.status,
        StatusCode::OK,
        "Upload failed: {:?}",
        response.body
    );
    response.body["data"]["json"]["id"]
        .as_str()
        .expect("No id in upload response")
        .to_string()
}

#[tokio::test]
async fn test_upload_then_download_returns_same_bytes() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;
    let content = b"%PDF-1.4 quarterly numbers";

    let response = app
        .upload(
            &token,
            json!({ "name": "report.pdf", "file": true, "mime": "application/pdf" }),
            Some(("report.pdf", content)),
        )
        .await;
    let id = doc_id(&response);
    assert_eq!(response.body["data"]["file"], "report.pdf");
    assert_eq!(response.body["data"]["json"]["size"], content.len());
    assert_eq!(response.body["data"]["json"]["owner"], "aliceuser");

    let download = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&token))
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.raw, content);
    assert_eq!(download.header("content-type"), Some("application/pdf"));
    assert!(download.header("etag").is_some());
    assert!(
        download
            .header("content-disposition")
            .unwrap()
            .contains("report.pdf")
    );
}

#[tokio::test]
async fn test_json_record_is_returned_as_json() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;

    let response = app
        .upload(
            &token,
            json!({ "name": "settings", "file": false, "metadata": { "env": "prod" } }),
            None,
        )
        .await;
    let id = doc_id(&response);

    let record = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&token))
        .await;
    assert_eq!(record.status, StatusCode::OK);
    assert_eq!(record.body["data"]["name"], "settings");
    assert_eq!(record.body["data"]["file"], false);
    assert_eq!(record.body["data"]["metadata"]["env"], "prod");
}

#[tokio::test]
async fn test_list_returns_etag_and_honours_if_none_match() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;
    for name in ["a.txt", "b.txt"] {
        doc_id(
            &app.upload(&token, json!({ "name": name, "file": true }), Some((name, b"x")))
                .await,
        );
    }

    let list = app.request("GET", "/api/docs", None, Some(&token)).await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["data"]["docs"].as_array().unwrap().len(), 2);
    assert_eq!(list.header("x-file-count"), Some("2"));
    assert_eq!(list.header("cache-control"), Some("private, max-age=43200"));
    let etag = list.header("etag").unwrap().to_string();

    let cached = app
        .request_with_headers("GET", "/api/docs", &token, &[("if-none-match", &etag)])
        .await;
    assert_eq!(cached.status, StatusCode::NOT_MODIFIED);
    assert!(cached.raw.is_empty());

    doc_id(
        &app.upload(&token, json!({ "name": "c.txt", "file": true }), Some(("c.txt", b"y")))
            .await,
    );
    let changed = app
        .request_with_headers("GET", "/api/docs", &token, &[("if-none-match", &etag)])
        .await;
    assert_eq!(changed.status, StatusCode::OK);
    assert_eq!(changed.header("x-file-count"), Some("3"));
}

#[tokio::test]
async fn test_head_list_has_headers_but_no_body() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;
    doc_id(
        &app.upload(&token, json!({ "name": "a.txt", "file": true }), Some(("a.txt", b"x")))
            .await,
    );

    let response = app.request_with_headers("HEAD", "/api/docs", &token, &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-file-count"), Some("1"));
    assert!(response.header("etag").is_some());
    assert!(response.raw.is_empty());
}

#[tokio::test]
async fn test_list_filter_and_limit() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;
    for name in ["report-q1.pdf", "report-q2.pdf", "notes.txt"] {
        doc_id(
            &app.upload(&token, json!({ "name": name, "file": true }), Some((name, b"x")))
                .await,
        );
    }

    let filtered = app
        .request("GET", "/api/docs?key=name&value=REPORT", None, Some(&token))
        .await;
    assert_eq!(filtered.status, StatusCode::OK);
    assert_eq!(filtered.header("x-file-count"), Some("2"));

    let limited = app
        .request("GET", "/api/docs?limit=1", None, Some(&token))
        .await;
    assert_eq!(limited.header("x-file-count"), Some("1"));

    let invalid = app
        .request("GET", "/api/docs?limit=many", None, Some(&token))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_grantee_can_read_and_stranger_cannot() {
    let app = TestApp::new();
    let alice = app.user("aliceuser").await;
    let bob = app.user("bobbyuser").await;
    let carol = app.user("caroluser").await;

    let id = doc_id(
        &app.upload(
            &alice,
            json!({ "name": "secret.txt", "file": true, "grant": ["bobbyuser"] }),
            Some(("secret.txt", b"classified")),
        )
        .await,
    );

    let granted = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&bob))
        .await;
    assert_eq!(granted.status, StatusCode::OK);
    assert_eq!(granted.raw, b"classified");

    let denied = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&carol))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let hinted = app
        .request(
            "GET",
            &format!("/api/docs/{id}?login=aliceuser"),
            None,
            Some(&carol),
        )
        .await;
    assert_eq!(hinted.status, StatusCode::FORBIDDEN);

    let listed = app
        .request("GET", "/api/docs?login=aliceuser", None, Some(&carol))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.header("x-file-count"), Some("0"));
}

#[tokio::test]
async fn test_public_document_is_readable_by_anyone() {
    let app = TestApp::new();
    let alice = app.user("aliceuser").await;
    let carol = app.user("caroluser").await;

    let id = doc_id(
        &app.upload(
            &alice,
            json!({ "name": "readme.txt", "file": true, "public": true }),
            Some(("readme.txt", b"hello")),
        )
        .await,
    );

    let response = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&carol))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let listed = app
        .request("GET", "/api/docs?login=aliceuser", None, Some(&carol))
        .await;
    assert_eq!(listed.header("x-file-count"), Some("1"));
}

#[tokio::test]
async fn test_only_owner_can_delete() {
    let app = TestApp::new();
    let alice = app.user("aliceuser").await;
    let bob = app.user("bobbyuser").await;

    let id = doc_id(
        &app.upload(
            &alice,
            json!({ "name": "shared.txt", "file": true, "public": true }),
            Some(("shared.txt", b"data")),
        )
        .await,
    );

    let denied = app
        .request("DELETE", &format!("/api/docs/{id}"), None, Some(&bob))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let deleted = app
        .request("DELETE", &format!("/api/docs/{id}"), None, Some(&alice))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"][id.as_str()], true);

    let gone = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&alice))
        .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let listed = app.request("GET", "/api/docs", None, Some(&alice)).await;
    assert_eq!(listed.header("x-file-count"), Some("0"));
}

#[tokio::test]
async fn test_oversize_upload_is_rejected() {
    let app = TestApp::with_config(|config| config.storage.max_upload_size_bytes = 8);
    let token = app.user("aliceuser").await;

    let response = app
        .upload(
            &token,
            json!({ "name": "big.bin", "file": true }),
            Some(("big.bin", b"more than eight bytes")),
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.body["error"], "FILE_TOO_LARGE");
}

#[tokio::test]
async fn test_invalid_ids_and_names() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;

    let bad_id = app
        .request("GET", "/api/docs/not-a-uuid", None, Some(&token))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "INVALID_INPUT");

    let missing = app
        .request(
            "GET",
            &format!("/api/docs/{}", uuid::Uuid::new_v4()),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let bad_name = app
        .upload(&token, json!({ "name": "../escape", "file": true }), Some(("x", b"x")))
        .await;
    assert_eq!(bad_name.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_name.body["error"], "INVALID_FILE_NAME");
}

#[tokio::test]
async fn test_upload_requires_meta() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/docs")
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "multipart/form-data; boundary=b")
        .body(axum::body::Body::from("--b--\r\n"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), req)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_mime_that_cannot_be_a_header() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;

    let response = app
        .upload(
            &token,
            json!({ "name": "a.txt", "file": true, "mime": "text/plain\u{0007}" }),
            Some(("a.txt", b"x")),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "INVALID_INPUT");

    let listed = app.request("GET", "/api/docs", None, Some(&token)).await;
    assert_eq!(listed.header("x-file-count"), Some("0"));
}

#[tokio::test]
async fn test_grantee_limit_counts_only_readable_documents() {
    let app = TestApp::new();
    let alice = app.user("aliceuser").await;
    let bob = app.user("bobbyuser").await;

    doc_id(
        &app.upload(&alice, json!({ "name": "private.txt", "file": true }), Some(("p", b"p")))
            .await,
    );
    doc_id(
        &app.upload(
            &alice,
            json!({ "name": "shared.txt", "file": true, "grant": ["bobbyuser"] }),
            Some(("s", b"s")),
        )
        .await,
    );

    let listed = app
        .request("GET", "/api/docs?login=aliceuser&limit=1", None, Some(&bob))
        .await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.header("x-file-count"), Some("1"));
    assert_eq!(listed.body["data"]["docs"][0]["name"], "shared.txt");
}

#[tokio::test]
async fn test_deleted_document_is_gone_immediately() {
    let app = TestApp::new();
    let token = app.user("aliceuser").await;
    let id = doc_id(
        &app.upload(&token, json!({ "name": "a.txt", "file": true }), Some(("a.txt", b"x")))
            .await,
    );

    // Served from the cache entry the upload populated.
    let before = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&token))
        .await;
    assert_eq!(before.status, StatusCode::OK);

    let deleted = app
        .request("DELETE", &format!("/api/docs/{id}"), None, Some(&token))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let after = app
        .request("GET", &format!("/api/docs/{id}"), None, Some(&token))
        .await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}
