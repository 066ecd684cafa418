mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

// ---------------------------------------------------------------------------
// POST /api/auth/register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_creates_user() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state)).unwrap();

    let resp = server
        .post("/api/auth/register")
        .json(&serde_json::json!({ "username": "alice", "password": "password123" }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"]["id"].as_str().unwrap().starts_with("usr_"));
    // The hash never leaves the server.
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state)).unwrap();
    let payload = serde_json::json!({ "username": "alice", "password": "password123" });

    server.post("/api/auth/register").json(&payload).await.assert_status(StatusCode::CREATED);

    let resp = server.post("/api/auth/register").json(&payload).await;
    resp.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(body["error"]["message"], "Username already exists");
}

#[tokio::test]
async fn register_validates_fields() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state)).unwrap();

    let resp = server
        .post("/api/auth/register")
        .json(&serde_json::json!({ "username": "a", "password": "short" }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<_> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["username", "password"]);
}

#[tokio::test]
async fn register_requires_both_fields() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state)).unwrap();

    let resp = server
        .post("/api/auth/register")
        .json(&serde_json::json!({ "username": "alice" }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// POST /api/auth/login
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_accepts_valid_credentials() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state.clone())).unwrap();
    let user = common::create_user(&state, "bob").await;

    let resp = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "bob", "password": "password123" }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["user"]["id"], user.id);
    assert_eq!(body["user"]["username"], "bob");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user_alike() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state.clone())).unwrap();
    common::create_user(&state, "bob").await;

    let wrong_password = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "bob", "password": "not-the-password" }))
        .await;
    let unknown_user = server
        .post("/api/auth/login")
        .json(&serde_json::json!({ "username": "nobody", "password": "password123" }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<serde_json::Value>(),
        unknown_user.json::<serde_json::Value>()
    );
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(state)).unwrap();

    let resp = server.get("/api/health").await;
    resp.assert_status_ok();
    resp.assert_json(&serde_json::json!({ "status": "ok" }));
}
