//! HTTP-level tests of the ledger API over the SQLite adapter.
//!
//! These exercise routing, status mapping and error bodies through the full
//! middleware stack, including rate limiting.
//!
//! This test requires the `sqlite` feature flag.

#![cfg(feature = "sqlite")]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use ledger_hex::{Collaborators, LedgerService, inbound::HttpServer};
use ledger_repo::SqliteRepo;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Helper to create a test server backed by in-memory SQLite.
async fn create_test_server(requests_per_minute: u32) -> HttpServer<SqliteRepo> {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let service = LedgerService::new(repo.clone(), Collaborators::backed_by(repo));
    HttpServer::with_rate_limit(service, requests_per_minute)
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Caller-Id", "tests");
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Profile with a DAILY payer cap of 500.00, two funded parties and an
/// active mobile product.
async fn seed(app: &Router) {
    let (status, profile) = send(
        app,
        request(
            Method::POST,
            "/api/thresholds/profiles",
            Some(json!({ "name": "retail", "owner_type": "USER" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let profile_id = profile["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        request(
            Method::PUT,
            &format!("/api/thresholds/profiles/{}/limits/DEFAULT", profile_id),
            Some(json!({
                "payer_count": 10,
                "payer_amount": "500.00",
                "payee_count": 10,
                "payee_amount": "5000.00"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (owner, balance) in [("alice", "1000.00"), ("bob", "0")] {
        let (status, account) = send(
            app,
            request(
                Method::POST,
                "/api/accounts",
                Some(json!({
                    "id": owner,
                    "account_type": "USER",
                    "pin": "2468",
                    "threshold_profile_id": profile_id
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(account["has_pin"], true);

        let (status, _) = send(
            app,
            request(
                Method::POST,
                "/api/wallets",
                Some(json!({ "owner_id": owner, "kind": "MAIN" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        if balance != "0" {
            let (status, _) = send(
                app,
                request(
                    Method::POST,
                    &format!("/api/parties/{}/wallet/credit", owner),
                    Some(json!({ "amount": balance })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    let (status, _) = send(
        app,
        request(
            Method::PUT,
            "/api/products/PRD_MOBILE",
            Some(json!({ "active": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

fn transfer_body(amount: &str) -> Value {
    json!({ "payer_id": "alice", "payee_id": "bob", "amount": amount })
}

#[tokio::test]
async fn test_transfer_round_trip() {
    let app = create_test_server(1000).await.router();
    seed(&app).await;

    let (status, created) = send(
        &app,
        request(Method::POST, "/api/transfers", Some(transfer_body("120.50"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "SUCCESS");
    assert_eq!(created["payer_balance"], "879.50");
    assert_eq!(created["payee_balance"], "120.50");

    let id = created["transfer_id"].as_str().unwrap();
    assert!(id.starts_with("TXN_"));
    let (status, view) = send(
        &app,
        request(Method::GET, &format!("/api/transfers/{}", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["line_items"].as_array().unwrap().len(), 2);

    let (status, page) = send(
        &app,
        request(Method::GET, "/api/parties/bob/transfers?status=SUCCESS", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["transfer_id"], id);

    let (status, wallet) = send(&app, request(Method::GET, "/api/parties/bob/wallet", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wallet["balance"], "120.50");
}

#[tokio::test]
async fn test_idempotent_resubmission_replays() {
    let app = create_test_server(1000).await.router();
    seed(&app).await;

    let mut body = transfer_body("50.00");
    body["idempotency_key"] = json!("invoice-9");

    let (first_status, first) = send(
        &app,
        request(Method::POST, "/api/transfers", Some(body.clone())),
    )
    .await;
    let (second_status, second) =
        send(&app, request(Method::POST, "/api/transfers", Some(body))).await;

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(second["replayed"], true);
    assert_eq!(first["transfer_id"], second["transfer_id"]);

    let (_, wallet) = send(&app, request(Method::GET, "/api/parties/alice/wallet", None)).await;
    assert_eq!(wallet["balance"], "950.00");
}

#[tokio::test]
async fn test_insufficient_balance_is_unprocessable() {
    let app = create_test_server(1000).await.router();
    seed(&app).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/transfers",
            Some(json!({ "payer_id": "bob", "payee_id": "alice", "amount": "1.00" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "INSUFFICIENT_BALANCE");
    assert_eq!(body["code"], 422);

    let id = body["transfer_id"].as_str().unwrap();
    let (_, view) = send(
        &app,
        request(Method::GET, &format!("/api/transfers/{}", id), None),
    )
    .await;
    assert_eq!(view["status"], "FAILED");
    assert_eq!(view["error_code"], "INSUFFICIENT_BALANCE");
}

#[tokio::test]
async fn test_threshold_violation_lists_violations() {
    let app = create_test_server(1000).await.router();
    seed(&app).await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/transfers", Some(transfer_body("600.00"))),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_code"], "THRESHOLD_VIOLATION");
    let violations = body["violations"].as_array().unwrap();
    assert!(
        violations
            .iter()
            .any(|v| v["window"] == "DAILY" && v["kind"] == "AMOUNT")
    );

    let (status, check) = send(
        &app,
        request(
            Method::POST,
            "/api/thresholds/validate",
            Some(json!({ "owner_id": "alice", "amount": "100.00", "role": "PAYER" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["valid"], true);
}

#[tokio::test]
async fn test_payment_gates_map_to_statuses() {
    let app = create_test_server(1000).await.router();
    seed(&app).await;

    let payment = |pin: &str, product: &str| {
        json!({
            "payer_id": "alice",
            "payee_id": "bob",
            "amount": "10.00",
            "product_type": "MOBILE",
            "product_id": product,
            "pin": pin
        })
    };

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/transfers/recharge",
            Some(payment("0000", "PRD_MOBILE")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "INVALID_CREDENTIAL");
    assert!(body.get("transfer_id").is_none());

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/transfers/bill-payment",
            Some(payment("2468", "PRD_UNKNOWN")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, created) = send(
        &app,
        request(
            Method::POST,
            "/api/transfers/recharge",
            Some(payment("2468", "PRD_MOBILE")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let id = created["transfer_id"].as_str().unwrap();
    let (_, view) = send(
        &app,
        request(Method::GET, &format!("/api/transfers/{}", id), None),
    )
    .await;
    assert_eq!(view["service_type"], "RECHARGE");
}

#[tokio::test]
async fn test_unknown_transfer_is_not_found() {
    let app = create_test_server(1000).await.router();

    let (status, body) = send(&app, request(Method::GET, "/api/transfers/TXN_missing", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_rate_limit_is_per_caller() {
    let app = create_test_server(2).await.router();

    let limited = |caller: &str| {
        Request::builder()
            .uri("/api/transfers/TXN_missing")
            .header("X-Caller-Id", caller)
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(limited("merchant-1")).await.unwrap();
        assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let response = app.clone().oneshot(limited("merchant-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("Rate limit exceeded")
    );

    let response = app.clone().oneshot(limited("merchant-2")).await.unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Health endpoint bypasses rate limiting entirely
    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("X-Caller-Id", "merchant-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
