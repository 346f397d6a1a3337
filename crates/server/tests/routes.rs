use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router, spawn_with_listener};

async fn app() -> (Router, DatabaseConnection) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    let state = ServerState {
        engine: Arc::new(engine),
    };
    (router(state), db)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn open_account(app: &Router, owner: i64, currency: &str, balance: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/accounts",
        Some(json!({ "owner": owner, "currency": currency, "balance": balance })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn create_and_get_account() {
    let (app, _db) = app().await;
    let id = open_account(&app, 7, "USD", 1000).await;

    let (status, body) = send(&app, Method::GET, &format!("/accounts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner"], 7);
    assert_eq!(body["currency"], "USD");
    assert_eq!(body["balance"], 1000);
}

#[tokio::test]
async fn account_balance_defaults_to_zero() {
    let (app, _db) = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(json!({ "owner": 1, "currency": "EUR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn unknown_account_is_404() {
    let (app, _db) = app().await;
    let (status, body) = send(&app, Method::GET, "/accounts/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("99"));
}

#[tokio::test]
async fn transfer_returns_everything_written() {
    let (app, _db) = app().await;
    let a = open_account(&app, 1, "USD", 1000).await;
    let b = open_account(&app, 2, "USD", 500).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a,
            "to_account_id": b,
            "amount": 200,
            "currency": "USD",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["transfer"]["amount"], 200);
    assert_eq!(body["from_entry"]["amount"], -200);
    assert_eq!(body["to_entry"]["amount"], 200);
    assert_eq!(body["from_account"]["balance"], 800);
    assert_eq!(body["to_account"]["balance"], 700);

    let transfer_id = body["transfer"]["id"].as_i64().unwrap();
    let (status, body) = send(&app, Method::GET, &format!("/transfers/{transfer_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_account_id"], a);

    let (status, body) = send(&app, Method::GET, &format!("/accounts/{b}/entries"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    let entry_id = body["entries"][0]["id"].as_i64().unwrap();
    assert_eq!(body["entries"][0]["transfer_id"], transfer_id);

    let (status, body) = send(&app, Method::GET, &format!("/entries/{entry_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], b);

    let (status, body) = send(&app, Method::GET, &format!("/accounts/{a}/transfers"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transfers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn transfer_with_wrong_currency_is_rejected() {
    let (app, _db) = app().await;
    let a = open_account(&app, 1, "USD", 1000).await;
    let b = open_account(&app, 2, "EUR", 500).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a,
            "to_account_id": b,
            "amount": 10,
            "currency": "USD",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, Method::GET, &format!("/accounts/{a}"), None).await;
    assert_eq!(body["balance"], 1000);
}

#[tokio::test]
async fn invalid_transfers_are_422() {
    let (app, _db) = app().await;
    let a = open_account(&app, 1, "CAD", 1000).await;
    let b = open_account(&app, 1, "CAD", 1000).await;

    for (from, to, amount) in [(a, a, 100), (a, b, 0), (a, b, -5)] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/transfers",
            Some(json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": amount,
                "currency": "CAD",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn transfer_to_missing_account_is_404() {
    let (app, _db) = app().await;
    let a = open_account(&app, 1, "VND", 1000).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/transfers",
        Some(json!({
            "from_account_id": a,
            "to_account_id": a + 1,
            "amount": 1,
            "currency": "VND",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accounts_are_listed_by_owner() {
    let (app, _db) = app().await;
    for _ in 0..3 {
        open_account(&app, 5, "USD", 0).await;
    }
    open_account(&app, 6, "USD", 0).await;

    let (status, body) = send(&app, Method::GET, "/accounts?owner=5&page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::GET, "/accounts?owner=5&page=2&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accounts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn zero_page_is_422() {
    let (app, _db) = app().await;
    let (status, _) = send(&app, Method::GET, "/accounts?owner=1&page=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn spawned_server_answers_over_tcp() {
    let (_app, db) = app().await;
    let engine = Engine::builder().database(db).build();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = spawn_with_listener(engine, listener).unwrap();

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /accounts/1 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
}
