// End-to-end tests across the whole stack.
//
// Two gateway instances share one user store and one account store, the way
// two server processes share a database.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use neobank::account_service::{AccountService, AccountServiceConfig, InMemoryAccountRepository};
use neobank::api_gateway::{router, AppState};
use neobank::identity_service::{IdentityService, InMemoryUserRepository, TokenService};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-secret";

/// Build `count` routers over shared stores, each with its own services
fn cluster(count: usize) -> Vec<Router> {
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());

    (0..count)
        .map(|_| {
            let tokens = TokenService::new(SECRET, chrono::Duration::minutes(15), chrono::Duration::days(1));
            let state = AppState {
                account_service: Arc::new(AccountService::from_repository(
                    accounts.clone(),
                    AccountServiceConfig::new(64, "Premium Elite"),
                )),
                identity_service: Arc::new(IdentityService::from_repository(users.clone(), tokens)),
            };
            router(Arc::new(state))
        })
        .collect()
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match token {
        Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
        None => request,
    };
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_customer_journey() {
    let nodes = cluster(2);
    let (a, b) = (&nodes[0], &nodes[1]);

    // Register on one node
    let (status, body) = send(
        a,
        Method::POST,
        "/api/auth/register/",
        None,
        Some(json!({
            "email": "grace@example.com",
            "first_name": "Grace",
            "last_name": "Hopper",
            "password": "c0bol-forever",
            "password_confirm": "c0bol-forever",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let account_token = body["tokens"]["access"].as_str().unwrap().to_string();

    // Log in on the other; same account, same token secret
    let (status, body) = send(
        b,
        Method::POST,
        "/api/auth/login/",
        None,
        Some(json!({"email": "grace@example.com", "password": "c0bol-forever"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["tokens"]["access"].as_str().unwrap().to_string();

    let (_, first) = send(a, Method::GET, "/api/account/", Some(account_token.as_str()), None).await;
    let (_, second) = send(b, Method::GET, "/api/account/", Some(token.as_str()), None).await;
    assert_eq!(first["account_number"], second["account_number"]);
    assert_eq!(first["balance"], "0.00");

    // 100.00 + 50.00 = 150.00, then an overdraft is refused
    let (status, _) = send(
        a,
        Method::PATCH,
        "/api/account/balance/",
        Some(token.as_str()),
        Some(json!({"balance": "100.00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        b,
        Method::POST,
        "/api/account/deposit/",
        Some(token.as_str()),
        Some(json!({"amount": "50.00"})),
    )
    .await;
    assert_eq!(body["account"]["balance"], "150.00");

    let (status, body) = send(
        a,
        Method::POST,
        "/api/account/withdraw/",
        Some(token.as_str()),
        Some(json!({"amount": "150.01"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "insufficient_funds");

    let (_, body) = send(b, Method::GET, "/api/account/", Some(token.as_str()), None).await;
    assert_eq!(body["balance"], "150.00");

    let (_, body) = send(a, Method::GET, "/api/auth/profile/", Some(token.as_str()), None).await;
    assert_eq!(body["username"], "gracehopper");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_across_nodes() {
    let nodes = cluster(2);

    let (status, body) = send(
        &nodes[0],
        Method::POST,
        "/api/auth/register/",
        None,
        Some(json!({
            "email": "alan@example.com",
            "first_name": "Alan",
            "last_name": "Turing",
            "password": "enigma-machine",
            "password_confirm": "enigma-machine",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["tokens"]["access"].as_str().unwrap().to_string();

    // Nodes lock independently, so only the store's compare-and-swap keeps
    // them from overwriting each other
    let deposits = (0..40).map(|i| {
        let node = nodes[i % 2].clone();
        let token = token.clone();
        tokio::spawn(async move {
            send(
                &node,
                Method::POST,
                "/api/account/deposit/",
                Some(token.as_str()),
                Some(json!({"amount": "2.50"})),
            )
            .await
        })
    });

    for result in futures::future::join_all(deposits).await {
        let (status, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    let (_, body) = send(&nodes[1], Method::GET, "/api/account/", Some(token.as_str()), None).await;
    assert_eq!(body["balance"], "100.00");
}
