use std::sync::Arc;

use account_service::{AccountRepository, AccountService, AccountServiceConfig, InMemoryAccountRepository};
use api_gateway::{router, AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    Router,
};
use common::model::account::Account;
use common::{Error, Money, Result};
use identity_service::{IdentityService, IdentityServiceConfig, RepositoryType};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    state: Arc<AppState>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_accounts(Arc::new(InMemoryAccountRepository::new()))
    }

    fn with_accounts(accounts: Arc<dyn AccountRepository>) -> Self {
        let identity_config = IdentityServiceConfig::new(Some("http-test-secret".to_string()), 15, 1);
        let state = Arc::new(AppState {
            account_service: Arc::new(AccountService::from_repository(
                accounts,
                AccountServiceConfig::new(32, "Premium Elite"),
            )),
            identity_service: Arc::new(
                IdentityService::with_repository(RepositoryType::InMemory, &identity_config).unwrap(),
            ),
        });

        Self {
            router: router(state.clone()),
            state,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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

        self.call(request).await
    }

    async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Register a user and return `(access, refresh)`
    async fn register(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({
                    "email": email,
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "password": "s3cure-passw0rd",
                    "password_confirm": "s3cure-passw0rd",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let access = body["tokens"]["access"].as_str().unwrap().to_string();
        let refresh = body["tokens"]["refresh"].as_str().unwrap().to_string();
        (access, refresh)
    }

    async fn balance(&self, token: &str) -> String {
        let (status, body) = self.send(Method::GET, "/api/account/", Some(token), None).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["balance"].as_str().unwrap().to_string()
    }
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Account store that is reachable for reads but refuses to open accounts
struct UnwritableAccounts;

#[async_trait]
impl AccountRepository for UnwritableAccounts {
    async fn create_account(&self, _owner_id: Uuid, _account_type: &str) -> Result<Account> {
        Err(Error::Internal("account store is read-only".to_string()))
    }

    async fn get_account(&self, _id: Uuid) -> Result<Option<Account>> {
        Ok(None)
    }

    async fn get_account_by_owner(&self, _owner_id: Uuid) -> Result<Option<Account>> {
        Ok(None)
    }

    async fn compare_and_swap_balance(
        &self,
        _account_id: Uuid,
        _expected: Money,
        _new_balance: Money,
    ) -> Result<Option<Account>> {
        Ok(None)
    }
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_register_returns_user_and_tokens() {
        let app = TestApp::new();

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({
                    "email": "Ada@Example.com",
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "password": "s3cure-passw0rd",
                    "password_confirm": "s3cure-passw0rd",
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["email"], "ada@example.com");
        assert_eq!(body["user"]["username"], "adalovelace");
        assert!(body["user"].get("password_hash").is_none());
        assert!(body["tokens"]["access"].is_string());
        assert!(body["tokens"]["refresh"].is_string());
    }

    #[tokio::test]
    async fn test_register_errors() {
        let app = TestApp::new();
        app.register("ada@example.com").await;

        let mut payload = json!({
            "email": "ADA@example.com",
            "first_name": "Ada",
            "last_name": "King",
            "password": "s3cure-passw0rd",
            "password_confirm": "s3cure-passw0rd",
        });
        let (status, body) = app.send(Method::POST, "/api/auth/register/", None, Some(payload.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "email_taken");

        payload["email"] = json!("grace@example.com");
        payload["password_confirm"] = json!("different-password");
        let (status, body) = app.send(Method::POST, "/api/auth/register/", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "validation_error");
    }

    #[tokio::test]
    async fn test_login() {
        let app = TestApp::new();
        app.register("ada@example.com").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login/",
                None,
                Some(json!({"email": "ada@example.com", "password": "s3cure-passw0rd"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");

        let access = body["tokens"]["access"].as_str().unwrap();
        assert_eq!(app.balance(access).await, "0.00");

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/login/",
                None,
                Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), "invalid_credentials");
    }

    #[tokio::test]
    async fn test_refresh_and_logout() {
        let app = TestApp::new();
        let (access, refresh) = app.register("ada@example.com").await;

        let (status, body) = app
            .send(Method::POST, "/api/auth/token/refresh/", None, Some(json!({"refresh": refresh})))
            .await;
        assert_eq!(status, StatusCode::OK);
        let fresh_access = body["access"].as_str().unwrap().to_string();
        assert_eq!(app.balance(&fresh_access).await, "0.00");

        let (status, body) = app
            .send(Method::POST, "/api/auth/logout/", Some(access.as_str()), Some(json!({"refresh": refresh})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logout successful");

        let (status, _) = app
            .send(Method::POST, "/api/auth/token/refresh/", None, Some(json!({"refresh": refresh})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .send(Method::POST, "/api/auth/logout/", Some(access.as_str()), Some(json!({"refresh": "not-a-token"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "bad_request");
    }

    #[tokio::test]
    async fn test_logout_rejects_another_users_refresh_token() {
        let app = TestApp::new();
        let (_, ada_refresh) = app.register("ada@example.com").await;
        let (grace_access, _) = app.register("grace@example.com").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/logout/",
                Some(grace_access.as_str()),
                Some(json!({"refresh": ada_refresh})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "bad_request");

        // Ada's session survives
        let (status, _) = app
            .send(Method::POST, "/api/auth/token/refresh/", None, Some(json!({"refresh": ada_refresh})))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_fails_when_account_cannot_be_opened() {
        let app = TestApp::with_accounts(Arc::new(UnwritableAccounts));

        let (status, body) = app
            .send(
                Method::POST,
                "/api/auth/register/",
                None,
                Some(json!({
                    "email": "ada@example.com",
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "password": "s3cure-passw0rd",
                    "password_confirm": "s3cure-passw0rd",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_code(&body), "internal_error");
        assert!(body.get("tokens").is_none());
    }

    #[tokio::test]
    async fn test_profile() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;

        let (status, body) = app.send(Method::GET, "/api/auth/profile/", Some(access.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["first_name"], "Ada");
        assert!(body["date_joined"].is_string());
    }

    #[tokio::test]
    async fn test_requests_without_valid_token_are_rejected() {
        let app = TestApp::new();
        let (_, refresh) = app.register("ada@example.com").await;

        for token in [None, Some("garbage"), Some(refresh.as_str())] {
            let (status, body) = app.send(Method::GET, "/api/account/", token, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "token {:?}", token);
            assert_eq!(error_code(&body), "unauthorized");
        }

        let request = Request::builder()
            .uri("/api/account/")
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

mod account {
    use super::*;

    #[tokio::test]
    async fn test_new_account_shape() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;

        let (status, body) = app.send(Method::GET, "/api/account/", Some(access.as_str()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "0.00");
        assert_eq!(body["account_type"], "Premium Elite");

        let number = body["account_number"].as_str().unwrap();
        assert_eq!(number.len(), 12);
        assert!(number.starts_with("NB"));
        assert!(body["id"].is_string());
        assert!(body["created_at"].is_string());
        assert!(body.get("owner_id").is_none());

        // Reads do not change anything
        let (_, again) = app.send(Method::GET, "/api/account/", Some(access.as_str()), None).await;
        assert_eq!(body, again);
    }

    #[tokio::test]
    async fn test_deposit_withdraw_and_set_balance() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;

        let (status, body) = app
            .send(Method::PATCH, "/api/account/balance/", Some(access.as_str()), Some(json!({"balance": "100.00"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Balance updated successfully");
        assert_eq!(body["account"]["balance"], "100.00");

        let (status, body) = app
            .send(Method::POST, "/api/account/deposit/", Some(access.as_str()), Some(json!({"amount": "50.00"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Deposit successful");
        assert_eq!(body["account"]["balance"], "150.00");

        // JSON numbers are accepted too
        let (status, body) = app
            .send(Method::POST, "/api/account/withdraw/", Some(access.as_str()), Some(json!({"amount": 25.5})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Withdrawal successful");
        assert_eq!(body["account"]["balance"], "124.50");

        let (status, body) = app
            .send(Method::POST, "/api/account/withdraw/", Some(access.as_str()), Some(json!({"amount": "124.50"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account"]["balance"], "0.00");
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_balance() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;
        app.send(Method::PATCH, "/api/account/balance/", Some(access.as_str()), Some(json!({"balance": 100})))
            .await;

        let (status, body) = app
            .send(Method::POST, "/api/account/withdraw/", Some(access.as_str()), Some(json!({"amount": "150.00"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "insufficient_funds");
        assert_eq!(app.balance(&access).await, "100.00");
    }

    #[tokio::test]
    async fn test_invalid_amounts_are_rejected() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;
        app.send(Method::PATCH, "/api/account/balance/", Some(access.as_str()), Some(json!({"balance": "10.00"})))
            .await;

        for amount in [json!("abc"), json!(-5), json!("0"), json!("1.001"), json!(true), json!(""), Value::Null] {
            for uri in ["/api/account/deposit/", "/api/account/withdraw/"] {
                let (status, body) = app
                    .send(Method::POST, uri, Some(access.as_str()), Some(json!({ "amount": amount.clone() })))
                    .await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, amount);
                assert_eq!(error_code(&body), "invalid_amount", "{} {}", uri, amount);
            }
        }

        let (status, body) = app.send(Method::POST, "/api/account/deposit/", Some(access.as_str()), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "invalid_amount");

        for balance in [json!("-5"), json!(-0.01), json!("ten"), json!("5.123")] {
            let (status, body) = app
                .send(Method::PATCH, "/api/account/balance/", Some(access.as_str()), Some(json!({ "balance": balance.clone() })))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", balance);
            assert_eq!(error_code(&body), "invalid_amount", "{}", balance);
        }

        assert_eq!(app.balance(&access).await, "10.00");
    }

    #[tokio::test]
    async fn test_set_balance_to_zero() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;
        app.send(Method::POST, "/api/account/deposit/", Some(access.as_str()), Some(json!({"amount": "42.00"})))
            .await;

        let (status, body) = app
            .send(Method::PATCH, "/api/account/balance/", Some(access.as_str()), Some(json!({"balance": "0"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["account"]["balance"], "0.00");
    }

    #[tokio::test]
    async fn test_missing_account_is_reported_before_bad_input() {
        let app = TestApp::new();
        // A valid token for a user that has no account
        let tokens = app.state.identity_service.tokens().issue(Uuid::new_v4()).unwrap();

        let (status, body) = app.send(Method::GET, "/api/account/", Some(tokens.access.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "account_not_found");

        let (status, body) = app
            .send(Method::POST, "/api/account/deposit/", Some(tokens.access.as_str()), Some(json!({"amount": "abc"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "account_not_found");

        let (status, body) = app.send(Method::GET, "/api/auth/profile/", Some(tokens.access.as_str()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "user_not_found");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/account/deposit/")
            .header(AUTHORIZATION, format!("Bearer {}", access))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"amount\": "))
            .unwrap();
        let (status, body) = app.call(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), "bad_request");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_concurrent_deposits_are_not_lost() {
        let app = TestApp::new();
        let (access, _) = app.register("ada@example.com").await;

        let deposits = (0..25).map(|_| {
            app.send(Method::POST, "/api/account/deposit/", Some(access.as_str()), Some(json!({"amount": "4.00"})))
        });
        let results = futures::future::join_all(deposits).await;

        assert!(results.iter().all(|(status, _)| *status == StatusCode::OK));
        assert_eq!(app.balance(&access).await, "100.00");
    }
}

mod misc {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/health/", None, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api-docs/openapi.json", None, None).await;

        assert_eq!(status, StatusCode::OK);
        for path in ["/api/account/", "/api/account/deposit/", "/api/account/balance/", "/api/auth/register/"] {
            assert!(body["paths"].get(path).is_some(), "missing {}", path);
        }
        assert!(body["components"]["securitySchemes"].get("bearer").is_some());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/nothing-here", None, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), "not_found");
    }
}
