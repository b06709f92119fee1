use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

struct TestApp {
    app: Router,
    engine: Arc<Engine>,
}

async fn test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());

    TestApp {
        app: server::router(Arc::clone(&engine)),
        engine,
    }
}

impl TestApp {
    async fn user(&self, name: &str, email: &str) -> i64 {
        self.engine.create_user(name, email).await.unwrap().id
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user_id {
            request = request.header("x-user-id", user_id);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

#[tokio::test]
async fn missing_or_bad_user_header_is_unauthorized() {
    let app = test_app().await;

    let (status, _) = app.send(Method::GET, "/accounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/accounts", Some("not-a-number"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/accounts", Some("42"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_lifecycle_over_http() {
    let app = test_app().await;
    let user = app.user("Budi Santoso", "budi@example.com").await.to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/accounts",
            Some(&user),
            Some(json!({ "balance_minor": 500_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance_minor"], 500_000);
    let x = body["id"].as_i64().unwrap();

    let (status, body) = app
        .send(Method::POST, "/accounts", Some(&user), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance_minor"], 0);
    let y = body["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            "/transactions/withdraw",
            Some(&user),
            Some(json!({ "account_id": x, "amount_minor": 600_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient funds"));

    let (status, body) = app
        .send(
            Method::POST,
            "/transactions/deposit",
            Some(&user),
            Some(json!({ "account_id": x, "amount_minor": 100_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["balance_minor"], 600_000);
    assert_eq!(body["transaction"]["kind"], "DEPOSIT");

    let (status, body) = app
        .send(
            Method::POST,
            "/transactions/transfer",
            Some(&user),
            Some(json!({ "from_account_id": x, "to_account_id": y, "amount_minor": 250_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["balance_minor"], 350_000);
    assert_eq!(body["transfer_out"]["kind"], "TRANSFER_OUT");
    assert_eq!(body["transfer_in"]["kind"], "TRANSFER_IN");
    let transfer_in_id = body["transfer_in"]["id"].as_i64().unwrap();

    let (status, body) = app.send(Method::GET, "/accounts", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["accounts"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["account"]["id"], x);
    assert_eq!(listed[0]["recent_transactions"].as_array().unwrap().len(), 3);
    assert_eq!(listed[0]["recent_transactions"][0]["kind"], "TRANSFER_OUT");
    assert_eq!(listed[1]["recent_transactions"][0]["kind"], "TRANSFER_IN");

    let (status, body) = app
        .send(Method::GET, &format!("/accounts/{y}/balance"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance_minor"], 250_000);

    let (status, body) = app
        .send(Method::GET, &format!("/accounts/{x}"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recent_transactions"].as_array().unwrap().len(), 3);
    assert_eq!(body["recent_transactions"][0]["kind"], "TRANSFER_OUT");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/transactions/{transfer_in_id}"),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_id"], y);

    let (status, body) = app
        .send(Method::GET, "/transactions", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 4);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/transactions?account_id={x}&kind=DEPOSIT"),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/accounts/{x}/reconciliation"),
            Some(&user),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balanced"], true);
    assert_eq!(body["ledger_balance_minor"], 350_000);

    let (status, body) = app
        .send(Method::DELETE, &format!("/accounts/{x}"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Invalid operation: cannot delete account with existing transactions"
    );
}

#[tokio::test]
async fn adjust_and_remove() {
    let app = test_app().await;
    let user = app.user("Agus Pratama", "agus@example.com").await.to_string();

    let (_, body) = app
        .send(Method::POST, "/accounts", Some(&user), Some(json!({})))
        .await;
    let empty = body["id"].as_i64().unwrap();

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/accounts/{empty}"),
            Some(&user),
            Some(json!({ "balance_minor": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["transaction"].is_null());

    let (status, _) = app
        .send(Method::DELETE, &format!("/accounts/{empty}"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send(Method::GET, &format!("/accounts/{empty}"), Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .send(
            Method::POST,
            "/accounts",
            Some(&user),
            Some(json!({ "balance_minor": 1_000 })),
        )
        .await;
    let funded = body["id"].as_i64().unwrap();
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/accounts/{funded}"),
            Some(&user),
            Some(json!({ "balance_minor": 1_250 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["balance_minor"], 1_250);
    assert_eq!(body["transaction"]["kind"], "DEPOSIT");
    assert_eq!(body["transaction"]["amount_minor"], 250);
}

#[tokio::test]
async fn other_users_accounts_are_forbidden() {
    let app = test_app().await;
    let owner = app.user("Budi Santoso", "budi@example.com").await.to_string();
    let intruder = app.user("Sari Wijaya", "sari@example.com").await.to_string();

    let (_, body) = app
        .send(
            Method::POST,
            "/accounts",
            Some(&owner),
            Some(json!({ "balance_minor": 50_000 })),
        )
        .await;
    let account = body["id"].as_i64().unwrap();

    let (status, _) = app
        .send(Method::GET, &format!("/accounts/{account}"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/transactions/withdraw",
            Some(&intruder),
            Some(json!({ "account_id": account, "amount_minor": 10_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::POST,
            "/transactions/transfer",
            Some(&owner),
            Some(json!({ "from_account_id": account, "to_account_id": account, "amount_minor": 1_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["error"],
        "Invalid operation: cannot transfer to the same account"
    );

    let (status, _) = app
        .send(Method::GET, "/transactions/9999", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_shows_five_latest_entries_per_account() {
    let app = test_app().await;
    let user = app.user("Rina Kusuma", "rina@example.com").await.to_string();

    let (_, body) = app
        .send(
            Method::POST,
            "/accounts",
            Some(&user),
            Some(json!({ "balance_minor": 100_000 })),
        )
        .await;
    let account = body["id"].as_i64().unwrap();
    for _ in 0..6 {
        let (status, _) = app
            .send(
                Method::POST,
                "/transactions/deposit",
                Some(&user),
                Some(json!({ "account_id": account, "amount_minor": 1_000 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.send(Method::GET, "/accounts", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let recent = body["accounts"][0]["recent_transactions"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    assert!(recent.iter().all(|entry| entry["amount_minor"] == 1_000));
    assert_eq!(body["accounts"][0]["account"]["balance_minor"], 106_000);
}

#[tokio::test]
async fn profile_can_be_read_and_updated() {
    let app = test_app().await;
    let user = app.user("Budi Santoso", "budi@example.com").await.to_string();
    app.user("Sari Wijaya", "sari@example.com").await;

    let (status, body) = app.send(Method::GET, "/user/profile", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Budi Santoso");
    assert_eq!(body["email"], "budi@example.com");

    let (status, body) = app
        .send(
            Method::PATCH,
            "/user/profile",
            Some(&user),
            Some(json!({ "name": "Budi S.", "email": " BUDI.S@Example.com " })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Budi S.");
    assert_eq!(body["email"], "budi.s@example.com");

    let (status, body) = app
        .send(
            Method::PATCH,
            "/user/profile",
            Some(&user),
            Some(json!({ "email": "Sari@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Invalid operation: email already registered");

    let (status, body) = app.send(Method::GET, "/user/profile", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "budi.s@example.com");

    let (status, _) = app.send(Method::GET, "/user/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
