//! Full integration tests for the GridMarket API
//!
//! Each test spins up the complete router over the in-memory store and
//! drives it through HTTP, covering auth, role checks, and the main
//! purchase / top-up / redemption flows end to end.
//!
//! Run with: cargo test integration_tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::adapters::MemoryStorage;
    use crate::{routes, AppState};

    fn server() -> TestServer {
        let state = AppState::new(Arc::new(MemoryStorage::new()));
        TestServer::new(routes(state)).expect("router should build")
    }

    /// Register a user and return (id, api_key). The first caller per
    /// server becomes the admin.
    async fn register(server: &TestServer, username: &str) -> (String, String) {
        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": username }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        (
            body["id"].as_str().unwrap().to_string(),
            body["api_key"].as_str().unwrap().to_string(),
        )
    }

    /// Create a full-delivery item via the admin API, returning its id
    async fn create_item(server: &TestServer, admin_key: &str, price: i64) -> String {
        let response = server
            .post("/api/items")
            .authorization_bearer(admin_key)
            .json(&json!({
                "title": "Neon Sword",
                "description": "A glowing plasma blade.",
                "price": price,
                "type": "full",
                "content": "You have unlocked the Neon Sword asset pack!"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().to_string()
    }

    /// Grant credits by minting and redeeming a code
    async fn grant_credits(server: &TestServer, admin_key: &str, user_key: &str, amount: i64) {
        let response = server
            .post("/api/codes")
            .authorization_bearer(admin_key)
            .json(&json!({ "value": amount, "count": 1 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let code = response.json::<Value>()[0]["code"].as_str().unwrap().to_string();

        server
            .post("/api/codes/redeem")
            .authorization_bearer(user_key)
            .json(&json!({ "code": code }))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn health_check() {
        let server = server();
        let response = server.get("/health").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "ok");
    }

    #[tokio::test]
    async fn first_registered_user_is_the_admin() {
        let server = server();

        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": "root" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["role"], "admin");
        assert!(body["api_key"].as_str().unwrap().starts_with("gm-"));

        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": "neo" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["role"], "user");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let server = server();
        register(&server, "neo").await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": "neo" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blank_username_is_a_bad_request() {
        let server = server();
        let response = server
            .post("/api/auth/register")
            .json(&json!({ "username": "   " }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_a_valid_key() {
        let server = server();
        let (_, key) = register(&server, "neo").await;

        server.get("/api/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/auth/me")
            .authorization_bearer("gm-not-a-real-key")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let response = server.get("/api/auth/me").authorization_bearer(&key).await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["username"], "neo");
        assert!(body.get("api_key_hash").is_none());
    }

    #[tokio::test]
    async fn item_management_is_admin_only() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;

        let request = json!({
            "title": "Sword", "price": 100, "type": "full", "content": "x"
        });

        server
            .post("/api/items")
            .json(&request)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .post("/api/items")
            .authorization_bearer(&user_key)
            .json(&request)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let id = create_item(&server, &admin_key, 100).await;

        server
            .delete(&format!("/api/items/{}", id))
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .delete(&format!("/api/items/{}", id))
            .authorization_bearer(&admin_key)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["message"], "Item deleted");

        server
            .delete(&format!("/api/items/{}", id))
            .authorization_bearer(&admin_key)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn public_listing_never_leaks_content() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        create_item(&server, &admin_key, 500).await;

        let response = server.get("/api/items").await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert!(body[0].get("content").is_none());
        assert_eq!(body[0]["type"], "full");
    }

    #[tokio::test]
    async fn paid_content_is_gated_until_purchase() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;
        let id = create_item(&server, &admin_key, 500).await;
        let path = format!("/api/items/{}", id);

        // Anonymous and unpurchased both get Forbidden.
        server.get(&path).await.assert_status(StatusCode::FORBIDDEN);
        server
            .get(&path)
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        grant_credits(&server, &admin_key, &user_key, 500).await;
        let response = server
            .post(&format!("/api/items/{}/purchase", id))
            .authorization_bearer(&user_key)
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["message"], "Purchase successful");
        assert_eq!(body["content"], "You have unlocked the Neon Sword asset pack!");

        let response = server.get(&path).authorization_bearer(&user_key).await;
        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.json::<Value>()["content"],
            "You have unlocked the Neon Sword asset pack!"
        );
    }

    #[tokio::test]
    async fn free_items_are_visible_to_anyone() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let id = create_item(&server, &admin_key, 0).await;

        let response = server.get(&format!("/api/items/{}", id)).await;
        response.assert_status(StatusCode::OK);
        assert!(response.json::<Value>()["content"].is_string());
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let server = server();
        server
            .get("/api/items/9999")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn purchase_without_credits_is_rejected() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;
        let id = create_item(&server, &admin_key, 500).await;

        server
            .post(&format!("/api/items/{}/purchase", id))
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sequential_purchases_deliver_pages_in_order() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;
        grant_credits(&server, &admin_key, &user_key, 3000).await;

        let response = server
            .post("/api/items")
            .authorization_bearer(&admin_key)
            .json(&json!({
                "title": "Hacker Manifesto",
                "price": 1000,
                "type": "sequential",
                "contents": ["Chapter 1", "Chapter 2"]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
        let path = format!("/api/items/{}/purchase", id);

        let first = server.post(&path).authorization_bearer(&user_key).await;
        assert_eq!(first.json::<Value>()["content"], "Chapter 1");
        let second = server.post(&path).authorization_bearer(&user_key).await;
        assert_eq!(second.json::<Value>()["content"], "Chapter 2");

        // Pages exhausted, and the caller still has 1000 credits left.
        server
            .post(&path)
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        let me = server.get("/api/auth/me").authorization_bearer(&user_key).await;
        assert_eq!(me.json::<Value>()["credits"], 1000);
    }

    #[tokio::test]
    async fn transaction_approval_credits_the_owner_once() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;

        let response = server
            .post("/api/transactions")
            .authorization_bearer(&user_key)
            .json(&json!({ "reference": "pay-123", "amount": 1500 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let tx_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        // Listing and resolving are admin-only.
        server
            .get("/api/transactions")
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .post(&format!("/api/transactions/{}/approve", tx_id))
            .authorization_bearer(&user_key)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post(&format!("/api/transactions/{}/approve", tx_id))
            .authorization_bearer(&admin_key)
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "approved");

        // Second resolution of any kind is a conflict.
        server
            .post(&format!("/api/transactions/{}/approve", tx_id))
            .authorization_bearer(&admin_key)
            .await
            .assert_status(StatusCode::CONFLICT);
        server
            .post(&format!("/api/transactions/{}/reject", tx_id))
            .authorization_bearer(&admin_key)
            .await
            .assert_status(StatusCode::CONFLICT);

        let me = server.get("/api/auth/me").authorization_bearer(&user_key).await;
        assert_eq!(me.json::<Value>()["credits"], 1500);
    }

    #[tokio::test]
    async fn admin_can_fix_a_transaction_amount_before_approving() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;

        let response = server
            .post("/api/transactions")
            .authorization_bearer(&user_key)
            .json(&json!({ "reference": "pay-9", "amount": 100 }))
            .await;
        let tx_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        let response = server
            .patch(&format!("/api/transactions/{}", tx_id))
            .authorization_bearer(&admin_key)
            .json(&json!({ "amount": 250 }))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["amount"], 250);

        server
            .post(&format!("/api/transactions/{}/approve", tx_id))
            .authorization_bearer(&admin_key)
            .await
            .assert_status(StatusCode::OK);
        let me = server.get("/api/auth/me").authorization_bearer(&user_key).await;
        assert_eq!(me.json::<Value>()["credits"], 250);
    }

    #[tokio::test]
    async fn ticket_flow_open_reply_close() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;
        let (_, other_key) = register(&server, "bob").await;

        let response = server
            .post("/api/tickets")
            .authorization_bearer(&user_key)
            .json(&json!({ "subject": "Broken item", "message": "No content arrived" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let ticket_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        // Replying is admin-only; one reply closes the ticket for good.
        server
            .post(&format!("/api/tickets/{}/reply", ticket_id))
            .authorization_bearer(&user_key)
            .json(&json!({ "reply": "nice try" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post(&format!("/api/tickets/{}/reply", ticket_id))
            .authorization_bearer(&admin_key)
            .json(&json!({ "reply": "Re-delivered, sorry!" }))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()["status"], "closed");

        server
            .post(&format!("/api/tickets/{}/reply", ticket_id))
            .authorization_bearer(&admin_key)
            .json(&json!({ "reply": "again" }))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Owner and admin see it; an unrelated user does not.
        let own = server.get("/api/tickets").authorization_bearer(&user_key).await;
        assert_eq!(own.json::<Value>().as_array().unwrap().len(), 1);
        let all = server.get("/api/tickets").authorization_bearer(&admin_key).await;
        assert_eq!(all.json::<Value>().as_array().unwrap().len(), 1);
        let none = server.get("/api/tickets").authorization_bearer(&other_key).await;
        assert_eq!(none.json::<Value>().as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn codes_are_single_use() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;
        let (_, user_key) = register(&server, "neo").await;
        let (_, other_key) = register(&server, "bob").await;

        server
            .post("/api/codes")
            .authorization_bearer(&user_key)
            .json(&json!({ "value": 500 }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/api/codes")
            .authorization_bearer(&admin_key)
            .json(&json!({ "value": 500, "count": 3 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let codes: Value = response.json();
        assert_eq!(codes.as_array().unwrap().len(), 3);
        let code = codes[0]["code"].as_str().unwrap().to_string();
        assert_eq!(code.len(), 16);

        let response = server
            .post("/api/codes/redeem")
            .authorization_bearer(&user_key)
            .json(&json!({ "code": code.to_lowercase() }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["message"], "Code redeemed");
        assert_eq!(body["value"], 500);

        // Used codes and unknown codes both fail the same way.
        server
            .post("/api/codes/redeem")
            .authorization_bearer(&other_key)
            .json(&json!({ "code": code }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        server
            .post("/api/codes/redeem")
            .authorization_bearer(&other_key)
            .json(&json!({ "code": "FFFFFFFFFFFFFFFF" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_code_batches_are_rejected() {
        let server = server();
        let (_, admin_key) = register(&server, "root").await;

        for body in [
            json!({ "value": 0 }),
            json!({ "value": 500, "count": 0 }),
            json!({ "value": 500, "count": 101 }),
        ] {
            server
                .post("/api/codes")
                .authorization_bearer(&admin_key)
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }
}
