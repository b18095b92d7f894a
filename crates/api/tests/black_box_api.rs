use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use siphon_auth::{Claims, TokenCodec, hash_password};
use siphon_core::EmployeeId;
use siphon_infra::{MemoryStore, Store};
use siphon_parties::NewEmployee;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Spawn the real router on an ephemeral port, seeded with one admin
    /// account (`root` / `rootpw`).
    async fn spawn() -> Self {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_employee(NewEmployee {
                full_name: "Root Admin".into(),
                position: "manager".into(),
                phone: "+7 900 000-00-00".into(),
                hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                username: Some("root".into()),
                password_hash: Some(hash_password("rootpw").unwrap()),
            })
            .await
            .unwrap();

        let app = siphon_api::app::build_app_with_store(store, JWT_SECRET);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, base_url: &str, username: &str, password: &str) -> String {
    let res = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("username", username), ("password", password)])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

/// Seed a category, a supplier, and a product; returns (category, supplier,
/// product) ids.
async fn seed_catalog(
    client: &reqwest::Client,
    base_url: &str,
    admin: &str,
    price: &str,
    stock: i64,
) -> (i64, i64, i64) {
    let res = client
        .post(format!("{base_url}/product-categories"))
        .bearer_auth(admin)
        .json(&json!({ "name": "Fittings", "parent_id": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{base_url}/suppliers"))
        .bearer_auth(admin)
        .json(&json!({ "name": "TruboProm", "phone": "+7 812 000-00-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let supplier: Value = res.json().await.unwrap();

    let res = client
        .post(format!("{base_url}/products"))
        .bearer_auth(admin)
        .json(&json!({
            "name": "Ball valve 1/2\"",
            "category_id": category["id"],
            "supplier_id": supplier["id"],
            "price": price,
            "description": null,
            "stock_quantity": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product: Value = res.json().await.unwrap();

    (
        category["id"].as_i64().unwrap(),
        supplier["id"].as_i64().unwrap(),
        product["id"].as_i64().unwrap(),
    )
}

async fn register_customer(client: &reqwest::Client, base_url: &str, username: &str) -> i64 {
    let res = client
        .post(format!("{base_url}/customers"))
        .json(&json!({
            "full_name": "Vera Pavlova",
            "phone": "+7 900 111-22-33",
            "username": username,
            "password": "hunter2",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("password_hash").is_none());
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_is_public_and_everything_else_is_not() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for path in ["/auth/me", "/products", "/orders", "/customers"] {
        let res = client
            .get(format!("{}{path}", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "GET {path}");
    }
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut bodies = Vec::new();
    for (user, pass) in [("root", "wrong-password"), ("no-such-user", "rootpw")] {
        let res = client
            .post(format!("{}/auth/login", srv.base_url))
            .form(&[("username", user), ("password", pass)])
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        bodies.push(res.json::<Value>().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn login_and_me_reflect_the_principal_table() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "root");
    assert_eq!(body["role"], "admin");

    register_customer(&client, &srv.base_url, "vera").await;
    let customer = login(&client, &srv.base_url, "vera", "hunter2").await;
    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "customer");
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let issued = Utc::now() - Duration::minutes(siphon_auth::TOKEN_TTL_MINUTES + 5);
    let stale = TokenCodec::new(JWT_SECRET.as_bytes())
        .encode(&Claims::for_admin("root", EmployeeId::new(1), issued))
        .unwrap();

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(stale)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleted_principal_invalidates_a_live_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;

    let res = client
        .delete(format!("{}/employees/1", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/auth/me", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn customers_only_reach_their_own_records() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let own_id = register_customer(&client, &srv.base_url, "vera").await;
    let other_id = register_customer(&client, &srv.base_url, "oleg").await;
    let token = login(&client, &srv.base_url, "vera", "hunter2").await;

    let res = client
        .get(format!("{}/customers", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/customers/{own_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/customers/{other_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn checkout_totals_are_computed_server_side() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;

    let (category_id, supplier_id, product_a) =
        seed_catalog(&client, &srv.base_url, &admin, "10.00", 50).await;
    let res = client
        .post(format!("{}/products", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Coupling 3/4\"",
            "category_id": category_id,
            "supplier_id": supplier_id,
            "price": "5.00",
            "description": null,
            "stock_quantity": 50,
        }))
        .send()
        .await
        .unwrap();
    let product_b: Value = res.json().await.unwrap();

    register_customer(&client, &srv.base_url, "vera").await;
    let customer = login(&client, &srv.base_url, "vera", "hunter2").await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&customer)
        .json(&json!({
            "items": [
                { "product_id": product_a, "quantity": 2 },
                { "product_id": product_b["id"], "quantity": 1 },
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total_amount"], "25.00");
    assert_eq!(body["status"], "Оплачен");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    // Prices are frozen at order time: raise product A and re-read lines.
    let res = client
        .put(format!("{}/products/{product_a}", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Ball valve 1/2\"",
            "category_id": category_id,
            "supplier_id": supplier_id,
            "price": "99.00",
            "description": null,
            "stock_quantity": 50,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let order_id = body["id"].as_i64().unwrap();
    let res = client
        .get(format!("{}/order-details/order/{order_id}", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let lines: Value = res.json().await.unwrap();
    let prices: Vec<&str> = lines
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["price_per_unit"].as_str().unwrap())
        .collect();
    assert!(prices.contains(&"10.00"));
    assert!(prices.contains(&"5.00"));
}

#[tokio::test]
async fn bad_line_items_create_nothing() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (_, _, product_id) = seed_catalog(&client, &srv.base_url, &admin, "10.00", 50).await;

    register_customer(&client, &srv.base_url, "vera").await;
    let customer = login(&client, &srv.base_url, "vera", "hunter2").await;

    for items in [
        json!([{ "product_id": product_id, "quantity": 0 }]),
        json!([
            { "product_id": product_id, "quantity": 1 },
            { "product_id": 999, "quantity": 1 },
        ]),
        json!([]),
    ] {
        let res = client
            .post(format!("{}/orders", srv.base_url))
            .bearer_auth(&customer)
            .json(&json!({ "items": items }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = client
        .get(format!("{}/orders", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn order_status_lifecycle_is_enforced() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (_, _, product_id) = seed_catalog(&client, &srv.base_url, &admin, "10.00", 50).await;

    let customer_id = register_customer(&client, &srv.base_url, "vera").await;
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order_id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Paid -> Completed skips Delivered.
    let res = client
        .put(format!("{}/orders/{order_id}", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "status": "Завершен" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    for (status, expect) in [
        ("Доставлен", StatusCode::OK),
        ("Завершен", StatusCode::OK),
        // Terminal: nothing more is legal.
        ("Отменен", StatusCode::BAD_REQUEST),
    ] {
        let res = client
            .put(format!("{}/orders/{order_id}", srv.base_url))
            .bearer_auth(&admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), expect, "transition to {status}");
    }
}

#[tokio::test]
async fn stock_adjustments_are_audited_and_checked() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (_, _, product_id) = seed_catalog(&client, &srv.base_url, &admin, "10.00", 5).await;

    // Outbound below zero is refused and changes nothing.
    let res = client
        .post(format!("{}/stock-operations", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "product_id": product_id, "operation_type": "расход", "quantity": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/products/{product_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["stock_quantity"], 5);

    // Inbound lands and leaves exactly one audit row.
    let res = client
        .post(format!("{}/stock-operations", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "product_id": product_id, "operation_type": "приход", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(format!("{}/products/{product_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["stock_quantity"], 8);

    // Admin edit to 12 derives inbound 4.
    let res = client
        .patch(format!("{}/products/{product_id}/stock", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "stock_quantity": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/stock-operations", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let ops: Value = res.json().await.unwrap();
    let ops = ops.as_array().unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1]["operation_type"], "приход");
    assert_eq!(ops[1]["quantity"], 4);
}

#[tokio::test]
async fn category_with_children_or_products_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (category_id, _, _) = seed_catalog(&client, &srv.base_url, &admin, "10.00", 5).await;

    let res = client
        .post(format!("{}/product-categories", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Valves", "parent_id": category_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Refused twice: first for the child category, and (after removing it)
    // still for the attached product.
    let res = client
        .delete(format!("{}/product-categories/{category_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/product-categories/{category_id}/children", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let children = res.json::<Value>().await.unwrap();
    let child_id = children.as_array().unwrap()[0]["id"].as_i64().unwrap();

    let res = client
        .delete(format!("{}/product-categories/{child_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .delete(format!("{}/product-categories/{category_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{}/product-categories/{category_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn supplier_detail_view_filters_by_date_and_owner() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (_, supplier_id, product_id) =
        seed_catalog(&client, &srv.base_url, &admin, "10.00", 50).await;

    let customer_id = register_customer(&client, &srv.base_url, "vera").await;
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // A customer is not allowed into the supplier view.
    let customer = login(&client, &srv.base_url, "vera", "hunter2").await;
    let res = client
        .get(format!("{}/order-details/supplier/{supplier_id}", srv.base_url))
        .bearer_auth(&customer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(format!("{}/order-details/supplier/{supplier_id}", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Value = res.json().await.unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_name"], "Ball valve 1/2\"");

    // A window that ends yesterday excludes today's order.
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let res = client
        .get(format!(
            "{}/order-details/supplier/{supplier_id}?end_date={yesterday}",
            srv.base_url
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn financial_report_snapshots_revenue_and_expenses() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &srv.base_url, "root", "rootpw").await;
    let (_, _, product_id) = seed_catalog(&client, &srv.base_url, &admin, "10.00", 0).await;

    // Inbound 5 at price 10.00 -> expenses 50.00.
    let res = client
        .post(format!("{}/stock-operations", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "product_id": product_id, "operation_type": "приход", "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let customer_id = register_customer(&client, &srv.base_url, "vera").await;
    let res = client
        .post(format!("{}/orders", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": 3 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/financial-reports", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "report_date": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["total_revenue"], "30.00");
    assert_eq!(report["total_expenses"], "50.00");
    assert_eq!(report["profit"], "-20.00");
}
