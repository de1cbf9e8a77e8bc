use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use stockroom_api::app::{AppServices, InMemoryHandles};
use stockroom_auth::{JwtClaims, Role};
use stockroom_core::{ActorId, LocationId, ProductId};
use stockroom_inventory::{BundleComponent, StockKey};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handles: InMemoryHandles,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over the in-memory backend, on an ephemeral port.
        let (services, handles) = AppServices::in_memory();
        let app = stockroom_api::app::router(services, JWT_SECRET);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            handles,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn dispatch(&self, token: &str, operation: &str, data: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}/inventory/dispatch", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "operation": operation, "data": data }))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(actor_id: ActorId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: actor_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin_token() -> String {
    mint_jwt(ActorId::new(), vec![Role::ADMIN])
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_token_identity() {
    let srv = TestServer::spawn().await;
    let actor_id = ActorId::new();
    let token = mint_jwt(actor_id, vec![Role::STORE_MANAGER]);

    let (status, body) = srv.get(&token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["actor_id"].as_str().unwrap(), actor_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "store_manager"));
    assert_eq!(body["scope"], "assigned");
}

#[tokio::test]
async fn reserve_then_sale_scenario() {
    let srv = TestServer::spawn().await;
    let token = admin_token();
    let (product, location) = (ProductId::new(), LocationId::new());

    let (status, body) = srv
        .dispatch(
            &token,
            "adjustStock",
            json!({ "productId": product, "locationId": location, "adjustment": 100, "reason": "initial count" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["previousQuantity"], 0);
    assert_eq!(body["newQuantity"], 100);

    let order = json!({ "productId": product, "locationId": location, "quantity": 30, "orderId": "SO-1" });
    let (status, body) = srv.dispatch(&token, "reserveStock", order.clone()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["stock"]["available"], 70);

    let (status, body) = srv.dispatch(&token, "recordSale", order).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = srv
        .get(&token, &format!("/inventory/records/{product}/{location}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stock"]["onHand"], 70);
    assert_eq!(body["stock"]["reserved"], 0);
    assert_eq!(body["stock"]["available"], 70);

    let (status, body) = srv
        .get(&token, &format!("/inventory/movements?product={product}&limit=10"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = body["movements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["movement_type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["sale", "reservation", "adjustment"]);
}

#[tokio::test]
async fn failures_map_to_status_codes() {
    let srv = TestServer::spawn().await;
    let token = admin_token();
    let (product, location) = (ProductId::new(), LocationId::new());

    let (status, body) = srv.dispatch(&token, "teleportStock", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_operation");

    let (status, body) = srv
        .dispatch(
            &token,
            "reserveStock",
            json!({ "productId": product, "locationId": location, "quantity": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["available"], 0);
    assert_eq!(body["requested"], 5);

    let (status, body) = srv
        .dispatch(
            &token,
            "adjustStock",
            json!({ "productId": product, "locationId": location, "adjustment": -5, "reason": "damage" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "negative_stock");

    let (status, body) = srv
        .dispatch(&token, "reserveStock", json!({ "productId": "nope" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn permissions_and_location_scope_are_enforced() {
    let srv = TestServer::spawn().await;
    let (product, assigned, other) = (ProductId::new(), LocationId::new(), LocationId::new());

    let sales = mint_jwt(ActorId::new(), vec![Role::SALES]);
    let (status, _) = srv
        .dispatch(
            &sales,
            "adjustStock",
            json!({ "productId": product, "locationId": assigned, "adjustment": 5, "reason": "recount" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let manager_id = ActorId::new();
    srv.handles
        .assignments
        .assign_manager(manager_id, assigned)
        .unwrap();
    let manager = mint_jwt(manager_id, vec![Role::STORE_MANAGER]);

    let (status, body) = srv
        .dispatch(
            &manager,
            "adjustStock",
            json!({ "productId": product, "locationId": other, "adjustment": 5, "reason": "recount" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");

    let (status, body) = srv
        .dispatch(
            &manager,
            "adjustStock",
            json!({ "productId": product, "locationId": assigned, "adjustment": 5, "reason": "recount" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["newQuantity"], 5);
}

#[tokio::test]
async fn bundle_reservation_scenario() {
    let srv = TestServer::spawn().await;
    let token = admin_token();
    let (bundle, a, b, location) = (
        ProductId::new(),
        ProductId::new(),
        ProductId::new(),
        LocationId::new(),
    );
    srv.handles
        .catalog
        .define(bundle, vec![BundleComponent::new(a, 1), BundleComponent::new(b, 1)])
        .unwrap();
    srv.handles.ledger.seed(StockKey::new(a, location), 5, 0).unwrap();
    srv.handles.ledger.seed(StockKey::new(b, location), 5, 0).unwrap();

    let (status, body) = srv
        .dispatch(
            &token,
            "reserveBundleStock",
            json!({ "productId": bundle, "locationId": location, "quantity": 3, "orderId": "SO-7" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["components"].as_array().unwrap().len(), 2);

    let (status, body) = srv
        .dispatch(
            &token,
            "checkBundleAvailability",
            json!({ "productId": bundle, "locationId": location, "quantity": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isBundle"], true);
    assert_eq!(body["bundleAvailability"], 2);
    assert_eq!(body["available"], false);
}
