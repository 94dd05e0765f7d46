//! End-to-end registration tests against PostgreSQL
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p kron-server -- --ignored

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use kron_server::db::create_pool;
use kron_server::http::{build_router, AppState};
use kron_server::{DatabaseConfig, PgStore};

const SCHEMA: &str = include_str!("../schema.sql");

struct Fixture {
    store: PgStore,
    suffix: String,
}

impl Fixture {
    async fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let options = DatabaseConfig::new(url).connect_options().unwrap();
        let pool = create_pool(options).await.expect("pool creation failed");
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .expect("schema setup failed");

        Self {
            store: PgStore::new(pool),
            suffix: Uuid::new_v4().simple().to_string(),
        }
    }

    fn pool(&self) -> &PgPool {
        self.store.pool()
    }

    fn app(&self) -> Router {
        build_router(AppState::new(Arc::new(self.store.clone())), false)
    }

    fn name(&self, base: &str) -> String {
        format!("{}-{}", base, self.suffix)
    }

    async fn seed_tag(&self, base: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO tag (name) VALUES ($1) RETURNING id")
            .bind(self.name(base))
            .fetch_one(self.pool())
            .await
            .unwrap()
    }

    fn request(&self, username: &str, tags: &[&str]) -> Value {
        json!({
            "username": self.name(username),
            "name": "Ada",
            "surname": "Lovelace",
            "email": format!("{}@example.com", self.name(username)),
            "tags": tags.iter().map(|t| self.name(t)).collect::<Vec<_>>(),
        })
    }

    async fn post(&self, body: Value) -> (StatusCode, String) {
        let response = self
            .app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/customer/add")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// Pooled connections go back on a spawned task; give it a moment.
    async fn settled_in_use(&self, expected: u32) -> u32 {
        for _ in 0..50 {
            if self.store.in_use() == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.store.in_use()
    }

    async fn customer_count(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM customer WHERE username = $1")
            .bind(self.name(username))
            .fetch_one(self.pool())
            .await
            .unwrap()
    }

    async fn linked_tags(&self, username: &str) -> Vec<i64> {
        sqlx::query_scalar(
            r#"
            SELECT ct.tag_id
            FROM customer_tags ct
            JOIN customer c ON c.id = ct.customer_id
            WHERE c.username = $1
            ORDER BY ct.tag_id
            "#,
        )
        .bind(self.name(username))
        .fetch_all(self.pool())
        .await
        .unwrap()
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn registers_customer_with_two_tags() {
    let fx = Fixture::new().await;
    let vip = fx.seed_tag("vip").await;
    let new = fx.seed_tag("new").await;

    let (status, body) = fx.post(fx.request("ada", &["vip", "new"])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Customer saved successfully.");
    assert_eq!(fx.customer_count("ada").await, 1);

    let mut expected = vec![vip, new];
    expected.sort();
    assert_eq!(fx.linked_tags("ada").await, expected);
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_tag_leaves_no_customer() {
    let fx = Fixture::new().await;
    fx.seed_tag("vip").await;

    let (status, body) = fx.post(fx.request("ada", &["vip", "gold"])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, format!("Undefined tag: {}", fx.name("gold")));
    assert_eq!(fx.customer_count("ada").await, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn replay_is_rejected_without_duplicate_row() {
    let fx = Fixture::new().await;
    fx.seed_tag("vip").await;

    let (first, _) = fx.post(fx.request("ada", &["vip"])).await;
    let (second, body) = fx.post(fx.request("ada", &["vip"])).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("Username already exists"));
    assert_eq!(fx.customer_count("ada").await, 1);
    assert_eq!(fx.linked_tags("ada").await.len(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_email_is_rejected() {
    let fx = Fixture::new().await;
    fx.seed_tag("vip").await;
    fx.post(fx.request("ada", &["vip"])).await;

    let mut body = fx.request("grace", &["vip"]);
    body["email"] = json!(format!("{}@example.com", fx.name("ada")));
    let (status, message) = fx.post(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message.starts_with("Email already exists"));
    assert_eq!(fx.customer_count("grace").await, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn failing_requests_return_connections() {
    let fx = Fixture::new().await;
    // The schema setup connection is still on its way back
    assert_eq!(fx.settled_in_use(0).await, 0);

    for i in 0..20 {
        let (status, _) = fx
            .post(fx.request(&format!("user{}", i), &["missing"]))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(fx.settled_in_use(0).await, 0);
    }
}
