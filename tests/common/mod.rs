use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;

use inventory_forecast_api::{
    build_router,
    config::AppConfig,
    db,
    entities::{product, product_in, shop, MOVEMENT_TYPE_IN, MOVEMENT_TYPE_OUT},
    AppState,
};

/// Helper harness for spinning up the router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

#[allow(dead_code)]
impl TestApp {
    /// Construct a new test application with an empty, migrated schema.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone()).expect("router should build");

        Self { router, state }
    }

    /// Send a GET request against the router.
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, &[]).await
    }

    pub async fn request(&self, method: Method, uri: &str, headers: &[(&str, &str)]) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(Body::empty())
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn create_shop(&self, name: &str) -> shop::Model {
        shop::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("create shop")
    }

    pub async fn create_product(&self, name: &str, price: f64) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            price: Set(price),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("create product")
    }

    /// Records a movement; positive quantities are inbound, negative outbound.
    pub async fn record_movement(
        &self,
        shop_id: i32,
        product_id: i32,
        quantity: i32,
        created_at: NaiveDateTime,
    ) -> product_in::Model {
        let movement_type = if quantity >= 0 {
            MOVEMENT_TYPE_IN
        } else {
            MOVEMENT_TYPE_OUT
        };
        product_in::ActiveModel {
            shop_id: Set(shop_id),
            prod_id: Set(product_id),
            ven_id: Set(None),
            movement_type: Set(movement_type.to_string()),
            quantity: Set(quantity.abs()),
            price: Set(None),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("record movement")
    }
}

/// `2024-01-{day} 09:00:00`
#[allow(dead_code)]
pub fn jan(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid fixture date")
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
