#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use movies_api::auth::{AuthConfig, Authenticator};
use movies_api::config::{DatabaseConfig, PaginationConfig, ServerConfig};
use movies_api::state::AppState;
use movies_db::models::movie::NewMovie;
use movies_db::repositories::MovieRepo;
use movies_db::PoolSettings;

pub const TEST_API_KEY: &str = "test-api-key";

/// Build a test `ServerConfig` with safe defaults and authentication off.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database: DatabaseConfig {
            url: String::new(),
            pool: PoolSettings::default(),
            query_timeout: Duration::from_secs(5),
        },
        pagination: PaginationConfig::default(),
        auth: AuthConfig::disabled(),
    }
}

/// Test config that requires `X-API-Key: TEST_API_KEY`.
pub fn api_key_config() -> ServerConfig {
    ServerConfig {
        auth: AuthConfig {
            enabled: true,
            api_key: Some(TEST_API_KEY.to_string()),
            oidc: None,
        },
        ..test_config()
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and authentication disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_config(pool, test_config())
}

/// Build the full application router for a specific configuration.
pub fn build_test_app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let authenticator =
        Authenticator::from_config(&config.auth).expect("test auth config must be valid");

    let state = AppState {
        pool,
        config: Arc::new(config),
        authenticator: Arc::new(authenticator),
    };

    movies_api::build_app(state)
}

/// Send a GET request without extra headers.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with one extra header.
pub async fn get_with_header(app: Router, uri: &str, name: &str, value: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header(name, value)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn movie(id: i64, title: &str, year: Option<i32>, genres: &[&str]) -> NewMovie {
    NewMovie {
        movie_id: id,
        title: title.to_string(),
        year,
        genres: genres.iter().map(|g| g.to_string()).collect(),
    }
}

/// Insert the three-row catalogue used by most scenarios:
///
/// ```text
/// 1  Toy Story (1995)  [Comedy]     1995
/// 2  Heat (1995)       [Crime]      1995
/// 3  Jumanji (1995)    [Adventure]  1995
/// ```
pub async fn seed_movies(pool: &PgPool) {
    let rows = [
        movie(1, "Toy Story (1995)", Some(1995), &["Comedy"]),
        movie(2, "Heat (1995)", Some(1995), &["Crime"]),
        movie(3, "Jumanji (1995)", Some(1995), &["Adventure"]),
    ];
    MovieRepo::upsert_batch(pool, &rows).await.unwrap();
}

/// Insert extra rows with varied years and titles.
pub async fn seed_more_movies(pool: &PgPool) {
    let rows = [
        movie(4, "Grumpier Old Men (1995)", Some(1995), &["Comedy", "Romance"]),
        movie(5, "Toy Story 2 (1999)", Some(1999), &["Adventure", "Animation", "Comedy"]),
        movie(6, "Heat Wave", None, &[]),
        movie(7, "100% Love (2011)", Some(2011), &["Comedy"]),
    ];
    MovieRepo::upsert_batch(pool, &rows).await.unwrap();
}

/// Extract the `id` field of every item in a page body.
pub fn item_ids(json: &serde_json::Value) -> Vec<i64> {
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
