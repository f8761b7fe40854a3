//! Saya Backend Server
//!
//! This is the main Rust backend server for Saya, providing APIs for the
//! music catalog, wallet-based authentication, platform analytics, and
//! IPFS pinning and retrieval.

use axum::{
    routing::get,
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use axum::http::{HeaderValue, Method};

mod app_state;
mod auth;
mod catalog;
mod handlers;
mod ipfs;
mod models;
mod player;
mod routes;
mod wallet;

use app_state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/saya".to_string());
    let pinata_api_url = std::env::var("PINATA_API_URL")
        .unwrap_or_else(|_| ipfs::DEFAULT_PINATA_API_URL.to_string());
    let pinata_jwt = std::env::var("PINATA_JWT").unwrap_or_default();

    if pinata_jwt.is_empty() {
        tracing::warn!("PINATA_JWT not set, IPFS upload and pin routes will fail upstream");
    }

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected successfully");

    // Initialize catalog service
    let catalog_service = Arc::new(catalog::CatalogService::new(Arc::new(db_pool.clone())));

    // Initialize auth service. The server verifies submitted signatures; it
    // never drives a wallet provider itself, so none is injected.
    let user_store = Arc::new(auth::PgUserStore::new(Arc::new(db_pool.clone())));
    let auth_service = Arc::new(auth::AuthService::new(user_store, None));

    // Initialize IPFS pinning service
    let ipfs_service = Arc::new(ipfs::IpfsService::new(pinata_api_url, pinata_jwt));

    // Create shared app state
    let app_state = AppState::new(catalog_service, auth_service, ipfs_service);

    // Create the app router
    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(routes::track_routes())
        .merge(routes::user_routes())
        .merge(routes::auth_routes())
        .merge(routes::stats_routes())
        .merge(routes::ipfs_routes())
        .with_state(app_state)
        .layer(configure_cors());

    // Get port from environment or default to 3001
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .expect("PORT must be a number");

    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    tracing::info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn root() -> &'static str {
    "Saya API Server"
}

async fn health_check() -> &'static str {
    "OK"
}

fn configure_cors() -> CorsLayer {
    let allowed_origins_str = std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();

    if allowed_origins_str.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .map(|s| s.trim().parse().expect("Invalid CORS origin"))
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
