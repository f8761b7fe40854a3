//! Route definitions for the Saya API

use axum::{routing::get, Router};

use crate::app_state::AppState;
use crate::handlers::*;

// Track routes
pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tracks", axum::routing::post(create_track))
        .route("/api/tracks", get(list_tracks))
        .route("/api/tracks/trending", get(trending_tracks))
        .route("/api/tracks/:id", get(get_track))
        .route("/api/tracks/:id/play", axum::routing::post(record_play))
        .route("/api/tracks/:id/like", axum::routing::post(toggle_like))
        .route("/api/tracks/:id/comments", get(list_comments))
        .route("/api/tracks/:id/comments", axum::routing::post(add_comment))
}

// User routes
//
// A single `:id` segment serves both lookups: the bare route takes a wallet
// address, the nested routes take a user UUID. The router requires one
// parameter name per position.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/:id", get(get_user))
        .route("/api/users/:id/tracks", get(user_tracks))
        .route("/api/users/:id/follow", axum::routing::post(toggle_follow))
}

// Auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/api/auth/login", axum::routing::post(login))
}

// Stats routes
pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", get(get_stats))
}

// IPFS routes
pub fn ipfs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ipfs/upload", axum::routing::post(upload_to_ipfs))
        .route("/api/ipfs/pin", axum::routing::post(pin_to_ipfs))
        .route("/api/ipfs/metadata/:hash", get(get_metadata))
}
