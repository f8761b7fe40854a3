//! Data models for the Saya backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

/// User model, keyed by lowercased wallet address
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Track model
///
/// Owned and mutated by the data store; the player treats a loaded track
/// as an immutable value.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Track {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub artist_name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    /// Duration in seconds, if known at upload time
    pub duration: Option<i32>,
    pub ipfs_hash: String,
    pub metadata_hash: String,
    pub cover_image_hash: Option<String>,
    pub price_eth: Option<f64>,
    pub is_minted: bool,
    pub nft_token_id: Option<String>,
    pub play_count: i32,
    pub like_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Track joined with its artist's public profile fields
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TrackWithArtist {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub track: Track,
    pub artist_username: Option<String>,
    pub artist_display_name: Option<String>,
    pub artist_verified: Option<bool>,
}

/// Like record
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Play record; user is optional for anonymous listens
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Play {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub track_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Follow edge between two users
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment on a track
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub track_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with the author's public profile fields
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: Option<String>,
    pub author_display_name: Option<String>,
}

/// Aggregate platform statistics
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlatformStats {
    pub total_tracks: i64,
    pub total_artists: i64,
    pub total_volume_eth: f64,
    pub total_plays: i64,
    pub total_likes: i64,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Pagination parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
