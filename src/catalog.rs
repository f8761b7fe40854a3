//! Track catalog and social graph over Postgres.
//!
//! Counter updates go through the schema's stored procedures so play and
//! like totals stay atomic under concurrent requests.

use std::sync::Arc;

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CommentWithAuthor, PlatformStats, Track, TrackWithArtist, User};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(&'static str),
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTrackRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub artist_name: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i32>,
    #[validate(length(min = 1))]
    pub ipfs_hash: String,
    #[validate(length(min = 1))]
    pub metadata_hash: String,
    pub cover_image_hash: Option<String>,
    #[validate(range(min = 0.0))]
    pub price_eth: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
}

pub struct CatalogService {
    pool: Arc<PgPool>,
}

impl CatalogService {
    pub fn new(pool: Arc<PgPool>) -> Self {
        CatalogService { pool }
    }

    pub async fn add_track(&self, request: CreateTrackRequest) -> Result<Track, CatalogError> {
        let track = sqlx::query_as::<_, Track>(
            "INSERT INTO tracks
                (user_id, title, artist_name, description, genre, duration,
                 ipfs_hash, metadata_hash, cover_image_hash, price_eth)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(request.user_id)
        .bind(&request.title)
        .bind(&request.artist_name)
        .bind(&request.description)
        .bind(&request.genre)
        .bind(request.duration)
        .bind(&request.ipfs_hash)
        .bind(&request.metadata_hash)
        .bind(&request.cover_image_hash)
        .bind(request.price_eth)
        .fetch_one(&*self.pool)
        .await?;
        tracing::info!(track_id = %track.id, title = %track.title, "track added to catalog");
        Ok(track)
    }

    pub async fn get_track(&self, track_id: Uuid) -> Result<TrackWithArtist, CatalogError> {
        let track = sqlx::query_as::<_, TrackWithArtist>(
            "SELECT t.*, u.username AS artist_username,
                    u.display_name AS artist_display_name,
                    u.verified AS artist_verified
             FROM tracks t
             JOIN users u ON u.id = t.user_id
             WHERE t.id = $1",
        )
        .bind(track_id)
        .fetch_optional(&*self.pool)
        .await?;
        track.ok_or(CatalogError::NotFound("track"))
    }

    /// Newest tracks first.
    pub async fn list_tracks(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TrackWithArtist>, CatalogError> {
        let tracks = sqlx::query_as::<_, TrackWithArtist>(
            "SELECT t.*, u.username AS artist_username,
                    u.display_name AS artist_display_name,
                    u.verified AS artist_verified
             FROM tracks t
             JOIN users u ON u.id = t.user_id
             ORDER BY t.created_at DESC
             LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&*self.pool)
        .await?;
        Ok(tracks)
    }

    /// Most played tracks first.
    pub async fn trending_tracks(&self, limit: i64) -> Result<Vec<TrackWithArtist>, CatalogError> {
        let tracks = sqlx::query_as::<_, TrackWithArtist>(
            "SELECT t.*, u.username AS artist_username,
                    u.display_name AS artist_display_name,
                    u.verified AS artist_verified
             FROM tracks t
             JOIN users u ON u.id = t.user_id
             ORDER BY t.play_count DESC, t.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await?;
        Ok(tracks)
    }

    pub async fn tracks_by_user(&self, user_id: Uuid) -> Result<Vec<Track>, CatalogError> {
        let tracks = sqlx::query_as::<_, Track>(
            "SELECT * FROM tracks WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(tracks)
    }

    pub async fn user_by_wallet(&self, address: &str) -> Result<User, CatalogError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE wallet_address = $1")
            .bind(address.to_lowercase())
            .fetch_optional(&*self.pool)
            .await?;
        user.ok_or(CatalogError::NotFound("user"))
    }

    /// Record one play and bump the track's counter atomically.
    pub async fn record_play(
        &self,
        track_id: Uuid,
        user_id: Option<Uuid>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<(), CatalogError> {
        self.ensure_track(track_id).await?;

        sqlx::query(
            "INSERT INTO plays (track_id, user_id, ip_address, user_agent)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(track_id)
        .bind(user_id)
        .bind(ip_address)
        .bind(user_agent)
        .execute(&*self.pool)
        .await?;

        sqlx::query("SELECT increment_play_count($1)")
            .bind(track_id)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    /// Like if not liked, unlike otherwise. Returns whether the track is
    /// liked afterwards.
    pub async fn toggle_like(&self, track_id: Uuid, user_id: Uuid) -> Result<bool, CatalogError> {
        self.ensure_track(track_id).await?;

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM likes WHERE user_id = $1 AND track_id = $2",
        )
        .bind(user_id)
        .bind(track_id)
        .fetch_optional(&*self.pool)
        .await?;

        if let Some(like_id) = existing {
            sqlx::query("DELETE FROM likes WHERE id = $1")
                .bind(like_id)
                .execute(&*self.pool)
                .await?;
            sqlx::query("SELECT decrement_like_count($1)")
                .bind(track_id)
                .execute(&*self.pool)
                .await?;
            Ok(false)
        } else {
            sqlx::query("INSERT INTO likes (user_id, track_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(track_id)
                .execute(&*self.pool)
                .await?;
            sqlx::query("SELECT increment_like_count($1)")
                .bind(track_id)
                .execute(&*self.pool)
                .await?;
            Ok(true)
        }
    }

    /// Follow if not following, unfollow otherwise. Returns whether the
    /// follow exists afterwards.
    pub async fn toggle_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<bool, CatalogError> {
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM follows WHERE follower_id = $1 AND following_id = $2",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(&*self.pool)
        .await?;

        if let Some(follow_id) = existing {
            sqlx::query("DELETE FROM follows WHERE id = $1")
                .bind(follow_id)
                .execute(&*self.pool)
                .await?;
            Ok(false)
        } else {
            sqlx::query("INSERT INTO follows (follower_id, following_id) VALUES ($1, $2)")
                .bind(follower_id)
                .bind(following_id)
                .execute(&*self.pool)
                .await?;
            Ok(true)
        }
    }

    pub async fn add_comment(
        &self,
        track_id: Uuid,
        request: CreateCommentRequest,
    ) -> Result<CommentWithAuthor, CatalogError> {
        self.ensure_track(track_id).await?;

        let comment = sqlx::query_as::<_, CommentWithAuthor>(
            "WITH inserted AS (
                 INSERT INTO comments (user_id, track_id, content)
                 VALUES ($1, $2, $3)
                 RETURNING *
             )
             SELECT i.*, u.username AS author_username,
                    u.display_name AS author_display_name
             FROM inserted i
             JOIN users u ON u.id = i.user_id",
        )
        .bind(request.user_id)
        .bind(track_id)
        .bind(&request.content)
        .fetch_one(&*self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn list_comments(&self, track_id: Uuid) -> Result<Vec<CommentWithAuthor>, CatalogError> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            "SELECT c.*, u.username AS author_username,
                    u.display_name AS author_display_name
             FROM comments c
             JOIN users u ON u.id = c.user_id
             WHERE c.track_id = $1
             ORDER BY c.created_at DESC",
        )
        .bind(track_id)
        .fetch_all(&*self.pool)
        .await?;
        Ok(comments)
    }

    /// Platform totals: volume is the sum of every listed track price,
    /// minted or not; plays and likes count the event rows.
    pub async fn platform_stats(&self) -> Result<PlatformStats, CatalogError> {
        let stats = sqlx::query_as::<_, PlatformStats>(
            "SELECT
                (SELECT COUNT(*) FROM tracks) AS total_tracks,
                (SELECT COUNT(DISTINCT user_id) FROM tracks) AS total_artists,
                (SELECT COALESCE(SUM(price_eth), 0) FROM tracks) AS total_volume_eth,
                (SELECT COUNT(*) FROM plays) AS total_plays,
                (SELECT COUNT(*) FROM likes) AS total_likes",
        )
        .fetch_one(&*self.pool)
        .await?;
        Ok(stats)
    }

    async fn ensure_track(&self, track_id: Uuid) -> Result<(), CatalogError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tracks WHERE id = $1)")
                .bind(track_id)
                .fetch_one(&*self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(CatalogError::NotFound("track"))
        }
    }
}
