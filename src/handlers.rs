//! HTTP handlers for the Saya API

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::app_state::AppState;
use crate::auth::{AuthError, LoginResult};
use crate::catalog::{CatalogError, CreateCommentRequest, CreateTrackRequest};
use crate::ipfs::{ForwardPart, IpfsError, MusicMetadata};
use crate::models::{
    ApiResponse, CommentWithAuthor, PaginationParams, PlatformStats, Track, TrackWithArtist, User,
};

#[derive(Debug, Deserialize)]
pub struct RecordPlayRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleLikeRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ToggleFollowRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub address: String,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub hash: String,
}

#[derive(Debug, Serialize)]
pub struct LikeStatus {
    pub liked: bool,
}

#[derive(Debug, Serialize)]
pub struct FollowStatus {
    pub following: bool,
}

// ===== Track Handlers =====

pub async fn create_track(
    State(state): State<AppState>,
    Json(payload): Json<CreateTrackRequest>,
) -> Result<Json<ApiResponse<Track>>, (StatusCode, Json<ApiResponse<Track>>)> {
    // Validate the request
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Validation error: {}", e)),
            }),
        ));
    }

    match state.catalog_service.add_track(payload).await {
        Ok(track) => Ok(Json(ApiResponse {
            success: true,
            data: Some(track),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn list_tracks(
    State(state): State<AppState>,
    Query(query): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<TrackWithArtist>>>, (StatusCode, Json<ApiResponse<Vec<TrackWithArtist>>>)>
{
    let limit = query.limit.unwrap_or(50).min(100); // Max 100 items
    let offset = query.offset.unwrap_or(0);

    match state.catalog_service.list_tracks(limit, offset).await {
        Ok(tracks) => Ok(Json(ApiResponse {
            success: true,
            data: Some(tracks),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn trending_tracks(
    State(state): State<AppState>,
    Query(query): Query<PaginationParams>,
) -> Result<Json<ApiResponse<Vec<TrackWithArtist>>>, (StatusCode, Json<ApiResponse<Vec<TrackWithArtist>>>)>
{
    let limit = query.limit.unwrap_or(10).min(50); // Max 50 items

    match state.catalog_service.trending_tracks(limit).await {
        Ok(tracks) => Ok(Json(ApiResponse {
            success: true,
            data: Some(tracks),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn get_track(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TrackWithArtist>>, (StatusCode, Json<ApiResponse<TrackWithArtist>>)> {
    match state.catalog_service.get_track(id).await {
        Ok(track) => Ok(Json(ApiResponse {
            success: true,
            data: Some(track),
            error: None,
        })),
        Err(CatalogError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Track not found".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn record_play(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    payload: Option<Json<RecordPlayRequest>>,
) -> Result<Json<ApiResponse<()>>, (StatusCode, Json<ApiResponse<()>>)> {
    let user_id = payload.and_then(|Json(p)| p.user_id);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    match state
        .catalog_service
        .record_play(id, user_id, None, user_agent)
        .await
    {
        Ok(()) => Ok(Json(ApiResponse {
            success: true,
            data: None,
            error: None,
        })),
        Err(CatalogError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Track not found".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleLikeRequest>,
) -> Result<Json<ApiResponse<LikeStatus>>, (StatusCode, Json<ApiResponse<LikeStatus>>)> {
    match state.catalog_service.toggle_like(id, payload.user_id).await {
        Ok(liked) => Ok(Json(ApiResponse {
            success: true,
            data: Some(LikeStatus { liked }),
            error: None,
        })),
        Err(CatalogError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Track not found".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CommentWithAuthor>>>, (StatusCode, Json<ApiResponse<Vec<CommentWithAuthor>>>)>
{
    match state.catalog_service.list_comments(id).await {
        Ok(comments) => Ok(Json(ApiResponse {
            success: true,
            data: Some(comments),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<CommentWithAuthor>>, (StatusCode, Json<ApiResponse<CommentWithAuthor>>)>
{
    // Validate the request
    if let Err(e) = payload.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Validation error: {}", e)),
            }),
        ));
    }

    match state.catalog_service.add_comment(id, payload).await {
        Ok(comment) => Ok(Json(ApiResponse {
            success: true,
            data: Some(comment),
            error: None,
        })),
        Err(CatalogError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Track not found".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

// ===== User Handlers =====

pub async fn get_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<User>>, (StatusCode, Json<ApiResponse<User>>)> {
    match state.catalog_service.user_by_wallet(&address).await {
        Ok(user) => Ok(Json(ApiResponse {
            success: true,
            data: Some(user),
            error: None,
        })),
        Err(CatalogError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("User not found".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn user_tracks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Track>>>, (StatusCode, Json<ApiResponse<Vec<Track>>>)> {
    match state.catalog_service.tracks_by_user(id).await {
        Ok(tracks) => Ok(Json(ApiResponse {
            success: true,
            data: Some(tracks),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

pub async fn toggle_follow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleFollowRequest>,
) -> Result<Json<ApiResponse<FollowStatus>>, (StatusCode, Json<ApiResponse<FollowStatus>>)> {
    if payload.user_id == id {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Validation error: users cannot follow themselves".to_string()),
            }),
        ));
    }

    match state.catalog_service.toggle_follow(payload.user_id, id).await {
        Ok(following) => Ok(Json(ApiResponse {
            success: true,
            data: Some(FollowStatus { following }),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

// ===== Auth Handlers =====

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, (StatusCode, Json<ApiResponse<LoginResult>>)> {
    match state
        .auth_service
        .verify_and_login(&payload.address, &payload.message, &payload.signature)
        .await
    {
        Ok(result) => Ok(Json(ApiResponse {
            success: true,
            data: Some(result),
            error: None,
        })),
        Err(e @ AuthError::SignatureMismatch { .. }) => Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Authentication failed: {}", e)),
            }),
        )),
        Err(e @ AuthError::MalformedSignature(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Authentication failed: {}", e)),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

// ===== Stats Handlers =====

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlatformStats>>, (StatusCode, Json<ApiResponse<PlatformStats>>)> {
    match state.catalog_service.platform_stats().await {
        Ok(stats) => Ok(Json(ApiResponse {
            success: true,
            data: Some(stats),
            error: None,
        })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("Database error: {}", e)),
            }),
        )),
    }
}

// ===== IPFS Handlers =====

// The upload and pin routes are thin proxies in front of the pinning API and
// keep its response shapes: the upstream JSON body is returned verbatim on
// success, and failures collapse to a generic error object.

pub async fn upload_to_ipfs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("IPFS upload multipart error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to upload to IPFS" })),
        )
    })? {
        let name = field.name().unwrap_or("file").to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| {
            tracing::error!("IPFS upload multipart error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to upload to IPFS" })),
            )
        })?;

        parts.push(ForwardPart {
            name,
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    match state.ipfs_service.pin_file(parts).await {
        Ok(body) => Ok(Json(body)),
        Err(e) => {
            tracing::error!("IPFS upload API error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to upload to IPFS" })),
            ))
        }
    }
}

pub async fn pin_to_ipfs(
    State(state): State<AppState>,
    Json(payload): Json<PinRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.ipfs_service.pin_by_hash(&payload.hash).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(e) => {
            tracing::error!("IPFS pin API error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to pin to IPFS" })),
            ))
        }
    }
}

pub async fn get_metadata(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Json<ApiResponse<MusicMetadata>>, (StatusCode, Json<ApiResponse<MusicMetadata>>)> {
    match state.ipfs_service.fetch_metadata(&hash).await {
        Ok(metadata) => Ok(Json(ApiResponse {
            success: true,
            data: Some(metadata),
            error: None,
        })),
        Err(IpfsError::AllGatewaysFailed { .. }) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some("Metadata not found on IPFS".to_string()),
            }),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                success: false,
                data: None,
                error: Some(format!("IPFS error: {}", e)),
            }),
        )),
    }
}
