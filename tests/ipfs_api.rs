//! Integration tests for the IPFS proxy routes.
//!
//! The catalog routes need a live database, so these tests cover the routes
//! that terminate in the pinning API and the public gateways, with wiremock
//! standing in for both upstreams. The database pool is lazy and never
//! acquired.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as request_header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use saya_server::app_state::AppState;
use saya_server::auth::{AuthService, PgUserStore};
use saya_server::catalog::CatalogService;
use saya_server::ipfs::IpfsService;
use saya_server::routes;

fn test_state(ipfs_service: IpfsService) -> AppState {
    // Lazy pool pointed at a dead port. IPFS routes never touch it, and the
    // catalog routes fail fast instead of hanging if a test hits one.
    let pool = Arc::new(
        PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://127.0.0.1:1/saya")
            .expect("lazy pool"),
    );

    let catalog_service = Arc::new(CatalogService::new(pool.clone()));
    let auth_service = Arc::new(AuthService::new(Arc::new(PgUserStore::new(pool)), None));

    AppState::new(catalog_service, auth_service, Arc::new(ipfs_service))
}

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::track_routes())
        .merge(routes::user_routes())
        .merge(routes::auth_routes())
        .merge(routes::stats_routes())
        .merge(routes::ipfs_routes())
        .with_state(state)
}

fn multipart_body(boundary: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"song.mp3\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: audio/mpeg\r\n\r\n");
    body.extend_from_slice(b"ID3 not really audio");
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn upload_forwards_multipart_and_returns_upstream_body() {
    let pinata = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .and(request_header("authorization", "Bearer test-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "IpfsHash": "QmUploadedTrack",
            "PinSize": 20,
            "Timestamp": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&pinata)
        .await;

    let app = app(test_state(IpfsService::new(pinata.uri(), "test-jwt")));

    let boundary = "saya-test-boundary";
    let request = Request::builder()
        .method("POST")
        .uri("/api/ipfs/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["IpfsHash"], "QmUploadedTrack");
    assert_eq!(body["PinSize"], 20);
}

#[tokio::test]
async fn upload_maps_upstream_failure_to_generic_error() {
    let pinata = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinFileToIPFS"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&pinata)
        .await;

    let app = app(test_state(IpfsService::new(pinata.uri(), "wrong-jwt")));

    let boundary = "saya-test-boundary";
    let request = Request::builder()
        .method("POST")
        .uri("/api/ipfs/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart_body(boundary)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body, json!({ "error": "Failed to upload to IPFS" }));
}

#[tokio::test]
async fn pin_sends_platform_envelope_and_reports_success() {
    let pinata = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinByHash"))
        .and(request_header("authorization", "Bearer test-jwt"))
        .and(body_partial_json(json!({
            "hashToPin": "QmPinMe",
            "pinataMetadata": {
                "name": "saya-pin-QmPinMe",
                "keyvalues": { "service": "saya-platform" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "queued" })))
        .expect(1)
        .mount(&pinata)
        .await;

    let app = app(test_state(IpfsService::new(pinata.uri(), "test-jwt")));

    let request = Request::builder()
        .method("POST")
        .uri("/api/ipfs/pin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "hash": "QmPinMe" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn pin_maps_upstream_failure_to_generic_error() {
    let pinata = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pinning/pinByHash"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&pinata)
        .await;

    let app = app(test_state(IpfsService::new(pinata.uri(), "test-jwt")));

    let request = Request::builder()
        .method("POST")
        .uri("/api/ipfs/pin")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "hash": "QmPinMe" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body, json!({ "error": "Failed to pin to IPFS" }));
}

#[tokio::test]
async fn metadata_route_serves_gateway_document() {
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipfs/QmMeta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "Midnight Drive",
            "artist": "Neon Coast",
            "genre": "synthwave",
            "audioFile": "ipfs://QmAudio",
            "createdAt": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let ipfs_service = IpfsService::new("http://127.0.0.1:1", "unused")
        .with_gateways(vec![format!("{}/ipfs/", gateway.uri())]);
    let app = app(test_state(ipfs_service));

    let request = Request::builder()
        .uri("/api/ipfs/metadata/QmMeta")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Midnight Drive");
    assert_eq!(body["data"]["artist"], "Neon Coast");
    assert_eq!(body["data"]["audioFile"], "ipfs://QmAudio");
}

#[tokio::test]
async fn metadata_route_reports_not_found_when_gateways_fail() {
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ipfs/QmGone"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&gateway)
        .await;

    let ipfs_service = IpfsService::new("http://127.0.0.1:1", "unused")
        .with_gateways(vec![format!("{}/ipfs/", gateway.uri())]);
    let app = app(test_state(ipfs_service));

    let request = Request::builder()
        .uri("/api/ipfs/metadata/QmGone")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Metadata not found on IPFS");
}

#[tokio::test]
async fn catalog_routes_surface_database_errors_without_a_database() {
    let app = app(test_state(IpfsService::new("http://127.0.0.1:1", "unused")));

    let request = Request::builder()
        .uri("/api/tracks/6b7a1f8e-1111-2222-3333-444455556666")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn stats_route_surfaces_database_errors_without_a_database() {
    let app = app(test_state(IpfsService::new("http://127.0.0.1:1", "unused")));

    let request = Request::builder()
        .uri("/api/stats")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}
