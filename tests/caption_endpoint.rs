//! Integration tests for the HTTP surface: the caption route and health.
//!
//! The router is driven in-process with `oneshot`; media comes from an
//! in-memory fetcher instead of Telegram.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::{ImageFormat, Rgba, RgbaImage};
use tower::ServiceExt;
use url::Url;

use memindex::channels::MediaFetcher;
use memindex::gateway::{build_routes, GatewayState};
use memindex::index::{IndexStore, KeywordIndex};
use memindex::media::MediaKind;
use memindex::sessions::PendingUploadTracker;

struct FakeFetcher {
    media: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, reference: &str) -> anyhow::Result<Vec<u8>> {
        self.media
            .get(reference)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {reference}"))
    }
}

struct StalledFetcher;

#[async_trait]
impl MediaFetcher for StalledFetcher {
    async fn fetch(&self, _reference: &str) -> anyhow::Result<Vec<u8>> {
        std::future::pending().await
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn state_with(fetcher: Arc<dyn MediaFetcher>, base: &str) -> GatewayState {
    let mut photos = KeywordIndex::default();
    photos.append("cat", "p1");
    let store = IndexStore::from_indexes([(MediaKind::Photo, PathBuf::from("photos.json"), photos)]);

    GatewayState::new(
        Arc::new(store),
        Arc::new(PendingUploadTracker::new()),
        fetcher,
        &Url::parse(base).unwrap(),
    )
}

fn state() -> GatewayState {
    let media = HashMap::from([
        ("p1".to_string(), png(120, 90)),
        ("broken".to_string(), b"definitely not an image".to_vec()),
    ]);
    state_with(
        Arc::new(FakeFetcher { media }),
        "https://memes.example.com/caption",
    )
}

async fn get(state: GatewayState, uri: &str) -> axum::response::Response {
    build_routes(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn renders_jpeg_for_known_photo() {
    let response = get(state(), "/caption/p1/hello%20there/general%20kenobi").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let decoded = image::load_from_memory_with_format(&body, ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (120, 90));
}

#[tokio::test]
async fn empty_captions_still_render() {
    let response = get(state(), "/caption/p1//").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn too_few_segments_is_bad_request() {
    let response = get(state(), "/caption/p1/top").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_media_is_bad_gateway() {
    let response = get(state(), "/caption/missing/top/bottom").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn undecodable_media_is_unprocessable() {
    let response = get(state(), "/caption/broken/top/bottom").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn caption_without_glyphs_is_unprocessable() {
    let response = get(state(), "/caption/p1/%E7%8C%AB/cat").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cyrillic_caption_renders() {
    let response = get(state(), "/caption/p1/%D0%BA%D0%BE%D1%82/cat").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stalled_fetch_times_out() {
    let mut state = state_with(Arc::new(StalledFetcher), "https://memes.example.com/caption");
    state.fetch_timeout = Duration::from_millis(20);

    let response = get(state, "/caption/p1/top/bottom").await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn root_mount_serves_captions() {
    let media = HashMap::from([("p1".to_string(), png(64, 64))]);
    let state = state_with(Arc::new(FakeFetcher { media }), "https://memes.example.com/");

    let response = get(state.clone(), "/p1/top/bottom").await;
    assert_eq!(response.status(), StatusCode::OK);

    let health = get(state, "/api/health").await;
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_indexes_and_pending() {
    let state = state();
    state.pending.set(7, MediaKind::Sticker, "s1");

    let response = get(state, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["pendingUploads"], 1);
    assert_eq!(json["indexes"][0]["kind"], "photo");
    assert_eq!(json["indexes"][0]["keywords"], 1);
}
