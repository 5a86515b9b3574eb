use crate::caption;
use crate::gateway::server::GatewayState;
use crate::index::IndexStats;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

/// Build all routes for the gateway.
///
/// The caption route lives under the path of the public base URL so that
/// the URLs handed out in inline answers resolve here unchanged.
pub fn build_routes(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let caption_route = format!("{}/{{*rest}}", state.caption_mount);

    Router::new()
        .route("/api/health", get(health_handler))
        .route(&caption_route, get(caption_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub indexes: Vec<IndexStats>,
    pub pending_uploads: usize,
}

async fn health_handler(State(state): State<GatewayState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime,
        indexes: state.store.stats(),
        pending_uploads: state.pending.len(),
    })
}

// ============================================================================
// Caption
// ============================================================================

/// `{mount}/{reference}/{top}/{bottom}` with every segment percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionRequest {
    pub reference: String,
    pub top: String,
    pub bottom: String,
}

impl CaptionRequest {
    /// Parse a request path. Segments past the third are ignored; fewer than
    /// three, or an empty reference, is not a caption request.
    pub fn from_path(path: &str, mount: &str) -> Option<Self> {
        let rest = path.strip_prefix(mount)?.strip_prefix('/')?;
        let mut segments = rest
            .split('/')
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned());

        let reference = segments.next().filter(|r| !r.is_empty())?;
        let top = segments.next()?;
        let bottom = segments.next()?;

        Some(Self {
            reference,
            top,
            bottom,
        })
    }
}

async fn caption_handler(State(state): State<GatewayState>, uri: Uri) -> Response {
    let Some(request) = CaptionRequest::from_path(uri.path(), &state.caption_mount) else {
        debug!(path = uri.path(), "malformed caption request");
        return StatusCode::BAD_REQUEST.into_response();
    };

    let fetched =
        tokio::time::timeout(state.fetch_timeout, state.fetcher.fetch(&request.reference)).await;
    let bytes = match fetched {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!(reference = %request.reference, "media fetch failed: {e:#}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
        Err(_) => {
            warn!(reference = %request.reference, "media fetch timed out");
            return StatusCode::GATEWAY_TIMEOUT.into_response();
        }
    };

    let CaptionRequest {
        reference,
        top,
        bottom,
    } = request;
    let rendered = tokio::task::spawn_blocking(move || caption::render(&bytes, &top, &bottom)).await;

    match rendered {
        Ok(Ok(jpeg)) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Ok(Err(e)) => {
            warn!(%reference, "caption render failed: {e}");
            StatusCode::UNPROCESSABLE_ENTITY.into_response()
        }
        Err(e) => {
            error!(%reference, "caption render task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
