use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::firmware::{FirmwareImage, UpdateDecision};

pub const VERSION_HEADER: &str = "x-esp32-version";
pub const MAC_HEADER: &str = "x-esp32-sta-mac";

#[derive(Clone)]
pub struct AppState {
    pub firmware: Arc<FirmwareImage>,
    pub target_version: Arc<str>,
}

impl AppState {
    pub fn new(firmware: FirmwareImage, target_version: impl Into<Arc<str>>) -> Self {
        Self {
            firmware: Arc::new(firmware),
            target_version: target_version.into(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/update", get(get_update))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

// GET /update
pub async fn get_update(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(version) = headers.get(VERSION_HEADER) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mac = headers
        .get(MAC_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    info!(mac = mac.as_deref().unwrap_or_default(), "ESP32 request");

    match UpdateDecision::for_version(version.as_bytes(), &state.target_version) {
        UpdateDecision::UpToDate => {
            info!("Node is up to date");
            StatusCode::NOT_MODIFIED.into_response()
        }
        UpdateDecision::UpdateRequired => {
            info!(file = state.firmware.file_name(), "Updating node");
            match state.firmware.open().await {
                Ok(download) => download.into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}
