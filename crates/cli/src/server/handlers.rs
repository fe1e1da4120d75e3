use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use chapterbay_core::DownloadRecord;

use super::state::AppState;
use crate::metrics::{encode_metrics, DOWNLOADS_ACTIVE, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub downloads: usize,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        downloads: state.registry().len(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Registry snapshot, ordered by start time.
pub async fn list_downloads(State(state): State<Arc<AppState>>) -> Json<Vec<DownloadRecord>> {
    Json(state.registry().snapshot())
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    DOWNLOADS_ACTIVE.set(state.registry().len() as i64);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

/// Records duration and count of every request.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, &path, &status])
        .observe(start.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    response
}
