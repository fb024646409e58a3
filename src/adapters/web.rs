//! HTTP shim over the artifact directory.
//!
//! Serves exactly what the serializer wrote: the manifest, individual
//! analysis documents and rendered charts. A metric that failed during the
//! run has no artifact and surfaces as 404, which the dashboard renders as
//! an omitted section.

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::fs;
use std::path::PathBuf;
use tower_http::services::ServeDir;

#[derive(Clone)]
pub struct AppState {
    pub artifact_dir: PathBuf,
}

pub fn build_router(state: AppState) -> Router {
    let charts = ServeDir::new(state.artifact_dir.join("charts"));
    Router::new()
        .route("/api/analyses", get(list_analyses))
        .route("/api/analysis/{id}", get(get_analysis))
        .nest_service("/charts", charts)
        .with_state(state)
}

async fn list_analyses(State(state): State<AppState>) -> impl IntoResponse {
    serve_json(state.artifact_dir.join("manifest.json"))
}

async fn get_analysis(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<u32>,
) -> impl IntoResponse {
    let prefix = format!("{id:02}_");
    let Ok(entries) = fs::read_dir(&state.artifact_dir) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&prefix) && name.ends_with(".json") {
            return serve_json(entry.path());
        }
    }
    StatusCode::NOT_FOUND.into_response()
}

fn serve_json(path: PathBuf) -> axum::response::Response {
    let Ok(body) = fs::read_to_string(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => Json(value).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}
