use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use snapmark_schemas::{MessageRequest, MessageResponse, SnapshotId};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::page::SubmittedPage;
use crate::service::SnapmarkService;

#[derive(Clone)]
pub struct AppState {
    pub service: SnapmarkService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/message", post(handle_message))
        .route("/snapshots", get(list_snapshots))
        .route("/snapshots/search", get(search_snapshots))
        .route("/snapshots/:id", delete(delete_snapshot))
        .route("/export/markdown", get(export_markdown))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "snapmark",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Protocol endpoint: always 200 with the `{success, data, error}` envelope
async fn handle_message(
    State(state): State<AppState>,
    body: Result<Json<MessageRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected message body: {}", rejection.body_text());
            return Json(MessageResponse::failure(rejection.body_text()));
        }
    };

    let pages = SubmittedPage::from_request(&request);
    Json(state.service.handle(request, &pages).await)
}

async fn list_snapshots(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshots = state.service.store().list().await.map_err(internal_error)?;
    Ok(Json(snapshots))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_snapshots(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshots = state
        .service
        .store()
        .search(&query.q)
        .await
        .map_err(internal_error)?;
    Ok(Json(snapshots))
}

async fn delete_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshots = state
        .service
        .store()
        .delete(SnapshotId(id))
        .await
        .map_err(internal_error)?;
    Ok(Json(snapshots))
}

async fn export_markdown(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let markdown = state
        .service
        .store()
        .export_markdown()
        .await
        .map_err(internal_error)?;
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], markdown))
}

fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    error!("Request failed: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
