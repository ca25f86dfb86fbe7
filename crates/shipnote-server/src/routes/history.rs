use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/events/:id/emails — send history for one event, newest first.
pub async fn event_history(
    State(app): State<AppState>,
    Path(event_id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let history = tokio::task::spawn_blocking(move || store.history_for_event(event_id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::to_value(history)?))
}

#[derive(serde::Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

/// GET /api/emails?page&limit — paged global send history, newest first.
pub async fn list_history(
    State(app): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let history = tokio::task::spawn_blocking(move || store.list_history(query.page, query.limit))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::json!({
        "page": query.page.max(1),
        "entries": history,
    })))
}
