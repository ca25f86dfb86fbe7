use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use shipnote_core::automation::AutomationOutcome;
use shipnote_core::policy::AutomationPolicy;

use crate::error::AppError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Policy read/write
// ---------------------------------------------------------------------------

/// GET /api/automation — the current automation policy.
pub async fn get_policy(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let policy = tokio::task::spawn_blocking(move || store.load_policy())
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::to_value(policy)?))
}

#[derive(serde::Deserialize)]
pub struct PutPolicyBody {
    pub enabled: bool,
    #[serde(default)]
    pub trigger_statuses: Vec<String>,
}

/// PUT /api/automation — replace the automation policy. The trigger list is
/// normalized (trimmed, de-duplicated, blanks dropped) before persisting.
pub async fn put_policy(
    State(app): State<AppState>,
    Json(body): Json<PutPolicyBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let saved = tokio::task::spawn_blocking(move || {
        store.save_policy(AutomationPolicy::new(body.enabled, body.trigger_statuses))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::to_value(saved)?))
}

// ---------------------------------------------------------------------------
// Inbound trigger
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct StatusChangeBody {
    pub event_id: u64,
    pub old_status: String,
    pub new_status: String,
}

/// POST /api/automation/status-change — called by the event CRUD handler
/// after a status change is durably persisted. Always answers 202 with the
/// outcome: automation failures are best-effort side effects and must never
/// fail the caller's update.
pub async fn status_change(
    State(app): State<AppState>,
    Json(body): Json<StatusChangeBody>,
) -> (StatusCode, Json<AutomationOutcome>) {
    let outcome = app
        .automation
        .process_status_change(body.event_id, &body.old_status, &body.new_status)
        .await;
    (StatusCode::ACCEPTED, Json(outcome))
}
