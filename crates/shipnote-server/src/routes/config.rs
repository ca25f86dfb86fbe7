use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config — branding as the admin UI needs it. SMTP credentials
/// are never exposed here.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let branding = &app.config.branding;
    Ok(Json(serde_json::json!({
        "project_name": branding.project_name,
        "base_url": branding.base_url,
        "primary_color": branding.primary_color,
    })))
}
