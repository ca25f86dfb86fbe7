use axum::extract::{Path, State};
use axum::Json;

use shipnote_core::template::EmailTemplate;
use shipnote_core::types::TemplateKind;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/templates — the effective template for every kind, with a flag
/// showing whether an admin override shadows the built-in default.
pub async fn list_templates(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let registry = app.registry.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut list = Vec::new();
        for kind in TemplateKind::all() {
            let customized = store.custom_template(kind)?.is_some();
            let effective = store.resolve_template(kind, &registry)?;
            list.push(serde_json::json!({
                "kind": kind.as_str(),
                "subject": effective.subject,
                "body": effective.body,
                "customized": customized,
            }));
        }
        Ok::<_, shipnote_core::ShipnoteError>(serde_json::json!(list))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct PutTemplateBody {
    pub subject: String,
    pub body: String,
}

/// PUT /api/templates/:kind — save an admin override for the given kind.
pub async fn put_template(
    State(app): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<PutTemplateBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let kind = TemplateKind::parse(&kind)?;
    let store = app.store.clone();
    let template = EmailTemplate {
        kind,
        subject: body.subject,
        body: body.body,
    };
    let saved = template.clone();
    tokio::task::spawn_blocking(move || store.set_template(&template))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(serde_json::json!({
        "kind": saved.kind.as_str(),
        "subject": saved.subject,
        "body": saved.body,
        "customized": true,
    })))
}
