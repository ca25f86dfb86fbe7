pub mod error;
pub mod mailer;
pub mod routes;
pub mod state;

pub use state::AppState;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Automation policy + inbound trigger
        .route("/api/automation", get(routes::automation::get_policy))
        .route("/api/automation", put(routes::automation::put_policy))
        .route(
            "/api/automation/status-change",
            post(routes::automation::status_change),
        )
        // Templates
        .route("/api/templates", get(routes::templates::list_templates))
        .route(
            "/api/templates/{kind}",
            put(routes::templates::put_template),
        )
        // Send history
        .route(
            "/api/events/{id}/emails",
            get(routes::history::event_history),
        )
        .route("/api/emails", get(routes::history::list_history))
        // Branding
        .route("/api/config", get(routes::config::get_config))
        .layer(cors)
        .with_state(state)
}

/// Install the fmt tracing subscriber, honoring `RUST_LOG` overrides.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();
}

/// Start the admin API server. The embedding application builds the
/// `AppState` with its own event store, subscriber directory, and mailer.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("shipnote admin API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
