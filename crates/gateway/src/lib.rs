//! HTTP service for the epgedit schedule editor.
//!
//! Serves the current schedule, validates edited sequences against the
//! stored rule set and commits rebuilt channels. All persistence goes
//! through a [`ScheduleStore`] chosen from configuration.
//!
//! Built on Axum.

pub mod api;
pub mod error;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    response::Json,
    routing::{get, post},
};
use chrono::Local;
use epgedit_config::AppConfig;
use epgedit_core::{ScheduleStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub store: Arc<dyn ScheduleStore>,
    /// Set once the first fetch of this process has backed up the schedule.
    backup_created: Mutex<bool>,
    /// Serialises load-rebuild-save so concurrent updates cannot interleave.
    update_lock: Mutex<()>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(config: AppConfig, store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            config,
            store,
            backup_created: Mutex::new(false),
            update_lock: Mutex::new(()),
        }
    }

    /// Back up the schedule unless this process already did.
    ///
    /// The flag is only set after a successful backup, so a failed attempt
    /// is retried by the next fetch.
    pub async fn ensure_backup(&self) -> Result<(), StoreError> {
        let mut created = self.backup_created.lock().await;
        if *created {
            return Ok(());
        }
        let key = self.store.create_backup(Local::now().date_naive()).await?;
        info!(backup = %key, store = self.store.name(), "Schedule backed up");
        *created = true;
        Ok(())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(parsed))
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.gateway.body_limit_kb * 1024;
    let cors = cors_layer(&state.config.gateway.allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/fetch_xml", get(api::fetch_xml))
        .route("/validate_schedule", post(api::validate_schedule))
        .route("/update_schedule", post(api::update_schedule))
        .route("/rules", get(api::list_rules))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let store = epgedit_store::from_config(&config.storage);
    info!(
        store = store.name(),
        data_dir = %config.storage.data_dir.display(),
        "Schedule store ready"
    );

    let app = build_router(Arc::new(GatewayState::new(config, store)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
