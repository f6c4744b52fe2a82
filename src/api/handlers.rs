//! API Handlers
//!
//! HTTP request handlers for each lookup service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::LookupError;
use crate::metrics::MetricsCollector;
use crate::models::{HealthResponse, UserQuery, UserResponse};
use crate::service::UserLookupService;
use crate::storage::{create_database, Database};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lookup façade over the active backend
    pub service: Arc<UserLookupService>,
    /// Collector shared with the backend and the HTTP middleware
    pub metrics: Arc<MetricsCollector>,
    /// Configuration in use, served on `/config`
    pub config: Arc<Config>,
    /// Cancelled on shutdown; each request works under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: UserLookupService, config: Config) -> Self {
        let metrics = Arc::clone(service.metrics());
        Self {
            service: Arc::new(service),
            metrics,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the metrics collector, the configured backend and the lookup
    /// service. The backend still has to be initialized by the caller.
    pub fn from_config(config: Config) -> Self {
        let metrics = Arc::new(MetricsCollector::new(config.app.features.metrics_enabled));
        let db = create_database(&config, Arc::clone(&metrics));
        let service = UserLookupService::from_config(db, metrics, &config);
        Self::new(service, config)
    }

    /// Uses `token` as the shutdown signal.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        self.service.database()
    }
}

/// Handler for GET /user?id=<id>
pub async fn user_handler(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<UserResponse>, LookupError> {
    let cancel = state.shutdown.child_token();
    let name = state.service.lookup(query.id(), &cancel).await?;
    let id = query.id.unwrap_or_default();

    Ok(Json(UserResponse::new(id, name)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /config
///
/// Returns the configuration the service was started with.
pub async fn config_handler(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.as_ref().clone())
}

/// Handler for GET /metrics
///
/// Returns the plain-text metrics report.
pub async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.report()
}
