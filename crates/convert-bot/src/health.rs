//! Health check and metrics endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use convert_core::{JobOutcome, JobReport, Routed};

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub telegram_connected: bool,
    pub bot_username: Option<String>,
}

/// Metrics data
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metrics {
    pub events_received: u64,
    pub commands_processed: u64,
    pub sessions_pending: usize,
    pub jobs_dispatched: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub errors: u64,
    /// Unix time of the last finished job
    pub last_job_at: Option<u64>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<RwLock<Metrics>>,
    pub start_time: SystemTime,
    pub bot_username: Option<String>,
    pub telegram_connected: Arc<RwLock<bool>>,
}

impl AppState {
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(Metrics::default())),
            start_time: SystemTime::now(),
            bot_username,
            telegram_connected: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn increment_events(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.events_received += 1;
    }

    pub async fn increment_commands(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.commands_processed += 1;
    }

    pub async fn increment_errors(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.errors += 1;
    }

    pub async fn set_sessions_pending(&self, count: usize) {
        let mut metrics = self.metrics.write().await;
        metrics.sessions_pending = count;
    }

    /// Count what the router did with an event
    pub async fn record_routed(&self, routed: &Routed) {
        if let Routed::Dispatched { .. } = routed {
            let mut metrics = self.metrics.write().await;
            metrics.jobs_dispatched += 1;
        }
    }

    /// Count a finished job
    pub async fn record_report(&self, report: &JobReport) {
        let mut metrics = self.metrics.write().await;
        match report.outcome {
            JobOutcome::Succeeded => metrics.jobs_succeeded += 1,
            JobOutcome::Failed { .. } => metrics.jobs_failed += 1,
        }
        metrics.last_job_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());
    }

    pub async fn set_telegram_connected(&self, connected: bool) {
        *self.telegram_connected.write().await = connected;
    }
}

/// Health check endpoint handler
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time.elapsed().unwrap_or_default().as_secs();

    let telegram_connected = *state.telegram_connected.read().await;

    let (status, status_code) = if telegram_connected {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        status_code,
        Json(HealthStatus {
            status: status.to_string(),
            uptime_seconds: uptime,
            telegram_connected,
            bot_username: state.bot_username.clone(),
        }),
    )
}

/// Metrics endpoint handler
async fn metrics_handler(State(state): State<AppState>) -> Json<Metrics> {
    let metrics = state.metrics.read().await;
    Json(metrics.clone())
}

/// Create health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/ready", get(ready_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Readiness check (ready to accept traffic)
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if *state.telegram_connected.read().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check (process is alive)
async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Start health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Health check server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
