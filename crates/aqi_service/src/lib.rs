//! AQI forecast HTTP service
//!
//! Loads the feature schema and model once at startup, then serves:
//! - `GET /` liveness text
//! - `POST /predict` categorized AQI estimate
//! - `GET /health` per-artifact health report
//! - `GET /metrics` Prometheus counters
//!
//! When artifacts fail to load the service stays up in a degraded state
//! unless `require_artifacts` is set.

pub mod cli;
pub mod config;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::{LogFormat, ServiceConfig};
pub use errors::{ApiError, ServiceError};
pub use health::{CheckResult, CheckStatus, HealthResponse, HealthStatus};
pub use metrics::{MetricsCollector, MetricsSnapshot, Outcome};
pub use server::{build_router, shutdown_signal, start_server, RouterOptions};
pub use state::{load_artifacts, AppState, ArtifactReport, LoadedArtifacts, SharedState};
