//! HTTP surface: router, handlers and server lifecycle

use anyhow::{Context, Result};
use aqi_core::{AqiResult, PredictionRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::health::{health_report, HealthResponse};
use crate::metrics::{Outcome, RequestTimer};
use crate::state::{AppState, SharedState};

/// Body returned by the liveness route
pub const LIVENESS_MESSAGE: &str = "API is Online";

/// Router options that do not live in the shared state
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub cors_permissive: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_permissive: true,
        }
    }
}

pub fn build_router(state: SharedState, options: RouterOptions) -> Router {
    let router = Router::new()
        .route("/", get(handle_liveness))
        .route("/predict", post(handle_predict))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics));

    let router = if options.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(
    state: AppState,
    addr: &str,
    options: RouterOptions,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(Arc::new(state), options);
    let listener = bind_listener(addr).await?;
    let local = listener
        .local_addr()
        .context("failed to read bound address")?;
    info!(addr = %local, "AQI service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("AQI server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received, draining connections"),
        Err(err) => warn!(error = %err, "failed to listen for shutdown signal"),
    }
}

async fn handle_liveness() -> &'static str {
    LIVENESS_MESSAGE
}

async fn handle_predict(
    State(state): State<SharedState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<AqiResult>, ApiError> {
    let timer = RequestTimer::start(state.metrics());

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "rejected prediction body");
            timer.finish(Outcome::InvalidInput);
            return Err(ApiError::internal(rejection.body_text()));
        }
    };

    let result = state
        .inference()
        .and_then(|context| context.estimate(&request));

    match result {
        Ok(result) => {
            timer.finish(Outcome::Success);
            Ok(Json(result))
        }
        Err(err) => {
            if err.is_client_error() {
                debug!(city = %request.city, error = %err, "prediction rejected");
            } else {
                warn!(city = %request.city, error = %err, "prediction failed");
            }
            timer.finish(Outcome::from(&err));
            Err(ApiError::from(err))
        }
    }
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(health_report(&state))
}

async fn handle_metrics(State(state): State<SharedState>) -> Response {
    let body = state
        .metrics()
        .snapshot()
        .render_prometheus(state.uptime(), state.is_ready());

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}
