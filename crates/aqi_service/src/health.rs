//! Health report built from the startup artifact checks

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: u64,
    pub version: String,
    pub uptime_secs: u64,
    pub checks: BTreeMap<String, CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cities: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
}

impl CheckResult {
    fn pass(message: String) -> Self {
        Self {
            status: CheckStatus::Pass,
            message: Some(message),
        }
    }

    fn fail(message: String) -> Self {
        Self {
            status: CheckStatus::Fail,
            message: Some(message),
        }
    }
}

/// Assemble the health report for the current state
pub fn health_report(state: &AppState) -> HealthResponse {
    let report = state.report();
    let mut checks = BTreeMap::new();

    let schema_check = match &report.schema {
        Ok(schema) if schema.cities == 0 => CheckResult {
            status: CheckStatus::Warn,
            message: Some(format!(
                "{} features loaded from {} but no city columns",
                schema.features, schema.path
            )),
        },
        Ok(schema) => CheckResult::pass(format!(
            "{} features, {} cities from {}",
            schema.features, schema.cities, schema.path
        )),
        Err(err) => CheckResult::fail(err.clone()),
    };
    checks.insert("schema".to_string(), schema_check);

    let model_check = match (&report.model, state.is_ready()) {
        (Ok(model), true) => CheckResult::pass(match model.trees {
            Some(trees) => format!("{trees} trees from {}", model.path),
            None => format!("predictor from {}", model.path),
        }),
        (Ok(_), false) => CheckResult::fail("model loaded but not in service".to_string()),
        (Err(err), _) => CheckResult::fail(err.clone()),
    };
    checks.insert("model".to_string(), model_check);

    let (model_hash, features, cities) = match state.inference() {
        Ok(context) => (
            context.model_fingerprint(),
            Some(context.schema().len()),
            Some(context.schema().cities().len()),
        ),
        Err(_) => (None, None, None),
    };

    HealthResponse {
        status: determine_health_status(&checks),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime().as_secs(),
        checks,
        model_hash,
        features,
        cities,
    }
}

/// Determine overall health status from individual checks
fn determine_health_status(checks: &BTreeMap<String, CheckResult>) -> HealthStatus {
    let mut has_failures = false;
    let mut has_warnings = false;

    for check in checks.values() {
        match check.status {
            CheckStatus::Fail => has_failures = true,
            CheckStatus::Warn => has_warnings = true,
            CheckStatus::Pass => {}
        }
    }

    if has_failures {
        HealthStatus::Unhealthy
    } else if has_warnings {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
