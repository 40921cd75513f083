use anyhow::{Context, Result};
use aqi_service::cli::{apply_overrides, build_cli, config_path};
use aqi_service::{
    load_artifacts, shutdown_signal, start_server, AppState, LogFormat, RouterOptions,
    ServiceConfig,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let mut config = ServiceConfig::load(config_path(&matches).as_deref())
        .context("failed to load configuration")?;
    apply_overrides(&matches, &mut config)?;
    config.validate().context("invalid configuration")?;

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        schema = %config.schema_path.display(),
        model = %config.model_path.display(),
        "starting AQI service"
    );

    let mut artifacts = load_artifacts(&config);
    if config.require_artifacts || matches.get_flag("check") {
        artifacts = artifacts
            .require()
            .context("artifacts required but could not be loaded")?;
    }

    if matches.get_flag("check") {
        let report = &artifacts.report;
        println!("configuration: ok ({})", config.bind_addr());
        if let Ok(schema) = &report.schema {
            println!(
                "schema: ok ({} features, {} cities)",
                schema.features, schema.cities
            );
        }
        if let Ok(model) = &report.model {
            println!(
                "model: ok (hash {})",
                model.fingerprint.as_deref().unwrap_or("-")
            );
        }
        return Ok(());
    }

    if let Some(reason) = artifacts.report.first_error() {
        error!(%reason, "artifacts unavailable");
        warn!("running in degraded mode: /predict will answer 503 until restarted with valid artifacts");
    }

    let state = AppState::new(artifacts);
    let options = RouterOptions {
        cors_permissive: config.cors_permissive,
    };

    start_server(state, &config.bind_addr(), options, shutdown_signal()).await?;

    info!("AQI service stopped");
    Ok(())
}

fn init_logging(config: &ServiceConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}
