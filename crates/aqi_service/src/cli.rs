//! Command-line interface

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use crate::config::{LogFormat, ServiceConfig};
use crate::errors::ServiceError;

pub fn build_cli() -> Command {
    Command::new("aqi-service")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves categorized AQI forecasts over HTTP")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file path (defaults to config/aqi.toml if present)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDR")
                .help("Interface to bind"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .value_parser(value_parser!(u16))
                .help("Port to listen on"),
        )
        .arg(
            Arg::new("schema")
                .long("schema")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Feature column list (JSON array)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Tree-ensemble model (JSON)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("Log output format: pretty or json"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Exit when the schema or model cannot be loaded"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Load configuration and artifacts, report, then exit"),
        )
}

/// Explicit config file from the command line
pub fn config_path(matches: &ArgMatches) -> Option<PathBuf> {
    matches.get_one::<PathBuf>("config").cloned()
}

/// Apply CLI flags on top of file and environment configuration
pub fn apply_overrides(
    matches: &ArgMatches,
    config: &mut ServiceConfig,
) -> Result<(), ServiceError> {
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(path) = matches.get_one::<PathBuf>("schema") {
        config.schema_path = path.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("model") {
        config.model_path = path.clone();
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }
    if let Some(format) = matches.get_one::<String>("log-format") {
        config.log_format = LogFormat::parse(format)?;
    }
    if matches.get_flag("strict") {
        config.require_artifacts = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let matches = build_cli()
            .try_get_matches_from([
                "aqi-service",
                "--port",
                "8081",
                "--model",
                "forest.json",
                "--log-format",
                "json",
                "--strict",
            ])
            .unwrap();

        let mut config = ServiceConfig::default();
        apply_overrides(&matches, &mut config).unwrap();

        assert_eq!(config.port, 8081);
        assert_eq!(config.model_path, PathBuf::from("forest.json"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.require_artifacts);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config_path(&matches).is_none());
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let matches = build_cli()
            .try_get_matches_from(["aqi-service", "--config", "custom.toml"])
            .unwrap();

        let mut config = ServiceConfig::default();
        apply_overrides(&matches, &mut config).unwrap();

        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config_path(&matches), Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(build_cli()
            .try_get_matches_from(["aqi-service", "--port", "seventy"])
            .is_err());

        let matches = build_cli()
            .try_get_matches_from(["aqi-service", "--log-format", "xml"])
            .unwrap();
        let mut config = ServiceConfig::default();
        assert!(apply_overrides(&matches, &mut config).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
