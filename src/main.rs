//! Weather Forecast Service - HTTP endpoint
//!
//! Serves forecasts for a date and coordinate by downloading the same
//! calendar window from previous years and training one model per variable
//! on every request.
//!
//! Usage:
//!   cargo run --release                          # Bind PREVER_HOST:PREVER_PORT (default 0.0.0.0:5000)
//!   cargo run --release -- --port 8080           # Override the port
//!   cargo run --release -- --config other.toml   # Override the config file
//!
//! Environment:
//!   PREVER_HOST, PREVER_PORT - bind address
//!   PREVER_CONFIG            - config file (default forecast.toml)
//!   RUST_LOG                 - log filter (default info)

use prever_service::config::{self, ForecastConfig};
use prever_service::endpoint::{self, ForecastService};
use prever_service::ingest::power::PowerClient;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (host, mut port) = config::bind_address_from_env();
    let mut config_path: PathBuf = config::config_path_from_env();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => match args.get(i + 1).and_then(|p| p.parse().ok()) {
                Some(p) => {
                    port = p;
                    i += 2;
                }
                None => {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            },
            "--config" => match args.get(i + 1) {
                Some(path) => {
                    config_path = PathBuf::from(path);
                    i += 2;
                }
                None => {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
            },
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT] [--config FILE]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let config = match ForecastConfig::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let client = match PowerClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            log::error!("failed to build data source client: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "forecast service years={} window_days={} window_hours={} trees={} source={}",
        config.years,
        config.window_days,
        config.window_hours,
        config.trees,
        config.source.base_url
    );

    let service = ForecastService::new(config, Arc::new(client));
    if let Err(e) = endpoint::start_endpoint_server(&host, port, service) {
        log::error!("endpoint server error: {}", e);
        std::process::exit(1);
    }
}
