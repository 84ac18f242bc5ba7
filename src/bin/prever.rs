//! Command-line forecast for one date.
//!
//! Runs the same pipeline as `POST /prever` without the HTTP layer and
//! prints the forecast together with the held-out error of each model.
//!
//! Usage:
//!   cargo run --release --bin prever -- 2025-10-04
//!   cargo run --release --bin prever -- 2025-10-04 --lat -23.55 --lon -46.63 --all
//!
//! `--all` also forecasts solar irradiance.

use prever_service::config::{self, ForecastConfig};
use prever_service::ingest::ObservationSource;
use prever_service::ingest::power::PowerClient;
use prever_service::model::{Coordinate, Variable};
use prever_service::orchestrator::{TargetResult, forecast_date};
use std::env;
use std::sync::Arc;

fn parse_f64_arg(args: &[String], i: usize, flag: &str) -> f64 {
    match args.get(i + 1).and_then(|v| v.parse().ok()) {
        Some(v) => v,
        None => {
            eprintln!("Error: {} requires a number", flag);
            std::process::exit(1);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <YYYY-MM-DD> [--lat LAT] [--lon LON] [--all]", args[0]);
        std::process::exit(1);
    }

    let config = ForecastConfig::load_or_default(config::config_path_from_env())?;
    let date = args[1].clone();
    let mut coordinate = config.default_coordinate();
    let mut targets: Vec<Variable> = Variable::FORECAST_TARGETS.to_vec();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--lat" => {
                coordinate = Coordinate::new(parse_f64_arg(&args, i, "--lat"), coordinate.longitude);
                i += 2;
            }
            "--lon" => {
                coordinate = Coordinate::new(coordinate.latitude, parse_f64_arg(&args, i, "--lon"));
                i += 2;
            }
            "--all" => {
                targets.push(Variable::SolarIrradiance);
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    println!("===== Previsão para {} =====", date);
    println!("Coordenada: {}, {}\n", coordinate.latitude, coordinate.longitude);

    let source: Arc<dyn ObservationSource> = Arc::new(PowerClient::new(&config)?);
    let report = forecast_date(&date, coordinate, &targets, &config, &source)?;

    println!("Histórico: {} horas\n", report.history_rows);
    for target in &report.targets {
        match &target.result {
            TargetResult::Present(outcome) => {
                println!("{}:", target.label());
                println!("  Previsão: {:.2}", outcome.value);
                println!(
                    "  RMSE teste: {:.2}, MAE teste: {:.2} ({} treino / {} teste)\n",
                    outcome.rmse, outcome.mae, outcome.train_samples, outcome.test_samples
                );
            }
            TargetResult::Absent { reason } => {
                println!("{}: Não foi possível prever ({})\n", target.label(), reason);
            }
        }
    }

    println!("===== Fim da previsão =====");
    Ok(())
}
