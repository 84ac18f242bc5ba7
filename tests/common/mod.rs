//! Test helpers: synthetic hourly data and a mock POWER server.

#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use prever_service::config::ForecastConfig;
use prever_service::ingest::ObservationSource;
use prever_service::model::{Coordinate, ForecastError, ObservationSeries, Variable};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;

/// Deterministic value of `variable` at `ts`, with a daily cycle.
pub fn synthetic_value(variable: Variable, ts: NaiveDateTime) -> f64 {
    let phase = ts.hour() as f64 / 24.0 * std::f64::consts::TAU;
    let drift = (ts.ordinal() as f64 * 0.37).sin();
    match variable {
        Variable::Temperature => 21.0 + 6.0 * phase.sin() + drift,
        Variable::Humidity => 72.0 - 15.0 * phase.sin() + 3.0 * drift,
        Variable::WindSpeed => 2.2 + 0.8 * phase.cos() + 0.2 * drift,
        Variable::SolarIrradiance => (650.0 * phase.sin()).max(0.0),
        Variable::Precipitation => ((ts.day() * 5 + ts.hour()) % 13) as f64 * 0.04,
    }
}

/// Every hour of `[start, end]` inclusive.
pub fn hours(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDateTime> {
    let mut out = Vec::new();
    let mut ts = start.and_hms_opt(0, 0, 0).unwrap();
    let last = end.and_hms_opt(23, 0, 0).unwrap();
    while ts <= last {
        out.push(ts);
        ts += Duration::hours(1);
    }
    out
}

pub fn synthetic_series(start: NaiveDate, end: NaiveDate) -> ObservationSeries {
    let rows = hours(start, end)
        .into_iter()
        .map(|ts| (ts, Variable::ALL.iter().map(|v| synthetic_value(*v, ts)).collect()))
        .collect();
    ObservationSeries::from_rows(Variable::ALL.to_vec(), rows).unwrap()
}

/// POWER-shaped JSON body for `[start, end]`.
pub fn power_json(start: NaiveDate, end: NaiveDate) -> String {
    let mut parameter = Map::new();
    for variable in Variable::ALL {
        let values: Map<String, Value> = hours(start, end)
            .into_iter()
            .map(|ts| (ts.format("%Y%m%d%H").to_string(), json!(synthetic_value(variable, ts))))
            .collect();
        parameter.insert(variable.code().to_string(), Value::Object(values));
    }

    json!({
        "type": "Feature",
        "properties": { "parameter": parameter },
        "header": { "fill_value": -999.0, "time_standard": "LST" },
        "messages": []
    })
    .to_string()
}

/// In-process source serving synthetic data, failing for `failing_years`.
pub struct SyntheticSource {
    pub failing_years: HashSet<i32>,
    pub requests: Mutex<Vec<(NaiveDate, NaiveDate, Coordinate)>>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    pub fn failing(years: &[i32]) -> Self {
        Self {
            failing_years: years.iter().copied().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ObservationSource for SyntheticSource {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        coordinate: Coordinate,
    ) -> Result<ObservationSeries, ForecastError> {
        self.requests.lock().unwrap().push((start, end, coordinate));
        let center = start + Duration::days((end - start).num_days() / 2);
        if self.failing_years.contains(&center.year()) {
            return Err(ForecastError::DataSource {
                status: 500,
                body: "Internal Server Error".to_string(),
            });
        }
        Ok(synthetic_series(start, end))
    }
}

/// Small but complete config: 5 years, 2-day half window, 12-hour samples.
pub fn test_config() -> ForecastConfig {
    ForecastConfig {
        years: 5,
        window_days: 2,
        window_hours: 12,
        trees: 6,
        ..ForecastConfig::default()
    }
}

fn query_param<'a>(url: &'a str, name: &str) -> Option<&'a str> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// Starts a mock POWER server on an ephemeral port and returns its base URL.
///
/// With `status == 200` it answers with synthetic data for the requested
/// `start`/`end`; any other status is returned with a plain-text body.
pub fn spawn_mock_power(status: u16) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("bind mock server");
    let port = server
        .server_addr()
        .to_ip()
        .expect("mock server listens on TCP")
        .port();

    thread::spawn(move || {
        for request in server.incoming_requests() {
            let url = request.url().to_string();
            let response = if status == 200 {
                let start = query_param(&url, "start")
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y%m%d").ok());
                let end = query_param(&url, "end")
                    .and_then(|s| NaiveDate::parse_from_str(s, "%Y%m%d").ok());
                match (start, end) {
                    (Some(start), Some(end)) => {
                        tiny_http::Response::from_string(power_json(start, end)).with_status_code(200)
                    }
                    _ => tiny_http::Response::from_string("missing start/end").with_status_code(422),
                }
            } else {
                tiny_http::Response::from_string("Internal Server Error").with_status_code(status)
            };
            let _ = request.respond(response);
        }
    });

    format!("http://127.0.0.1:{}/api/temporal/hourly/point", port)
}
