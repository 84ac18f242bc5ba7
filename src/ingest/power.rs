/// NASA POWER hourly point API client.
///
/// Handles URL construction and JSON response parsing for:
///   https://power.larc.nasa.gov/api/temporal/hourly/point
///
/// The response nests values as `properties.parameter.<CODE>.<YYYYMMDDHH>`.
/// See `fixtures.rs` for annotated examples of the response structure.

use crate::config::{ForecastConfig, SourceConfig};
use crate::ingest::ObservationSource;
use crate::model::{Coordinate, ForecastError, ObservationSeries, Variable};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Sentinel POWER uses for missing values when the header omits it.
pub const DEFAULT_FILL_VALUE: f64 = -999.0;

// ---------------------------------------------------------------------------
// Serde structures for POWER JSON deserialization
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct HourlyResponse {
    properties: Properties,
    #[serde(default)]
    header: Option<Header>,
}

#[derive(Deserialize)]
struct Properties {
    parameter: HashMap<String, BTreeMap<String, Option<f64>>>,
}

#[derive(Deserialize)]
struct Header {
    fill_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds a POWER hourly point URL for an inclusive date range.
///
/// Dates go out as `YYYYMMDD`; parameter codes are comma-separated in the
/// configured order.
pub fn build_hourly_url(
    source: &SourceConfig,
    start: NaiveDate,
    end: NaiveDate,
    coordinate: Coordinate,
) -> String {
    let parameters: Vec<&str> = source.parameters.iter().map(|p| p.code()).collect();

    format!(
        "{}?parameters={}&community={}&longitude={}&latitude={}&format=JSON&start={}&end={}",
        source.base_url,
        urlencoding::encode(&parameters.join(",")),
        urlencoding::encode(&source.community),
        coordinate.longitude,
        coordinate.latitude,
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parses a `YYYYMMDDHH` key into an hourly timestamp.
pub fn parse_hour_key(key: &str) -> Result<NaiveDateTime, ForecastError> {
    let invalid = || ForecastError::Parse(format!("Invalid hourly timestamp '{}'", key));

    if key.len() != 10 || !key.is_ascii() {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(&key[..8], "%Y%m%d").map_err(|_| invalid())?;
    let hour: u32 = key[8..].parse().map_err(|_| invalid())?;
    date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)
}

/// Parses a POWER hourly JSON body into an `ObservationSeries` with one
/// column per entry in `columns`.
///
/// Hours where any requested variable is absent, null or equal to the fill
/// value are dropped.
///
/// # Errors
/// - `ForecastError::Parse` - malformed JSON, a requested parameter missing
///   from the payload, or an unparseable timestamp key.
pub fn parse_hourly_response(
    json: &str,
    columns: &[Variable],
) -> Result<ObservationSeries, ForecastError> {
    let response: HourlyResponse = serde_json::from_str(json)
        .map_err(|e| ForecastError::Parse(format!("JSON deserialization failed: {}", e)))?;

    let fill_value = response
        .header
        .and_then(|h| h.fill_value)
        .unwrap_or(DEFAULT_FILL_VALUE);

    let mut per_column = Vec::with_capacity(columns.len());
    for variable in columns {
        let values = response
            .properties
            .parameter
            .get(variable.code())
            .ok_or_else(|| ForecastError::Parse(format!("Parameter {} missing from response", variable)))?;
        per_column.push(values);
    }

    // Union of hour keys; YYYYMMDDHH sorts chronologically as text
    let keys: BTreeSet<&String> = per_column.iter().flat_map(|m| m.keys()).collect();

    let mut rows = Vec::with_capacity(keys.len());
    let mut dropped = 0usize;

    for key in keys {
        let timestamp = parse_hour_key(key)?;

        let row: Option<Vec<f64>> = per_column
            .iter()
            .map(|m| {
                m.get(key)
                    .copied()
                    .flatten()
                    .filter(|v| v.is_finite() && (v - fill_value).abs() > f64::EPSILON)
            })
            .collect();

        match row {
            Some(values) => rows.push((timestamp, values)),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("power dropped={} hours with missing or fill values", dropped);
    }

    ObservationSeries::from_rows(columns.to_vec(), rows)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking POWER client. One call = one network request, no retries.
pub struct PowerClient {
    http: reqwest::blocking::Client,
    source: SourceConfig,
}

impl PowerClient {
    pub fn new(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            source: config.source.clone(),
        })
    }

    /// Fetches the configured parameters for `[start, end]` at `coordinate`.
    ///
    /// # Errors
    /// - `ForecastError::DataSource` - non-success HTTP status (status + body).
    /// - `ForecastError::Transport` - the request itself failed.
    /// - `ForecastError::Parse` - see `parse_hourly_response`.
    pub fn fetch_hourly(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        coordinate: Coordinate,
    ) -> Result<ObservationSeries, ForecastError> {
        let url = build_hourly_url(&self.source, start, end, coordinate);
        log::debug!("power fetch url={}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(ForecastError::DataSource {
                status: status.as_u16(),
                body,
            });
        }

        parse_hourly_response(&body, &self.source.parameters)
    }
}

impl ObservationSource for PowerClient {
    fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        coordinate: Coordinate,
    ) -> Result<ObservationSeries, ForecastError> {
        self.fetch_hourly(start, end, coordinate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
