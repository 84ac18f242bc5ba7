/// Shared data types for the forecast pipeline.
///
/// Everything that crosses a module boundary lives here: the monitored
/// variables, the coordinate, the hourly observation table and the error
/// taxonomy used from the fetcher up to the HTTP boundary.

use chrono::NaiveDateTime;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// A physical variable published by the POWER hourly point API.
///
/// Serialized as the upstream parameter code (`"T2M"`, `"RH2M"`, ...), which
/// is also the name used in `forecast.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variable {
    #[serde(rename = "T2M")]
    Temperature,
    #[serde(rename = "PRECTOTCORR")]
    Precipitation,
    #[serde(rename = "RH2M")]
    Humidity,
    #[serde(rename = "WS2M")]
    WindSpeed,
    #[serde(rename = "ALLSKY_SFC_SW_DWN")]
    SolarIrradiance,
}

impl Variable {
    /// All variables, in the order they are requested from the data source.
    pub const ALL: [Variable; 5] = [
        Variable::Temperature,
        Variable::Humidity,
        Variable::WindSpeed,
        Variable::SolarIrradiance,
        Variable::Precipitation,
    ];

    /// The four variables answered by `POST /prever`.
    pub const FORECAST_TARGETS: [Variable; 4] = [
        Variable::Temperature,
        Variable::Precipitation,
        Variable::Humidity,
        Variable::WindSpeed,
    ];

    /// Upstream parameter code.
    pub fn code(&self) -> &'static str {
        match self {
            Variable::Temperature => "T2M",
            Variable::Precipitation => "PRECTOTCORR",
            Variable::Humidity => "RH2M",
            Variable::WindSpeed => "WS2M",
            Variable::SolarIrradiance => "ALLSKY_SFC_SW_DWN",
        }
    }

    /// Friendly display label, including the physical unit.
    pub fn label(&self) -> &'static str {
        match self {
            Variable::Temperature => "Temperatura (°C)",
            Variable::Precipitation => "Precipitação (mm)",
            Variable::Humidity => "Umidade (%)",
            Variable::WindSpeed => "Vento (m/s)",
            Variable::SolarIrradiance => "Neve / Insolação (MJ/m²)",
        }
    }

    pub fn from_code(code: &str) -> Option<Variable> {
        Variable::ALL.iter().copied().find(|v| v.code() == code)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Variable {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::from_code(s.trim())
            .ok_or_else(|| ForecastError::Validation(format!("Unknown variable code '{}'", s)))
    }
}

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// Geographic point in decimal degrees. No range is enforced here; the data
/// source rejects coordinates it cannot serve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

// ---------------------------------------------------------------------------
// Observation series
// ---------------------------------------------------------------------------

/// Hourly observation table: one row per timestamp, one column per variable.
///
/// Rows are kept sorted by timestamp with no duplicates. Values live in a
/// row-major `Array2` of shape `(timestamps, columns)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSeries {
    columns: Vec<Variable>,
    timestamps: Vec<NaiveDateTime>,
    values: Array2<f64>,
}

impl ObservationSeries {
    /// Builds a series from unordered rows.
    ///
    /// Rows are sorted by timestamp; when a timestamp repeats, the first
    /// occurrence wins.
    ///
    /// # Errors
    /// `ForecastError::Parse` when a row's width differs from the column count.
    pub fn from_rows(
        columns: Vec<Variable>,
        rows: Vec<(NaiveDateTime, Vec<f64>)>,
    ) -> Result<Self, ForecastError> {
        if let Some((ts, row)) = rows.iter().find(|(_, r)| r.len() != columns.len()) {
            return Err(ForecastError::Parse(format!(
                "Row at {} has {} values, expected {}",
                ts,
                row.len(),
                columns.len()
            )));
        }

        let mut rows = rows;
        // Stable sort keeps the first occurrence of a duplicate in front
        rows.sort_by_key(|(ts, _)| *ts);
        rows.dedup_by_key(|(ts, _)| *ts);

        let width = columns.len();
        let mut timestamps = Vec::with_capacity(rows.len());
        let mut flat = Vec::with_capacity(rows.len() * width);
        for (ts, row) in rows {
            timestamps.push(ts);
            flat.extend(row);
        }

        let values = Array2::from_shape_vec((timestamps.len(), width), flat)
            .map_err(|e| ForecastError::Parse(format!("Cannot shape observation table: {}", e)))?;

        Ok(Self { columns, timestamps, values })
    }

    /// Concatenates several series sharing the same columns into one
    /// chronologically ordered series.
    ///
    /// # Errors
    /// `ForecastError::Parse` when the parts disagree on their columns.
    pub fn merge(parts: Vec<ObservationSeries>) -> Result<Self, ForecastError> {
        let Some(columns) = parts.first().map(|p| p.columns.clone()) else {
            return Self::from_rows(Vec::new(), Vec::new());
        };

        let mut rows: Vec<(NaiveDateTime, Vec<f64>)> = Vec::new();
        for part in &parts {
            if part.columns != columns {
                return Err(ForecastError::Parse(format!(
                    "Cannot merge series with columns {:?} into {:?}",
                    part.columns, columns
                )));
            }
            rows.extend(
                part.timestamps
                    .iter()
                    .copied()
                    .zip(part.values.outer_iter().map(|row| row.to_vec())),
            );
        }

        Self::from_rows(columns, rows)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn columns(&self) -> &[Variable] {
        &self.columns
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// The `(timestamps, columns)` value matrix.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn column_index(&self, variable: Variable) -> Option<usize> {
        self.columns.iter().position(|c| *c == variable)
    }

    pub fn column(&self, variable: Variable) -> Option<ArrayView1<'_, f64>> {
        let idx = self.column_index(variable)?;
        Some(self.values.index_axis(Axis(1), idx))
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure taxonomy for the forecast pipeline.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Upstream responded with a non-success status.
    #[error("Data source error {status}: {body}")]
    DataSource { status: u16, body: String },

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("Data source request failed: {0}")]
    Transport(String),

    /// Upstream payload did not have the expected shape.
    #[error("Failed to parse data source response: {0}")]
    Parse(String),

    /// Every per-year download failed.
    #[error("No historical data could be downloaded ({years} years attempted)")]
    InsufficientHistory { years: u32 },

    /// Not enough (or unusable) data to train a model for one target.
    #[error("Modeling failed: {0}")]
    Modeling(String),

    /// Bad input at the boundary.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for ForecastError {
    fn from(e: reqwest::Error) -> Self {
        ForecastError::Transport(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
