/// Forecast orchestration: one shared history, one model per target.
///
/// Collects the multi-year history once, then runs the windowed forecaster
/// for each requested variable. A target that cannot be modeled is recorded
/// as `TargetResult::Absent` and the remaining targets still run; only a
/// failure to collect any history fails the whole call.

use crate::config::ForecastConfig;
use crate::forecast::{self, ForecastOutcome};
use crate::history;
use crate::ingest::ObservationSource;
use crate::model::{Coordinate, ForecastError, Variable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome for one target, explicitly tagged present or absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetResult {
    Present(ForecastOutcome),
    Absent { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetForecast {
    pub variable: Variable,
    pub result: TargetResult,
}

impl TargetForecast {
    pub fn label(&self) -> &'static str {
        self.variable.label()
    }

    pub fn value(&self) -> Option<f64> {
        match &self.result {
            TargetResult::Present(outcome) => Some(outcome.value),
            TargetResult::Absent { .. } => None,
        }
    }
}

/// Everything produced for one forecast request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub date: NaiveDate,
    pub coordinate: Coordinate,
    pub history_rows: usize,
    pub targets: Vec<TargetForecast>,
}

impl ForecastReport {
    /// Friendly label → predicted value (`None` for failed targets).
    pub fn by_label(&self) -> BTreeMap<&'static str, Option<f64>> {
        self.targets.iter().map(|t| (t.label(), t.value())).collect()
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        self.targets
            .iter()
            .find(|t| t.variable == variable)
            .and_then(|t| t.value())
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Parses a `YYYY-MM-DD` target date.
pub fn parse_target_date(date: &str) -> Result<NaiveDate, ForecastError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        ForecastError::Validation(format!(
            "Data inválida '{}'. Use formato YYYY-MM-DD.",
            date
        ))
    })
}

/// Forecasts every variable in `targets` for `date` at `coordinate`.
///
/// # Errors
/// - `ForecastError::Validation` - `date` is not `YYYY-MM-DD`.
/// - `ForecastError::InsufficientHistory` - no prior year could be fetched.
///
/// Per-target modeling failures never surface here; they become
/// `TargetResult::Absent`.
pub fn forecast_date(
    date: &str,
    coordinate: Coordinate,
    targets: &[Variable],
    config: &ForecastConfig,
    source: &Arc<dyn ObservationSource>,
) -> Result<ForecastReport, ForecastError> {
    let date = parse_target_date(date)?;
    log::info!(
        "forecast date={} lat={} lon={} targets={}",
        date,
        coordinate.latitude,
        coordinate.longitude,
        targets.len()
    );

    let history = history::collect_history(date, coordinate, config, source)?;

    let targets = targets
        .iter()
        .map(|&variable| {
            let result = match forecast::forecast_target(&history, variable, config) {
                Ok(outcome) => {
                    log::info!(
                        "forecast target={} value={:.2} rmse={:.2} mae={:.2} train={} test={}",
                        variable,
                        outcome.value,
                        outcome.rmse,
                        outcome.mae,
                        outcome.train_samples,
                        outcome.test_samples
                    );
                    TargetResult::Present(outcome)
                }
                Err(e) => {
                    log::warn!("forecast target={} error=\"{}\"", variable, e);
                    TargetResult::Absent { reason: e.to_string() }
                }
            };
            TargetForecast { variable, result }
        })
        .collect();

    Ok(ForecastReport {
        date,
        coordinate,
        history_rows: history.len(),
        targets,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
