/// Windowed forecaster: one model per target variable.
///
/// For a merged history and a target:
/// 1. Standardize every column on this history.
/// 2. Build sliding-window samples (`window` rows of all columns → next
///    target value).
/// 3. Split chronologically, 80% train / 20% test, no shuffling.
/// 4. Fit the bagged tree ensemble on the training part.
/// 5. Score the held-out part in physical units (RMSE, MAE) using a scaler
///    fitted on the target column alone.
/// 6. Predict from the last `window` rows and map back to physical units.
///
/// Nothing is cached: scalers and model live for one call.

pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod windows;

use crate::config::ForecastConfig;
use crate::model::{ForecastError, ObservationSeries, Variable};
use forest::{ForestParams, RandomForest};
use ndarray::s;
use scaler::StandardScaler;
use serde::Serialize;
use std::sync::Arc;
use windows::{build_windows, flatten_window, split_index};

/// Share of samples used for training.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Point forecast plus held-out error, all in the target's physical units.
///
/// `test_samples == 0` only happens at the minimum history size
/// (`window + 1` rows); the metrics are then measured on the training sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastOutcome {
    pub value: f64,
    pub rmse: f64,
    pub mae: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Trains a model for `target` on `history` and predicts the hour after it.
///
/// # Errors
/// `ForecastError::Modeling` when:
/// - `target` is not a column of `history`
/// - `history` has fewer than `window + 1` rows
/// - `history` contains non-finite values
pub fn train_and_predict(
    history: &ObservationSeries,
    target: Variable,
    window: usize,
    params: &ForestParams,
) -> Result<ForecastOutcome, ForecastError> {
    let target_col = history
        .column_index(target)
        .ok_or_else(|| ForecastError::Modeling(format!("Target {} is not in the history", target)))?;

    if window == 0 || history.len() < window + 1 {
        return Err(ForecastError::Modeling(format!(
            "Need at least {} hourly rows to build a {}-hour window, got {}",
            window + 1,
            window,
            history.len()
        )));
    }

    if history.values().iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::Modeling("History contains non-finite values".to_string()));
    }

    let scaler = StandardScaler::fit(history.values())
        .ok_or_else(|| ForecastError::Modeling("Empty history".to_string()))?;
    let scaled = scaler.transform(history.values());

    let samples = build_windows(scaled.view(), target_col, window);
    let (train, test) = samples.split_at(split_index(samples.len(), TRAIN_FRACTION));
    let train = Arc::new(train);

    let model = RandomForest::fit(Arc::clone(&train), params)?;

    let target_scaler = StandardScaler::fit_column(history.values().column(target_col))
        .ok_or_else(|| ForecastError::Modeling("Empty target column".to_string()))?;

    let eval = if test.is_empty() { train.as_ref() } else { &test };
    let predicted = model
        .predict_all(eval.features())
        .mapv(|p| target_scaler.inverse(0, p));
    let actual = eval.labels().mapv(|y| target_scaler.inverse(0, y));

    let rmse = metrics::rmse(actual.view(), predicted.view())
        .ok_or_else(|| ForecastError::Modeling("No samples to evaluate".to_string()))?;
    let mae = metrics::mae(actual.view(), predicted.view())
        .ok_or_else(|| ForecastError::Modeling("No samples to evaluate".to_string()))?;

    let last_window = flatten_window(scaled.slice(s![scaled.nrows() - window.., ..]));
    let value = target_scaler.inverse(0, model.predict(last_window.view()));

    Ok(ForecastOutcome {
        value,
        rmse,
        mae,
        train_samples: train.len(),
        test_samples: test.len(),
    })
}

/// `train_and_predict` with window and ensemble settings taken from `config`.
pub fn forecast_target(
    history: &ObservationSeries,
    target: Variable,
    config: &ForecastConfig,
) -> Result<ForecastOutcome, ForecastError> {
    train_and_predict(history, target, config.window_hours, &ForestParams::from(config))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
