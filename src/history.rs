/// Multi-year history collection.
///
/// For a target date, downloads the same calendar window from each of the
/// previous N years in parallel and merges the successful downloads into one
/// chronologically ordered series.
///
/// ## Concurrency
///
/// - One `threadpool` per call, sized by `ForecastConfig::fetch_workers`.
/// - Each job performs one blocking fetch and sends `(window, result)` over
///   an mpsc channel; the caller blocks until every job has reported.
/// - Completion order is irrelevant: the merge sorts by timestamp.
/// - A failed year is logged and skipped. Only zero successful years fails
///   the call.

use crate::config::ForecastConfig;
use crate::ingest::ObservationSource;
use crate::model::{Coordinate, ForecastError, ObservationSeries};
use chrono::{Datelike, Duration, NaiveDate};
use std::sync::{Arc, mpsc};
use threadpool::ThreadPool;

// ---------------------------------------------------------------------------
// Year windows
// ---------------------------------------------------------------------------

/// The calendar window requested for one prior year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub year: i32,
    pub center: NaiveDate,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Moves `date` to `year`, keeping day and month.
///
/// Feb 29 clamps to Feb 28 when `year` is not a leap year.
pub fn same_day_in_year(date: NaiveDate, year: i32) -> Option<NaiveDate> {
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
}

/// Builds the windows for the `years` years preceding `target`, most recent
/// first. Each window spans `center ± window_days`, inclusive.
pub fn year_windows(target: NaiveDate, years: u32, window_days: u32) -> Vec<YearWindow> {
    let half = Duration::days(window_days as i64);

    (1..=years as i32)
        .filter_map(|offset| {
            let year = target.year() - offset;
            let center = same_day_in_year(target, year)?;
            Some(YearWindow {
                year,
                center,
                start: center - half,
                end: center + half,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Downloads and merges the historical window for `target` at `coordinate`.
///
/// # Errors
/// - `ForecastError::InsufficientHistory` - no year could be downloaded.
/// - `ForecastError::Parse` - downloads disagree on their columns.
pub fn collect_history(
    target: NaiveDate,
    coordinate: Coordinate,
    config: &ForecastConfig,
    source: &Arc<dyn ObservationSource>,
) -> Result<ObservationSeries, ForecastError> {
    let windows = year_windows(target, config.years, config.window_days);
    let pool = ThreadPool::new(config.fetch_workers());
    let (tx, rx) = mpsc::channel();

    for window in &windows {
        let tx = tx.clone();
        let source = Arc::clone(source);
        let window = *window;

        pool.execute(move || {
            let result = source.fetch(window.start, window.end, coordinate);
            // Receiver outlives every job; a send error cannot happen
            let _ = tx.send((window, result));
        });
    }
    // Channel closes once the last job drops its sender
    drop(tx);

    let mut parts = Vec::with_capacity(windows.len());
    let mut reported = 0usize;

    for (window, result) in rx.iter() {
        reported += 1;
        match result {
            Ok(series) => {
                log::debug!(
                    "history year={} start={} end={} rows={}",
                    window.year,
                    window.start,
                    window.end,
                    series.len()
                );
                parts.push(series);
            }
            Err(e) => {
                log::warn!(
                    "history fetch failed year={} start={} end={} error=\"{}\"",
                    window.year,
                    window.start,
                    window.end,
                    e
                );
            }
        }
    }

    if reported < windows.len() {
        log::warn!(
            "history {} of {} fetch jobs ended without reporting",
            windows.len() - reported,
            windows.len()
        );
    }

    if parts.is_empty() {
        return Err(ForecastError::InsufficientHistory { years: config.years });
    }

    let succeeded = parts.len();
    let merged = ObservationSeries::merge(parts)?;
    log::info!(
        "history target={} years_ok={}/{} rows={}",
        target,
        succeeded,
        windows.len(),
        merged.len()
    );

    Ok(merged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::fixture_synthetic_series;
    use crate::model::Variable;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serves synthetic data, failing for the listed years.
    struct StubSource {
        failing_years: HashSet<i32>,
        calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    impl StubSource {
        fn new(failing_years: &[i32]) -> Arc<Self> {
            Arc::new(Self {
                failing_years: failing_years.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl ObservationSource for StubSource {
        fn fetch(
            &self,
            start: NaiveDate,
            end: NaiveDate,
            _coordinate: Coordinate,
        ) -> Result<ObservationSeries, ForecastError> {
            self.calls.lock().unwrap().push((start, end));
            let year = (start + Duration::days((end - start).num_days() / 2)).year();
            if self.failing_years.contains(&year) {
                return Err(ForecastError::DataSource {
                    status: 500,
                    body: "upstream exploded".to_string(),
                });
            }
            Ok(fixture_synthetic_series(start, end, &Variable::ALL))
        }
    }

    fn collect(source: Arc<StubSource>, config: &ForecastConfig) -> Result<ObservationSeries, ForecastError> {
        let source: Arc<dyn ObservationSource> = source;
        collect_history(date(2025, 10, 4), Coordinate::new(-23.0, -47.0), config, &source)
    }

    // --- Windows ------------------------------------------------------------

    #[test]
    fn test_year_windows_cover_prior_years_same_calendar_day() {
        let windows = year_windows(date(2025, 10, 4), 5, 7);
        let years: Vec<i32> = windows.iter().map(|w| w.year).collect();
        assert_eq!(years, vec![2024, 2023, 2022, 2021, 2020]);

        let first = windows[0];
        assert_eq!(first.center, date(2024, 10, 4));
        assert_eq!(first.start, date(2024, 9, 27));
        assert_eq!(first.end, date(2024, 10, 11));
    }

    #[test]
    fn test_leap_day_clamps_to_feb_28() {
        assert_eq!(same_day_in_year(date(2024, 2, 29), 2023), Some(date(2023, 2, 28)));
        assert_eq!(same_day_in_year(date(2024, 2, 29), 2020), Some(date(2020, 2, 29)));

        let windows = year_windows(date(2024, 2, 29), 4, 1);
        let centers: Vec<NaiveDate> = windows.iter().map(|w| w.center).collect();
        assert_eq!(
            centers,
            vec![date(2023, 2, 28), date(2022, 2, 28), date(2021, 2, 28), date(2020, 2, 29)]
        );
    }

    // --- Collection ---------------------------------------------------------

    #[test]
    fn test_all_years_succeed_spans_full_window_per_year() {
        let source = StubSource::new(&[]);
        let config = ForecastConfig::default();
        let history = collect(Arc::clone(&source), &config).unwrap();

        // 5 years × 15 days × 24 hours
        assert_eq!(history.len(), 5 * 15 * 24);
        assert!(history.timestamps().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(source.calls.lock().unwrap().len(), 5);

        for year in 2020..=2024 {
            let days: HashSet<NaiveDate> = history
                .timestamps()
                .iter()
                .filter(|t| t.year() == year)
                .map(|t| t.date())
                .collect();
            assert!(days.len() >= 2 * 7 + 1, "year {} should span 15 days", year);
        }
    }

    #[test]
    fn test_two_failing_years_are_dropped_without_failing() {
        let source = StubSource::new(&[2021, 2023]);
        let config = ForecastConfig::default();
        let history = collect(source, &config).unwrap();

        let years: HashSet<i32> = history.timestamps().iter().map(|t| t.year()).collect();
        assert_eq!(years, [2020, 2022, 2024].into_iter().collect());
        assert_eq!(history.len(), 3 * 15 * 24);
    }

    #[test]
    fn test_all_years_failing_is_insufficient_history() {
        let source = StubSource::new(&[2020, 2021, 2022, 2023, 2024]);
        let config = ForecastConfig::default();
        let result = collect(source, &config);
        assert!(
            matches!(result, Err(ForecastError::InsufficientHistory { years: 5 })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_single_worker_gives_same_result_as_parallel() {
        let parallel = collect(StubSource::new(&[2022]), &ForecastConfig::default()).unwrap();
        let serial_config = ForecastConfig { fetch_workers: Some(1), ..ForecastConfig::default() };
        let serial = collect(StubSource::new(&[2022]), &serial_config).unwrap();
        assert_eq!(parallel, serial);
    }
}
