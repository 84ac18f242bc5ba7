/// prever_service: near-future weather forecasts from multi-year hourly history.
///
/// # Module structure
///
/// ```text
/// prever_service
/// ├── model        - shared data types (Variable, Coordinate, ObservationSeries, ForecastError)
/// ├── config       - forecast configuration loader (forecast.toml + env bind address)
/// ├── ingest
/// │   ├── power    - NASA POWER hourly point API: URL construction + JSON parsing
/// │   └── fixtures (test only) - representative API response payloads
/// ├── history      - parallel multi-year collection and merge
/// ├── forecast
/// │   ├── scaler   - per-column standardization
/// │   ├── windows  - sliding-window samples and chronological split
/// │   ├── forest   - seeded bagged regression trees
/// │   └── metrics  - RMSE / MAE
/// ├── orchestrator - one shared history, one model per target variable
/// └── endpoint     - HTTP API (GET /healthz, POST /prever)
/// ```

/// Public modules
pub mod config;
pub mod endpoint;
pub mod forecast;
pub mod history;
pub mod ingest;
pub mod model;
pub mod orchestrator;
