/// HTTP endpoint for weather forecasts
///
/// Thin routing layer over the orchestrator. Every request runs a full,
/// independent collect-and-train cycle; requests are handed to a worker pool
/// so a slow forecast does not block health checks.
///
/// Endpoints:
/// - GET /healthz - Liveness check
/// - POST /prever - Forecast for `{data, lat?, lon?}`

use crate::config::ForecastConfig;
use crate::ingest::ObservationSource;
use crate::model::{ForecastError, Variable};
use crate::orchestrator::{self, ForecastReport};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use threadpool::ThreadPool;
use tiny_http::{Header, Method, Request, Response, StatusCode};

const MSG_JSON_REQUIRED: &str = "É necessário enviar um JSON.";
const MSG_DATE_REQUIRED: &str = "Parametro \"data\" é obrigatório. Use formato YYYY-MM-DD.";

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /prever`.
#[derive(Debug, Deserialize)]
pub struct PrevisaoRequest {
    pub data: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Successful `POST /prever` body. Failed targets serialize as `null`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PrevisaoResponse {
    pub data: String,
    pub lat: f64,
    pub lon: f64,
    pub temperatura: Option<f64>,
    pub precipitacao: Option<f64>,
    pub umidade: Option<f64>,
    pub vento: Option<f64>,
}

impl PrevisaoResponse {
    fn from_report(data: String, report: &ForecastReport) -> Self {
        Self {
            data,
            lat: report.coordinate.latitude,
            lon: report.coordinate.longitude,
            temperatura: report.value(Variable::Temperature),
            precipitacao: report.value(Variable::Precipitation),
            umidade: report.value(Variable::Humidity),
            vento: report.value(Variable::WindSpeed),
        }
    }
}

/// Routed response, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn json(status: u16, body: Value) -> Self {
        Self { status, body: ResponseBody::Json(body) }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "erro": message.into() }))
    }

    /// JSON body, if any (convenience for callers and tests).
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Shared, read-only state behind the endpoint.
#[derive(Clone)]
pub struct ForecastService {
    config: Arc<ForecastConfig>,
    source: Arc<dyn ObservationSource>,
}

impl ForecastService {
    pub fn new(config: ForecastConfig, source: Arc<dyn ObservationSource>) -> Self {
        Self {
            config: Arc::new(config),
            source,
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Routes one request. `url` may carry a query string.
    pub fn handle(&self, method: &Method, url: &str, body: &str) -> ApiResponse {
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (Method::Options, _) => ApiResponse { status: 204, body: ResponseBody::Empty },
            (Method::Get, "/healthz") => ApiResponse {
                status: 200,
                body: ResponseBody::Text("ok".to_string()),
            },
            (Method::Post, "/prever") => self.handle_prever(body),
            (_, "/prever") | (_, "/healthz") => ApiResponse::error(405, "Método não permitido"),
            _ => ApiResponse::json(
                404,
                json!({
                    "erro": "Not found",
                    "available_endpoints": ["GET /healthz", "POST /prever"]
                }),
            ),
        }
    }

    /// Handle POST /prever
    fn handle_prever(&self, body: &str) -> ApiResponse {
        let value: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => return ApiResponse::error(400, MSG_JSON_REQUIRED),
        };

        match value.as_object() {
            Some(obj) if !obj.is_empty() => {}
            _ => return ApiResponse::error(400, MSG_JSON_REQUIRED),
        }

        let request: PrevisaoRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => return ApiResponse::error(400, format!("JSON inválido: {}", e)),
        };

        let data = match request.data {
            Some(d) if !d.trim().is_empty() => d,
            _ => return ApiResponse::error(400, MSG_DATE_REQUIRED),
        };

        let default = self.config.default_coordinate();
        let coordinate = crate::model::Coordinate::new(
            request.lat.unwrap_or(default.latitude),
            request.lon.unwrap_or(default.longitude),
        );

        match orchestrator::forecast_date(
            &data,
            coordinate,
            &Variable::FORECAST_TARGETS,
            &self.config,
            &self.source,
        ) {
            Ok(report) => {
                let response = PrevisaoResponse::from_report(data, &report);
                match serde_json::to_value(&response) {
                    Ok(v) => ApiResponse::json(200, v),
                    Err(e) => ApiResponse::error(500, e.to_string()),
                }
            }
            Err(e @ ForecastError::Validation(_)) => ApiResponse::error(400, e.to_string()),
            Err(e) => {
                log::error!("prever data={} error=\"{}\"", data, e);
                ApiResponse::error(500, e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Start HTTP endpoint server on `host:port`. Blocks for the server's lifetime.
pub fn start_endpoint_server(host: &str, port: u16, service: ForecastService) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("{}:{}", host, port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    log::info!("endpoint listening on http://{}:{}", host, port);
    log::info!("  GET /healthz - Liveness check");
    log::info!("  POST /prever - Forecast for a date and coordinate");

    serve(server, service);
    Ok(())
}

/// Dispatches requests from an already bound server onto the worker pool.
pub fn serve(server: tiny_http::Server, service: ForecastService) {
    let pool = ThreadPool::new(service.config().server.workers.max(1));

    for request in server.incoming_requests() {
        let service = service.clone();
        pool.execute(move || handle_request(request, &service));
    }

    pool.join();
}

fn handle_request(mut request: Request, service: &ForecastService) {
    let method = request.method().clone();
    let url = request.url().to_string();

    let mut body = String::new();
    let response = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => service.handle(&method, &url, &body),
        Err(e) => ApiResponse::error(400, format!("Corpo da requisição ilegível: {}", e)),
    };

    log::info!("{} {} -> {}", method, url, response.status);

    if let Err(e) = request.respond(to_http_response(&response)) {
        log::warn!("failed to send response path={} error=\"{}\"", url, e);
    }
}

/// Create HTTP response with CORS headers
fn to_http_response(response: &ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let (bytes, content_type) = match &response.body {
        ResponseBody::Json(v) => (v.to_string().into_bytes(), "application/json"),
        ResponseBody::Text(t) => (t.clone().into_bytes(), "text/plain; charset=utf-8"),
        ResponseBody::Empty => (Vec::new(), "text/plain; charset=utf-8"),
    };

    let headers = [
        ("Content-Type", content_type),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ];

    headers
        .iter()
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .fold(
            Response::from_data(bytes).with_status_code(StatusCode::from(response.status)),
            |resp, header| resp.with_header(header),
        )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
