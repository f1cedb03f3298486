use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use errata_core::Collector;

pub mod global;

/// Path scrapers fetch the snapshot from unless configured otherwise.
pub const DEFAULT_PATH: &str = "/-/exceptions";

// ── Config ──

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
    pub path: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7777,
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl ServeConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.path.starts_with('/') {
            anyhow::bail!("scrape path must start with '/', got {:?}", self.path);
        }
        if self.path == "/-/health" {
            anyhow::bail!("scrape path {:?} is reserved", self.path);
        }
        Ok(())
    }
}

// ── App State ──

struct AppState {
    collector: Arc<Collector>,
}

// ── Error Handling ──

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "scrape request failed");
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ── Entrypoint ──

/// Serve `collector`'s snapshot until the listener fails.
pub async fn serve(collector: Arc<Collector>, config: ServeConfig) -> anyhow::Result<()> {
    config.validate()?;
    let app = router(collector, &config.path);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "errata scrape endpoint listening on http://{addr}{}",
        config.path
    );
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router (for testing without binding to a port).
///
/// `path` must start with `/`; see [`ServeConfig::validate`].
pub fn router(collector: Arc<Collector>, path: &str) -> Router {
    let state = Arc::new(AppState { collector });
    Router::new()
        .route("/-/health", get(health))
        .route(path, get(get_exceptions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

// ── GET <scrape path> ──

async fn get_exceptions(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let payload = state.collector.snapshot();
    let body = payload.to_json()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use errata_core::Severity;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let app = router(Arc::new(Collector::new()), DEFAULT_PATH);
        let (status, json) = get_json(app, "/-/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn empty_collector_exports_no_groups() {
        let collector = Arc::new(Collector::new());
        let app = router(collector.clone(), DEFAULT_PATH);
        let (status, json) = get_json(app, DEFAULT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["AggregatedErrors"].as_array().unwrap().len(), 0);
        assert_eq!(json["TargetUuid"], collector.target_uuid().to_string());
    }

    #[tokio::test]
    async fn exports_reported_errors() {
        let collector = Arc::new(Collector::new());
        let err = std::io::Error::other("disk full");
        collector.report(&err);
        collector.report_with_severity(&err, Severity::Warning);

        let app = router(collector, DEFAULT_PATH);
        let (status, json) = get_json(app, DEFAULT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        let groups = json["AggregatedErrors"].as_array().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0]["AggregationKey"], "std::io::error::Error@disk full");
        assert_eq!(groups[0]["TotalCount"], 2);
        let latest = groups[0]["LatestErrors"].as_array().unwrap();
        assert_eq!(latest[0]["Severity"], "error");
        assert_eq!(latest[1]["Severity"], "warning");
        assert_eq!(latest[1]["Error"]["Message"], "disk full");
    }

    #[tokio::test]
    async fn custom_path_is_routed() {
        let app = router(Arc::new(Collector::new()), "/errors");
        let (status, json) = get_json(app, "/errors").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["AggregatedErrors"].is_array());
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = ServeConfig::default();
        assert_eq!(config.path, DEFAULT_PATH);
        assert!(config.validate().is_ok());

        let relative = ServeConfig {
            path: "exceptions".to_string(),
            ..ServeConfig::default()
        };
        assert!(relative.validate().is_err());

        let reserved = ServeConfig {
            path: "/-/health".to_string(),
            ..ServeConfig::default()
        };
        assert!(reserved.validate().is_err());
    }

    #[test]
    fn config_from_json() {
        let config: ServeConfig = serde_json::from_str(r#"{"port": 9090}"#).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind, "127.0.0.1");
    }
}
