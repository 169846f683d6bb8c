//! Request boundary
//!
//! Turns one HTTP request into a complete response: routes the special
//! endpoints, runs decode → resolve → fetch → transform for everything else,
//! and maps [`ResizeError`] kinds to a status code and a log line. The
//! pingora layer only copies the result onto the wire.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::directive::DirectiveSet;
use crate::engine::RasterEngine;
use crate::error::ResizeError;
use crate::fetch::AssetFetcher;
use crate::metrics::Metrics;
use crate::plan::PlanResolver;
use crate::transform::TransformOrchestrator;

/// Request fields the handler needs
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    /// Path without the query string
    pub path: String,
    /// Full request URI, for logs
    pub uri: String,
    pub accept: Option<String>,
    pub referer: Option<String>,
}

impl IncomingRequest {
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.to_string(),
            uri: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    pub fn with_referer(mut self, referer: &str) -> Self {
        self.referer = Some(referer.to_string());
        self
    }
}

/// Fully built response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: String,
    /// Extra headers beyond Content-Type and Content-Length
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl EndpointResponse {
    fn new(status: u16, content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn text(status: u16, body: &'static str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", Bytes::from_static(body.as_bytes()))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Endpoint type for a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Metrics,
    Transform,
}

pub fn classify_route(path: &str) -> Route {
    match path {
        "/health" => Route::Health,
        "/metrics" => Route::Metrics,
        _ => Route::Transform,
    }
}

/// Shared, immutable request handler
pub struct RequestHandler {
    resolver: PlanResolver,
    orchestrator: TransformOrchestrator,
    metrics: Arc<Metrics>,
}

impl RequestHandler {
    pub fn new(
        resolver: PlanResolver,
        orchestrator: TransformOrchestrator,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            resolver,
            orchestrator,
            metrics,
        }
    }

    /// Wire up resolver, fetcher and orchestrator from configuration
    pub async fn from_config(config: &Config, metrics: Arc<Metrics>) -> Result<Self, String> {
        let presets = config.preset_store()?;
        let resolver = PlanResolver::new(presets, config.image.plan_settings());
        let fetcher =
            AssetFetcher::from_config(&config.storage, &config.cache, Arc::clone(&metrics)).await;
        let orchestrator = TransformOrchestrator::new(
            Arc::new(RasterEngine::new()),
            fetcher,
            Arc::clone(&metrics),
            config.image.auto_webp,
        );
        Ok(Self::new(resolver, orchestrator, metrics))
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub async fn handle(&self, request: &IncomingRequest) -> EndpointResponse {
        let started = Instant::now();
        self.metrics.increment_request_count();

        let response = if !request.method.eq_ignore_ascii_case("GET") {
            let mut response = EndpointResponse::text(405, "Method Not Allowed");
            response.headers.push(("Allow", "GET".to_string()));
            response
        } else {
            match classify_route(&request.path) {
                Route::Health => self.health(),
                Route::Metrics => EndpointResponse::new(
                    200,
                    "text/plain; version=0.0.4",
                    self.metrics.export_prometheus(),
                ),
                Route::Transform => self.transform(request).await,
            }
        };

        self.metrics.increment_status_count(response.status);
        self.metrics
            .record_request_duration(started.elapsed().as_secs_f64() * 1000.0);
        response
    }

    fn health(&self) -> EndpointResponse {
        let body = serde_json::json!({
            "status": "healthy",
            "uptime_seconds": self.metrics.uptime_seconds(),
            "version": env!("CARGO_PKG_VERSION"),
            "storage": self.orchestrator.fetcher().backend_name(),
        })
        .to_string();
        EndpointResponse::new(200, "application/json", body)
    }

    async fn transform(&self, request: &IncomingRequest) -> EndpointResponse {
        match self.run_transform(request).await {
            Ok(response) => response,
            Err(err) => self.error_response(request, &err),
        }
    }

    async fn run_transform(
        &self,
        request: &IncomingRequest,
    ) -> Result<EndpointResponse, ResizeError> {
        let directives = DirectiveSet::decode(&request.path)?;
        let plan = self.resolver.resolve(&directives)?;
        let output = self
            .orchestrator
            .execute(&plan, request.accept.as_deref())
            .await?;

        self.metrics.increment_format_count(output.content_type);
        tracing::debug!(
            uri = %request.uri,
            content_type = output.content_type,
            bytes = output.data.len(),
            "Image served"
        );

        let mut response = EndpointResponse::new(200, output.content_type, output.data);
        if let Some(vary) = output.vary {
            response.headers.push(("Vary", vary.to_string()));
        }
        Ok(response)
    }

    fn error_response(&self, request: &IncomingRequest, err: &ResizeError) -> EndpointResponse {
        self.metrics.increment_error_count(err.kind());
        let referer = request.referer.as_deref().unwrap_or("-");

        match err.to_http_status() {
            404 => {
                tracing::info!(
                    uri = %request.uri,
                    referer = %referer,
                    error = %err,
                    "Asset not found"
                );
                EndpointResponse::text(404, "Not Found")
            }
            _ => {
                tracing::error!(
                    uri = %request.uri,
                    referer = %referer,
                    kind = err.kind(),
                    error = %err,
                    "Request failed"
                );
                EndpointResponse::text(500, "Internal Server Error")
            }
        }
    }
}
