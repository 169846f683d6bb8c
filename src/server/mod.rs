// Server module - Pingora HTTP service
//
// Every request is answered in request_filter; there is no upstream to
// proxy to, so upstream_peer always fails.

pub mod handler;

pub use handler::{classify_route, EndpointResponse, IncomingRequest, RequestHandler, Route};

use async_trait::async_trait;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::logging::create_request_span;

/// Per-request state
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    started_at: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            started_at: Instant::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Image service exposed through pingora's HTTP proxy framework
pub struct ShashinService {
    handler: Arc<RequestHandler>,
}

impl ShashinService {
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self { handler }
    }
}

/// Copy the fields the handler needs out of the request header
pub fn incoming_request(req: &RequestHeader) -> IncomingRequest {
    let header = |name: &str| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };

    IncomingRequest {
        method: req.method.as_str().to_string(),
        path: req.uri.path().to_string(),
        uri: req.uri.to_string(),
        accept: header("accept"),
        referer: header("referer"),
    }
}

#[async_trait]
impl ProxyHttp for ShashinService {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "shashin serves every request locally",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let request = incoming_request(session.req_header());
        let span = create_request_span(&request.method, &request.path, ctx.request_id());

        let response = self.handler.handle(&request).instrument(span).await;

        let mut header = ResponseHeader::build(response.status, None)?;
        header.insert_header("Content-Type", response.content_type.as_str())?;
        header.insert_header("Content-Length", response.body.len().to_string())?;
        header.insert_header("X-Request-Id", ctx.request_id())?;
        for (name, value) in &response.headers {
            header.insert_header(*name, value.as_str())?;
        }

        session
            .write_response_header(Box::new(header), false)
            .await?;
        session
            .write_response_body(Some(response.body), true)
            .await?;

        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status_code = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %session.req_header().method,
            uri = %session.req_header().uri,
            status = status_code,
            duration_ms = ctx.started_at.elapsed().as_millis() as u64,
            error = ?e.map(|err| err.to_string()),
            "Request completed"
        );
    }
}
