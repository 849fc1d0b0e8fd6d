//! W3C Trace Context propagation for outbound REST calls.
//!
//! Every request the clinic client sends to the backend goes through
//! [`TracedRequest`], so the backend's access logs can be joined with the
//! client-side spans (page fetches, logins, form submissions).
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Correlates several requests that belong to one logical operation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `traceparent` / `tracestate` of the current span.
///
/// Empty when there is no valid span context, e.g. when the OTLP layer is
/// not installed.
pub fn trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    if !span_context.is_valid() {
        return headers;
    }

    // version-trace_id-span_id-trace_flags
    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = HeaderValue::from_str(&traceparent) {
        headers.insert(TRACEPARENT_HEADER, value);
    }

    let trace_state = span_context.trace_state().header();
    if !trace_state.is_empty()
        && let Ok(value) = HeaderValue::from_str(&trace_state)
    {
        headers.insert(TRACESTATE_HEADER, value);
    }

    headers
}

/// A reqwest request that picks up the trace context when sent.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
    request_id: Option<String>,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder) -> Self {
        Self {
            request,
            request_id: None,
        }
    }

    pub fn json<T: serde::Serialize + ?Sized>(mut self, json: &T) -> Self {
        self.request = self.request.json(json);
        self
    }

    /// Bearer auth when a token is present, none otherwise.
    pub fn maybe_bearer_auth<T: std::fmt::Display>(mut self, token: Option<T>) -> Self {
        if let Some(token) = token {
            self.request = self.request.bearer_auth(token);
        }
        self
    }

    pub fn request_id(mut self, request_id: Option<&str>) -> Self {
        self.request_id = request_id.map(str::to_string);
        self
    }

    /// Headers added on send: trace context plus the request ID, if set.
    pub fn propagation_headers(&self) -> HeaderMap {
        let mut headers = trace_headers();

        if let Some(value) = self
            .request_id
            .as_deref()
            .and_then(|id| HeaderValue::from_str(id).ok())
        {
            headers.insert(REQUEST_ID_HEADER, value);
        }

        headers
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let headers = self.propagation_headers();
        self.request.headers(headers).send().await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced_get(&self, url: &str) -> TracedRequest;
    fn traced_post(&self, url: &str) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_get(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.get(url))
    }

    fn traced_post(&self, url: &str) -> TracedRequest {
        TracedRequest::new(self.post(url))
    }
}
