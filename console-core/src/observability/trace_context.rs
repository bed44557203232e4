//! Outgoing trace propagation for console HTTP calls.
//!
//! Requests built through [`TracedClientExt`] carry the W3C `traceparent` and
//! `tracestate` of the span they are sent from, plus an optional
//! `x-request-id` for log correlation on the backend.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::{SpanContext, TraceContextExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn traceparent(span_context: &SpanContext) -> String {
    format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    )
}

/// Headers propagating the current span, if it is a valid OpenTelemetry span,
/// and `request_id` when it is a legal header value.
pub fn trace_headers(request_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    if span_context.is_valid() {
        if let Ok(value) = HeaderValue::from_str(&traceparent(span_context)) {
            headers.insert(TRACEPARENT_HEADER, value);
        }
        let state = span_context.trace_state().header();
        if !state.is_empty()
            && let Ok(value) = HeaderValue::from_str(&state)
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    headers
}

/// A request whose trace headers are resolved at send time, inside the
/// caller's span.
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

    pub fn header(mut self, key: HeaderName, value: HeaderValue) -> Self {
        self.request = self.request.header(key, value);
        self
    }

    /// Attach an already-serialized body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.request = self.request.body(body);
        self
    }

    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let headers = trace_headers(self.request_id.as_deref());
        self.request.headers(headers).send().await
    }
}

pub trait TracedClientExt {
    fn traced_request(&self, method: Method, url: Url) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_request(&self, method: Method, url: Url) -> TracedRequest {
        TracedRequest::new(self.request(method, url))
    }
}
