//! W3C Trace Context propagation for outbound HTTP calls.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt as _;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Format the current span's context as a `traceparent` value
/// (`version-trace_id-span_id-flags`), or `None` outside a sampled span.
pub fn traceparent() -> Option<String> {
    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return None;
    }

    Some(format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    ))
}

fn tracestate() -> Option<String> {
    let context = Span::current().context();
    let state = context.span().span_context().trace_state().header();
    (!state.is_empty()).then_some(state)
}

/// Attach the current trace context to an outgoing reqwest request.
pub trait TraceContextExt {
    fn with_trace_context(self) -> Self;
}

impl TraceContextExt for reqwest::RequestBuilder {
    fn with_trace_context(self) -> Self {
        let Some(parent) = traceparent() else {
            return self;
        };

        let builder = self.header(TRACEPARENT_HEADER, parent);
        match tracestate() {
            Some(state) => builder.header(TRACESTATE_HEADER, state),
            None => builder,
        }
    }
}
