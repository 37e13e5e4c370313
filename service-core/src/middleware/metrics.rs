use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram};
use std::time::Instant;

/// Label recorded when no low-cardinality value is known.
pub const UNLABELLED: &str = "-";

/// Route label for requests no route template matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Host label chosen by the service (never the raw `Host` header). Insert it
/// into request extensions before [`metrics_middleware`] runs.
#[derive(Debug, Clone, Copy)]
pub struct HostLabel(pub &'static str);

/// Route template reported back by an inner router on the response.
#[derive(Debug, Clone)]
pub struct RouteLabel(pub String);

/// Copy the matched route template onto the response so an outer
/// [`metrics_middleware`] can see it through nested dispatch.
pub async fn route_label_middleware(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    let mut response = next.run(req).await;
    if let Some(route) = route {
        response.extensions_mut().insert(RouteLabel(route));
    }
    response
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let host = req
        .extensions()
        .get::<HostLabel>()
        .map(|label| label.0)
        .unwrap_or(UNLABELLED);
    let matched = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16().to_string();
    let path = response
        .extensions()
        .get::<RouteLabel>()
        .map(|label| label.0.clone())
        .or(matched)
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    let labels = [
        ("method", method),
        ("host", host.to_string()),
        ("path", path),
        ("status", status),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    response
}
