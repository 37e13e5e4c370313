use crate::domain::Domain;
use service_core::middleware::metrics::HostLabel;
use axum::{
    extract::Request,
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};

const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Host the client addressed: `X-Forwarded-Host` (first entry), then `Host`,
/// then the URI authority.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    headers
        .get(FORWARDED_HOST_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
        })
        .or_else(|| uri.host())
        .unwrap_or_default()
}

pub fn resolve_request_domain(headers: &HeaderMap, uri: &Uri) -> Domain {
    Domain::from_host(request_host(headers, uri))
}

/// Tag the request with its front-end so routing, gates and handlers agree.
pub async fn resolve_domain_middleware(mut request: Request, next: Next) -> Response {
    let domain = resolve_request_domain(request.headers(), request.uri());
    request.extensions_mut().insert(domain);
    request.extensions_mut().insert(HostLabel(domain.as_str()));
    next.run(request).await
}
