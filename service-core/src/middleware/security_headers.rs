use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// CSP for the static front end: same-origin assets only, inline styles allowed.
const FRONTEND_CSP: &str = "default-src 'self'; \
     script-src 'self'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data:; \
     font-src 'self'; \
     connect-src 'self'; \
     object-src 'none'; \
     frame-ancestors 'none'";

/// CSP for JSON API responses.
const API_CSP: &str = "default-src 'none'; frame-ancestors 'none'";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_api_route = req.uri().path().starts_with("/api/");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_XSS_PROTECTION,
        header::HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    let csp = if is_api_route { API_CSP } else { FRONTEND_CSP };
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(csp),
    );

    response
}
