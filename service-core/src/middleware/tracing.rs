use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is echoed back unchanged.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id attached to request extensions for handlers and log fields.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn inbound_request_id(req: &Request) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .filter(|s| s.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = inbound_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        req.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
