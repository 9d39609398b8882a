pub mod rate_limit;
pub mod security_headers;
pub mod tracing;

pub use rate_limit::{
    client_ip, create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter,
    SlidingWindowLimiter, RATE_LIMIT_MESSAGE,
};
pub use security_headers::security_headers_middleware;
pub use self::tracing::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
