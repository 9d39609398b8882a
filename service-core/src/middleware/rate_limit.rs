use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::{
    collections::VecDeque,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Message returned to clients that exceed their request budget.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Sliding-window request log per client IP.
///
/// A client may make at most `max_requests` requests in any `window`-long
/// interval. Rejected requests are not recorded. Clients with no request
/// inside the last window are swept out at most once per window.
pub struct SlidingWindowLimiter {
    max_requests: usize,
    window: Duration,
    trust_proxy: bool,
    hits: DashMap<IpAddr, VecDeque<Instant>>,
    last_sweep: Mutex<Instant>,
}

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<SlidingWindowLimiter>;

/// Create a keyed rate limiter allowing `max_requests` per `window_seconds` for each IP.
///
/// With `trust_proxy` the first `X-Forwarded-For` hop identifies the client;
/// otherwise only the socket peer address does.
pub fn create_ip_rate_limiter(
    max_requests: u32,
    window_seconds: u64,
    trust_proxy: bool,
) -> IpRateLimiter {
    Arc::new(SlidingWindowLimiter::new(
        max_requests,
        Duration::from_secs(window_seconds.max(1)),
        trust_proxy,
    ))
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: u32, window: Duration, trust_proxy: bool) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            trust_proxy,
            hits: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn trusts_proxy(&self) -> bool {
        self.trust_proxy
    }

    /// Record a request from `ip` now. `Err` carries the wait until a slot frees up.
    pub fn check(&self, ip: IpAddr) -> Result<(), Duration> {
        self.check_at(ip, Instant::now())
    }

    /// Record a request from `ip` at `now`.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), Duration> {
        self.sweep_idle(now);

        let mut log = self.hits.entry(ip).or_default();
        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        if log.len() >= self.max_requests {
            let oldest = log.front().copied().unwrap_or(now);
            return Err((oldest + self.window).saturating_duration_since(now));
        }

        log.push_back(now);
        Ok(())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.hits.len()
    }

    fn sweep_idle(&self, now: Instant) {
        let Ok(mut last_sweep) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last_sweep) < self.window {
            return;
        }
        *last_sweep = now;

        let window = self.window;
        self.hits.retain(|_, log| {
            log.back()
                .is_some_and(|&latest| now.saturating_duration_since(latest) < window)
        });
    }
}

/// Resolve the client address: the socket peer, or the first
/// `X-Forwarded-For` hop when running behind a trusted proxy.
pub fn client_ip(request: &Request, trust_proxy: bool) -> Option<IpAddr> {
    let forwarded_ip = trust_proxy
        .then(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .flatten();

    forwarded_ip.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request, limiter.trusts_proxy()) {
        Some(ip) => match limiter.check(ip) {
            Ok(()) => Ok(next.run(request).await),
            Err(wait_time) => {
                tracing::warn!(client_ip = %ip, "Rate limit exceeded");
                let retry_after = wait_time.as_secs() + u64::from(wait_time.subsec_nanos() > 0);
                Err(AppError::TooManyRequests(
                    RATE_LIMIT_MESSAGE.to_string(),
                    Some(retry_after.max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
