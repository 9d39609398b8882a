//! CORS allow-list for the browser front end.
//!
//! Development accepts any `localhost`/`127.0.0.1` origin. Production accepts
//! the configured `FRONTEND_URL` plus HTTPS subdomains of the configured
//! suffix (for example `https://my-app.vercel.app`).

use crate::config::AssistantConfig;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use service_core::middleware::REQUEST_ID_HEADER;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, Clone)]
pub enum OriginPolicy {
    Development,
    Production {
        frontend_url: Option<String>,
        subdomain_suffix: Option<String>,
    },
}

impl OriginPolicy {
    pub fn from_config(config: &AssistantConfig) -> Self {
        if !config.is_production() {
            return OriginPolicy::Development;
        }

        OriginPolicy::Production {
            frontend_url: config
                .gateway
                .frontend_url
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            subdomain_suffix: config.gateway.cors_origin_suffix.as_deref().map(|suffix| {
                if suffix.starts_with('.') {
                    suffix.to_string()
                } else {
                    format!(".{}", suffix)
                }
            }),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::Development => {
                let host = origin_host(origin, &["http://", "https://"]);
                matches!(host, Some("localhost") | Some("127.0.0.1"))
            }
            OriginPolicy::Production {
                frontend_url,
                subdomain_suffix,
            } => {
                if frontend_url.as_deref() == Some(origin) {
                    return true;
                }
                match (subdomain_suffix, origin_host(origin, &["https://"])) {
                    (Some(suffix), Some(host)) => {
                        host.len() > suffix.len() && host.ends_with(suffix.as_str())
                    }
                    _ => false,
                }
            }
        }
    }
}

/// Host part of an origin using one of `schemes`, without the port.
fn origin_host<'a>(origin: &'a str, schemes: &[&str]) -> Option<&'a str> {
    let rest = schemes
        .iter()
        .find_map(|scheme| origin.strip_prefix(scheme))?;
    let host = rest.split(':').next()?;
    if host.is_empty() || host.contains('/') {
        None
    } else {
        Some(host)
    }
}

pub fn cors_layer(config: &AssistantConfig) -> CorsLayer {
    let policy = OriginPolicy::from_config(config);

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().map(|o| policy.allows(o)).unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}
