use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const OTLP_ENDPOINT_ENV: &str = "OTLP_ENDPOINT";

/// Collector endpoint for trace export, if any.
///
/// Loads `.env` first: this runs before the subscriber exists, ahead of
/// the regular configuration load.
pub fn otlp_endpoint() -> Option<String> {
    dotenvy::dotenv().ok();
    configured_otlp_endpoint()
}

fn configured_otlp_endpoint() -> Option<String> {
    std::env::var(OTLP_ENDPOINT_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Install the global subscriber: env-filtered JSON logs, plus OTLP trace
/// export when `otlp_endpoint` is set.
///
/// `RUST_LOG` overrides `log_level`. An exporter that fails to build is
/// reported on stderr and the service keeps running with logs only.
pub fn init_tracing(service_name: &str, log_level: &str, otlp_endpoint: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let tracer = otlp_endpoint.and_then(|endpoint| {
        let otlp_exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(otlp_exporter)
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", service_name.to_string()),
            ])))
            .install_batch(runtime::Tokio)
        {
            Ok(t) => Some(t),
            Err(e) => {
                eprintln!(
                    "Failed to initialize OTLP tracer for service '{}' at endpoint '{}': {}",
                    service_name, endpoint, e
                );
                None
            }
        }
    });

    let telemetry = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(telemetry)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_set_only_in_env_file_is_found() {
        let dir = std::env::temp_dir().join(format!("otlp-env-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let env_file = dir.join(".env");
        std::fs::write(&env_file, "OTLP_ENDPOINT=http://collector:4317\n").unwrap();

        dotenvy::from_path(&env_file).unwrap();
        assert_eq!(
            configured_otlp_endpoint().as_deref(),
            Some("http://collector:4317")
        );

        // SAFETY: no other test in this crate touches OTLP_ENDPOINT.
        unsafe { std::env::remove_var(OTLP_ENDPOINT_ENV) };
        std::fs::remove_dir_all(&dir).ok();
    }
}
