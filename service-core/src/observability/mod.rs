pub mod logging;

pub use logging::{init_tracing, otlp_endpoint};
