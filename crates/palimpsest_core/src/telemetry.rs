//! Tracing initialization.

use palimpsest_error::{ConfigError, ConfigErrorKind};
use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_directive` (e.g. `"info"` or
/// `"palimpsest_store=debug"`).
///
/// # Errors
///
/// Returns an error if the directive is malformed or a global subscriber is
/// already installed.
pub fn init_tracing(format: LogFormat, default_directive: &str) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Logging(format!("invalid directive: {}", e))))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ConfigError::new(ConfigErrorKind::Logging(format!("subscriber already installed: {}", e))))
}

#[cfg(feature = "otel")]
mod otel {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::{
        Resource,
        trace::{RandomIdGenerator, Sampler, TracerProvider},
    };
    use opentelemetry_stdout::SpanExporter;
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    /// Initialize OpenTelemetry with a stdout span exporter for development.
    ///
    /// Spans are exported to stdout alongside human-readable logs; both
    /// layers respect `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns error if subscriber initialization fails.
    pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
        let provider = TracerProvider::builder()
            .with_simple_exporter(SpanExporter::default())
            .with_id_generator(RandomIdGenerator::default())
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(Resource::default())
            .build();

        let tracer = provider.tracer("palimpsest");

        let telemetry_layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(EnvFilter::from_default_env());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_filter(EnvFilter::from_default_env());

        tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }

    /// Flush pending spans. Call before exit.
    pub fn shutdown_telemetry() {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

#[cfg(feature = "otel")]
pub use otel::{init_telemetry, shutdown_telemetry};
