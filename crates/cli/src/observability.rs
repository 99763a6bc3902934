//! Tracing subscriber and OpenTelemetry exporter wiring.
//!
//! NOTE: only the binary calls [`initialize_tracing`]; library crates
//! concern themselves with instrumentation only.

use anyhow::Result;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// When set, spans are also exported over OTLP/gRPC to this endpoint.
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const SERVICE_NAME: &str = "smartjob-trigger";

/// Keeps the span exporter alive; flush it with [`Telemetry::shutdown`].
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Flushes pending spans.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(error) = provider.shutdown() {
                eprintln!("failed to flush trace exporter: {error}");
            }
        }
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(level: Level) -> String {
    level.as_str().to_ascii_lowercase()
}

/// Installs the global subscriber: JSON lines on stdout, plus OTLP export
/// when [`OTLP_ENDPOINT_VAR`] is set.
pub fn initialize_tracing(level: Level) -> Result<Telemetry> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directives(level))?,
    };

    let provider = match std::env::var(OTLP_ENDPOINT_VAR) {
        Ok(endpoint) if !endpoint.is_empty() => Some(otlp_provider(&endpoint)?),
        _ => None,
    };
    let otel_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()?;

    Ok(Telemetry { provider })
}

fn otlp_provider(endpoint: &str) -> Result<TracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::info(Level::INFO, "info")]
    #[case::warn(Level::WARN, "warn")]
    #[case::trace(Level::TRACE, "trace")]
    fn directives_follow_configured_level(#[case] level: Level, #[case] expected: &str) {
        assert_eq!(default_directives(level), expected);
        assert!(EnvFilter::try_new(default_directives(level)).is_ok());
    }
}
