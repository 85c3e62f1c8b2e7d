//! Tracing and OpenTelemetry setup for the runner.

use anyhow::Result;
use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE: &str = "life-runner";

/// Tracer provider exporting over OTLP/gRPC when an endpoint is given,
/// otherwise a provider that samples nothing
fn build_tracer_provider(otel_endpoint: Option<&str>) -> Result<TracerProvider> {
    let config = opentelemetry_sdk::trace::Config::default()
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(Resource::new(vec![
            opentelemetry::KeyValue::new(SERVICE_NAME, SERVICE),
            opentelemetry::KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ]));

    let provider = match otel_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?;

            TracerProvider::builder()
                .with_config(config.with_sampler(Sampler::AlwaysOn))
                .with_batch_exporter(exporter, runtime::Tokio)
                .build()
        }
        None => TracerProvider::builder()
            .with_config(config.with_sampler(Sampler::AlwaysOff))
            .build(),
    };
    Ok(provider)
}

/// Install the global subscriber. Must run inside the tokio runtime when an
/// endpoint is configured.
pub fn init_telemetry(otel_endpoint: Option<&str>) -> Result<()> {
    let tracer_provider = build_tracer_provider(otel_endpoint)?;
    global::set_tracer_provider(tracer_provider.clone());

    let telemetry_layer =
        tracing_opentelemetry::layer().with_tracer(tracer_provider.tracer(SERVICE));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,life_runner=debug,life_world=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(telemetry_layer)
        .try_init()?;

    match otel_endpoint {
        Some(endpoint) => info!("Telemetry initialized, exporting spans to {}", endpoint),
        None => info!("Telemetry initialized (OpenTelemetry disabled)"),
    }
    Ok(())
}

pub fn shutdown_telemetry() {
    info!("Shutting down telemetry");
    global::shutdown_tracer_provider();
}

/// Record a counter metric
#[macro_export]
macro_rules! record_counter {
    ($name:expr, $value:expr) => {
        tracing::info!(
            counter_name = $name,
            counter_value = $value,
            "Counter metric"
        );
    };
}

/// Record a gauge metric
#[macro_export]
macro_rules! record_gauge {
    ($name:expr, $value:expr) => {
        tracing::info!(
            gauge_name = $name,
            gauge_value = $value,
            "Gauge metric"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{Span as _, Tracer as _};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_endpoint_enables_sampled_export() {
        let provider = build_tracer_provider(Some("http://127.0.0.1:4317")).unwrap();
        let span = provider.tracer(SERVICE).start("step");
        assert!(span.span_context().is_sampled());
        drop(span);
        let _ = provider.shutdown();
    }

    #[test]
    fn test_no_endpoint_samples_nothing() {
        let provider = build_tracer_provider(None).unwrap();
        let span = provider.tracer(SERVICE).start("step");
        assert!(!span.span_context().is_sampled());
    }
}
