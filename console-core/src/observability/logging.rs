use crate::config::TelemetrySettings;
use crate::error::CoreError;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output layer. Both formats write to `writer` so that command output on
/// stdout stays clean.
fn fmt_layer<S, W>(json: bool, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_file(true)
            .with_line_number(true)
            .json()
            .flatten_event(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .boxed()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Spans are exported over OTLP only
/// when `settings.otlp_endpoint` is set.
pub fn init_tracing(service_name: &str, settings: &TelemetrySettings) -> Result<(), CoreError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let fmt_layer = fmt_layer(settings.json, std::io::stderr);

    let telemetry = match settings.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let otlp_exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint);

            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(otlp_exporter)
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                ])))
                .install_batch(runtime::Tokio)
                .map_err(|e| {
                    CoreError::TelemetryError(format!(
                        "failed to initialize OTLP tracer for '{}' at '{}': {}",
                        service_name, endpoint, e
                    ))
                })?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .with(telemetry)
        .try_init()
        .map_err(|e| CoreError::TelemetryError(e.to_string()))
}
