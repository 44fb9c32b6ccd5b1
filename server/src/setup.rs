use opentelemetry_otlp::WithExportConfig as _;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,entra_pkce=debug,tower_http=debug";

/// Start Sentry when `SENTRY_DSN` is set.
///
/// The returned guard flushes pending events on drop, so hold it for the life of `main`.
pub fn setup_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok()?;

    let traces_sample_rate = std::env::var("SENTRY_TRACES_SAMPLE_RATE")
        .ok()
        .and_then(|rate| rate.parse().ok())
        .unwrap_or(0.0);

    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            traces_sample_rate,
            ..Default::default()
        },
    )))
}

/// Install the global tracing subscriber.
///
/// Logs go to stdout as an indented tree. When `OTEL_EXPORTER_OTLP_ENDPOINT` is
/// set, spans are also exported over OTLP/HTTP under `service_name`.
pub fn setup_tracing(service_name: &str) -> crate::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let tree_layer = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true);

    let otel_layer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .http()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(opentelemetry_sdk::trace::config().with_resource(
                    opentelemetry_sdk::Resource::new(vec![opentelemetry::KeyValue::new(
                        "service.name",
                        service_name.to_string(),
                    )]),
                ))
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;

            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(tree_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}
