use cloud_orders_config::LoggingConfig;
use cloud_orders_types::Flow;
use std::sync::Arc;
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

/// Initialize tracing from the logging section of the configuration
///
/// `RUST_LOG` takes precedence over the configured level when set
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), TracingError> {
    init(logging, None)
}

/// Initialize tracing with metrics integration
pub fn init_tracing_with_metrics(
    logging: &LoggingConfig,
    collector: Arc<MetricsCollector>,
) -> Result<(), TracingError> {
    init(logging, Some(MetricsLayer::new(collector)))
}

fn init(logging: &LoggingConfig, metrics: Option<MetricsLayer>) -> Result<(), TracingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .map_err(|e| TracingError::InitError(e.to_string()))?,
    };

    let json_layer = logging.json.then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .json()
    });
    let plain_layer = (!logging.json).then(|| fmt::layer().with_target(true).with_level(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .with(metrics)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer that counts error-level events by their `error_type` field
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = ErrorTypeVisitor::default();
        event.record(&mut visitor);
        let error_type = visitor.error_type.as_deref().unwrap_or("unclassified");
        self.collector.record_error_event(error_type);
    }
}

/// Visitor to extract the `error_type` field from events
#[derive(Default)]
struct ErrorTypeVisitor {
    error_type: Option<String>,
}

impl Visit for ErrorTypeVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "error_type" {
            self.error_type = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "error_type" {
            self.error_type = Some(value.to_string());
        }
    }
}

/// Correlation ID tying together every event of one fulfillment invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Span context for one fulfillment invocation
#[derive(Debug, Clone)]
pub struct FulfillmentSpan {
    pub correlation_id: CorrelationId,
    pub order_id: String,
}

impl FulfillmentSpan {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            order_id: order_id.into(),
        }
    }

    /// Tracing span for this invocation; `flow` is recorded once selected
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "fulfillment",
            correlation_id = %self.correlation_id,
            order_id = %self.order_id,
            flow = tracing::field::Empty,
        )
    }

    /// Record the selected flow on a span created by [`FulfillmentSpan::span`]
    pub fn record_flow(span: &tracing::Span, flow: Flow) {
        span.record("flow", flow.as_str());
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}
