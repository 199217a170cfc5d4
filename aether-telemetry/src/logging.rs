//! ## aether-telemetry::logging
//! **Structured logging with tracing**
//!
//! `RUST_LOG` wins over the configured level when both are present.

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber at `info` unless `RUST_LOG` says otherwise.
    pub fn init() {
        Self::init_with_level("info");
    }

    /// Installs the global subscriber with `level` as the fallback filter.
    /// Later calls are no-ops.
    pub fn init_with_level(level: &str) {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
    }

    /// Emits one simulation event with its attributes inside its own span.
    #[inline]
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "simulation_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            let attributes: Vec<String> = metadata
                .iter()
                .map(|kv| format!("{}={}", kv.key, kv.value))
                .collect();
            tracing::info!(attributes = ?attributes, "Simulation event recorded");
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "advance_complete",
                vec![KeyValue::new("now", "@1br")],
            ));
        assert!(logs_contain("Simulation event recorded"));
        assert!(logs_contain("now=@1br"));
    }
}
