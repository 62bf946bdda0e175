//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for all framework components:
//! - Reducer execution
//! - Effect handling
//! - Remote gateway calls
//! - Store lifecycle
//!
//! # Example
//!
//! ```rust,no_run
//! use event360_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Install the Prometheus recorder
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! // Render current metrics for scraping
//! let snapshot = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Installs the Prometheus recorder and exposes a render handle for scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Initialize metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the metrics exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this will
    /// log a warning and continue. In production, ensure this is only called once.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        // Register all metric descriptions
        register_metrics();

        // Build the Prometheus exporter
        let builder = PrometheusBuilder::new()
            // Configure histogram buckets for latency measurements
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        // Try to install the recorder
        // In tests, this may fail if a recorder is already installed
        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics recorder installed - scrape endpoint http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    // In tests, multiple MetricsServer instances may be created
                    // We'll allow this but warn about it
                    tracing::warn!(
                        "Metrics recorder already initialized, skipping re-initialization"
                    );
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the recorder hasn't been installed by this instance.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Reducer Metrics
    describe_counter!(
        "reducer_actions_processed_total",
        "Total number of actions processed by reducers"
    );
    describe_histogram!(
        "reducer_execution_duration_seconds",
        "Time taken to execute reducers"
    );

    // Effect Metrics
    describe_counter!(
        "effects_executed_total",
        "Total number of effects executed"
    );
    describe_counter!(
        "effects_failed_total",
        "Total number of effects that failed"
    );
    describe_histogram!(
        "effect_execution_duration_seconds",
        "Time taken to execute effects"
    );

    // Gateway Metrics
    describe_counter!(
        "gateway_requests_total",
        "Total number of remote gateway calls by procedure"
    );
    describe_counter!(
        "gateway_request_errors_total",
        "Total number of failed remote gateway calls by procedure"
    );
    describe_histogram!(
        "gateway_request_duration_seconds",
        "Time taken for remote gateway calls"
    );

    // Store Metrics
    describe_gauge!(
        "store_pending_effects",
        "Current number of in-flight effects across the store"
    );
    describe_counter!(
        "store_shutdowns_total",
        "Total number of store shutdown attempts by outcome"
    );
}

/// Reducer metrics recorder.
pub struct ReducerMetrics;

impl ReducerMetrics {
    /// Record an action processed.
    pub fn record_action(duration: Duration) {
        counter!("reducer_actions_processed_total").increment(1);
        histogram!("reducer_execution_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record an effect execution.
    pub fn record_execution(duration: Duration) {
        counter!("effects_executed_total").increment(1);
        histogram!("effect_execution_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an effect failure.
    pub fn record_failure() {
        counter!("effects_failed_total").increment(1);
    }
}

/// Remote gateway metrics recorder.
pub struct GatewayMetrics;

impl GatewayMetrics {
    /// Record a completed gateway call.
    pub fn record_call(procedure: &'static str, duration: Duration) {
        counter!("gateway_requests_total", "procedure" => procedure).increment(1);
        histogram!("gateway_request_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a failed gateway call.
    pub fn record_error(procedure: &'static str) {
        counter!("gateway_request_errors_total", "procedure" => procedure).increment(1);
    }
}

/// Store lifecycle metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record the number of in-flight effects.
    #[allow(clippy::cast_precision_loss)] // Effect counts stay far below 2^52
    pub fn record_pending_effects(pending: usize) {
        gauge!("store_pending_effects").set(pending as f64);
    }

    /// Record a shutdown outcome.
    pub fn record_shutdown(outcome: &'static str) {
        counter!("store_shutdowns_total", "outcome" => outcome).increment(1);
    }
}
