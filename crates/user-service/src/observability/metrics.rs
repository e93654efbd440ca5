//! Metric definitions and the explicit metric registry.
//!
//! All metrics follow Prometheus naming conventions:
//! - `app_http_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: 7 values max (GET, POST, PUT, DELETE, PATCH, OPTIONS, UNKNOWN)
//! - `route`: registered route templates plus `unknown`
//! - `status_class`: 4 values (2xx, 3xx, 4xx, 5xx)
//!
//! # Registry
//!
//! [`MetricRegistry`] owns its own Prometheus recorder. Nothing is installed
//! as the process-global `metrics` recorder, so several registries can live
//! side by side (one per test server, for instance) without interfering.

use metrics::{Counter, Histogram, Key, KeyName, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Counter of completed HTTP requests.
pub const HTTP_REQUESTS_TOTAL: &str = "app_http_requests_total";

/// Histogram of HTTP request latency in seconds.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "app_http_request_duration_seconds";

/// Label names shared by both HTTP series.
pub const HTTP_LABELS: [&str; 3] = ["method", "route", "status_class"];

/// Method label for verbs outside [`KNOWN_METHODS`].
pub const UNKNOWN_METHOD: &str = "UNKNOWN";

/// Route label for requests that matched no registered route.
pub const UNKNOWN_ROUTE: &str = "unknown";

/// Verbs that keep their own method label.
pub const KNOWN_METHODS: [&str; 6] = ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];

/// Latency buckets in seconds (Prometheus client defaults).
const HTTP_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to build metrics recorder: {0}")]
    Build(String),

    #[error("Metric {name} expects {expected} label values, got {got}")]
    LabelArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Metric {name} is already registered as a {existing:?}")]
    KindMismatch { name: String, existing: MetricKind },
}

// ============================================================================
// Label normalization
// ============================================================================

/// Map an outcome code to its status class.
///
/// Zero means "no explicit status was set" and counts as success.
pub fn status_class(code: u16) -> &'static str {
    match code {
        500..=u16::MAX => "5xx",
        400..=499 => "4xx",
        300..=399 => "3xx",
        _ => "2xx",
    }
}

/// Map an inbound verb to its method label.
///
/// Exact-token comparison: `GETX` or `get` are not `GET`.
pub fn normalize_method(method: &str) -> &'static str {
    KNOWN_METHODS
        .iter()
        .find(|known| **known == method)
        .copied()
        .unwrap_or(UNKNOWN_METHOD)
}

/// Map the router's matched route template to the route label.
pub fn normalize_route(matched_route: Option<&str>) -> &str {
    match matched_route {
        Some(route) if !route.is_empty() => route,
        _ => UNKNOWN_ROUTE,
    }
}

// ============================================================================
// Collectors
// ============================================================================

/// Kind of collector a registry entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
}

struct FamilyInner {
    name: String,
    label_names: Vec<&'static str>,
    recorder: Arc<PrometheusRecorder>,
}

impl FamilyInner {
    fn key(&self, values: &[&str]) -> Result<Key, MetricsError> {
        if values.len() != self.label_names.len() {
            return Err(MetricsError::LabelArity {
                name: self.name.clone(),
                expected: self.label_names.len(),
                got: values.len(),
            });
        }

        let labels: Vec<Label> = self
            .label_names
            .iter()
            .zip(values)
            .map(|(name, value)| Label::new(*name, (*value).to_string()))
            .collect();

        Ok(Key::from_parts(self.name.clone(), labels))
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// A labeled counter family.
#[derive(Clone)]
pub struct CounterFamily {
    inner: Arc<FamilyInner>,
}

impl CounterFamily {
    /// Resolve the counter for one set of label values (in label-name order).
    pub fn with_label_values(&self, values: &[&str]) -> Result<Counter, MetricsError> {
        let key = self.inner.key(values)?;
        Ok(self.inner.recorder.register_counter(&key, &metadata()))
    }
}

/// A labeled histogram family.
#[derive(Clone)]
pub struct HistogramFamily {
    inner: Arc<FamilyInner>,
}

impl HistogramFamily {
    /// Resolve the histogram for one set of label values (in label-name order).
    pub fn with_label_values(&self, values: &[&str]) -> Result<Histogram, MetricsError> {
        let key = self.inner.key(values)?;
        Ok(self.inner.recorder.register_histogram(&key, &metadata()))
    }
}

/// A registered collector.
#[derive(Clone)]
pub enum Collector {
    Counter(CounterFamily),
    Histogram(HistogramFamily),
}

impl Collector {
    pub fn kind(&self) -> MetricKind {
        match self {
            Collector::Counter(_) => MetricKind::Counter,
            Collector::Histogram(_) => MetricKind::Histogram,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Collector::Counter(family) => &family.inner.name,
            Collector::Histogram(family) => &family.inner.name,
        }
    }

    pub fn label_names(&self) -> &[&'static str] {
        match self {
            Collector::Counter(family) => &family.inner.label_names,
            Collector::Histogram(family) => &family.inner.label_names,
        }
    }

    pub fn as_counter(&self) -> Result<&CounterFamily, MetricsError> {
        match self {
            Collector::Counter(family) => Ok(family),
            Collector::Histogram(_) => Err(self.kind_mismatch()),
        }
    }

    pub fn as_histogram(&self) -> Result<&HistogramFamily, MetricsError> {
        match self {
            Collector::Histogram(family) => Ok(family),
            Collector::Counter(_) => Err(self.kind_mismatch()),
        }
    }

    fn kind_mismatch(&self) -> MetricsError {
        MetricsError::KindMismatch {
            name: self.name().to_string(),
            existing: self.kind(),
        }
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("label_names", &self.label_names())
            .finish()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Explicit metric registry.
///
/// Built once at process start and shared by `Arc`. Registration is
/// idempotent: the first `register` for a name constructs the collector,
/// every later call (from any thread) gets the same `Arc` back.
pub struct MetricRegistry {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    collectors: Mutex<HashMap<String, Arc<Collector>>>,
}

impl MetricRegistry {
    /// Create an empty registry with HTTP latency buckets configured.
    ///
    /// # Errors
    ///
    /// Returns error if the bucket configuration is rejected.
    pub fn new() -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
                HTTP_DURATION_BUCKETS,
            )
            .map_err(|e| MetricsError::Build(format!("HTTP duration buckets: {e}")))?
            .build_recorder();
        let handle = recorder.handle();

        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
            collectors: Mutex::new(HashMap::new()),
        })
    }

    /// Register a collector, or return the one already registered under `name`.
    ///
    /// A later call never replaces or duplicates the first collector, even
    /// when it asks for a different kind or label set; callers that need a
    /// specific kind go through [`Collector::as_counter`] /
    /// [`Collector::as_histogram`].
    pub fn register(
        &self,
        name: &str,
        kind: MetricKind,
        help: &str,
        label_names: &[&'static str],
    ) -> Arc<Collector> {
        // Held across check-and-insert so racing first registrations build one collector.
        let mut collectors = self
            .collectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = collectors.get(name) {
            return Arc::clone(existing);
        }

        let inner = Arc::new(FamilyInner {
            name: name.to_string(),
            label_names: label_names.to_vec(),
            recorder: Arc::clone(&self.recorder),
        });

        let key_name = KeyName::from(name.to_string());
        let collector = match kind {
            MetricKind::Counter => {
                self.recorder
                    .describe_counter(key_name, None, help.to_string().into());
                Collector::Counter(CounterFamily { inner })
            }
            MetricKind::Histogram => {
                self.recorder
                    .describe_histogram(key_name, None, help.to_string().into());
                Collector::Histogram(HistogramFamily { inner })
            }
        };

        let collector = Arc::new(collector);
        collectors.insert(name.to_string(), Arc::clone(&collector));

        tracing::debug!(target: "us.metrics", metric = name, ?kind, "Registered collector");

        collector
    }

    /// Number of registered collectors.
    pub fn len(&self) -> usize {
        self.collectors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render all registered series in Prometheus text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// The request counter and latency histogram used by the HTTP middleware.
///
/// Metric: `app_http_requests_total`, `app_http_request_duration_seconds`
/// Labels: `method`, `route`, `status_class`
#[derive(Clone)]
pub struct HttpMetrics {
    requests_total: CounterFamily,
    request_duration: HistogramFamily,
}

impl HttpMetrics {
    /// Register (or reuse) the HTTP collectors in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` if either name is already taken by a collector
    /// of the other kind.
    pub fn register(registry: &MetricRegistry) -> Result<Self, MetricsError> {
        let requests_total = registry.register(
            HTTP_REQUESTS_TOTAL,
            MetricKind::Counter,
            "Total HTTP requests",
            &HTTP_LABELS,
        );
        let request_duration = registry.register(
            HTTP_REQUEST_DURATION_SECONDS,
            MetricKind::Histogram,
            "HTTP request latency",
            &HTTP_LABELS,
        );

        Ok(Self {
            requests_total: requests_total.as_counter()?.clone(),
            request_duration: request_duration.as_histogram()?.clone(),
        })
    }

    /// Record one completed request.
    ///
    /// `method` and `matched_route` are normalized here; callers pass the
    /// raw verb and the router's matched template (if any).
    pub fn record(
        &self,
        method: &str,
        matched_route: Option<&str>,
        status_code: u16,
        duration: Duration,
    ) {
        let labels = [
            normalize_method(method),
            normalize_route(matched_route),
            status_class(status_code),
        ];

        match self.requests_total.with_label_values(&labels) {
            Ok(counter) => counter.increment(1),
            Err(e) => tracing::warn!(target: "us.metrics", error = %e, "Failed to record request"),
        }

        match self.request_duration.with_label_values(&labels) {
            Ok(histogram) => histogram.record(duration.as_secs_f64()),
            Err(e) => tracing::warn!(target: "us.metrics", error = %e, "Failed to record latency"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
