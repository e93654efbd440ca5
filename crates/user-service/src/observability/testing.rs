//! Test helpers for asserting on rendered metrics.
//!
//! Compiled for this crate's own tests and, behind the `test-utils` feature,
//! for `user-test-utils` and the integration tests that use it.

/// A parsed view over Prometheus text exposition output.
#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    text: String,
}

impl MetricSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Sample lines of `series` (comments skipped).
    fn samples<'a>(&'a self, series: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.text
            .lines()
            .filter(|line| !line.starts_with('#'))
            .filter(move |line| {
                line.strip_prefix(series)
                    .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
            })
    }

    /// Value of the first `series` sample carrying every given label pair.
    pub fn value(&self, series: &str, labels: &[(&str, &str)]) -> Option<f64> {
        self.samples(series)
            .find(|line| {
                labels
                    .iter()
                    .all(|(key, value)| line.contains(&format!("{key}=\"{value}\"")))
            })
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|value| value.parse().ok())
    }

    /// Number of distinct sample lines of `series`.
    pub fn count_series(&self, series: &str) -> usize {
        self.samples(series).count()
    }

    /// Whether any `series` sample carries `key="value"`.
    pub fn has_label_value(&self, series: &str, key: &str, value: &str) -> bool {
        let needle = format!("{key}=\"{value}\"");
        self.samples(series).any(|line| line.contains(&needle))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}
