//! Minimal metrics registry for the service.
//!
//! Labels are flattened into sorted key vectors to keep deterministic
//! ordering. Histogram buckets are fixed in microseconds to avoid floating
//! point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Sorted snapshot so output order does not depend on shard layout.
fn sorted_keys<V>(map: &DashMap<LabelKey, V>) -> Vec<LabelKey> {
    let mut keys: Vec<LabelKey> = map.iter().map(|r| r.key().clone()).collect();
    keys.sort();
    keys
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self.map.entry(label_key(labels)).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for key in sorted_keys(&self.map) {
            if let Some(c) = self.map.get(&key) {
                let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(&key), c.load(Ordering::Relaxed));
            }
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self.map.entry(label_key(labels)).or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for key in sorted_keys(&self.map) {
            if let Some(g) = self.map.get(&key) {
                let _ = writeln!(out, "{}{{{}}} {}", name, render_labels(&key), g.load(Ordering::Relaxed));
            }
        }
    }
}

// 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 500ms, 1s
const BUCKETS_MICROS: [u64; 9] = [100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 500_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self.map.entry(label_key(labels)).or_default();
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for key in sorted_keys(&self.map) {
            let Some(hist) = self.map.get(&key) else { continue };
            let label_str = render_labels(&key);
            let prefix = if label_str.is_empty() { String::new() } else { format!("{},", label_str) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);

            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, label_str, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, label_str, count);
        }
    }
}

#[derive(Default)]
pub struct ApiMetrics {
    /// Labels: route, status.
    pub requests: CounterVec,
    /// Labels: reason (`invalid_filter`, `forbidden`, `auth`, `not_found`, ...).
    pub rejections: CounterVec,
    /// Labels: route.
    pub in_flight: GaugeVec,
    /// Labels: route. Microseconds.
    pub resolve_duration: HistogramVec,
}

impl ApiMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.requests.render("figures_requests_total", &mut out);
        self.rejections.render("figures_rejections_total", &mut out);
        self.in_flight.render("figures_requests_in_flight", &mut out);
        self.resolve_duration.render("figures_resolve_duration_micros", &mut out);
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn renders_sorted_labels() {
        let m = ApiMetrics::default();
        m.requests.inc(&[("status", "200"), ("route", "list")]);
        m.requests.inc(&[("route", "list"), ("status", "200")]);
        m.requests.inc(&[("route", "list"), ("status", "404")]);
        assert_eq!(m.requests.get(&[("route", "list"), ("status", "200")]), 2);

        let out = m.render();
        let a = out.find("figures_requests_total{route=\"list\",status=\"200\"} 2").unwrap();
        let b = out.find("figures_requests_total{route=\"list\",status=\"404\"} 1").unwrap();
        assert!(a < b);
    }

    #[test]
    fn rejections_render_by_reason() {
        let m = ApiMetrics::default();
        m.rejections.inc(&[("reason", "invalid_filter")]);
        m.rejections.inc(&[("reason", "auth")]);
        let out = m.render();
        assert!(out.contains("figures_rejections_total{reason=\"invalid_filter\"} 1"));
        assert!(out.contains("figures_rejections_total{reason=\"auth\"} 1"));
    }

    #[test]
    fn histogram_buckets_are_cumulative() {
        let m = ApiMetrics::default();
        m.resolve_duration.observe(&[("route", "list")], Duration::from_micros(700));
        let out = m.render();
        assert!(out.contains("figures_resolve_duration_micros_bucket{route=\"list\",le=\"500\"} 0"));
        assert!(out.contains("figures_resolve_duration_micros_bucket{route=\"list\",le=\"1000\"} 1"));
        assert!(out.contains("figures_resolve_duration_micros_count{route=\"list\"} 1"));
    }
}
