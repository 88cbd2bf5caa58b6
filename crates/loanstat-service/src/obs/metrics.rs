//! In-process metrics registry for the service.
//!
//! Three instrument kinds are provided (counter, histogram, gauge), each with
//! a label key set fixed at construction. Series are stored in `DashMap`s keyed
//! by label values in declared order. Counters and gauges are atomics;
//! histogram series sit behind their own `Mutex` so an export always sees a
//! consistent count/sum/bucket triple.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const DB_UP: &str = "db_up";

// Upper bounds in seconds, same defaults most Prometheus clients ship.
const BUCKET_COUNT: usize = 14;
const BUCKETS_SECONDS: [f64; BUCKET_COUNT] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Instrumentation misuse. Never surfaces to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("label mismatch on {name}: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        name: &'static str,
        expected: &'static [&'static str],
        got: Vec<String>,
    },
}

/// Label values in the instrument's declared key order.
type SeriesKey = Vec<String>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Debug)]
struct Descriptor {
    name: &'static str,
    help: &'static str,
    label_keys: &'static [&'static str],
}

impl Descriptor {
    /// Resolve caller labels into a series key. Order of `labels` does not
    /// matter, but the key set must match exactly.
    fn key(&self, labels: &[(&str, &str)]) -> Result<SeriesKey, MetricError> {
        let mismatch = || MetricError::LabelMismatch {
            name: self.name,
            expected: self.label_keys,
            got: labels.iter().map(|(k, _)| k.to_string()).collect(),
        };

        if labels.len() != self.label_keys.len() {
            return Err(mismatch());
        }
        self.label_keys
            .iter()
            .map(|want| {
                let mut found = labels.iter().filter(|(k, _)| k == want);
                match (found.next(), found.next()) {
                    (Some((_, v)), None) => Ok(v.to_string()),
                    _ => Err(mismatch()),
                }
            })
            .collect()
    }

    fn header(&self, kind: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", self.name, self.help);
        let _ = writeln!(out, "# TYPE {} {}", self.name, kind);
    }

    /// `k1="v1",k2="v2"` (no braces).
    fn label_str(&self, key: &SeriesKey) -> String {
        self.label_keys
            .iter()
            .zip(key)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn braced(labels: &str) -> String {
    if labels.is_empty() {
        String::new()
    } else {
        format!("{{{labels}}}")
    }
}

/// Monotonic counter family.
#[derive(Debug)]
pub struct Counter {
    desc: Descriptor,
    map: DashMap<SeriesKey, AtomicU64>,
}

impl Counter {
    fn new(name: &'static str, help: &'static str, label_keys: &'static [&'static str]) -> Self {
        Self {
            desc: Descriptor { name, help, label_keys },
            map: DashMap::new(),
        }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) -> Result<(), MetricError> {
        let key = self.desc.key(labels)?;
        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current value, `None` if the combination was never recorded.
    pub fn get(&self, labels: &[(&str, &str)]) -> Option<u64> {
        let key = self.desc.key(labels).ok()?;
        self.map.get(&key).map(|c| c.load(Ordering::Relaxed))
    }

    fn render(&self, out: &mut String) {
        self.desc.header("counter", out);
        let mut rows: Vec<(SeriesKey, u64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let _ = writeln!(out, "{}{} {}", self.desc.name, braced(&self.desc.label_str(&key)), val);
        }
    }
}

/// Last-value gauge family.
#[derive(Debug)]
pub struct Gauge {
    desc: Descriptor,
    map: DashMap<SeriesKey, AtomicI64>,
}

impl Gauge {
    fn new(name: &'static str, help: &'static str, label_keys: &'static [&'static str]) -> Self {
        Self {
            desc: Descriptor { name, help, label_keys },
            map: DashMap::new(),
        }
    }

    pub fn set(&self, labels: &[(&str, &str)], v: i64) -> Result<(), MetricError> {
        let key = self.desc.key(labels)?;
        let gauge = self.map.entry(key).or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
        Ok(())
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> Option<i64> {
        let key = self.desc.key(labels).ok()?;
        self.map.get(&key).map(|g| g.load(Ordering::Relaxed))
    }

    fn render(&self, out: &mut String) {
        self.desc.header("gauge", out);
        let mut rows: Vec<(SeriesKey, i64)> = self
            .map
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        rows.sort();
        for (key, val) in rows {
            let _ = writeln!(out, "{}{} {}", self.desc.name, braced(&self.desc.label_str(&key)), val);
        }
    }
}

/// Point-in-time copy of one histogram series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub sum: f64,
    /// Cumulative counts, one per entry of the bucket bounds.
    pub buckets: [u64; BUCKET_COUNT],
}

/// Duration histogram family (unit: seconds).
#[derive(Debug)]
pub struct Histogram {
    desc: Descriptor,
    map: DashMap<SeriesKey, Mutex<HistogramSnapshot>>,
}

impl Histogram {
    fn new(name: &'static str, help: &'static str, label_keys: &'static [&'static str]) -> Self {
        Self {
            desc: Descriptor { name, help, label_keys },
            map: DashMap::new(),
        }
    }

    /// Observe a duration and increment cumulative buckets.
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) -> Result<(), MetricError> {
        let key = self.desc.key(labels)?;
        let secs = duration.as_secs_f64();

        let series = self.map.entry(key).or_insert_with(Mutex::default);
        let mut hist = series.lock().unwrap_or_else(PoisonError::into_inner);
        hist.count += 1;
        hist.sum += secs;
        // Cumulative buckets: increment every bucket whose bound covers the value.
        for (i, &le) in BUCKETS_SECONDS.iter().enumerate() {
            if secs <= le {
                hist.buckets[i] += 1;
            }
        }
        Ok(())
    }

    pub fn snapshot(&self, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        let key = self.desc.key(labels).ok()?;
        let series = self.map.get(&key)?;
        let hist = series.lock().unwrap_or_else(PoisonError::into_inner);
        Some(hist.clone())
    }

    fn render(&self, out: &mut String) {
        self.desc.header("histogram", out);
        let mut rows: Vec<(SeriesKey, HistogramSnapshot)> = self
            .map
            .iter()
            .map(|r| {
                let hist = r.value().lock().unwrap_or_else(PoisonError::into_inner);
                (r.key().clone(), hist.clone())
            })
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));

        let name = self.desc.name;
        for (key, hist) in rows {
            let label_str = self.desc.label_str(&key);
            let prefix = if label_str.is_empty() { String::new() } else { format!("{},", label_str) };

            for (i, le) in BUCKETS_SECONDS.iter().enumerate() {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, hist.buckets[i]);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, hist.count);
            let _ = writeln!(out, "{}_sum{} {}", name, braced(&label_str), hist.sum);
            let _ = writeln!(out, "{}_count{} {}", name, braced(&label_str), hist.count);
        }
    }
}

/// Process-wide registry, built once at startup and shared through `AppState`.
#[derive(Debug)]
pub struct MetricRegistry {
    requests_total: Counter,
    request_duration: Histogram,
    db_up: Gauge,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            requests_total: Counter::new(HTTP_REQUESTS_TOTAL, "Total HTTP requests", &["method", "endpoint"]),
            request_duration: Histogram::new(
                HTTP_REQUEST_DURATION_SECONDS,
                "Response time in seconds",
                &["endpoint"],
            ),
            db_up: Gauge::new(DB_UP, "Database liveness as seen by the last health probe", &[]),
        }
    }

    pub fn db_up(&self) -> &Gauge {
        &self.db_up
    }

    fn counter(&self, name: &str) -> Result<&Counter, MetricError> {
        match name {
            HTTP_REQUESTS_TOTAL => Ok(&self.requests_total),
            _ => Err(MetricError::UnknownInstrument(name.to_string())),
        }
    }

    fn histogram(&self, name: &str) -> Result<&Histogram, MetricError> {
        match name {
            HTTP_REQUEST_DURATION_SECONDS => Ok(&self.request_duration),
            _ => Err(MetricError::UnknownInstrument(name.to_string())),
        }
    }

    fn gauge(&self, name: &str) -> Result<&Gauge, MetricError> {
        match name {
            DB_UP => Ok(&self.db_up),
            _ => Err(MetricError::UnknownInstrument(name.to_string())),
        }
    }

    /// Increment the named counter for this exact label combination.
    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) -> Result<(), MetricError> {
        self.counter(name)?.inc(labels)
    }

    /// Record one observation on the named histogram.
    pub fn observe(&self, name: &str, labels: &[(&str, &str)], value: Duration) -> Result<(), MetricError> {
        self.histogram(name)?.observe(labels, value)
    }

    pub fn set_gauge(&self, name: &str, labels: &[(&str, &str)], value: i64) -> Result<(), MetricError> {
        self.gauge(name)?.set(labels, value)
    }

    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> Option<u64> {
        self.counter(name).ok()?.get(labels)
    }

    pub fn histogram_snapshot(&self, name: &str, labels: &[(&str, &str)]) -> Option<HistogramSnapshot> {
        self.histogram(name).ok()?.snapshot(labels)
    }

    /// Render every instrument in Prometheus text exposition format.
    pub fn export(&self) -> String {
        let mut out = String::new();
        self.requests_total.render(&mut out);
        self.request_duration.render(&mut out);
        self.db_up.render(&mut out);
        out
    }
}
