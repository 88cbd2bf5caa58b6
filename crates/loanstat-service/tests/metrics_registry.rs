#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use loanstat_service::obs::metrics::{
    MetricError, MetricRegistry, DB_UP, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS,
};

const STATS: &[(&str, &str)] = &[("method", "GET"), ("endpoint", "/api/stats")];

/// Structural check of a Prometheus text export: every sample line is
/// `name[{labels}] value`, and per histogram series the buckets are
/// non-decreasing and `+Inf` equals `_count`.
fn assert_well_formed(text: &str) {
    let mut last_bucket: Option<(String, f64)> = None;
    let mut inf_by_series: Vec<(String, f64)> = Vec::new();

    for line in text.lines() {
        if line.starts_with("# HELP ") || line.starts_with("# TYPE ") {
            continue;
        }
        let (series, value) = line.rsplit_once(' ').unwrap_or_else(|| panic!("no value: {line}"));
        let value: f64 = value.parse().unwrap_or_else(|_| panic!("bad value: {line}"));
        if let Some(open) = series.find('{') {
            assert!(series.ends_with('}'), "unterminated labels: {line}");
            assert!(open > 0, "missing name: {line}");
        }

        if series.contains("_bucket{") {
            let base = series.split(",le=").next().unwrap().to_string();
            if let Some((prev_base, prev)) = &last_bucket {
                if *prev_base == base {
                    assert!(value >= *prev, "buckets decrease: {line}");
                }
            }
            if series.ends_with("le=\"+Inf\"}") {
                inf_by_series.push((base.replace("_bucket", "_count"), value));
            }
            last_bucket = Some((base, value));
        } else if series.contains("_count") {
            let key = series.trim_end_matches('}').to_string();
            let inf = inf_by_series
                .iter()
                .find(|(k, _)| *k == key)
                .unwrap_or_else(|| panic!("count without +Inf bucket: {line}"));
            assert_eq!(inf.1, value, "+Inf != count: {line}");
        }
    }
}

#[test]
fn counter_starts_at_zero_and_increments() {
    let m = MetricRegistry::new();
    assert_eq!(m.counter_value(HTTP_REQUESTS_TOTAL, STATS), None);

    m.increment_counter(HTTP_REQUESTS_TOTAL, STATS).unwrap();
    m.increment_counter(HTTP_REQUESTS_TOTAL, STATS).unwrap();
    assert_eq!(m.counter_value(HTTP_REQUESTS_TOTAL, STATS), Some(2));

    // label order does not matter, the key set does
    m.increment_counter(HTTP_REQUESTS_TOTAL, &[("endpoint", "/api/stats"), ("method", "GET")])
        .unwrap();
    assert_eq!(m.counter_value(HTTP_REQUESTS_TOTAL, STATS), Some(3));
}

#[test]
fn concurrent_increments_are_not_lost() {
    let m = MetricRegistry::new();
    let threads = 8;
    let per_thread = 1_000;

    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                for _ in 0..per_thread {
                    m.increment_counter(HTTP_REQUESTS_TOTAL, STATS).unwrap();
                }
            });
        }
    });

    assert_eq!(m.counter_value(HTTP_REQUESTS_TOTAL, STATS), Some(threads * per_thread));
}

#[test]
fn histogram_count_matches_observations() {
    let m = MetricRegistry::new();
    let labels = &[("endpoint", "/api/loans")];

    thread::scope(|s| {
        let m = &m;
        for i in 0..4u64 {
            s.spawn(move || {
                for j in 0..250u64 {
                    m.observe(HTTP_REQUEST_DURATION_SECONDS, labels, Duration::from_micros(i * 1000 + j))
                        .unwrap();
                }
            });
        }
    });

    let snap = m.histogram_snapshot(HTTP_REQUEST_DURATION_SECONDS, labels).unwrap();
    assert_eq!(snap.count, 1000);
    // every observation is under 5ms, so the first bucket already holds all of them
    assert_eq!(snap.buckets[0], 1000);
    assert!(snap.sum > 0.0);
}

#[test]
fn histogram_buckets_are_cumulative() {
    let m = MetricRegistry::new();
    let labels = &[("endpoint", "/x")];
    m.observe(HTTP_REQUEST_DURATION_SECONDS, labels, Duration::from_millis(1)).unwrap();
    m.observe(HTTP_REQUEST_DURATION_SECONDS, labels, Duration::from_millis(300)).unwrap();
    m.observe(HTTP_REQUEST_DURATION_SECONDS, labels, Duration::from_secs(30)).unwrap();

    let snap = m.histogram_snapshot(HTTP_REQUEST_DURATION_SECONDS, labels).unwrap();
    assert_eq!(snap.count, 3);
    assert_eq!(snap.buckets[0], 1); // le=0.005
    assert_eq!(snap.buckets[7], 2); // le=0.5
    assert_eq!(snap.buckets[13], 2); // le=10, the 30s sample only lands in +Inf
}

#[test]
fn label_mismatch_is_rejected_and_nothing_is_recorded() {
    let m = MetricRegistry::new();

    let err = m.increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "GET")]).unwrap_err();
    assert!(matches!(err, MetricError::LabelMismatch { name: HTTP_REQUESTS_TOTAL, .. }));

    let err = m
        .increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "GET"), ("path", "/")])
        .unwrap_err();
    assert!(matches!(err, MetricError::LabelMismatch { .. }));

    let err = m
        .increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "GET"), ("method", "POST")])
        .unwrap_err();
    assert!(matches!(err, MetricError::LabelMismatch { .. }));

    let err = m
        .observe(HTTP_REQUEST_DURATION_SECONDS, &[("endpoint", "/"), ("method", "GET")], Duration::ZERO)
        .unwrap_err();
    assert!(matches!(err, MetricError::LabelMismatch { .. }));

    assert!(!m.export().contains("http_requests_total{"));
}

#[test]
fn unknown_instrument_is_rejected() {
    let m = MetricRegistry::new();
    assert_eq!(
        m.increment_counter("nope_total", &[]),
        Err(MetricError::UnknownInstrument("nope_total".into()))
    );
    assert!(m.observe(HTTP_REQUESTS_TOTAL, STATS, Duration::ZERO).is_err());
}

#[test]
fn export_renders_prometheus_text() {
    let m = MetricRegistry::new();
    m.increment_counter(HTTP_REQUESTS_TOTAL, STATS).unwrap();
    m.increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "POST"), ("endpoint", "/api/loans")])
        .unwrap();
    m.observe(HTTP_REQUEST_DURATION_SECONDS, &[("endpoint", "/api/stats")], Duration::from_millis(20))
        .unwrap();
    m.set_gauge(DB_UP, &[], 1).unwrap();

    let text = m.export();
    assert!(text.contains("# HELP http_requests_total Total HTTP requests\n"));
    assert!(text.contains("# TYPE http_requests_total counter\n"));
    assert!(text.contains("http_requests_total{method=\"GET\",endpoint=\"/api/stats\"} 1\n"));
    assert!(text.contains("http_requests_total{method=\"POST\",endpoint=\"/api/loans\"} 1\n"));
    assert!(text.contains("# TYPE http_request_duration_seconds histogram\n"));
    assert!(text.contains("http_request_duration_seconds_bucket{endpoint=\"/api/stats\",le=\"0.01\"} 0\n"));
    assert!(text.contains("http_request_duration_seconds_bucket{endpoint=\"/api/stats\",le=\"0.025\"} 1\n"));
    assert!(text.contains("http_request_duration_seconds_bucket{endpoint=\"/api/stats\",le=\"+Inf\"} 1\n"));
    assert!(text.contains("http_request_duration_seconds_count{endpoint=\"/api/stats\"} 1\n"));
    assert!(text.contains("http_request_duration_seconds_sum{endpoint=\"/api/stats\"} 0.02\n"));
    assert!(text.contains("# TYPE db_up gauge\ndb_up 1\n"));
    assert_well_formed(&text);

    // stable across calls
    assert_eq!(text, m.export());
}

#[test]
fn export_escapes_label_values() {
    let m = MetricRegistry::new();
    m.increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "GET"), ("endpoint", "/a\"b\\c\nd")])
        .unwrap();
    let text = m.export();
    assert!(text.contains(r#"endpoint="/a\"b\\c\nd""#));
}

#[test]
fn export_concurrent_with_updates_stays_well_formed() {
    let m = MetricRegistry::new();
    let done = AtomicBool::new(false);

    thread::scope(|s| {
        for t in 0..4 {
            let m = &m;
            let done = &done;
            s.spawn(move || {
                let mut i = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let endpoint = format!("/api/e{}", (i + t) % 16);
                    m.increment_counter(HTTP_REQUESTS_TOTAL, &[("method", "GET"), ("endpoint", endpoint.as_str())])
                        .unwrap();
                    m.observe(HTTP_REQUEST_DURATION_SECONDS, &[("endpoint", endpoint.as_str())], Duration::from_micros(i % 20_000))
                        .unwrap();
                    i += 1;
                }
            });
        }

        let exports: Vec<String> = (0..200).map(|_| m.export()).collect();
        done.store(true, Ordering::Relaxed);
        for text in &exports {
            assert_well_formed(text);
        }
    });
}
