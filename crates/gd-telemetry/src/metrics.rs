use ahash::AHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, RwLock};

/// Counter bumped once per status report, labelled by `outcome`.
pub const STATUS_UPDATES: &str = "door_status_updates_total";
/// Counter bumped once per address observation, labelled by `outcome`.
pub const REACHABILITY_UPDATES: &str = "reachability_updates_total";
/// Counter bumped once per outbound command, labelled by `command` and `outcome`.
pub const COMMANDS_DISPATCHED: &str = "commands_dispatched_total";
/// Counter bumped by the request middleware.
pub const API_REQUESTS: &str = "api_requests_total";
/// Histograms of handler and outbound command latency, in seconds.
pub const API_REQUEST_DURATION: &str = "api_request_duration_seconds";
pub const COMMAND_DURATION: &str = "command_duration_seconds";

const DURATION_BUCKETS: [f64; 10] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 10.0];

/// Sorted `key=value` pairs distinguishing series of one metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Labels(Vec<(String, String)>);

impl Labels {
    fn new(pairs: &[(&str, &str)]) -> Self {
        let mut v: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        v.sort();
        Self(v)
    }

    fn render(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let inner: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}=\"{v}\"")).collect();
        format!("{{{}}}", inner.join(","))
    }
}

#[derive(Debug)]
struct Histogram {
    /// Per-bucket (non-cumulative) observation counts.
    counts: [AtomicU64; DURATION_BUCKETS.len()],
    /// Sum of observations in microseconds, kept integral for atomic adds.
    sum_micros: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    fn new() -> Self {
        Self {
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    fn observe(&self, seconds: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add((seconds.max(0.0) * 1_000_000.0) as u64, Ordering::Relaxed);
        if let Some(i) = DURATION_BUCKETS.iter().position(|b| seconds <= *b) {
            self.counts[i].fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Process-wide counters and latency histograms.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: RwLock<AHashMap<(String, Labels), AtomicU64>>,
    histograms: RwLock<AHashMap<String, Histogram>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_counter(&self, name: &str, labels: &[(&str, &str)]) {
        let key = (name.to_string(), Labels::new(labels));
        if let Ok(map) = self.counters.read() {
            if let Some(c) = map.get(&key) {
                c.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        if let Ok(mut map) = self.counters.write() {
            map.entry(key)
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = (name.to_string(), Labels::new(labels));
        self.counters
            .read()
            .ok()
            .and_then(|map| map.get(&key).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    pub fn record_duration(&self, name: &str, seconds: f64) {
        if let Ok(map) = self.histograms.read() {
            if let Some(h) = map.get(name) {
                h.observe(seconds);
                return;
            }
        }
        if let Ok(mut map) = self.histograms.write() {
            map.entry(name.to_string())
                .or_insert_with(Histogram::new)
                .observe(seconds);
        }
    }

    /// Prometheus text exposition format, series sorted for stable output.
    pub fn export_prometheus(&self) -> String {
        let mut out = String::new();

        if let Ok(map) = self.counters.read() {
            let mut series: Vec<(&String, &Labels, u64)> = map
                .iter()
                .map(|((name, labels), v)| (name, labels, v.load(Ordering::Relaxed)))
                .collect();
            series.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
            let mut last: Option<&String> = None;
            for (name, labels, value) in series {
                if last != Some(name) {
                    out.push_str(&format!("# TYPE {name} counter\n"));
                    last = Some(name);
                }
                out.push_str(&format!("{name}{} {value}\n", labels.render()));
            }
        }

        if let Ok(map) = self.histograms.read() {
            let mut names: Vec<&String> = map.keys().collect();
            names.sort();
            for name in names {
                let h = &map[name];
                out.push_str(&format!("# TYPE {name} histogram\n"));
                let mut cumulative = 0u64;
                for (i, bound) in DURATION_BUCKETS.iter().enumerate() {
                    cumulative += h.counts[i].load(Ordering::Relaxed);
                    out.push_str(&format!("{name}_bucket{{le=\"{bound}\"}} {cumulative}\n"));
                }
                let count = h.count.load(Ordering::Relaxed);
                let sum = h.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
                out.push_str(&format!("{name}_bucket{{le=\"+Inf\"}} {count}\n"));
                out.push_str(&format!("{name}_sum {sum}\n"));
                out.push_str(&format!("{name}_count {count}\n"));
            }
        }

        out
    }

    /// Counters as a flat JSON object keyed by `name{labels}`.
    pub fn export_json(&self) -> serde_json::Value {
        let mut counters = serde_json::Map::new();
        if let Ok(map) = self.counters.read() {
            for ((name, labels), v) in map.iter() {
                counters.insert(
                    format!("{name}{}", labels.render()),
                    serde_json::json!(v.load(Ordering::Relaxed)),
                );
            }
        }
        serde_json::json!({ "counters": counters })
    }
}

/// The collector shared by the whole process.
pub fn global_metrics() -> &'static MetricsCollector {
    static INSTANCE: OnceLock<MetricsCollector> = OnceLock::new();
    INSTANCE.get_or_init(MetricsCollector::new)
}
