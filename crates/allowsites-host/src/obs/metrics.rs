//! Counter registry with dynamic labels backed by `DashMap`.
//!
//! Labels are flattened into sorted key vectors so rendering is
//! deterministic per series.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use allowsites_core::policy::Decision;

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let mut key: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        key.sort();

        let counter = self.map.entry(key).or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| {
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (label_str, r.value().load(Ordering::Relaxed))
            })
            .collect();
        rows.sort();
        for (labels, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", name, labels, val);
        }
    }
}

#[derive(Default)]
pub struct HostMetrics {
    /// Policy decisions by call site, outcome and reason.
    pub decisions: CounterVec,
    pub http_requests: CounterVec,
}

impl HostMetrics {
    pub fn record_decision(&self, call_site: &str, decision: Decision) {
        let outcome = if decision.is_allowed() { "allowed" } else { "denied" };
        self.decisions.inc(&[
            ("call_site", call_site),
            ("outcome", outcome),
            ("reason", decision.as_str()),
        ]);
    }

    pub fn record_request(&self, route: &str, status: u16) {
        let status = status.to_string();
        self.http_requests.inc(&[("route", route), ("status", &status)]);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.decisions.render("allowsites_decisions_total", &mut out);
        self.http_requests.render("allowsites_http_requests_total", &mut out);
        out
    }
}
