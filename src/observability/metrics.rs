//! Metrics recorded by the variable engine.
//!
//! # Metrics
//! - `variables_cycle_detected_total` (counter): recursion budget exhausted
//! - `variables_evaluation_errors_total` (counter): getter failures by `kind`
//! - `variables_regex_exec_total` (counter): pattern executions by `outcome`
//! - `variables_map_lookups_total` (counter): map lookups by `outcome`
//!
//! # Design Decisions
//! - The library only records; installing an exporter is up to the embedding server
//! - Without a recorder every call is a no-op

use metrics::counter;

pub fn record_cycle_detected() {
    counter!("variables_cycle_detected_total").increment(1);
}

pub fn record_evaluation_error(kind: &'static str) {
    counter!("variables_evaluation_errors_total", "kind" => kind).increment(1);
}

/// `outcome` is one of `matched`, `declined`, `fault`.
pub fn record_regex_exec(outcome: &'static str) {
    counter!("variables_regex_exec_total", "outcome" => outcome).increment(1);
}

/// `outcome` is one of `exact`, `regex`, `default`, `miss`, `fault`.
pub fn record_map_lookup(outcome: &'static str) {
    counter!("variables_map_lookups_total", "outcome" => outcome).increment(1);
}
