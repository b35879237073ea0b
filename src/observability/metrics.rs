//! Roster metrics
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the host
//! process installs a recorder.

pub mod import {
    /// Record a finished import and how many profiles it produced
    pub fn completed(format: &str, profiles: usize) {
        ::metrics::counter!("roster_import_completed_total", "format" => format.to_string())
            .increment(1);
        ::metrics::histogram!("roster_import_batch_size").record(profiles as f64);
        ::metrics::counter!("roster_import_profiles_total").increment(profiles as u64);
    }

    /// Record an import that persisted nothing
    pub fn failed(reason: &'static str) {
        ::metrics::counter!("roster_import_failed_total", "reason" => reason).increment(1);
    }

    /// Record issues found by the quality gate, by severity
    pub fn issues_found(severity: &str, count: usize) {
        if count == 0 {
            return;
        }
        ::metrics::counter!("roster_import_issues_total", "severity" => severity.to_string())
            .increment(count as u64);
    }
}

pub mod export {
    pub fn completed(format: &str, children: usize) {
        ::metrics::counter!("roster_export_completed_total", "format" => format.to_string())
            .increment(1);
        ::metrics::histogram!("roster_export_rows").record(children as f64);
    }
}

pub mod store {
    pub fn timed_out(operation: &str) {
        ::metrics::counter!("roster_store_timeouts_total", "operation" => operation.to_string())
            .increment(1);
    }
}
