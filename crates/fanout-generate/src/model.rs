use fanout_core::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Namespace of targets whose template and specification set none.
    pub default_namespace: String,
    /// Skip a failing specification instead of aborting the run.
    pub continue_on_error: bool,
    /// Append the local cluster record when the registry lacks it.
    pub include_local_cluster: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            continue_on_error: false,
            include_local_cluster: false,
        }
    }
}

/// Summary of one specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecReport {
    pub spec: String,
    pub parameter_sets: u64,
    pub targets: u64,
    pub conflicts_dropped: u64,
}

/// A specification skipped under `continue_on_error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecFailure {
    pub spec: String,
    pub code: String,
    pub message: String,
}

/// Report for a generation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub specs_processed: u64,
    pub records_processed: u64,
    pub targets_generated: u64,
    pub conflicts_dropped: u64,
    pub specs: Vec<SpecReport>,
    pub failures: Vec<SpecFailure>,
}

impl GenerationReport {
    pub fn new(records_processed: u64) -> Self {
        Self {
            records_processed,
            ..Self::default()
        }
    }

    pub fn record_spec(&mut self, report: SpecReport) {
        self.specs_processed += 1;
        self.targets_generated += report.targets;
        self.conflicts_dropped += report.conflicts_dropped;
        self.specs.push(report);
    }

    pub fn record_failure(&mut self, failure: SpecFailure) {
        self.specs_processed += 1;
        self.failures.push(failure);
    }
}
