//! Run configuration for one probe run.
//!
//! The CLI layer fills a [`RunConfig`]; the orchestrator consumes it and
//! derives the immutable [`SelectionPolicy`] handed to the selector. Nothing
//! here persists across runs.

use std::path::PathBuf;

/// Immutable per-run selection configuration. `--only-safe` is already
/// folded in by the time this exists.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    pub max_ops_per_service: usize,
    pub include_dry_run: bool,
    pub aggressive: bool,
    pub all_ops: bool,
    /// Accepted but not enforced: the selector never tops the dry-run stage
    /// up to this minimum. Kept so the flag surface matches the tool's
    /// documented interface.
    pub min_dry_run: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_ops_per_service: 30,
            include_dry_run: false,
            aggressive: false,
            all_ops: false,
            min_dry_run: 5,
        }
    }
}

/// Everything the orchestrator needs for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub services: Vec<String>,
    pub region: String,
    pub profile: Option<String>,
    /// Max calls per second, per service.
    pub rate_per_second: u32,
    pub max_ops_per_service: usize,
    pub include_dry_run: bool,
    pub min_dry_run: usize,
    pub aggressive: bool,
    pub all_ops: bool,
    /// Only call read-only ops; masks `include_dry_run` and `aggressive`.
    pub only_safe: bool,
    pub verbose: bool,
    /// Concurrent workers per service (1 = sequential).
    pub threads: usize,
    pub parallel_services: bool,
    /// Root of the botocore-layout service model directory.
    pub models_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            region: "us-east-1".to_string(),
            profile: None,
            rate_per_second: 5,
            max_ops_per_service: 30,
            include_dry_run: false,
            min_dry_run: 5,
            aggressive: false,
            all_ops: false,
            only_safe: false,
            verbose: false,
            threads: 1,
            parallel_services: false,
            models_dir: PathBuf::new(),
        }
    }
}

impl RunConfig {
    /// Derive the selection policy, applying the `only_safe` mask over the
    /// dry-run and aggressive flags.
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy {
            max_ops_per_service: self.max_ops_per_service,
            include_dry_run: self.include_dry_run && !self.only_safe,
            aggressive: self.aggressive && !self.only_safe,
            all_ops: self.all_ops,
            min_dry_run: self.min_dry_run,
        }
    }

    /// Upper bound on concurrently running service pipelines.
    pub fn service_concurrency(&self) -> usize {
        if self.parallel_services {
            self.services.len().clamp(1, 8)
        } else {
            1
        }
    }
}
