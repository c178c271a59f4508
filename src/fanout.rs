//! Parallel per-entry execution for batch operations

use crate::error::BatchFailure;
use crate::{Error, Result};
use rayon::prelude::*;

/// Outcome of running one call per entry
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Entries whose call succeeded, in input order
    pub succeeded: Vec<String>,
    /// Entries whose call failed, in input order
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold into a `Result`, naming the batch in the error
    pub fn into_result(self, operation: &'static str) -> Result<Vec<String>> {
        if self.failed.is_empty() {
            Ok(self.succeeded)
        } else {
            Err(self.into_error(operation))
        }
    }

    pub fn into_error(self, operation: &'static str) -> Error {
        Error::Batch {
            operation,
            failed: self.failed,
            completed: self.succeeded,
        }
    }
}

/// A bounded thread pool that runs one call per entry
///
/// Every entry is attempted even when others fail; there is no
/// cancellation and no ordering between calls.
pub struct Fanout {
    pool: rayon::ThreadPool,
    width: usize,
}

impl Fanout {
    pub fn new(max_parallel: usize) -> Result<Self> {
        if max_parallel == 0 {
            return Err(Error::Config("max_parallel must be at least 1".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_parallel)
            .thread_name(|i| format!("mfs-fanout-{}", i))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build thread pool: {}", e)))?;

        Ok(Fanout {
            pool,
            width: max_parallel,
        })
    }

    /// Number of calls that may run at once
    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `call` for every name and collect the outcome
    pub fn run<F>(&self, names: &[String], call: F) -> BatchOutcome
    where
        F: Fn(&str) -> Result<()> + Sync + Send,
    {
        let results: Vec<(String, Result<()>)> = self.pool.install(|| {
            names
                .par_iter()
                .map(|name| (name.clone(), call(name.as_str())))
                .collect()
        });

        let mut outcome = BatchOutcome::default();
        for (name, result) in results {
            match result {
                Ok(()) => outcome.succeeded.push(name),
                Err(e) => outcome.failed.push(BatchFailure::new(name, &e)),
            }
        }
        outcome
    }
}
