//! Index-wide configuration.
//!
//! Every per-length filter of a [`PlagiarismIndex`](crate::detector::PlagiarismIndex)
//! is sized from the same capacity and false positive rate; the window length
//! only decides which windows go in.

use pyo3::prelude::*;

use crate::errors::{DetectorError, Result};
use crate::params::{self, FilterParams, HASH_COUNT_CAP};

pub const DEFAULT_CAPACITY: usize = 10000;
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.001;
pub const DEFAULT_WINDOW_SIZE: usize = 4;

/// Configuration of a plagiarism index.
#[pyclass(module = "plagiarism_core")]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Expected number of distinct windows inserted into one filter.
    #[pyo3(get, set)]
    pub capacity: usize,

    /// Target false positive rate of every filter, in (0, 1).
    #[pyo3(get, set)]
    pub false_positive_rate: f64,

    /// Number of tokens in one unit of comparison.
    #[pyo3(get, set)]
    pub fixed_window_size: usize,

    /// Ceiling on hash functions per filter.
    #[pyo3(get, set)]
    pub hash_count_cap: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            fixed_window_size: DEFAULT_WINDOW_SIZE,
            hash_count_cap: HASH_COUNT_CAP,
        }
    }
}

impl DetectorConfig {
    /// Sets the expected number of distinct windows per filter.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the target false positive rate.
    #[must_use]
    pub fn with_false_positive_rate(mut self, rate: f64) -> Self {
        self.false_positive_rate = rate;
        self
    }

    /// Sets the comparison window length.
    #[must_use]
    pub fn with_fixed_window_size(mut self, size: usize) -> Self {
        self.fixed_window_size = size;
        self
    }

    /// Sets the hash function ceiling.
    #[must_use]
    pub fn with_hash_count_cap(mut self, cap: usize) -> Self {
        self.hash_count_cap = cap;
        self
    }

    /// Filter parameters shared by every window length.
    pub fn filter_params(&self) -> Result<FilterParams> {
        FilterParams::with_cap(self.capacity, self.false_positive_rate, self.hash_count_cap)
    }
}

#[pymethods]
impl DetectorConfig {
    #[new]
    #[pyo3(signature = (
        capacity = DEFAULT_CAPACITY,
        false_positive_rate = DEFAULT_FALSE_POSITIVE_RATE,
        fixed_window_size = DEFAULT_WINDOW_SIZE,
        hash_count_cap = HASH_COUNT_CAP,
    ))]
    pub fn new(
        capacity: usize,
        false_positive_rate: f64,
        fixed_window_size: usize,
        hash_count_cap: usize,
    ) -> Result<Self> {
        let config = Self {
            capacity,
            false_positive_rate,
            fixed_window_size,
            hash_count_cap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every option against its domain.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        params::validate(self.capacity, self.false_positive_rate, self.hash_count_cap)?;
        if self.fixed_window_size == 0 {
            return Err(DetectorError::invalid_parameter(
                "fixed_window_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectorConfig(capacity={}, false_positive_rate={}, fixed_window_size={}, \
             hash_count_cap={})",
            self.capacity,
            self.false_positive_rate,
            self.fixed_window_size,
            self.hash_count_cap
        )
    }
}
