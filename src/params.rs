//! Sizing of counting bloom filters.
//!
//! Derives the counter-array length and the number of hash functions from the
//! expected number of distinct items and a target false positive rate, using
//! the usual bloom filter optimum:
//!
//! - `m = round(-n * ln(p) / ln(2)^2)`
//! - `k = round(m / n * ln(2))`, capped at `hash_count_cap`

use crate::errors::{DetectorError, Result};

/// Bases of the polynomial hash family, in the order they are handed out.
pub const SEED_PRIMES: [u64; 10] = [127, 149, 179, 197, 233, 257, 283, 313, 379, 401];

/// Default ceiling on the number of hash functions per filter.
pub const HASH_COUNT_CAP: usize = SEED_PRIMES.len();

/// Largest counter array a `Vec<u32>` can hold.
pub const MAX_ARRAY_LENGTH: usize = isize::MAX as usize / size_of::<u32>();

/// Immutable parameters of one filter instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub capacity: usize,
    pub false_positive_rate: f64,
    pub array_length: usize,
    pub hash_count: usize,
    pub seeds: &'static [u64],
}

impl FilterParams {
    /// Sizes a filter with the default hash count ceiling.
    pub fn new(capacity: usize, false_positive_rate: f64) -> Result<Self> {
        Self::with_cap(capacity, false_positive_rate, HASH_COUNT_CAP)
    }

    /// Sizes a filter for `capacity` distinct items at `false_positive_rate`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `capacity` is 0 or needs more than
    /// [`MAX_ARRAY_LENGTH`] counters, the rate is not strictly between 0 and 1,
    /// or `hash_count_cap` is outside `1..=10`.
    pub fn with_cap(
        capacity: usize,
        false_positive_rate: f64,
        hash_count_cap: usize,
    ) -> Result<Self> {
        validate(capacity, false_positive_rate, hash_count_cap)?;

        let ln2 = 2f64.ln();
        let n = capacity as f64;
        let length = (-n * false_positive_rate.ln() / (ln2 * ln2)).round();
        if !length.is_finite() || length > MAX_ARRAY_LENGTH as f64 {
            return Err(DetectorError::invalid_parameter(
                "capacity",
                format!(
                    "{} items at rate {} need {} counters, more than {}",
                    capacity, false_positive_rate, length, MAX_ARRAY_LENGTH
                ),
            ));
        }
        let array_length = (length as usize).max(1);
        let hash_count =
            ((array_length as f64 / n * ln2).round() as usize).clamp(1, hash_count_cap);

        Ok(Self {
            capacity,
            false_positive_rate,
            array_length,
            hash_count,
            seeds: &SEED_PRIMES[..hash_count],
        })
    }
}

/// Checks the sizing inputs without computing anything.
pub fn validate(capacity: usize, false_positive_rate: f64, hash_count_cap: usize) -> Result<()> {
    if capacity == 0 {
        return Err(DetectorError::invalid_parameter(
            "capacity",
            "must be at least 1",
        ));
    }
    // NaN fails both comparisons
    if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
        return Err(DetectorError::invalid_parameter(
            "false_positive_rate",
            format!("must be in (0, 1), got {}", false_positive_rate),
        ));
    }
    if hash_count_cap == 0 || hash_count_cap > SEED_PRIMES.len() {
        return Err(DetectorError::invalid_parameter(
            "hash_count_cap",
            format!(
                "must be in 1..={}, got {}",
                SEED_PRIMES.len(),
                hash_count_cap
            ),
        ));
    }
    Ok(())
}
