//! Counting bloom filter over token strings.
//!
//! A counting bloom filter replaces the bits of a classic bloom filter with
//! counters, so items can be deleted as well as inserted. It can tell you
//! whether a string is definitely not in the set or might be in the set.
//!
//! # Deleting false positives
//!
//! Counters are shared between items. Deleting a string that was never
//! inserted but happens to test positive decrements counters owned by other
//! strings, which can later make those strings test negative. This is
//! inherent to counting bloom filters and is not guarded against beyond the
//! `search` precondition of [`CountingBloomFilter::delete`].
//!
//! # Note on Thread Safety
//!
//! `CountingBloomFilter` is not thread-safe. Wrap it in a `Mutex` when sharing
//! across threads; concurrent `search` calls without mutation are fine.

use anyhow::anyhow;
use pyo3::prelude::*;

use crate::errors::{DetectorError, Result, catch_panic};
use crate::hash::HashFamily;
use crate::params::FilterParams;
use crate::window::windows;

/// A counting bloom filter with fixed size and hash family.
///
/// # Examples
///
/// ```ignore
/// let mut filter = CountingBloomFilter::new(10000, 0.001)?;
/// filter.insert("thequickbrownfox");
/// assert!(filter.search("thequickbrownfox"));
/// filter.delete("thequickbrownfox")?;
/// ```
#[pyclass(module = "plagiarism_core")]
#[derive(Debug, Clone)]
pub struct CountingBloomFilter {
    params: FilterParams,
    family: HashFamily,
    counters: Vec<u32>,
}

impl CountingBloomFilter {
    /// Creates an empty filter from already validated parameters.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the counter array cannot be allocated.
    pub fn with_params(params: FilterParams) -> Result<Self> {
        let mut counters: Vec<u32> = Vec::new();
        if let Err(e) = counters.try_reserve_exact(params.array_length) {
            return Err(DetectorError::invalid_parameter(
                "capacity",
                format!("cannot allocate {} counters: {}", params.array_length, e),
            ));
        }
        counters.resize(params.array_length, 0);

        log::debug!(
            "CountingBloomFilter created: capacity={}, fpr={}, array_length={}, hash_count={}",
            params.capacity,
            params.false_positive_rate,
            params.array_length,
            params.hash_count
        );

        Ok(Self {
            family: HashFamily::new(&params),
            counters,
            params,
        })
    }

    /// Read-only view of the counter array.
    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    /// Inserts the key of every window of `window_size` tokens.
    ///
    /// Returns the number of windows inserted, 0 when `tokens` is shorter than
    /// the window.
    pub fn insert_windows<S: AsRef<str>>(
        &mut self,
        tokens: &[S],
        window_size: usize,
    ) -> Result<usize> {
        let windows = windows(tokens, window_size)?;
        let count = windows.len();
        for window in windows {
            self.insert(&window.concat());
        }
        log::debug!(
            "CountingBloomFilter indexed {} windows of {} tokens",
            count,
            window_size
        );
        Ok(count)
    }

    /// Checks the decrement of `indices` keeps every counter non-negative.
    ///
    /// An index listed twice needs a counter of at least 2.
    fn can_decrement(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&idx| {
            let needed = indices.iter().filter(|&&other| other == idx).count();
            self.counters[idx] as usize >= needed
        })
    }

    fn decrement(&mut self, index: usize) -> anyhow::Result<()> {
        let counter = self
            .counters
            .get_mut(index)
            .ok_or_else(|| anyhow!("counter index {} out of bounds", index))?;
        *counter = counter
            .checked_sub(1)
            .ok_or_else(|| anyhow!("counter {} would drop below zero", index))?;
        Ok(())
    }
}

#[pymethods]
impl CountingBloomFilter {
    /// Creates a filter sized for `capacity` distinct items at the given false
    /// positive rate.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Expected number of distinct items, at least 1
    /// * `fpr` - Target false positive rate, strictly between 0 and 1
    ///
    /// # Errors
    ///
    /// `InvalidParameter` before anything is allocated if either argument is
    /// out of range.
    #[new]
    pub fn new(capacity: usize, fpr: f64) -> Result<Self> {
        Self::with_params(FilterParams::new(capacity, fpr)?)
    }

    /// Length of the counter array.
    #[getter]
    pub fn array_length(&self) -> usize {
        self.params.array_length
    }

    /// Number of hash functions.
    #[getter]
    pub fn hash_count(&self) -> usize {
        self.params.hash_count
    }

    #[getter]
    pub fn capacity(&self) -> usize {
        self.params.capacity
    }

    #[getter]
    pub fn false_positive_rate(&self) -> f64 {
        self.params.false_positive_rate
    }

    /// Counter indices addressed by `item`, one per hash function.
    #[must_use]
    pub fn hash_indices(&self, item: &str) -> Vec<usize> {
        self.family.indices(item)
    }

    /// Adds `item`, incrementing each addressed counter once per occurrence.
    ///
    /// Inserting the same item twice increments its counters twice.
    pub fn insert(&mut self, item: &str) {
        for idx in self.family.indices(item) {
            let counter = &mut self.counters[idx];
            if *counter == u32::MAX {
                log::warn!("CountingBloomFilter insert: counter {} saturated", idx);
                continue;
            }
            *counter += 1;
        }
    }

    /// Tests whether `item` might be in the set.
    ///
    /// Returns `false` if the item is definitely not in the set, `true` if it
    /// might be (could be a false positive).
    #[must_use]
    pub fn search(&self, item: &str) -> bool {
        self.family
            .indices(item)
            .into_iter()
            .all(|idx| self.counters[idx] > 0)
    }

    /// Removes one occurrence of `item`.
    ///
    /// # Errors
    ///
    /// `NotFound` when `search(item)` is false, or when the item addresses
    /// one counter more times than that counter's value. Nothing is modified
    /// in either case.
    pub fn delete(&mut self, item: &str) -> Result<()> {
        let indices = self.family.indices(item);
        if !self.search(item) || !self.can_decrement(&indices) {
            return Err(DetectorError::not_found(item));
        }
        for idx in indices {
            self.decrement(idx)?;
        }
        Ok(())
    }

    /// Snapshot of the counter array.
    #[pyo3(name = "counters")]
    fn py_counters(&self) -> Vec<u32> {
        self.counters.clone()
    }

    fn seeds(&self) -> Vec<u64> {
        self.params.seeds.to_vec()
    }

    /// Inserts every window of `window_size` tokens and returns how many.
    #[pyo3(name = "insert_windows")]
    fn py_insert_windows(
        &mut self,
        tokens: Vec<String>,
        window_size: usize,
    ) -> PyResult<usize> {
        use std::panic::AssertUnwindSafe;
        catch_panic(
            AssertUnwindSafe(|| self.insert_windows(&tokens, window_size)),
            "insert_windows",
        )?
        .map_err(PyErr::from)
    }

    fn __contains__(&self, item: &str) -> bool {
        self.search(item)
    }

    fn __repr__(&self) -> String {
        format!(
            "CountingBloomFilter(capacity={}, fpr={}, array_length={}, hash_count={})",
            self.params.capacity,
            self.params.false_positive_rate,
            self.params.array_length,
            self.params.hash_count
        )
    }
}
