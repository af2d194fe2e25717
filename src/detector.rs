//! Plagiarism index over a reference document.
//!
//! The index keeps one [`CountingBloomFilter`] per window length. A filter for
//! length `w` holds every `w`-token window of the reference document and is
//! built the first time a query of that length arrives, then reused for the
//! lifetime of the index.
//!
//! # Thread Safety
//!
//! Queries may populate a filter, so every query takes `&mut self`. Users must
//! wrap a shared `PlagiarismIndex` in a `Mutex`.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;

use pyo3::prelude::*;

use crate::config::DetectorConfig;
use crate::document::{split_phrase, tokenize, tokenize_file};
use crate::errors::{DetectorError, Result, catch_panic};
use crate::filter::CountingBloomFilter;
use crate::params::FilterParams;
use crate::window::{TokenWindow, window_count, windows};

/// Lifecycle of the filter for one window length.
///
/// `Absent` is the initial state. `Populated` is reached once, by
/// [`PlagiarismIndex::ensure_filter`], and never left.
#[pyclass(eq, eq_int, module = "plagiarism_core")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    Absent,
    Populated,
}

/// Approximate overlap detector built from a reference document.
#[pyclass(module = "plagiarism_core")]
#[derive(Debug)]
pub struct PlagiarismIndex {
    reference: Vec<String>,
    config: DetectorConfig,
    params: FilterParams,
    filters: HashMap<usize, CountingBloomFilter>,
}

impl PlagiarismIndex {
    /// Creates an index over already tokenized reference text.
    ///
    /// No filter is built until the first query.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `config` does not validate.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let reference = tokenize("The quick brown fox jumps over the lazy dog.");
    /// let mut index = PlagiarismIndex::new(reference, DetectorConfig::default())?;
    /// assert_eq!(index.plagiarism_ratio(&["the", "quick", "brown", "fox"])?, 1.0);
    /// ```
    pub fn new(reference: Vec<String>, config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        let params = config.filter_params()?;

        log::debug!(
            "PlagiarismIndex created: reference_tokens={}, window_size={}, \
             array_length={}, hash_count={}",
            reference.len(),
            config.fixed_window_size,
            params.array_length,
            params.hash_count
        );

        Ok(Self {
            reference,
            config,
            params,
            filters: HashMap::new(),
        })
    }

    /// Tokenizes `text` and indexes it.
    pub fn from_text(text: &str, config: DetectorConfig) -> Result<Self> {
        Self::new(tokenize(text), config)
    }

    /// Reads, tokenizes and indexes the document at `path`.
    ///
    /// # Errors
    ///
    /// `Document` if the file cannot be read.
    pub fn from_path(path: impl Into<PathBuf>, config: DetectorConfig) -> Result<Self> {
        Self::new(read_tokens(path.into())?, config)
    }

    /// The filter for `window_size`, if it has been built.
    pub fn filter(&self, window_size: usize) -> Option<&CountingBloomFilter> {
        self.filters.get(&window_size)
    }

    /// Moves `window_size` from `Absent` to `Populated` if needed.
    ///
    /// Building inserts every reference window of that length. Later calls
    /// return the same filter untouched.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `window_size` is 0 or the counters cannot be
    /// allocated.
    pub fn ensure_filter(&mut self, window_size: usize) -> Result<&CountingBloomFilter> {
        if window_size == 0 {
            return Err(DetectorError::invalid_parameter(
                "window_size",
                "must be at least 1",
            ));
        }

        match self.filters.entry(window_size) {
            Entry::Occupied(slot) => Ok(&*slot.into_mut()),
            Entry::Vacant(slot) => {
                let expected = window_count(self.reference.len(), window_size);
                if expected > self.params.capacity {
                    log::warn!(
                        "PlagiarismIndex: {} windows of {} tokens exceed filter capacity {}",
                        expected,
                        window_size,
                        self.params.capacity
                    );
                }
                let mut filter = CountingBloomFilter::with_params(self.params.clone())?;
                let inserted = filter.insert_windows(&self.reference, window_size)?;
                log::debug!(
                    "PlagiarismIndex populated filter: window_size={}, windows={}",
                    window_size,
                    inserted
                );
                Ok(&*slot.insert(filter))
            }
        }
    }

    /// Tests whether the window made of `tokens` might occur in the reference.
    ///
    /// The window length is `tokens.len()`; its filter is built on first use.
    pub fn is_window_present<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<bool> {
        let key = TokenWindow::new(tokens).concat();
        let present = self.ensure_filter(tokens.len())?.search(&key);
        log::trace!("Window {:?} present={}", key, present);
        Ok(present)
    }

    /// Fraction of the candidate's windows of the configured length found in
    /// the reference.
    pub fn plagiarism_ratio<S: AsRef<str>>(&mut self, candidate: &[S]) -> Result<f64> {
        self.plagiarism_ratio_with(candidate, self.config.fixed_window_size)
    }

    /// Fraction of the candidate's `window_size` windows found in the reference.
    ///
    /// A candidate shorter than the window has nothing to compare and scores
    /// `0.0`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `window_size` is 0.
    pub fn plagiarism_ratio_with<S: AsRef<str>>(
        &mut self,
        candidate: &[S],
        window_size: usize,
    ) -> Result<f64> {
        let candidate_windows = windows(candidate, window_size)?;
        let total = candidate_windows.len();
        if total == 0 {
            log::trace!(
                "Candidate of {} tokens is shorter than window {}, ratio 0",
                candidate.len(),
                window_size
            );
            return Ok(0.0);
        }

        let filter = self.ensure_filter(window_size)?;
        let hits = candidate_windows
            .filter(|window| filter.search(&window.concat()))
            .count();

        let ratio = hits as f64 / total as f64;
        log::trace!(
            "Plagiarism ratio: {}/{} windows of {} tokens = {}",
            hits,
            total,
            window_size,
            ratio
        );
        Ok(ratio)
    }

    /// Reads and tokenizes the candidate document at `path`, then scores it
    /// with the configured window length.
    ///
    /// # Errors
    ///
    /// `Document` if the file cannot be read.
    pub fn check_path(&mut self, path: impl Into<PathBuf>) -> Result<f64> {
        let candidate = read_tokens(path.into())?;
        self.plagiarism_ratio(&candidate)
    }
}

fn read_tokens(path: PathBuf) -> Result<Vec<String>> {
    tokenize_file(path).map_err(|e| DetectorError::document(format!("{:#}", e)))
}

#[pymethods]
impl PlagiarismIndex {
    #[new]
    #[pyo3(signature = (reference_tokens, config = None))]
    fn py_new(reference_tokens: Vec<String>, config: Option<DetectorConfig>) -> Result<Self> {
        Self::new(reference_tokens, config.unwrap_or_default())
    }

    #[staticmethod]
    #[pyo3(name = "from_text", signature = (text, config = None))]
    fn py_from_text(text: &str, config: Option<DetectorConfig>) -> Result<Self> {
        Self::from_text(text, config.unwrap_or_default())
    }

    #[staticmethod]
    #[pyo3(name = "from_path", signature = (path, config = None))]
    fn py_from_path(path: PathBuf, config: Option<DetectorConfig>) -> Result<Self> {
        Self::from_path(path, config.unwrap_or_default())
    }

    /// State of the filter for `window_size`.
    #[must_use]
    pub fn filter_state(&self, window_size: usize) -> FilterState {
        if self.filters.contains_key(&window_size) {
            FilterState::Populated
        } else {
            FilterState::Absent
        }
    }

    /// Window lengths whose filter has been built, ascending.
    #[must_use]
    pub fn indexed_window_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self.filters.keys().copied().collect();
        sizes.sort_unstable();
        sizes
    }

    /// Checks a space-separated phrase against the reference.
    ///
    /// The phrase length in words selects the filter.
    pub fn is_phrase_present(&mut self, phrase: &str) -> Result<bool> {
        let words = split_phrase(phrase);
        self.is_window_present(&words)
    }

    #[getter]
    fn reference_len(&self) -> usize {
        self.reference.len()
    }

    #[getter(config)]
    fn py_config(&self) -> DetectorConfig {
        self.config.clone()
    }

    /// Copy of the filter for `window_size`, `None` while it is absent.
    #[pyo3(name = "filter")]
    fn py_filter(&self, window_size: usize) -> Option<CountingBloomFilter> {
        self.filter(window_size).cloned()
    }

    #[pyo3(name = "ensure_filter")]
    fn py_ensure_filter(&mut self, window_size: usize) -> PyResult<()> {
        use std::panic::AssertUnwindSafe;
        catch_panic(
            AssertUnwindSafe(|| self.ensure_filter(window_size).map(|_| ())),
            "ensure_filter",
        )?
        .map_err(PyErr::from)
    }

    #[pyo3(name = "is_window_present")]
    fn py_is_window_present(&mut self, tokens: Vec<String>) -> PyResult<bool> {
        use std::panic::AssertUnwindSafe;
        catch_panic(
            AssertUnwindSafe(|| self.is_window_present(&tokens)),
            "is_window_present",
        )?
        .map_err(PyErr::from)
    }

    #[pyo3(name = "plagiarism_ratio", signature = (candidate, window_size = None))]
    fn py_plagiarism_ratio(
        &mut self,
        candidate: Vec<String>,
        window_size: Option<usize>,
    ) -> PyResult<f64> {
        use std::panic::AssertUnwindSafe;
        let window_size = window_size.unwrap_or(self.config.fixed_window_size);
        catch_panic(
            AssertUnwindSafe(|| self.plagiarism_ratio_with(&candidate, window_size)),
            "plagiarism_ratio",
        )?
        .map_err(PyErr::from)
    }

    /// Tokenizes `text` and scores it against the reference.
    fn check_text(&mut self, text: &str) -> PyResult<f64> {
        use std::panic::AssertUnwindSafe;
        let candidate = tokenize(text);
        catch_panic(
            AssertUnwindSafe(|| self.plagiarism_ratio(&candidate)),
            "check_text",
        )?
        .map_err(PyErr::from)
    }

    /// Reads the candidate document at `path` and scores it.
    #[pyo3(name = "check_path")]
    fn py_check_path(&mut self, path: PathBuf) -> PyResult<f64> {
        use std::panic::AssertUnwindSafe;
        catch_panic(AssertUnwindSafe(|| self.check_path(path)), "check_path")?
            .map_err(PyErr::from)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rand::Rng;
    use rand::seq::SliceRandom;

    use super::*;

    const FOX: &str = "the quick brown fox jumps over the lazy dog";

    fn fox_index() -> PlagiarismIndex {
        let config = DetectorConfig::default();
        PlagiarismIndex::from_text(FOX, config).unwrap()
    }

    fn temp_document(name: &str, text: &str) -> PathBuf {
        let name = format!("plagiarism_core_{}_{}.txt", name, std::process::id());
        let path = std::env::temp_dir().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_matching_prefix() {
        let mut index = fox_index();
        let ratio = index
            .plagiarism_ratio(&["the", "quick", "brown", "fox"])
            .unwrap();
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_disjoint_words() {
        let mut index = fox_index();
        let ratio = index
            .plagiarism_ratio(&["completely", "different", "words", "here"])
            .unwrap();
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_short_candidate_scores_zero() {
        let mut index = fox_index();
        assert_eq!(index.plagiarism_ratio(&["the", "quick"]).unwrap(), 0.0);
        let empty: [&str; 0] = [];
        assert_eq!(index.plagiarism_ratio(&empty).unwrap(), 0.0);
        // nothing to compare, nothing built
        assert!(index.indexed_window_sizes().is_empty());
    }

    #[test]
    fn test_self_comparison() {
        let mut index = fox_index();
        let tokens = tokenize(FOX);
        assert_eq!(index.plagiarism_ratio(&tokens).unwrap(), 1.0);
        for w in 1..=tokens.len() {
            assert_eq!(index.plagiarism_ratio_with(&tokens, w).unwrap(), 1.0);
        }
    }

    #[test]
    fn test_partial_overlap() {
        let mut index = fox_index();
        // windows: "the quick brown fox" hits, "quick brown fox sleeps" misses
        let ratio = index
            .plagiarism_ratio(&["the", "quick", "brown", "fox", "sleeps"])
            .unwrap();
        assert_eq!(ratio, 0.5);
    }

    #[test]
    fn test_filter_state_machine() {
        let mut index = fox_index();
        assert_eq!(index.filter_state(4), FilterState::Absent);
        assert!(index.filter(4).is_none());

        let present = ["jumps", "over", "the", "lazy"];
        assert!(index.is_window_present(&present).unwrap());
        assert_eq!(index.filter_state(4), FilterState::Populated);
        assert_eq!(index.filter_state(3), FilterState::Absent);

        let counters = index.filter(4).unwrap().counters().to_vec();
        index.ensure_filter(4).unwrap();
        let reordered = ["lazy", "dog", "jumps", "over"];
        assert!(!index.is_window_present(&reordered).unwrap());
        assert_eq!(index.filter(4).unwrap().counters(), &counters[..]);

        assert!(index.is_phrase_present("lazy dog").unwrap());
        assert_eq!(index.indexed_window_sizes(), vec![2, 4]);
    }

    #[test]
    fn test_filter_uses_index_configuration() {
        let config = DetectorConfig::default()
            .with_capacity(1000)
            .with_false_positive_rate(0.01);
        let mut index = PlagiarismIndex::from_text(FOX, config).unwrap();
        let two = index.ensure_filter(2).unwrap().array_length();
        let five = index.ensure_filter(5).unwrap().array_length();
        assert_eq!(two, 9585);
        assert_eq!(five, 9585);
        assert_eq!(index.filter(5).unwrap().hash_count(), 7);
    }

    #[test]
    fn test_phrase_queries() {
        let mut index = fox_index();
        assert!(index.is_phrase_present("the quick brown").unwrap());
        assert!(index.is_phrase_present("over the lazy dog").unwrap());
        assert!(!index.is_phrase_present("dog lazy the over").unwrap());
        assert!(matches!(
            index.is_phrase_present(""),
            Err(DetectorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut index = fox_index();
        assert!(index.plagiarism_ratio_with(&["a"], 0).is_err());
        assert!(index.ensure_filter(0).is_err());
        let empty: [&str; 0] = [];
        assert!(index.is_window_present(&empty).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = DetectorConfig::default().with_false_positive_rate(0.0);
        assert!(matches!(
            PlagiarismIndex::new(vec![], config),
            Err(DetectorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_empty_reference() {
        let config = DetectorConfig::default();
        let mut index = PlagiarismIndex::new(vec![], config).unwrap();
        let ratio = index
            .plagiarism_ratio(&["the", "quick", "brown", "fox"])
            .unwrap();
        assert_eq!(ratio, 0.0);
        assert_eq!(index.filter_state(4), FilterState::Populated);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = PlagiarismIndex::from_path(
            "/nonexistent/plagiarism_core/reference.txt",
            DetectorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DetectorError::Document(_)));
    }

    #[test]
    fn test_check_path() {
        let mut index = fox_index();
        let path = temp_document("candidate", "The quick, brown fox!\nSleeps.");
        // "the quick brown fox" hits, "quick brown fox sleeps" misses
        assert_eq!(index.check_path(&path).unwrap(), 0.5);
        fs::remove_file(&path).unwrap();

        let err = index.check_path(&path).unwrap_err();
        assert!(matches!(err, DetectorError::Document(_)));
    }

    #[test]
    fn test_reference_beyond_capacity_still_builds() {
        let config = DetectorConfig::default()
            .with_capacity(3)
            .with_false_positive_rate(0.01);
        let mut index = PlagiarismIndex::from_text(FOX, config).unwrap();
        // 8 windows of 2 tokens against room for 3
        assert_eq!(window_count(9, 2), 8);
        assert!(index.is_phrase_present("the lazy").unwrap());
        assert_eq!(index.filter_state(2), FilterState::Populated);
    }

    #[test]
    fn test_unallocatable_capacity_rejected() {
        let config = DetectorConfig::default().with_capacity(usize::MAX / 4);
        assert!(matches!(
            PlagiarismIndex::from_text(FOX, config),
            Err(DetectorError::InvalidParameter {
                name: "capacity",
                ..
            })
        ));
    }

    #[test]
    fn test_random_documents() {
        let mut rng = rand::rng();
        let vocabulary: Vec<String> = (0..500).map(|i| format!("word{}", i)).collect();
        let reference: Vec<String> = (0..2000)
            .map(|_| vocabulary[rng.random_range(0..250)].clone())
            .collect();
        let config = DetectorConfig::default();
        let mut index = PlagiarismIndex::new(reference.clone(), config).unwrap();

        // a copy scores 1.0
        assert_eq!(index.plagiarism_ratio(&reference).unwrap(), 1.0);

        // any excerpt scores 1.0
        let start = rng.random_range(0..1000);
        let excerpt = &reference[start..start + 100];
        assert_eq!(index.plagiarism_ratio(excerpt).unwrap(), 1.0);

        // words never used by the reference score (close to) 0
        let mut unseen: Vec<String> = vocabulary[250..].to_vec();
        unseen.shuffle(&mut rng);
        let ratio = index.plagiarism_ratio(&unseen).unwrap();
        assert!(ratio < 0.05, "ratio={}", ratio);
    }

    #[test]
    fn test_py_methods() {
        Python::attach(|_py| {
            let mut index = PlagiarismIndex::py_new(tokenize(FOX), None).unwrap();
            assert_eq!(index.reference_len(), 9);
            assert_eq!(index.check_text("The quick, brown fox!").unwrap(), 1.0);
            assert_eq!(
                index
                    .py_plagiarism_ratio(vec!["lazy".into(), "dog".into()], Some(2))
                    .unwrap(),
                1.0
            );
            assert!(index.py_filter(2).is_some());
            index.py_ensure_filter(3).unwrap();
            assert_eq!(index.indexed_window_sizes(), vec![2, 3, 4]);
            assert!(index.py_ensure_filter(0).is_err());

            let path = temp_document("py_candidate", "over the lazy dog");
            assert_eq!(index.py_check_path(path.clone()).unwrap(), 1.0);
            fs::remove_file(&path).unwrap();
            assert!(index.py_check_path(path).is_err());
        });
    }
}
