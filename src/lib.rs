//! Approximate text overlap detection with counting bloom filters.
//!
//! A [`PlagiarismIndex`] tokenizes a reference document and answers, for a
//! candidate document, what fraction of its fixed-length token windows also
//! occur in the reference. Membership is tested with one
//! [`CountingBloomFilter`] per window length, so answers can be false
//! positives but never false negatives.
//!
//! Everything is also exposed to Python as the `plagiarism_core` module.

pub mod config;
pub mod detector;
pub mod document;
pub mod errors;
pub mod filter;
pub mod hash;
pub mod params;
pub mod window;

use pyo3::prelude::*;

pub use config::DetectorConfig;
pub use detector::{FilterState, PlagiarismIndex};
pub use document::tokenize;
pub use errors::DetectorError;
pub use filter::CountingBloomFilter;
pub use params::FilterParams;
pub use window::{TokenWindow, windows};

#[pymodule]
fn plagiarism_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<CountingBloomFilter>()?;
    m.add_class::<DetectorConfig>()?;
    m.add_class::<FilterState>()?;
    m.add_class::<PlagiarismIndex>()?;
    m.add_function(wrap_pyfunction!(document::tokenize, m)?)?;
    Ok(())
}
