//! Turns raw document text into the token sequence the index works on.
//!
//! Punctuation is dropped, line breaks and tabs separate tokens like a space,
//! and every token is lower-cased.

use std::fs;
use std::path::Path;

use anyhow::Context;
use pyo3::prelude::*;

const STRIPPED: [char; 11] = [';', ',', '.', '?', '!', '_', '[', ']', '(', ')', '*'];
const SEPARATORS: [char; 3] = ['\n', '\r', '\t'];

/// Splits `text` into lower-cased tokens.
///
/// Only the space character splits after separator replacement, so other
/// whitespace stays inside its token. Empty tokens are discarded.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(tokenize("The quick (brown) fox!\n"), ["the", "quick", "brown", "fox"]);
/// ```
#[pyfunction]
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    cleaned
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Splits a phrase on single spaces, the way a user-typed query is read.
pub fn split_phrase(phrase: &str) -> Vec<&str> {
    phrase.split(' ').filter(|word| !word.is_empty()).collect()
}

/// Reads a UTF-8 document from disk.
pub fn read_document(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path)
        .with_context(|| format!("failed to read document {}", path.display()))
}

/// Reads and tokenizes a document from disk.
pub fn tokenize_file(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let text = read_document(path)?;
    let tokens = tokenize(&text);
    log::debug!("Tokenized document: {} tokens", tokens.len());
    Ok(tokens)
}
