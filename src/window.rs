//! Overlapping fixed-length token windows.
//!
//! A document of `n` tokens has `n - w + 1` windows of length `w`, each one
//! advanced by a single token: the oldest token leaves the window as the next
//! one enters. A document shorter than `w` has no windows at all.

use std::iter::FusedIterator;
use std::slice;

use crate::errors::{DetectorError, Result};

/// A contiguous run of exactly `len()` tokens borrowed from a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindow<'a, S> {
    tokens: &'a [S],
}

impl<'a, S: AsRef<str>> TokenWindow<'a, S> {
    pub fn new(tokens: &'a [S]) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &'a [S] {
        self.tokens
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The filter key of this window: its tokens concatenated without a separator.
    pub fn concat(&self) -> String {
        join_tokens(self.tokens, "")
    }

    /// The window as a readable phrase.
    pub fn joined(&self, sep: &str) -> String {
        join_tokens(self.tokens, sep)
    }
}

fn join_tokens<S: AsRef<str>>(tokens: &[S], sep: &str) -> String {
    let size = tokens.iter().map(|t| t.as_ref().len()).sum::<usize>()
        + sep.len() * tokens.len().saturating_sub(1);
    let mut out = String::with_capacity(size);
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(token.as_ref());
    }
    out
}

/// Iterator over the windows of a token sequence, see [`windows`].
#[derive(Debug, Clone)]
pub struct Windows<'a, S> {
    inner: slice::Windows<'a, S>,
}

impl<'a, S: AsRef<str>> Iterator for Windows<'a, S> {
    type Item = TokenWindow<'a, S>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(TokenWindow::new)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: AsRef<str>> ExactSizeIterator for Windows<'_, S> {}

impl<S: AsRef<str>> FusedIterator for Windows<'_, S> {}

/// Returns the overlapping windows of `window_size` tokens, in document order.
///
/// # Errors
///
/// `InvalidParameter` if `window_size` is 0.
///
/// # Examples
///
/// ```ignore
/// let tokens = ["a", "b", "c", "d"];
/// let keys: Vec<String> = windows(&tokens, 3)?.map(|w| w.concat()).collect();
/// assert_eq!(keys, ["abc", "bcd"]);
/// ```
pub fn windows<S: AsRef<str>>(tokens: &[S], window_size: usize) -> Result<Windows<'_, S>> {
    if window_size == 0 {
        return Err(DetectorError::invalid_parameter(
            "window_size",
            "must be at least 1",
        ));
    }
    Ok(Windows {
        inner: tokens.windows(window_size),
    })
}

/// Number of windows [`windows`] yields, without building them.
#[inline]
pub fn window_count(token_count: usize, window_size: usize) -> usize {
    if window_size == 0 {
        return 0;
    }
    (token_count + 1).saturating_sub(window_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: [&str; 9] = [
        "the", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog",
    ];

    #[test]
    fn test_windows_order_and_content() {
        let keys: Vec<String> = windows(&FOX, 4).unwrap().map(|w| w.concat()).collect();
        assert_eq!(
            keys,
            vec![
                "thequickbrownfox",
                "quickbrownfoxjumps",
                "brownfoxjumpsover",
                "foxjumpsoverthe",
                "jumpsoverthelazy",
                "overthelazydog",
            ]
        );
    }

    #[test]
    fn test_windows_count() {
        for n in 0..12 {
            let tokens: Vec<String> = (0..n).map(|i| format!("t{}", i)).collect();
            for w in 1..12 {
                let produced = windows(&tokens, w).unwrap();
                let expected = if n >= w { n - w + 1 } else { 0 };
                assert_eq!(produced.len(), expected);
                assert_eq!(produced.count(), expected);
                assert_eq!(window_count(n, w), expected);
            }
        }
    }

    #[test]
    fn test_windows_short_document_is_empty() {
        let tokens = ["the", "quick"];
        assert!(windows(&tokens, 4).unwrap().next().is_none());
        // exactly one window when lengths match
        let one: Vec<_> = windows(&tokens, 2).unwrap().collect();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].tokens(), &tokens[..]);
    }

    #[test]
    fn test_windows_zero_size() {
        assert!(matches!(
            windows(&FOX, 0),
            Err(DetectorError::InvalidParameter {
                name: "window_size",
                ..
            })
        ));
        assert_eq!(window_count(5, 0), 0);
    }

    #[test]
    fn test_window_joined() {
        let first = windows(&FOX, 3).unwrap().next().unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.joined(" "), "the quick brown");
        assert_eq!(first.concat(), "thequickbrown");
    }
}
