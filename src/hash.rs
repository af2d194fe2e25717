//! Polynomial hash family over token strings.
//!
//! Every seed prime `p` defines one hash function that reads the string as a
//! base-`p` number whose digits are the characters' Unicode scalar values,
//! first character most significant:
//!
//! `h_p(s) = (code(s[0]) * p^(n-1) + ... + code(s[n-1])) mod m`
//!
//! Insert, search and delete of one filter all go through the same family.

use crate::params::FilterParams;

/// The fixed set of hash functions of one filter.
#[derive(Debug, Clone)]
pub struct HashFamily {
    seeds: &'static [u64],
    modulus: u128,
}

impl HashFamily {
    pub fn new(params: &FilterParams) -> Self {
        Self {
            seeds: params.seeds,
            modulus: params.array_length as u128,
        }
    }

    /// Returns one counter index per seed, in seed order.
    ///
    /// Duplicates are kept: an index that appears twice is incremented or
    /// decremented twice.
    pub fn indices(&self, item: &str) -> Vec<usize> {
        self.seeds
            .iter()
            .map(|&prime| self.index_for(prime, item))
            .collect()
    }

    // Horner's rule reduced at every step; equal to reducing the exact value once.
    #[inline]
    fn index_for(&self, prime: u64, item: &str) -> usize {
        let prime = prime as u128;
        let mut hash = 0u128;
        for c in item.chars() {
            hash = (hash * prime + c as u128) % self.modulus;
        }
        hash as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(capacity: usize, fpr: f64) -> (FilterParams, HashFamily) {
        let params = FilterParams::new(capacity, fpr).unwrap();
        let family = HashFamily::new(&params);
        (params, family)
    }

    // Exact big-number value, only usable for short inputs.
    fn naive(prime: u64, item: &str, m: usize) -> usize {
        let codes: Vec<u128> = item.chars().map(|c| c as u128).collect();
        let n = codes.len() as u32;
        let value: u128 = codes
            .iter()
            .enumerate()
            .map(|(i, &c)| c * (prime as u128).pow(n - 1 - i as u32))
            .sum();
        (value % m as u128) as usize
    }

    #[test]
    fn test_matches_positional_sum() {
        let (params, family) = build(10000, 0.001);
        for word in ["apple", "the", "fox", "zebra!", "é"] {
            let indices = family.indices(word);
            assert_eq!(indices.len(), params.hash_count);
            for (idx, &prime) in indices.iter().zip(params.seeds) {
                assert_eq!(*idx, naive(prime, word, params.array_length));
            }
        }
    }

    #[test]
    fn test_first_character_weighs_most() {
        let (params, family) = build(10000, 0.001);
        let m = params.array_length;
        // 'a' * 127 + 'b' vs 'b' * 127 + 'a'
        assert_eq!(family.indices("ab")[0], (97 * 127 + 98) % m);
        assert_eq!(family.indices("ba")[0], (98 * 127 + 97) % m);
    }

    #[test]
    fn test_indices_in_bounds_and_pure() {
        let (params, family) = build(50, 0.3);
        for i in 0..1000 {
            let word = format!("thequickbrownfox{}", i);
            let first = family.indices(&word);
            assert!(first.iter().all(|&idx| idx < params.array_length));
            assert_eq!(first, family.indices(&word));
        }
    }

    #[test]
    fn test_empty_and_single_slot() {
        let (_, family) = build(10000, 0.001);
        assert!(family.indices("").iter().all(|&idx| idx == 0));

        let (params, family) = build(1, 0.9);
        assert_eq!(params.array_length, 1);
        assert_eq!(family.indices("anything"), vec![0]);
    }
}
