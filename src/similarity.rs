//! Sequence-alignment string similarity.
//!
//! Implements the Ratcliff/Obershelp "gestalt" ratio: find the longest common
//! contiguous block, recurse on the unmatched text to its left and right, and
//! sum the block lengths `M`. The ratio is `2*M / T` where `T` is the combined
//! length of both strings, so identical strings score `1.0` and strings with
//! no character in common score `0.0`.
//!
//! Strings are compared as sequences of Unicode scalar values, so accented
//! names count one position per character rather than per byte.
//!
//! The greedy block search depends on argument order, which would make
//! `ratio(a, b)` and `ratio(b, a)` differ for a handful of inputs. [`ratio`]
//! always aligns the pair in a canonical order (shorter first, then
//! lexicographically smaller first) so the measure is symmetric.

use std::collections::HashMap;

/// Similarity of `a` and `b` in `[0.0, 1.0]`.
///
/// Two empty strings are considered identical and score `1.0`.
///
/// ```
/// use roster_match::similarity::ratio;
///
/// assert_eq!(ratio("Smith", "Smith"), 1.0);
/// assert_eq!(ratio("abcd", "bcde"), 0.75);
/// assert_eq!(ratio("Smith", "Jones"), ratio("Jones", "Smith"));
/// ```
pub fn ratio(a: &str, b: &str) -> f64 {
    let (a, b) = canonical_order(a, b);
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn canonical_order<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    let key_a = (a.chars().count(), a);
    let key_b = (b.chars().count(), b);
    if key_a <= key_b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Total length of all matching blocks between `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    // Positions of every character in `b`, ascending.
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside `a[alo..ahi]` and
/// `b[blo..bhi]`.
///
/// Among equally long blocks the one starting earliest in `a` wins, and among
/// those the one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);

    // j2len[j] = length of the match ending at a[i-1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j
                    .checked_sub(1)
                    .and_then(|prev| j2len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, k);
                if k > best_len {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_len = k;
                }
            }
        }
        j2len = next;
    }

    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert_eq!(ratio("Jane Smith", "Jane Smith"), 1.0);
        assert_eq!(ratio("Zoë O'Brien-Núñez", "Zoë O'Brien-Núñez"), 1.0);
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("", "Smith"), 0.0);
        assert_eq!(ratio("Smith", ""), 0.0);
    }

    #[test]
    fn test_disjoint_strings() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        // "Smith" is a 5-char block inside "Smithe"
        assert!(close(ratio("Smith", "Smithe"), 10.0 / 11.0));
        // only "J" lines up
        assert!(close(ratio("J.", "John"), 2.0 / 6.0));
        // "J" then "n"
        assert!(close(ratio("Jane", "John"), 0.5));
        // " Smith" plus "J" and "n"
        assert!(close(ratio("John Smithe", "Jane Smith"), 16.0 / 21.0));
        assert!(close(ratio("abcd", "bcde"), 0.75));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 'é' is two bytes but one position
        assert!(close(ratio("José", "Jose"), 6.0 / 8.0));
    }

    #[test]
    fn test_symmetric() {
        let samples = [
            "Jane Smith",
            "John Smithe",
            "J. Smith",
            "Smith",
            "tide",
            "diet",
            "abcabc",
            "cbacba",
            "Mary-Kate O'Neil",
            "Marie O Neill",
            "",
            "Núñez",
        ];
        for a in samples {
            for b in samples {
                assert_eq!(ratio(a, b), ratio(b, a), "asymmetric for {:?} / {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_range() {
        let pairs = [("a", "b"), ("ab", "ba"), ("Smith", "Smyth"), ("x", "xxxx")];
        for (a, b) in pairs {
            let r = ratio(a, b);
            assert!((0.0..=1.0).contains(&r), "{} out of range", r);
        }
    }
}
