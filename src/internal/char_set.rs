//! This module contains the character set type used by the pattern algebra.
//! A character set is kept as a normalized list of inclusive scalar-value
//! ranges. All set algebra needed by the partitioner works on these ranges.

use serde::{Deserialize, Serialize};

use crate::{LexrError, LexrErrorKind, Result};

/// The first scalar value after the surrogate gap.
const AFTER_SURROGATES: char = '\u{E000}';
/// The last scalar value before the surrogate gap.
const BEFORE_SURROGATES: char = '\u{D7FF}';

/// A set of characters, represented as sorted, disjoint, non-adjacent
/// inclusive ranges of Unicode scalar values.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub(crate) struct CharSet {
    ranges: Vec<(char, char)>,
}

impl CharSet {
    /// Create an empty character set.
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// Create a set containing a single character.
    pub(crate) fn singleton(c: char) -> Self {
        Self {
            ranges: vec![(c, c)],
        }
    }

    /// Create a set containing every character of the given string.
    pub(crate) fn from_chars(chars: &str) -> Self {
        let mut set = Self::empty();
        for c in chars.chars() {
            set.add_range(c, c);
        }
        set
    }

    /// Create a set from pairs of range endpoints, consumed left-to-right.
    /// `"AZaz"` denotes the union of `A..=Z` and `a..=z`. An odd trailing
    /// character or a descending pair is rejected.
    pub(crate) fn from_range_pairs(pairs: &str) -> Result<Self> {
        let chars: Vec<char> = pairs.chars().collect();
        if chars.len() % 2 != 0 {
            return Err(LexrError::new(LexrErrorKind::InvalidPattern(format!(
                "range specification {:?} has an odd number of characters",
                pairs
            ))));
        }
        let mut set = Self::empty();
        for pair in chars.chunks(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if lo > hi {
                return Err(LexrError::new(LexrErrorKind::InvalidPattern(format!(
                    "descending range {:?}..{:?}",
                    lo, hi
                ))));
            }
            set.add_range(lo, hi);
        }
        Ok(set)
    }

    /// Create the universal set of all Unicode scalar values.
    pub(crate) fn universal() -> Self {
        Self {
            ranges: vec![('\0', BEFORE_SURROGATES), (AFTER_SURROGATES, char::MAX)],
        }
    }

    /// Returns true if the set contains no characters.
    pub(crate) fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns true if the set contains the given character.
    pub(crate) fn contains(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if c < lo {
                    std::cmp::Ordering::Greater
                } else if c > hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Returns the ranges of the set.
    pub(crate) fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    /// Add an inclusive range to the set, keeping the representation
    /// normalized.
    pub(crate) fn add_range(&mut self, lo: char, hi: char) {
        debug_assert!(lo <= hi);
        self.ranges.push((lo, hi));
        self.normalize();
    }

    /// Returns the union of two sets.
    pub(crate) fn union(&self, other: &CharSet) -> CharSet {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        let mut set = CharSet { ranges };
        set.normalize();
        set
    }

    /// Returns the complement of the set relative to the universal alphabet.
    pub(crate) fn complement(&self) -> CharSet {
        let mut result = CharSet::empty();
        let mut cursor = Some('\0');
        for &(lo, hi) in &self.ranges {
            if let Some(start) = cursor {
                if start < lo {
                    result.ranges.push((start, pred(lo)));
                }
            }
            cursor = succ(hi);
        }
        if let Some(start) = cursor {
            result.ranges.push((start, char::MAX));
        }
        // Cut the surrogate gap out of any range spanning it.
        let mut gap_free = CharSet::empty();
        for &(lo, hi) in &result.ranges {
            if lo <= BEFORE_SURROGATES && hi >= AFTER_SURROGATES {
                gap_free.ranges.push((lo, BEFORE_SURROGATES));
                gap_free.ranges.push((AFTER_SURROGATES, hi));
            } else {
                gap_free.ranges.push((lo, hi));
            }
        }
        gap_free.normalize();
        gap_free
    }

    /// Returns the set extended by the case-flipped counterparts of its
    /// ASCII-alphabetic members. Non-ASCII letters are left untouched.
    pub(crate) fn case_doubled(&self) -> CharSet {
        let mut folded = self.clone();
        for &(lo, hi) in &self.ranges {
            if let Some((lo, hi)) = intersect((lo, hi), ('A', 'Z')) {
                folded.add_range(flip_case(lo), flip_case(hi));
            }
            if let Some((lo, hi)) = intersect((lo, hi), ('a', 'z')) {
                folded.add_range(flip_case(lo), flip_case(hi));
            }
        }
        folded
    }

    // Sort the ranges and merge overlapping or adjacent ones.
    fn normalize(&mut self) {
        if self.ranges.len() < 2 {
            return;
        }
        self.ranges.sort_unstable();
        let mut merged: Vec<(char, char)> = Vec::with_capacity(self.ranges.len());
        for &(lo, hi) in &self.ranges {
            match merged.last_mut() {
                Some(last) if succ(last.1).map_or(true, |next| lo <= next) => {
                    last.1 = last.1.max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        self.ranges = merged;
    }
}

impl std::fmt::Display for CharSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for &(lo, hi) in &self.ranges {
            if lo == hi {
                write!(f, "{}", lo.escape_debug())?;
            } else {
                write!(f, "{}-{}", lo.escape_debug(), hi.escape_debug())?;
            }
        }
        write!(f, "]")
    }
}

/// The scalar value following `c`, skipping the surrogate gap.
pub(crate) fn succ(c: char) -> Option<char> {
    match c {
        BEFORE_SURROGATES => Some(AFTER_SURROGATES),
        char::MAX => None,
        _ => char::from_u32(c as u32 + 1),
    }
}

/// The scalar value preceding `c`, skipping the surrogate gap.
pub(crate) fn pred(c: char) -> char {
    match c {
        AFTER_SURROGATES => BEFORE_SURROGATES,
        '\0' => '\0',
        _ => char::from_u32(c as u32 - 1).unwrap(),
    }
}

fn intersect(a: (char, char), b: (char, char)) -> Option<(char, char)> {
    let lo = a.0.max(b.0);
    let hi = a.1.min(b.1);
    (lo <= hi).then_some((lo, hi))
}

fn flip_case(c: char) -> char {
    (c as u8 ^ 0x20) as char
}
