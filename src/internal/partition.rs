//! This module contains the character set registry and the character
//! partition. The registry interns every character set mentioned by any
//! pattern of a lexicon; the partition derives from them the coarsest
//! equivalence classing of the alphabet, so that all DFA transition tables
//! can be keyed on a small class index instead of raw characters.

use log::trace;
use rustc_hash::FxHashMap;

use super::{
    char_set::{succ, CharSet},
    ids::{CharClassIDBase, SetIDBase},
    source::Symbol,
    CharClassID, SetID,
};

/// A registry of the distinct character sets used by the patterns compiled
/// into one lexicon.
#[derive(Debug, Clone, Default)]
pub(crate) struct CharSetRegistry {
    sets: Vec<CharSet>,
}

impl CharSetRegistry {
    /// Creates a new empty registry.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a character set to the registry if it is not already present and
    /// returns its ID.
    pub(crate) fn add_set(&mut self, set: &CharSet) -> SetID {
        if let Some(id) = self.sets.iter().position(|s| s == set) {
            SetID::new(id as SetIDBase)
        } else {
            let id = SetID::new(self.sets.len() as SetIDBase);
            self.sets.push(set.clone());
            id
        }
    }

    /// Returns the registered sets.
    pub(crate) fn sets(&self) -> &[CharSet] {
        &self.sets
    }

    /// Returns the number of registered sets.
    #[allow(dead_code)]
    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }
}

/// The character partition of a lexicon.
///
/// The alphabet is split at every range boundary of every registered set and
/// the resulting segments are grouped by their membership signature across
/// all sets. Each group is one character class; a set is always a union of
/// classes. The three anchor symbols occupy reserved trailing class indices.
#[derive(Debug, Clone)]
pub(crate) struct CharacterPartition {
    // Segment start points as scalar values, ascending. Segment i covers
    // starts[i] up to starts[i + 1] - 1 (the last one up to char::MAX).
    starts: Vec<u32>,
    // The class of each segment.
    segment_classes: Vec<CharClassID>,
    // Direct lookup for the ASCII range.
    ascii_classes: Vec<CharClassID>,
    // For each registered set the classes covering it.
    set_coverage: Vec<Vec<CharClassID>>,
    // Number of character classes, anchors not included.
    class_count: usize,
}

impl CharacterPartition {
    /// Builds the partition from all sets of the registry.
    pub(crate) fn build(registry: &CharSetRegistry) -> Self {
        let sets = registry.sets();

        // Split the alphabet at every range boundary.
        let mut starts: Vec<u32> = vec![0];
        for set in sets {
            for &(lo, hi) in set.ranges() {
                starts.push(lo as u32);
                if let Some(next) = succ(hi) {
                    starts.push(next as u32);
                }
            }
        }
        starts.sort_unstable();
        starts.dedup();

        // Group the segments by their membership signature across all sets.
        // A signature is a bitset with one bit per registered set.
        let words = sets.len().div_ceil(64);
        let mut signature_classes: FxHashMap<Vec<u64>, CharClassID> = FxHashMap::default();
        let mut segment_classes = Vec::with_capacity(starts.len());
        let mut set_coverage: Vec<Vec<CharClassID>> = vec![Vec::new(); sets.len()];
        for &start in &starts {
            // Segments never straddle a set boundary, so probing the start
            // point decides membership for the whole segment.
            let probe = char::from_u32(start).unwrap_or('\u{E000}');
            let mut signature = vec![0u64; words];
            for (i, set) in sets.iter().enumerate() {
                if set.contains(probe) {
                    signature[i / 64] |= 1 << (i % 64);
                }
            }
            let next_id = CharClassID::new(signature_classes.len() as CharClassIDBase);
            let class = *signature_classes.entry(signature).or_insert(next_id);
            segment_classes.push(class);
            for (i, set) in sets.iter().enumerate() {
                if set.contains(probe) && !set_coverage[i].contains(&class) {
                    set_coverage[i].push(class);
                }
            }
        }
        let class_count = signature_classes.len();
        trace!(
            "Partitioned {} sets into {} classes over {} segments",
            sets.len(),
            class_count,
            starts.len()
        );

        let ascii_classes = (0u32..128)
            .map(|c| {
                let index = match starts.binary_search(&c) {
                    Ok(i) => i,
                    Err(i) => i - 1,
                };
                segment_classes[index]
            })
            .collect();

        Self {
            starts,
            segment_classes,
            ascii_classes,
            set_coverage,
            class_count,
        }
    }

    /// Returns the class of a character.
    #[inline]
    pub(crate) fn class_of_char(&self, c: char) -> CharClassID {
        let scalar = c as u32;
        if scalar < 128 {
            return self.ascii_classes[scalar as usize];
        }
        let index = match self.starts.binary_search(&scalar) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        self.segment_classes[index]
    }

    /// Returns the class of an effective input symbol.
    #[inline]
    pub(crate) fn class_of(&self, symbol: Symbol) -> CharClassID {
        match symbol {
            Symbol::Char(c) => self.class_of_char(c),
            Symbol::Bol => self.bol_class(),
            Symbol::Eol => self.eol_class(),
            Symbol::Eof => self.eof_class(),
        }
    }

    /// Returns the classes that cover the given registered set.
    pub(crate) fn classes_of_set(&self, set: SetID) -> &[CharClassID] {
        &self.set_coverage[set.as_usize()]
    }

    /// The class of the beginning-of-line anchor.
    #[inline]
    pub(crate) fn bol_class(&self) -> CharClassID {
        CharClassID::new(self.class_count as CharClassIDBase)
    }

    /// The class of the end-of-line anchor.
    #[inline]
    pub(crate) fn eol_class(&self) -> CharClassID {
        CharClassID::new(self.class_count as CharClassIDBase + 1)
    }

    /// The class of the end-of-file anchor.
    #[inline]
    pub(crate) fn eof_class(&self) -> CharClassID {
        CharClassID::new(self.class_count as CharClassIDBase + 2)
    }

    /// Returns true if the class is one of the three anchor classes.
    #[inline]
    pub(crate) fn is_anchor_class(&self, class: CharClassID) -> bool {
        class.as_usize() >= self.class_count
    }

    /// The number of character classes, anchors not included.
    #[allow(dead_code)]
    pub(crate) fn char_class_count(&self) -> usize {
        self.class_count
    }

    /// The total number of classes including the three anchor classes. This
    /// is the width of every DFA transition table row.
    pub(crate) fn total_class_count(&self) -> usize {
        self.class_count + 3
    }
}
