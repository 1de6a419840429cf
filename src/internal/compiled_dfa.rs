//! This module contains the compiled DFA, the representation the scan loop
//! actually runs on. The transition relation of a minimized [Dfa] is lowered
//! into one dense table row per state, keyed by character class, with a dead
//! sentinel for missing transitions.

use super::{ids::StateIDBase, CharClassID, Dfa, RuleID, StateID};

/// The sentinel for a missing transition.
pub(crate) const DEAD_STATE: StateID = StateID::new(StateIDBase::MAX);

/// A DFA lowered to a dense transition table.
#[derive(Debug, Clone)]
pub(crate) struct CompiledDfa {
    // Transition table, `width` entries per state.
    table: Vec<StateID>,
    // The accepted rule per state, if any.
    accepts: Vec<Option<RuleID>>,
    // The number of character classes, i.e. the row width.
    width: usize,
}

impl CompiledDfa {
    /// Lower a DFA into its dense form. `width` is the total class count of
    /// the lexicon's character partition.
    pub(crate) fn compile(dfa: &Dfa, width: usize) -> Self {
        let state_count = dfa.states().len();
        let mut table = vec![DEAD_STATE; state_count * width];
        for (source, targets) in dfa.transitions() {
            for (char_class, target) in targets {
                table[source.as_usize() * width + char_class.as_usize()] = *target;
            }
        }
        let accepts = dfa.states().iter().map(|state| state.accept).collect();
        Self {
            table,
            accepts,
            width,
        }
    }

    /// The start state of every compiled DFA.
    #[inline]
    pub(crate) fn start(&self) -> StateID {
        StateID::new(0)
    }

    /// The successor of `state` on `char_class`, or [DEAD_STATE].
    #[inline]
    pub(crate) fn next(&self, state: StateID, char_class: CharClassID) -> StateID {
        self.table[state.as_usize() * self.width + char_class.as_usize()]
    }

    /// The rule accepted in `state`, if it is an accepting state.
    #[inline]
    pub(crate) fn accept(&self, state: StateID) -> Option<RuleID> {
        self.accepts[state.as_usize()]
    }

    /// The number of states of the DFA.
    #[allow(dead_code)]
    pub(crate) fn state_count(&self) -> usize {
        self.accepts.len()
    }
}
