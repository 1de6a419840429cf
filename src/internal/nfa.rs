//! This module contains the NFA (Non-deterministic Finite Automaton)
//! implementation. One NFA holds the Thompson fragments of all rules of a
//! single scanner state, linked from a common start state, with the end state
//! of each fragment tagged by the rule it accepts.

use log::trace;

use crate::{
    pattern::{Pattern, PatternKind},
    LexrError, LexrErrorKind, Result,
};

use super::{
    ids::StateIDBase, partition::CharSetRegistry, CharClassID, CharacterPartition, RuleID, StateID,
};

/// Register every character set reachable in the pattern, with the enclosing
/// case-folding mode applied. This is the first pass over a lexicon's
/// patterns; the partition is built from the registry before any NFA states
/// exist.
pub(crate) fn collect_sets(
    pattern: &Pattern,
    fold: bool,
    registry: &mut CharSetRegistry,
) -> Result<()> {
    match &pattern.kind {
        PatternKind::Empty | PatternKind::Bol | PatternKind::Eol | PatternKind::Eof => Ok(()),
        PatternKind::Set(set) => {
            let effective = if fold { set.case_doubled() } else { set.clone() };
            if effective.is_empty() {
                return Err(LexrError::new(LexrErrorKind::InvalidPattern(
                    "empty character set".to_string(),
                )));
            }
            registry.add_set(&effective);
            Ok(())
        }
        PatternKind::Concat(parts) | PatternKind::Alt(parts) => {
            for part in parts {
                collect_sets(part, fold, registry)?;
            }
            Ok(())
        }
        PatternKind::Rep(inner) => collect_sets(inner, fold, registry),
        PatternKind::Fold(inner, mode) => collect_sets(inner, *mode, registry),
    }
}

/// The NFA of one scanner state.
///
/// State 0 is the common start state; every rule fragment hangs off it via an
/// ε-transition in rule order.
#[derive(Debug, Clone)]
pub(crate) struct Nfa {
    states: Vec<NfaState>,
    // The end states of the rule fragments together with the rule they
    // accept, in rule order.
    accepts: Vec<(StateID, RuleID)>,
}

impl Nfa {
    pub(crate) fn new() -> Self {
        Self {
            states: vec![NfaState::default()],
            accepts: Vec::new(),
        }
    }

    pub(crate) fn states(&self) -> &[NfaState] {
        &self.states
    }

    #[allow(dead_code)]
    pub(crate) fn accepts(&self) -> &[(StateID, RuleID)] {
        &self.accepts
    }

    /// Build the Thompson fragment for one rule's pattern and link it from
    /// the start state.
    pub(crate) fn add_rule(
        &mut self,
        pattern: &Pattern,
        rule: RuleID,
        registry: &mut CharSetRegistry,
        partition: &CharacterPartition,
    ) -> Result<()> {
        let (entry, exit) = self.build_fragment(pattern, false, registry, partition)?;
        self.add_epsilon_transition(StateID::new(0), entry);
        self.accepts.push((exit, rule));
        trace!(
            "Added rule {} with fragment {}..{} ({} states total)",
            rule,
            entry,
            exit,
            self.states.len()
        );
        Ok(())
    }

    fn build_fragment(
        &mut self,
        pattern: &Pattern,
        fold: bool,
        registry: &mut CharSetRegistry,
        partition: &CharacterPartition,
    ) -> Result<(StateID, StateID)> {
        match &pattern.kind {
            PatternKind::Empty => {
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_epsilon_transition(entry, exit);
                Ok((entry, exit))
            }
            PatternKind::Set(set) => {
                let effective = if fold { set.case_doubled() } else { set.clone() };
                let set_id = registry.add_set(&effective);
                let entry = self.new_state();
                let exit = self.new_state();
                for &class in partition.classes_of_set(set_id) {
                    self.add_transition(entry, class, exit);
                }
                Ok((entry, exit))
            }
            PatternKind::Concat(parts) => {
                let entry = self.new_state();
                let mut current = entry;
                for part in parts {
                    let (part_entry, part_exit) =
                        self.build_fragment(part, fold, registry, partition)?;
                    self.add_epsilon_transition(current, part_entry);
                    current = part_exit;
                }
                Ok((entry, current))
            }
            PatternKind::Alt(parts) => {
                let entry = self.new_state();
                let exit = self.new_state();
                for part in parts {
                    let (part_entry, part_exit) =
                        self.build_fragment(part, fold, registry, partition)?;
                    self.add_epsilon_transition(entry, part_entry);
                    self.add_epsilon_transition(part_exit, exit);
                }
                Ok((entry, exit))
            }
            PatternKind::Rep(inner) => {
                let (inner_entry, inner_exit) =
                    self.build_fragment(inner, fold, registry, partition)?;
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_epsilon_transition(entry, inner_entry);
                self.add_epsilon_transition(entry, exit);
                self.add_epsilon_transition(inner_exit, exit);
                self.add_epsilon_transition(inner_exit, inner_entry);
                Ok((entry, exit))
            }
            PatternKind::Fold(inner, mode) => {
                self.build_fragment(inner, *mode, registry, partition)
            }
            PatternKind::Bol => Ok(self.anchor_fragment(partition.bol_class())),
            PatternKind::Eol => Ok(self.anchor_fragment(partition.eol_class())),
            PatternKind::Eof => Ok(self.anchor_fragment(partition.eof_class())),
        }
    }

    fn anchor_fragment(&mut self, class: CharClassID) -> (StateID, StateID) {
        let entry = self.new_state();
        let exit = self.new_state();
        self.add_transition(entry, class, exit);
        (entry, exit)
    }

    fn new_state(&mut self) -> StateID {
        let id = StateID::new(self.states.len() as StateIDBase);
        self.states.push(NfaState::new(id));
        id
    }

    fn add_transition(&mut self, from: StateID, class: CharClassID, target: StateID) {
        self.states[from].transitions.push(NfaTransition {
            char_class: class,
            target_state: target,
        });
    }

    fn add_epsilon_transition(&mut self, from: StateID, target: StateID) {
        self.states[from].epsilon_transitions.push(target);
    }

    /// Calculate the ε-closure of a set of states.
    pub(crate) fn epsilon_closure<I>(&self, states: I) -> Vec<StateID>
    where
        I: IntoIterator<Item = StateID>,
    {
        let mut closure: Vec<StateID> = states.into_iter().collect();
        let mut i = 0;
        while i < closure.len() {
            let current = closure[i];
            for &target in &self.states[current].epsilon_transitions {
                if !closure.contains(&target) {
                    closure.push(target);
                }
            }
            i += 1;
        }
        closure.sort_unstable();
        closure.dedup();
        closure
    }

    /// Calculate move(T, a) for a set of states T and a character class a.
    pub(crate) fn move_set(&self, states: &[StateID], char_class: CharClassID) -> Vec<StateID> {
        let mut move_set = Vec::new();
        for &state in states {
            for transition in &self.states[state].transitions {
                if transition.char_class == char_class {
                    move_set.push(transition.target_state);
                }
            }
        }
        move_set.sort_unstable();
        move_set.dedup();
        move_set
    }

    /// The states of T that an unmatched anchor symbol passes through
    /// transparently: states with at least one class transition but none on
    /// the anchor's class. States without outgoing class transitions (rule
    /// ends in particular) drop out instead.
    pub(crate) fn anchor_survivors(
        &self,
        states: &[StateID],
        anchor_class: CharClassID,
    ) -> Vec<StateID> {
        states
            .iter()
            .copied()
            .filter(|&state| {
                let transitions = &self.states[state].transitions;
                !transitions.is_empty()
                    && !transitions.iter().any(|t| t.char_class == anchor_class)
            })
            .collect()
    }

    /// The lowest-priority rule accepted by any state of the set, if any.
    /// Rule ids are insertion indices, so the minimum is the winner of a
    /// priority tie.
    pub(crate) fn accept_of(&self, states: &[StateID]) -> Option<RuleID> {
        self.accepts
            .iter()
            .filter(|(state, _)| states.binary_search(state).is_ok())
            .map(|(_, rule)| *rule)
            .min()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NfaState {
    state: StateID,
    epsilon_transitions: Vec<StateID>,
    transitions: Vec<NfaTransition>,
}

impl NfaState {
    pub(crate) fn new(state: StateID) -> Self {
        Self {
            state,
            epsilon_transitions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> StateID {
        self.state
    }

    pub(crate) fn transitions(&self) -> &[NfaTransition] {
        &self.transitions
    }

    pub(crate) fn epsilon_transitions(&self) -> &[StateID] {
        &self.epsilon_transitions
    }
}

/// A transition in the NFA, labeled by a class of the character partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NfaTransition {
    pub(crate) char_class: CharClassID,
    pub(crate) target_state: StateID,
}
