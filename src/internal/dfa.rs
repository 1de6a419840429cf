//! This module contains the DFA implementation.
//! The DFA is generated from the NFA of one scanner state using the subset
//! construction algorithm. Accepting subsets remember the lowest-index rule
//! among their accepting NFA states, which resolves priority ties. Unmatched
//! anchor classes are transparent: the anchor step keeps every NFA state that
//! has outgoing transitions but none on the anchor's class.

use log::trace;
use std::collections::{BTreeMap, BTreeSet};

use crate::Result;

use super::{
    ids::StateIDBase, CharClassID, CharacterPartition, Nfa, RuleID, StateID,
};

// The type definitions for the minimization algorithm.
pub(crate) type StateGroup = BTreeSet<StateID>;
pub(crate) type Partition = Vec<StateGroup>;

// A data type that is calculated from the transitions of a DFA state so that
// for each character class the target state is mapped to the partition group
// it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct TransitionsToPartitionGroups(Vec<(CharClassID, usize)>);

impl TransitionsToPartitionGroups {
    fn new() -> Self {
        TransitionsToPartitionGroups(Vec::new())
    }

    fn insert(&mut self, char_class: CharClassID, partition_group: usize) {
        self.0.push((char_class, partition_group));
    }
}

/// The DFA of one scanner state. The start state is always state 0.
#[derive(Debug, Default, Clone)]
pub(crate) struct Dfa {
    // The states of the DFA.
    pub(crate) states: Vec<DfaState>,
    // The transitions of the DFA.
    pub(crate) transitions: BTreeMap<StateID, BTreeMap<CharClassID, StateID>>,
}

impl Dfa {
    /// Get the states of the DFA.
    pub(crate) fn states(&self) -> &[DfaState] {
        &self.states
    }

    /// Get the transitions of the DFA.
    pub(crate) fn transitions(&self) -> &BTreeMap<StateID, BTreeMap<CharClassID, StateID>> {
        &self.transitions
    }

    /// Create a DFA from the NFA of one scanner state using the subset
    /// construction algorithm.
    pub(crate) fn try_from_nfa(nfa: &Nfa, partition: &CharacterPartition) -> Result<Self> {
        let mut dfa = Dfa::default();

        let start_set = nfa.epsilon_closure(vec![StateID::new(0)]);
        let initial_state = dfa.add_state_if_new(start_set, nfa);
        let mut work_list = vec![initial_state];
        dfa.states[initial_state].marked = true;

        while let Some(state_id) = work_list.pop() {
            let nfa_states = dfa.states[state_id].nfa_states.clone();
            for class_index in 0..partition.total_class_count() {
                let char_class = CharClassID::new(class_index as u32);
                let mut target_states = nfa.move_set(&nfa_states, char_class);
                if partition.is_anchor_class(char_class) {
                    // An anchor nobody asked for passes through transparently.
                    target_states.extend(nfa.anchor_survivors(&nfa_states, char_class));
                    target_states.sort_unstable();
                    target_states.dedup();
                }
                if target_states.is_empty() {
                    continue;
                }
                let target_states = nfa.epsilon_closure(target_states);
                let target_state = dfa.add_state_if_new(target_states, nfa);
                dfa.transitions
                    .entry(state_id)
                    .or_default()
                    .insert(char_class, target_state);
                if !dfa.states[target_state].marked {
                    dfa.states[target_state].marked = true;
                    work_list.push(target_state);
                }
            }
        }

        trace!("Subset construction produced {} states", dfa.states.len());
        Ok(dfa)
    }

    /// Add a state to the DFA if it does not already exist.
    /// The state is identified by the NFA states that constitute it; its
    /// accept tag is the lowest rule accepted by any of them.
    fn add_state_if_new(&mut self, nfa_states: Vec<StateID>, nfa: &Nfa) -> StateID {
        debug_assert!(nfa_states.windows(2).all(|w| w[0] < w[1]));
        if let Some(state_id) = self
            .states
            .iter()
            .position(|state| state.nfa_states == nfa_states)
        {
            return StateID::new(state_id as StateIDBase);
        }

        let state_id = StateID::new(self.states.len() as StateIDBase);
        let accept = nfa.accept_of(&nfa_states);
        if let Some(rule) = accept {
            trace!("State {} accepts rule {}", state_id, rule);
        }
        self.states.push(DfaState {
            id: state_id,
            nfa_states,
            marked: false,
            accept,
        });
        state_id
    }

    /// Add a representative state for a group of the minimization partition.
    /// The accept tag is taken over from the group members; by construction
    /// all members of a group carry the same tag.
    fn add_representative_state(&mut self, group: &BTreeSet<StateID>, source: &Dfa) -> StateID {
        let state_id = StateID::new(self.states.len() as StateIDBase);
        let accept = group
            .iter()
            .find_map(|state_in_group| source.states[*state_in_group].accept);
        self.states.push(DfaState {
            id: state_id,
            nfa_states: Vec::new(),
            marked: false,
            accept,
        });
        state_id
    }

    /// Trace out a partition of the DFA.
    fn trace_partition(context: &str, partition: &[StateGroup]) {
        trace!("Partition {}:", context);
        for (i, group) in partition.iter().enumerate() {
            trace!("Group {}: {:?}", i, group);
        }
    }

    /// Minimize the DFA with iterative partition refinement. The NFA states
    /// are dropped from the DFA states; they are not needed anymore.
    pub(crate) fn minimize(&self) -> Result<Self> {
        debug_assert!(self
            .states
            .iter()
            .enumerate()
            .all(|(i, state)| state.id.as_usize() == i));

        let mut partition_old = self.calculate_initial_partition();
        Self::trace_partition("initial", &partition_old);
        let mut partition_new = Partition::new();
        let mut changed = true;

        while changed {
            partition_new = self.calculate_new_partition(&partition_old);
            Self::trace_partition("new", &partition_new);
            changed = partition_new != partition_old;
            partition_old.clone_from(&partition_new);
        }

        Ok(self.create_from_partition(&partition_new))
    }

    /// The start partition has one group per distinct accept tag: one group
    /// of all non-accepting states and one group per accepted rule. Keeping
    /// the rules apart preserves accept-tag identity through the merge.
    fn calculate_initial_partition(&self) -> Partition {
        let mut group_non_accepting = StateGroup::new();
        let mut groups_accepting = BTreeMap::<RuleID, StateGroup>::new();

        for state in &self.states {
            match state.accept {
                Some(rule) => {
                    groups_accepting.entry(rule).or_default().insert(state.id);
                }
                None => {
                    group_non_accepting.insert(state.id);
                }
            }
        }
        let mut initial_partition = vec![group_non_accepting];
        for group in groups_accepting.into_values() {
            initial_partition.push(group);
        }
        initial_partition
    }

    /// Calculate the new partition based on the old partition.
    /// Groups are split when their states transition into different groups of
    /// the old partition.
    fn calculate_new_partition(&self, partition: &[StateGroup]) -> Partition {
        let mut new_partition = Partition::new();
        for (index, group) in partition.iter().enumerate() {
            self.split_group(index, group, partition)
                .into_iter()
                .for_each(|new_group| {
                    new_partition.push(new_group);
                });
        }
        new_partition
    }

    fn split_group(
        &self,
        group_index: usize,
        group: &StateGroup,
        partition: &[StateGroup],
    ) -> Partition {
        // A group with a single state can't be split further.
        if group.len() == 1 {
            return vec![group.clone()];
        }
        trace!("Split group {}: {:?}", group_index, group);
        let mut transition_map_to_states: BTreeMap<TransitionsToPartitionGroups, StateGroup> =
            BTreeMap::new();
        for state_id in group {
            let transitions_to_partition =
                self.build_transitions_to_partition_group(*state_id, partition);
            transition_map_to_states
                .entry(transitions_to_partition)
                .or_default()
                .insert(*state_id);
        }
        transition_map_to_states.into_values().collect::<Partition>()
    }

    /// Build a transition map of a state with the target states replaced by
    /// the partition group they belong to. Two states are distinguishable
    /// exactly when these maps differ.
    fn build_transitions_to_partition_group(
        &self,
        state_id: StateID,
        partition: &[StateGroup],
    ) -> TransitionsToPartitionGroups {
        if let Some(transitions_of_state) = self.transitions.get(&state_id) {
            let mut transitions_to_partition_groups = TransitionsToPartitionGroups::new();
            for transition in transitions_of_state {
                let partition_group = self.find_group(*transition.1, partition).unwrap();
                transitions_to_partition_groups.insert(*transition.0, partition_group);
            }
            transitions_to_partition_groups
        } else {
            trace!("** State {} has no transitions.", state_id);
            TransitionsToPartitionGroups::new()
        }
    }

    fn find_group(&self, state_id: StateID, partition: &[StateGroup]) -> Option<usize> {
        partition.iter().position(|group| group.contains(&state_id))
    }

    /// Create a DFA from a partition, one state per group, with the
    /// transitions renumbered onto the group representatives.
    fn create_from_partition(&self, partition: &[StateGroup]) -> Dfa {
        trace!("Create DFA from partition {:?}", partition);
        let mut dfa = Dfa {
            states: Vec::new(),
            transitions: self.transitions.clone(),
        };

        // The group containing the old start state becomes the new state 0.
        let mut partition = partition.to_vec();
        partition.sort_by(|a, b| {
            if a.contains(&StateID::new(0)) {
                return std::cmp::Ordering::Less;
            }
            if b.contains(&StateID::new(0)) {
                return std::cmp::Ordering::Greater;
            }
            std::cmp::Ordering::Equal
        });

        for group in &partition {
            dfa.add_representative_state(group, self);
        }

        dfa.update_transitions(&partition);
        trace!("Minimized DFA has {} states", dfa.states.len());
        dfa
    }

    fn update_transitions(&mut self, partition: &[StateGroup]) {
        let mut transitions = self
            .transitions
            .iter()
            .map(|(s, t)| (*s, t.clone()))
            .collect::<Vec<_>>();

        Self::merge_transitions(partition, &mut transitions);
        Self::renumber_states_in_transitions(partition, &mut transitions);

        self.transitions = transitions.into_iter().collect();
    }

    fn merge_transitions(
        partition: &[StateGroup],
        transitions: &mut Vec<(StateID, BTreeMap<CharClassID, StateID>)>,
    ) {
        // Remove the transitions of all group members but the representative.
        // Group members transition identically up to group renumbering, so
        // nothing is lost.
        for group in partition {
            debug_assert!(!group.is_empty());
            if group.len() == 1 {
                continue;
            }
            let representative_state_id = group.first().unwrap();
            for state_id in group.iter().skip(1) {
                Self::merge_transitions_of_state(*state_id, *representative_state_id, transitions);
            }
        }
    }

    fn merge_transitions_of_state(
        state_id: StateID,
        representative_state_id: StateID,
        transitions: &mut Vec<(StateID, BTreeMap<CharClassID, StateID>)>,
    ) {
        if let Some(rep_pos) = transitions
            .iter()
            .position(|(s, _)| *s == representative_state_id)
        {
            let mut rep_trans = transitions.get_mut(rep_pos).unwrap().1.clone();
            if let Some(pos) = transitions.iter().position(|(s, _)| *s == state_id) {
                let (_, transitions_of_state) = transitions.get_mut(pos).unwrap();
                for (char_class, target_state) in transitions_of_state.iter() {
                    rep_trans.insert(*char_class, *target_state);
                }
                transitions.remove(pos);
            }
            transitions[rep_pos].1 = rep_trans;
        }
    }

    fn renumber_states_in_transitions(
        partition: &[StateGroup],
        transitions: &mut [(StateID, BTreeMap<CharClassID, StateID>)],
    ) {
        let find_group_of_state = |state_id: StateID| -> StateID {
            for (group_id, group) in partition.iter().enumerate() {
                if group.contains(&state_id) {
                    return StateID::new(group_id as StateIDBase);
                }
            }
            panic!("State {} not found in partition.", state_id);
        };

        for transition in transitions.iter_mut() {
            transition.0 = find_group_of_state(transition.0);
            for target_state in transition.1.values_mut() {
                *target_state = find_group_of_state(*target_state);
            }
        }
    }
}

impl std::fmt::Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DFA")?;
        writeln!(f, "States:")?;
        for state in &self.states {
            writeln!(f, "{:?}", state)?;
        }
        writeln!(f, "Transitions:")?;
        for (source_id, targets) in &self.transitions {
            write!(f, "{} -> ", source_id)?;
            for (char_class, target_id) in targets {
                write!(f, "{}:{}, ", char_class, target_id)?;
            }
            writeln!(f)?
        }
        Ok(())
    }
}

/// A state of the DFA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DfaState {
    pub(crate) id: StateID,
    // The ids of the NFA states that constitute this DFA state. Empty after
    // minimization.
    pub(crate) nfa_states: Vec<StateID>,
    // Marks a state as visited during the subset construction algorithm.
    marked: bool,
    // The rule this state accepts, if it is an accepting state. Always the
    // lowest-index competitor of the subset.
    pub(crate) accept: Option<RuleID>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        nfa::collect_sets, partition::CharSetRegistry, CharacterPartition,
    };
    use crate::internal::source::Symbol;
    use crate::pattern::Pattern;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn build_dfa(patterns: &[Pattern]) -> (Dfa, CharacterPartition) {
        let mut registry = CharSetRegistry::new();
        for pattern in patterns {
            collect_sets(pattern, false, &mut registry).unwrap();
        }
        let partition = CharacterPartition::build(&registry);
        let mut nfa = Nfa::new();
        for (i, pattern) in patterns.iter().enumerate() {
            nfa.add_rule(pattern, RuleID::new(i), &mut registry, &partition)
                .unwrap();
        }
        let dfa = Dfa::try_from_nfa(&nfa, &partition).unwrap();
        (dfa.minimize().unwrap(), partition)
    }

    // Drive the DFA over one line of input the way the scanner does: Bol,
    // the characters, then Eol and Eof. Returns the rule and the number of
    // characters of the longest match.
    fn run(dfa: &Dfa, partition: &CharacterPartition, input: &str) -> Option<(usize, usize)> {
        let mut symbols: Vec<Symbol> = vec![Symbol::Bol];
        symbols.extend(input.chars().map(Symbol::Char));
        symbols.push(Symbol::Eol);
        symbols.push(Symbol::Eof);

        let mut state = StateID::new(0);
        let mut consumed_chars = 0;
        let mut last_accept = None;
        for symbol in symbols {
            let class = partition.class_of(symbol);
            let Some(next) = dfa.transitions.get(&state).and_then(|t| t.get(&class)) else {
                break;
            };
            state = *next;
            if let Symbol::Char(_) = symbol {
                consumed_chars += 1;
            }
            if let Some(rule) = dfa.states[state].accept {
                last_accept = Some((rule.as_usize(), consumed_chars));
            }
        }
        last_accept
    }

    #[test]
    fn test_single_pattern_match() {
        init();
        let (dfa, partition) = build_dfa(&[Pattern::str("ab")]);
        assert_eq!(run(&dfa, &partition, "ab"), Some((0, 2)));
        assert_eq!(run(&dfa, &partition, "abx"), Some((0, 2)));
        assert_eq!(run(&dfa, &partition, "ba"), None);
        assert_eq!(run(&dfa, &partition, "a"), None);
    }

    #[test]
    fn test_classic_subset_construction() {
        init();
        let alt = Pattern::ch('a') | Pattern::ch('b');
        let pattern = alt.rep() + Pattern::str("abb");
        let (dfa, partition) = build_dfa(&[pattern]);
        assert_eq!(run(&dfa, &partition, "abb"), Some((0, 3)));
        assert_eq!(run(&dfa, &partition, "aababb"), Some((0, 6)));
        assert_eq!(run(&dfa, &partition, "abba"), Some((0, 3)));
        assert_eq!(run(&dfa, &partition, "ab"), None);
    }

    #[test]
    fn test_longest_match_wins() {
        init();
        let (dfa, partition) = build_dfa(&[
            Pattern::str("if"),
            Pattern::range("az").unwrap().rep1(),
        ]);
        // "ifx" is consumed completely by the identifier rule.
        assert_eq!(run(&dfa, &partition, "ifx"), Some((1, 3)));
        // "if" is an exact tie on length; the lower rule index wins.
        assert_eq!(run(&dfa, &partition, "if"), Some((0, 2)));
    }

    #[test]
    fn test_priority_tie_resolved_by_rule_order() {
        init();
        let (dfa, partition) = build_dfa(&[
            Pattern::range("az").unwrap().rep1(),
            Pattern::str("if"),
        ]);
        // Now the identifier rule is first and shadows the keyword.
        assert_eq!(run(&dfa, &partition, "if"), Some((0, 2)));
    }

    #[test]
    fn test_anchors_are_transparent_for_plain_patterns() {
        init();
        let (dfa, partition) = build_dfa(&[Pattern::str("ab")]);
        // The leading Bol and the trailing Eol/Eof of `run` do not disturb
        // the match, although the pattern never mentions them.
        assert_eq!(run(&dfa, &partition, "ab"), Some((0, 2)));
    }

    #[test]
    fn test_bol_anchored_pattern() {
        init();
        let (dfa, partition) = build_dfa(&[
            Pattern::bol() + Pattern::str("a"),
            Pattern::str("b"),
        ]);
        // Both the anchored and the plain rule match after the injected Bol.
        assert_eq!(run(&dfa, &partition, "a"), Some((0, 1)));
        assert_eq!(run(&dfa, &partition, "b"), Some((1, 1)));
    }

    #[test]
    fn test_eol_anchored_pattern() {
        init();
        let (dfa, partition) = build_dfa(&[Pattern::str("a") + Pattern::eol()]);
        assert_eq!(run(&dfa, &partition, "a"), Some((0, 1)));
        assert_eq!(run(&dfa, &partition, "ax"), None);
    }

    #[test]
    fn test_eof_anchored_pattern() {
        init();
        let (dfa, partition) = build_dfa(&[Pattern::str("a") + Pattern::eof()]);
        // The Eol injected before Eof passes through transparently.
        assert_eq!(run(&dfa, &partition, "a"), Some((0, 1)));
    }

    #[test]
    fn test_minimization_preserves_behavior() {
        init();
        let patterns = [
            Pattern::words(&["if", "then", "else"]),
            Pattern::range("az").unwrap().rep1(),
            Pattern::range("09").unwrap().rep1(),
        ];
        let mut registry = CharSetRegistry::new();
        for pattern in &patterns {
            collect_sets(pattern, false, &mut registry).unwrap();
        }
        let partition = CharacterPartition::build(&registry);
        let mut nfa = Nfa::new();
        for (i, pattern) in patterns.iter().enumerate() {
            nfa.add_rule(pattern, RuleID::new(i), &mut registry, &partition)
                .unwrap();
        }
        let dfa = Dfa::try_from_nfa(&nfa, &partition).unwrap();
        let minimized = dfa.minimize().unwrap();
        assert!(minimized.states.len() <= dfa.states.len());

        for input in ["if", "then", "elsewhere", "x", "42", "if2"] {
            assert_eq!(
                run(&dfa, &partition, input),
                run(&minimized, &partition, input),
                "minimization changed the behavior for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_accept_tag_is_minimum_rule() {
        init();
        // Two rules accepting the same single character.
        let (dfa, partition) = build_dfa(&[Pattern::ch('x'), Pattern::any("xy")]);
        assert_eq!(run(&dfa, &partition, "x"), Some((0, 1)));
        assert_eq!(run(&dfa, &partition, "y"), Some((1, 1)));
    }
}
