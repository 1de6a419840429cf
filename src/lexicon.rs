//! Module with the lexicon, the compiled collection of pattern/action rules
//! partitioned by scanner state.
//!
//! A lexicon is built once from an ordered list of entries and is immutable
//! afterwards. It can be shared behind an [std::sync::Arc] by any number of
//! scanners, concurrently.

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    action::Action,
    internal::{
        nfa::collect_sets, partition::CharSetRegistry, CharacterPartition, CompiledDfa, Dfa,
        LexStateID, Nfa, RuleID,
    },
    pattern::Pattern,
    LexrError, LexrErrorKind, Result,
};

/// The name of the default scanner state.
pub const DEFAULT_STATE: &str = "";

/// One entry of a lexicon specification: either a single rule for the default
/// scanner state or a named scanner state with its own rules. Nesting state
/// definitions inside state definitions is unrepresentable.
pub struct LexEntry<V, U = ()> {
    kind: EntryKind<V, U>,
}

enum EntryKind<V, U> {
    Rule(Pattern, Action<V, U>),
    State(String, Vec<(Pattern, Action<V, U>)>),
}

impl<V, U> LexEntry<V, U> {
    /// A rule of the default scanner state.
    pub fn rule(pattern: Pattern, action: Action<V, U>) -> Self {
        Self {
            kind: EntryKind::Rule(pattern, action),
        }
    }

    /// A named scanner state with its rules. Rule order defines priority
    /// within the state: on a match-length tie the earlier rule wins.
    pub fn state<T, I>(name: T, rules: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = (Pattern, Action<V, U>)>,
    {
        Self {
            kind: EntryKind::State(name.into(), rules.into_iter().collect()),
        }
    }
}

// A rule after compilation. The pattern is kept in rendered form for
// diagnostics only.
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule<V, U> {
    #[allow(dead_code)]
    pub(crate) pattern: String,
    pub(crate) action: Action<V, U>,
    #[allow(dead_code)]
    pub(crate) state: LexStateID,
}

// A scanner state with its compiled DFA.
#[derive(Debug, Clone)]
pub(crate) struct CompiledLexState {
    pub(crate) name: String,
    pub(crate) dfa: CompiledDfa,
}

/// A compiled lexicon.
///
/// All scanner states share one character partition; each scanner state owns
/// the DFA compiled from its rules. Rule priorities are insertion order.
#[derive(Debug)]
pub struct Lexicon<V, U = ()> {
    pub(crate) states: Vec<CompiledLexState>,
    pub(crate) rules: Vec<CompiledRule<V, U>>,
    pub(crate) partition: CharacterPartition,
    state_index: FxHashMap<String, LexStateID>,
}

impl<V, U> Lexicon<V, U> {
    /// Compile a lexicon from an ordered list of entries.
    ///
    /// Plain rules belong to the default scanner state `""`. Compile-time
    /// errors: an explicit state named `""`, a duplicate state name, a
    /// `Begin` action referencing an unknown state, an empty specification,
    /// and any pattern error.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = LexEntry<V, U>>,
    {
        // Group the rules by scanner state, the default state first.
        let mut state_names: Vec<String> = vec![DEFAULT_STATE.to_string()];
        let mut grouped: Vec<Vec<(Pattern, Action<V, U>)>> = vec![Vec::new()];
        for entry in entries {
            match entry.kind {
                EntryKind::Rule(pattern, action) => {
                    grouped[0].push((pattern, action));
                }
                EntryKind::State(name, rules) => {
                    if name == DEFAULT_STATE {
                        return Err(LexrError::new(LexrErrorKind::InvalidLexicon(
                            "the empty state name is reserved for the default state".to_string(),
                        )));
                    }
                    if state_names.contains(&name) {
                        return Err(LexrError::new(LexrErrorKind::InvalidLexicon(format!(
                            "duplicate scanner state {:?}",
                            name
                        ))));
                    }
                    state_names.push(name);
                    grouped.push(rules);
                }
            }
        }
        if grouped.iter().all(|rules| rules.is_empty()) {
            return Err(LexrError::new(LexrErrorKind::InvalidLexicon(
                "a lexicon needs at least one rule".to_string(),
            )));
        }

        let state_index: FxHashMap<String, LexStateID> = state_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), LexStateID::new(i)))
            .collect();

        // Every `Begin` target must name a defined scanner state.
        for rules in &grouped {
            for (_, action) in rules {
                if let Action::Begin(target) = action {
                    if !state_index.contains_key(target) {
                        return Err(LexrError::new(LexrErrorKind::InvalidLexicon(format!(
                            "Begin references unknown scanner state {:?}",
                            target
                        ))));
                    }
                }
            }
        }

        // One character partition for all scanner states.
        let mut registry = CharSetRegistry::new();
        for rules in &grouped {
            for (pattern, _) in rules {
                collect_sets(pattern, false, &mut registry)?;
            }
        }
        let partition = CharacterPartition::build(&registry);

        // Per scanner state: NFA, subset construction, minimization and the
        // dense table. Rule ids are global insertion indices, so within one
        // state the lowest id is the highest priority.
        let mut states = Vec::with_capacity(grouped.len());
        let mut rules = Vec::new();
        for (state_id, (name, state_rules)) in
            state_names.into_iter().zip(grouped.into_iter()).enumerate()
        {
            let mut nfa = Nfa::new();
            for (pattern, action) in state_rules {
                let rule_id = RuleID::new(rules.len());
                nfa.add_rule(&pattern, rule_id, &mut registry, &partition)?;
                rules.push(CompiledRule {
                    pattern: pattern.to_string(),
                    action,
                    state: LexStateID::new(state_id),
                });
            }
            let dfa = Dfa::try_from_nfa(&nfa, &partition)?.minimize()?;
            debug!(
                "Compiled scanner state {:?} into {} DFA states",
                name,
                dfa.states().len()
            );
            states.push(CompiledLexState {
                name,
                dfa: CompiledDfa::compile(&dfa, partition.total_class_count()),
            });
        }

        Ok(Self {
            states,
            rules,
            partition,
            state_index,
        })
    }

    /// Returns the id of the named scanner state.
    pub(crate) fn state_id(&self, name: &str) -> Option<LexStateID> {
        self.state_index.get(name).copied()
    }

    /// Returns the names of the scanner states in definition order, the
    /// default state first.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|state| state.name.as_str())
    }

    /// Returns the number of rules over all scanner states.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
