/// Module that provides the character set type of the pattern algebra.
mod char_set;
pub(crate) use char_set::CharSet;

/// Module that provides the dense DFA representation the scan loop runs on.
pub(crate) mod compiled_dfa;
pub(crate) use compiled_dfa::CompiledDfa;

/// Module that provides the DFA and its construction from the NFA.
pub(crate) mod dfa;
pub(crate) use dfa::Dfa;

/// Module with conversion to graphviz dot format.
#[cfg(test)]
mod dot;

/// Module for several ID types.
mod ids;
pub(crate) use ids::{CharClassID, LexStateID, RuleID, SetID, StateID};

/// Module that provides the NFA and the Thompson construction.
pub(crate) mod nfa;
pub(crate) use nfa::Nfa;

/// Module that provides the regex syntax parser.
pub(crate) mod parser;

/// Module that provides the character set registry and the partition.
pub(crate) mod partition;
pub(crate) use partition::CharacterPartition;

/// Module that provides the symbol source feeding the scan loop.
pub(crate) mod source;
pub(crate) use source::{Symbol, SymbolSource};
