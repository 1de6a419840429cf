//! The `dot` module contains the conversion from a finite automaton to the
//! graphviz dot format. The functions in this module are used for testing and
//! debugging purposes.

use std::io::Write;

use dot_writer::{Attributes, DotWriter, RankDirection};

use super::{dfa::Dfa, nfa::Nfa};

/// Render the NFA of one scanner state to graphviz dot format.
#[allow(dead_code)]
pub(crate) fn nfa_render<W: Write>(nfa: &Nfa, label: &str, output: &mut W) {
    let mut writer = DotWriter::from(output);
    writer.set_pretty_print(true);
    let mut digraph = writer.digraph();
    digraph
        .set_label(label)
        .set_rank_direction(RankDirection::LeftRight);
    for state in nfa.states() {
        let source_id = {
            let mut source_node = digraph.node_auto();
            source_node.set_label(&state.id().to_string());
            if state.id().as_usize() == 0 {
                source_node
                    .set_shape(dot_writer::Shape::Circle)
                    .set_color(dot_writer::Color::Blue)
                    .set_pen_width(3.0);
            }
            if let Some((_, rule)) = nfa.accepts().iter().find(|(s, _)| *s == state.id()) {
                source_node
                    .set_shape(dot_writer::Shape::Circle)
                    .set_color(dot_writer::Color::Red)
                    .set_pen_width(3.0);
                source_node.set_label(&format!("{}:R{}", state.id(), rule));
            }
            source_node.id()
        };
        for transition in state.transitions() {
            digraph
                .edge(
                    source_id.clone(),
                    format!("node_{}", transition.target_state.as_usize()),
                )
                .attributes()
                .set_label(&format!("#{}", transition.char_class));
        }
        for target in state.epsilon_transitions() {
            digraph
                .edge(source_id.clone(), format!("node_{}", target.as_usize()))
                .attributes()
                .set_label("ε");
        }
    }
}

/// Render a DFA to graphviz dot format.
#[allow(dead_code)]
pub(crate) fn dfa_render<W: Write>(dfa: &Dfa, label: &str, output: &mut W) {
    let mut writer = DotWriter::from(output);
    writer.set_pretty_print(true);
    let mut digraph = writer.digraph();
    digraph
        .set_label(label)
        .set_rank_direction(RankDirection::LeftRight);
    for state in dfa.states() {
        let mut source_node = digraph.node_auto();
        source_node.set_label(&state.id.to_string());
        if state.id.as_usize() == 0 {
            source_node
                .set_shape(dot_writer::Shape::Circle)
                .set_color(dot_writer::Color::Blue)
                .set_pen_width(3.0);
        }
        if let Some(rule) = state.accept {
            source_node
                .set_shape(dot_writer::Shape::Circle)
                .set_color(dot_writer::Color::Red)
                .set_pen_width(3.0);
            source_node.set_label(&format!("{}:R{}", state.id, rule));
        }
    }
    for (source_id, targets) in dfa.transitions() {
        for (char_class, target_id) in targets {
            digraph
                .edge(
                    format!("node_{}", source_id.as_usize()),
                    format!("node_{}", target_id.as_usize()),
                )
                .attributes()
                .set_label(&format!("#{}", char_class));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::{
        nfa::collect_sets, partition::CharSetRegistry, CharacterPartition, RuleID,
    };
    use crate::pattern::Pattern;

    fn automata(patterns: &[Pattern]) -> (Nfa, Dfa) {
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
        let dfa = Dfa::try_from_nfa(&nfa, &partition)
            .unwrap()
            .minimize()
            .unwrap();
        (nfa, dfa)
    }

    #[test]
    fn test_nfa_render() {
        let (nfa, _) = automata(&[Pattern::str("ab") | Pattern::ch('c').rep1()]);
        let mut cursor = std::io::Cursor::new(Vec::new());
        nfa_render(&nfa, "AbOrC", &mut cursor);
        let rendered = String::from_utf8(cursor.into_inner()).unwrap();
        assert!(rendered.starts_with("digraph"));
        assert!(rendered.contains("ε"));
    }

    #[test]
    fn test_dfa_render() {
        let (_, dfa) = automata(&[Pattern::str("ab")]);
        let mut cursor = std::io::Cursor::new(Vec::new());
        dfa_render(&dfa, "Ab", &mut cursor);
        let rendered = String::from_utf8(cursor.into_inner()).unwrap();
        assert!(rendered.starts_with("digraph"));
        assert!(rendered.contains("R0"));
    }
}
