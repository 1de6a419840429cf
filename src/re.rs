//! Module with the traditional regex syntax front end.
//! [re] parses a textual regular expression and folds it onto the pattern
//! algebra, so the two notations mix freely in one lexicon. Only the strictly
//! regular subset is accepted; everything the automaton pipeline can't
//! express is rejected with an `UnsupportedFeature` error.

use regex_syntax::ast::{
    Ast, AssertionKind, ClassAscii, ClassAsciiKind, ClassBracketed, ClassPerl, ClassPerlKind,
    ClassSet, ClassSetItem, FlagsItemKind, GroupKind, RepetitionKind, RepetitionRange,
};

use crate::{
    internal::{parser::parse_regex_syntax, CharSet},
    LexrError, Pattern, Result,
};

macro_rules! unsupported {
    ($feature:expr) => {
        LexrError::new($crate::LexrErrorKind::UnsupportedFeature(
            $feature.to_string(),
        ))
    };
}

/// Parse a traditional regular expression into a [Pattern].
///
/// Supported syntax: literals, `\c` escapes, `.` (any character but a
/// newline), alternation, concatenation, `*`/`+`/`?` and the bounded
/// repetitions `{n}`, `{n,}` and `{n,m}`, bracket classes with ranges and
/// negation (including Perl and POSIX ASCII classes), `^`/`$` for the line
/// anchors, `\z` for the end-of-file anchor, groups, and the group-scoped
/// case flag `(?i:…)`/`(?-i:…)`.
///
/// ```rust
/// use lexr::{re, Pattern};
///
/// assert_eq!(re(".").unwrap(), Pattern::any_but("\n"));
/// assert_eq!(re("[a-z]").unwrap(), Pattern::range("az").unwrap());
/// ```
pub fn re(pattern: &str) -> Result<Pattern> {
    let ast = parse_regex_syntax(pattern)?;
    translate(&ast)
}

fn translate(ast: &Ast) -> Result<Pattern> {
    match ast {
        Ast::Empty(_) => Ok(Pattern::empty()),
        Ast::Flags(flags) => Err(unsupported!(format!(
            "{:?}: Inline flags outside a group",
            flags.flags.items
        ))),
        Ast::Literal(literal) => Ok(Pattern::ch(literal.c)),
        Ast::Dot(_) => Ok(Pattern::any_but("\n")),
        Ast::Assertion(assertion) => match assertion.kind {
            AssertionKind::StartLine => Ok(Pattern::bol()),
            AssertionKind::EndLine => Ok(Pattern::eol()),
            AssertionKind::EndText => Ok(Pattern::eof()),
            ref kind => Err(unsupported!(format!("Assertion {:?}", kind))),
        },
        Ast::ClassPerl(perl) => Ok(Pattern::set(perl_set(perl))),
        Ast::ClassUnicode(unicode) => {
            Err(unsupported!(format!("Unicode class {:?}", unicode.kind)))
        }
        Ast::ClassBracketed(bracketed) => Ok(Pattern::set(bracketed_set(bracketed)?)),
        Ast::Repetition(repetition) => {
            if !repetition.greedy {
                return Err(unsupported!(format!(
                    "{}: Non-greedy repetitions. Consider using a scanner state instead.",
                    ast
                )));
            }
            let inner = translate(&repetition.ast)?;
            Ok(match &repetition.op.kind {
                RepetitionKind::ZeroOrOne => inner.opt(),
                RepetitionKind::ZeroOrMore => inner.rep(),
                RepetitionKind::OneOrMore => inner.rep1(),
                RepetitionKind::Range(range) => match range {
                    RepetitionRange::Exactly(n) => {
                        Pattern::seq((0..*n).map(|_| inner.clone()))
                    }
                    RepetitionRange::AtLeast(n) => {
                        let mut parts: Vec<Pattern> =
                            (0..*n).map(|_| inner.clone()).collect();
                        parts.push(inner.rep());
                        Pattern::seq(parts)
                    }
                    RepetitionRange::Bounded(n, m) => {
                        let mut parts: Vec<Pattern> =
                            (0..*n).map(|_| inner.clone()).collect();
                        parts.extend((*n..*m).map(|_| inner.clone().opt()));
                        Pattern::seq(parts)
                    }
                },
            })
        }
        Ast::Group(group) => {
            let inner = translate(&group.ast)?;
            match &group.kind {
                GroupKind::NonCapturing(flags) => {
                    // The only flag with a counterpart in the algebra is the
                    // case-insensitivity toggle.
                    let mut negated = false;
                    let mut fold: Option<bool> = None;
                    for item in &flags.items {
                        match &item.kind {
                            FlagsItemKind::Negation => negated = true,
                            FlagsItemKind::Flag(regex_syntax::ast::Flag::CaseInsensitive) => {
                                fold = Some(!negated);
                            }
                            FlagsItemKind::Flag(flag) => {
                                return Err(unsupported!(format!("Flag {:?}", flag)));
                            }
                        }
                    }
                    Ok(match fold {
                        Some(true) => inner.nocase(),
                        Some(false) => inner.case(),
                        None => inner,
                    })
                }
                // Parentheses only group; nothing is captured.
                _ => Ok(inner),
            }
        }
        Ast::Alternation(alternation) => {
            let parts = alternation
                .asts
                .iter()
                .map(translate)
                .collect::<Result<Vec<_>>>()?;
            Ok(Pattern::alt(parts))
        }
        Ast::Concat(concat) => {
            let parts = concat
                .asts
                .iter()
                .map(translate)
                .collect::<Result<Vec<_>>>()?;
            Ok(Pattern::seq(parts))
        }
    }
}

fn perl_set(perl: &ClassPerl) -> CharSet {
    let set = match perl.kind {
        ClassPerlKind::Digit => CharSet::from_range_pairs("09").expect("valid range"),
        ClassPerlKind::Space => CharSet::from_chars(" \t\n\x0B\x0C\r"),
        ClassPerlKind::Word => CharSet::from_range_pairs("09AZaz__").expect("valid range"),
    };
    if perl.negated {
        set.complement()
    } else {
        set
    }
}

fn ascii_set(ascii: &ClassAscii) -> CharSet {
    let set = match ascii.kind {
        ClassAsciiKind::Alnum => CharSet::from_range_pairs("09AZaz").expect("valid range"),
        ClassAsciiKind::Alpha => CharSet::from_range_pairs("AZaz").expect("valid range"),
        ClassAsciiKind::Ascii => {
            let mut set = CharSet::empty();
            set.add_range('\0', '\x7F');
            set
        }
        ClassAsciiKind::Blank => CharSet::from_chars(" \t"),
        ClassAsciiKind::Cntrl => {
            let mut set = CharSet::empty();
            set.add_range('\0', '\x1F');
            set.add_range('\x7F', '\x7F');
            set
        }
        ClassAsciiKind::Digit => CharSet::from_range_pairs("09").expect("valid range"),
        ClassAsciiKind::Graph => {
            let mut set = CharSet::empty();
            set.add_range('!', '~');
            set
        }
        ClassAsciiKind::Lower => CharSet::from_range_pairs("az").expect("valid range"),
        ClassAsciiKind::Print => {
            let mut set = CharSet::empty();
            set.add_range(' ', '~');
            set
        }
        ClassAsciiKind::Punct => CharSet::from_range_pairs("!/:@[`{~").expect("valid range"),
        ClassAsciiKind::Space => CharSet::from_chars(" \t\n\x0B\x0C\r"),
        ClassAsciiKind::Upper => CharSet::from_range_pairs("AZ").expect("valid range"),
        ClassAsciiKind::Word => CharSet::from_range_pairs("09AZaz__").expect("valid range"),
        ClassAsciiKind::Xdigit => CharSet::from_range_pairs("09AFaf").expect("valid range"),
    };
    if ascii.negated {
        set.complement()
    } else {
        set
    }
}

fn bracketed_set(bracketed: &ClassBracketed) -> Result<CharSet> {
    let set = class_set(&bracketed.kind)?;
    if bracketed.negated {
        Ok(set.complement())
    } else {
        Ok(set)
    }
}

fn class_set(kind: &ClassSet) -> Result<CharSet> {
    match kind {
        ClassSet::Item(item) => class_set_item(item),
        ClassSet::BinaryOp(op) => Err(unsupported!(format!(
            "Class set operator {:?}",
            op.kind
        ))),
    }
}

fn class_set_item(item: &ClassSetItem) -> Result<CharSet> {
    match item {
        ClassSetItem::Empty(_) => Ok(CharSet::empty()),
        ClassSetItem::Literal(literal) => Ok(CharSet::singleton(literal.c)),
        ClassSetItem::Range(range) => {
            let mut set = CharSet::empty();
            set.add_range(range.start.c, range.end.c);
            Ok(set)
        }
        ClassSetItem::Ascii(ascii) => Ok(ascii_set(ascii)),
        ClassSetItem::Perl(perl) => Ok(perl_set(perl)),
        ClassSetItem::Bracketed(bracketed) => bracketed_set(bracketed),
        ClassSetItem::Union(union) => {
            let mut set = CharSet::empty();
            for item in &union.items {
                set = set.union(&class_set_item(item)?);
            }
            Ok(set)
        }
        ClassSetItem::Unicode(unicode) => {
            Err(unsupported!(format!("Unicode class {:?}", unicode.kind)))
        }
    }
}
