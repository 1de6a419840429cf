//! Module with the pattern algebra.
//! Patterns are immutable expression trees built by combinator calls. They
//! carry no automaton state; compiling them into a DFA is the lexicon's job.

use serde::{Deserialize, Serialize};

use crate::{internal::CharSet, Result};

/// A regular pattern, built by combinator calls.
///
/// Patterns are immutable values. Concatenation and alternation are also
/// available as the `+` and `|` operators:
///
/// ```rust
/// use lexr::Pattern;
///
/// let letter = Pattern::range("AZaz").unwrap();
/// let digit = Pattern::range("09").unwrap();
/// let name = letter.clone() + (letter | digit).rep();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    pub(crate) kind: PatternKind,
}

/// The variants of the pattern algebra.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum PatternKind {
    /// Matches the empty string.
    Empty,
    /// Matches any single character of the set.
    Set(CharSet),
    /// Matches the sequence of the sub-patterns.
    Concat(Vec<Pattern>),
    /// Matches any one of the sub-patterns.
    Alt(Vec<Pattern>),
    /// Matches zero or more repetitions of the sub-pattern.
    Rep(Box<Pattern>),
    /// Case-sensitivity wrapper. `true` means case-insensitive. The innermost
    /// wrapper wins; the default is case-sensitive.
    Fold(Box<Pattern>, bool),
    /// Matches the virtual beginning-of-line symbol.
    Bol,
    /// Matches the virtual end-of-line symbol.
    Eol,
    /// Matches the virtual end-of-file symbol.
    Eof,
}

impl Pattern {
    fn new(kind: PatternKind) -> Self {
        Self { kind }
    }

    /// A pattern matching any single character of the given set. Used by the
    /// traditional-syntax front end.
    pub(crate) fn set(set: CharSet) -> Self {
        Self::new(PatternKind::Set(set))
    }

    /// A pattern matching the empty string.
    pub fn empty() -> Self {
        Self::new(PatternKind::Empty)
    }

    /// A pattern matching exactly the given character.
    pub fn ch(c: char) -> Self {
        Self::new(PatternKind::Set(CharSet::singleton(c)))
    }

    /// A pattern matching exactly the given string.
    /// The empty string yields [Pattern::empty].
    pub fn str(s: &str) -> Self {
        if s.is_empty() {
            return Self::empty();
        }
        Self::new(PatternKind::Concat(s.chars().map(Pattern::ch).collect()))
    }

    /// A pattern matching any one of the given strings, tried in order.
    pub fn words(words: &[&str]) -> Self {
        Self::new(PatternKind::Alt(
            words.iter().map(|w| Pattern::str(w)).collect(),
        ))
    }

    /// A pattern matching any single character of the given string.
    pub fn any(chars: &str) -> Self {
        Self::new(PatternKind::Set(CharSet::from_chars(chars)))
    }

    /// A pattern matching any single character not in the given string.
    pub fn any_but(chars: &str) -> Self {
        Self::new(PatternKind::Set(CharSet::from_chars(chars).complement()))
    }

    /// A pattern matching any single character.
    pub fn any_char() -> Self {
        Self::new(PatternKind::Set(CharSet::universal()))
    }

    /// A pattern matching any single character of the union of ranges given
    /// as endpoint pairs, e.g. `"AZaz"` for ASCII letters. An odd number of
    /// characters or a descending pair is an `InvalidPattern` error.
    pub fn range(pairs: &str) -> Result<Self> {
        Ok(Self::new(PatternKind::Set(CharSet::from_range_pairs(
            pairs,
        )?)))
    }

    /// A pattern matching the sub-patterns in sequence.
    pub fn seq<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = Pattern>,
    {
        Self::new(PatternKind::Concat(patterns.into_iter().collect()))
    }

    /// A pattern matching any one of the sub-patterns. On equal match length
    /// the rule order within the lexicon decides, not the order of the
    /// alternatives.
    pub fn alt<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = Pattern>,
    {
        Self::new(PatternKind::Alt(patterns.into_iter().collect()))
    }

    /// A pattern matching zero or more repetitions of this pattern.
    pub fn rep(self) -> Self {
        Self::new(PatternKind::Rep(Box::new(self)))
    }

    /// A pattern matching one or more repetitions of this pattern.
    pub fn rep1(self) -> Self {
        let rep = self.clone().rep();
        self + rep
    }

    /// A pattern matching this pattern or the empty string.
    pub fn opt(self) -> Self {
        Self::new(PatternKind::Alt(vec![self, Pattern::empty()]))
    }

    /// Make every character set inside this pattern case-insensitive, unless
    /// overridden by a nested [Pattern::case].
    pub fn nocase(self) -> Self {
        Self::new(PatternKind::Fold(Box::new(self), true))
    }

    /// Make every character set inside this pattern case-sensitive again,
    /// overriding an enclosing [Pattern::nocase].
    pub fn case(self) -> Self {
        Self::new(PatternKind::Fold(Box::new(self), false))
    }

    /// A pattern matching the virtual beginning-of-line symbol. It consumes
    /// no input text.
    pub fn bol() -> Self {
        Self::new(PatternKind::Bol)
    }

    /// A pattern matching the virtual end-of-line symbol, yielded before a
    /// newline and before the end of the input. It consumes no input text.
    pub fn eol() -> Self {
        Self::new(PatternKind::Eol)
    }

    /// A pattern matching the virtual end-of-file symbol. It consumes no
    /// input text.
    pub fn eof() -> Self {
        Self::new(PatternKind::Eof)
    }
}

impl std::ops::Add for Pattern {
    type Output = Pattern;

    /// Concatenation of two patterns.
    fn add(self, rhs: Pattern) -> Pattern {
        match self {
            Pattern {
                kind: PatternKind::Concat(mut parts),
            } => {
                parts.push(rhs);
                Pattern::new(PatternKind::Concat(parts))
            }
            other => Pattern::new(PatternKind::Concat(vec![other, rhs])),
        }
    }
}

impl std::ops::BitOr for Pattern {
    type Output = Pattern;

    /// Alternation of two patterns.
    fn bitor(self, rhs: Pattern) -> Pattern {
        match self {
            Pattern {
                kind: PatternKind::Alt(mut parts),
            } => {
                parts.push(rhs);
                Pattern::new(PatternKind::Alt(parts))
            }
            other => Pattern::new(PatternKind::Alt(vec![other, rhs])),
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            PatternKind::Empty => Ok(()),
            PatternKind::Set(set) => {
                if let [(lo, hi)] = set.ranges() {
                    if lo == hi {
                        return write!(f, "{}", lo.escape_debug());
                    }
                }
                write!(f, "{}", set)
            }
            PatternKind::Concat(parts) => {
                for part in parts {
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
            PatternKind::Alt(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
            PatternKind::Rep(inner) => write!(f, "({})*", inner),
            PatternKind::Fold(inner, true) => write!(f, "(?i:{})", inner),
            PatternKind::Fold(inner, false) => write!(f, "(?-i:{})", inner),
            PatternKind::Bol => write!(f, "^"),
            PatternKind::Eol => write!(f, "$"),
            PatternKind::Eof => write!(f, "\\z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_desugars_to_concat() {
        let pattern = Pattern::str("if");
        match &pattern.kind {
            PatternKind::Concat(parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected a concatenation"),
        }
        assert_eq!(Pattern::str(""), Pattern::empty());
    }

    #[test]
    fn test_range_rejects_odd_length() {
        assert!(Pattern::range("AZaz").is_ok());
        assert!(Pattern::range("AZa").is_err());
    }

    #[test]
    fn test_operators() {
        let concat = Pattern::ch('a') + Pattern::ch('b') + Pattern::ch('c');
        match &concat.kind {
            PatternKind::Concat(parts) => assert_eq!(parts.len(), 3),
            _ => panic!("expected a concatenation"),
        }
        let alt = Pattern::str("if") | Pattern::str("then") | Pattern::str("else");
        match &alt.kind {
            PatternKind::Alt(parts) => assert_eq!(parts.len(), 3),
            _ => panic!("expected an alternation"),
        }
    }

    #[test]
    fn test_rep1_desugars() {
        let pattern = Pattern::ch('a').rep1();
        match &pattern.kind {
            PatternKind::Concat(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[1].kind, PatternKind::Rep(_)));
            }
            _ => panic!("expected a concatenation"),
        }
    }

    #[test]
    fn test_opt_desugars() {
        let pattern = Pattern::ch('a').opt();
        match &pattern.kind {
            PatternKind::Alt(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[1], Pattern::empty());
            }
            _ => panic!("expected an alternation"),
        }
    }

    #[test]
    fn test_display() {
        let pattern = Pattern::str("if") | Pattern::range("az").unwrap().rep1();
        assert_eq!(pattern.to_string(), "(if|[a-z]([a-z])*)");
        assert_eq!((Pattern::bol() + Pattern::str("x")).to_string(), "^x");
    }

    #[test]
    fn test_serde_roundtrip() {
        let pattern = (Pattern::str("from") + Pattern::any(" \t").rep1()).nocase();
        let json = serde_json::to_string(&pattern).unwrap();
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(pattern, back);
    }
}
