#![forbid(missing_docs)]
//! # `lexr`
//! The `lexr` crate is a library for building lexical analyzers. A user
//! declares a set of regular patterns paired with actions, compiles them into
//! a [Lexicon] and feeds a character stream through a [Scanner] that yields a
//! sequence of tokens.
//!
//! Its closest spiritual kin is Flex, but expressed as a library: patterns
//! are built by combinator calls (or parsed from a traditional textual regex
//! with [re]) instead of a separate generator DSL. The patterns of a lexicon
//! are compiled through a Thompson NFA and a character-class partition into
//! one DFA per scanner state, so scanning runs in time linear in the input
//! length, independent of the number or complexity of the patterns.
//!
//! The scanner applies the longest-match rule; equal-length candidates are
//! resolved in favor of the rule defined first. Scanner states (known from
//! Flex as *start conditions*) restrict which rules are active, and the
//! virtual anchor symbols for beginning-of-line, end-of-line and end-of-file
//! let patterns match at structural boundaries without consuming text.
//!
//! # Example with keywords, identifiers and numbers
//! ```rust
//! use std::sync::Arc;
//! use lexr::{Action, LexEntry, Lexicon, Pattern, Scanner};
//!
//! let letter = Pattern::range("AZaz").unwrap();
//! let digit = Pattern::range("09").unwrap();
//! let name = letter.clone() + (letter | digit.clone()).rep();
//! let number = digit.rep1();
//!
//! let lexicon = Arc::new(Lexicon::<String>::new([
//!     LexEntry::rule(Pattern::words(&["if", "then", "else", "end"]), Action::Text),
//!     LexEntry::rule(name, Action::Token("ident".into())),
//!     LexEntry::rule(number, Action::Token("int".into())),
//!     LexEntry::rule(Pattern::any(" \t\n").rep1(), Action::Ignore),
//! ]).unwrap());
//!
//! let mut scanner = Scanner::on_str(lexicon, "if x1 42");
//! assert_eq!(scanner.read().unwrap().into_pair(), (Some("if".into()), "if".into()));
//! assert_eq!(scanner.read().unwrap().into_pair(), (Some("ident".into()), "x1".into()));
//! assert_eq!(scanner.read().unwrap().into_pair(), (Some("int".into()), "42".into()));
//! assert!(scanner.read().unwrap().is_eof());
//! ```
//!
//! # Example with scanner states
//! ```rust
//! use std::sync::Arc;
//! use lexr::{re, Action, LexEntry, Lexicon, Scanner};
//!
//! let lexicon = Arc::new(Lexicon::<String>::new([
//!     LexEntry::rule(re("[a-z]+").unwrap(), Action::Text),
//!     LexEntry::rule(re(r"\{").unwrap(), Action::begin("comment")),
//!     LexEntry::rule(re("[ \t\n]+").unwrap(), Action::Ignore),
//!     LexEntry::state("comment", [
//!         (re(r"\}").unwrap(), Action::begin("")),
//!         (re(".|\n").unwrap(), Action::Ignore),
//!     ]),
//! ]).unwrap());
//!
//! let mut scanner = Scanner::on_str(lexicon, "a { ignored } b");
//! assert_eq!(scanner.read().unwrap().text, "a");
//! assert_eq!(scanner.read().unwrap().text, "b");
//! assert!(scanner.read().unwrap().is_eof());
//! ```
//!
//! A compiled [Lexicon] is immutable and can be shared behind an
//! [std::sync::Arc] by any number of scanners, also across threads. A
//! [Scanner] itself is single-threaded.

/// Module with the action type.
mod action;
pub use action::{Action, Callback};

/// Module with error definitions.
mod errors;
pub use errors::{LexrError, LexrErrorKind, Result};

/// The module with internal implementation details.
mod internal;

/// Module with the lexicon and its compiler.
mod lexicon;
pub use lexicon::{LexEntry, Lexicon, DEFAULT_STATE};

/// Module with the pattern algebra.
mod pattern;
pub use pattern::Pattern;

/// Module with the position type.
mod position;
pub use position::Position;

/// Module with the traditional regex syntax front end.
mod re;
pub use re::re;

/// The module with the scanner runtime.
mod scanner;
pub use scanner::{EofHook, Scanner, Tokens};

/// Module with the character stream contract and adapters.
pub mod stream;
pub use stream::{CharRead, StrReader, Utf8Reader};

/// Module with the token type.
mod token;
pub use token::Token;
