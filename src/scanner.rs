//! Module with the scanner runtime.
//! A scanner drives the compiled DFAs of a lexicon over a character stream,
//! applies the longest-match rule with priority tie-breaks, dispatches the
//! winning rule's action and hands out tokens on demand.

use std::collections::VecDeque;
use std::sync::Arc;

use log::trace;

use crate::{
    action::Action,
    internal::{compiled_dfa::DEAD_STATE, LexStateID, RuleID, Symbol, SymbolSource},
    stream::{CharRead, StrReader},
    Lexicon, LexrError, LexrErrorKind, Position, Result, Token,
};

/// The hook invoked exactly once when the input is exhausted, just before the
/// end-of-input sentinel is emitted. It may queue trailing tokens with
/// [Scanner::produce].
pub type EofHook<V, U> = Box<dyn FnMut(&mut Scanner<V, U>) -> Result<()>>;

/// A scanner.
///
/// It owns its input stream and match state and holds a shared reference to
/// an immutable [Lexicon]. A scanner is not thread-safe, but any number of
/// scanners can share one lexicon.
///
/// ```rust
/// use std::sync::Arc;
/// use lexr::{Action, LexEntry, Lexicon, Pattern, Scanner};
///
/// let lexicon = Arc::new(Lexicon::<String>::new([
///     LexEntry::rule(Pattern::range("az").unwrap().rep1(), Action::Text),
///     LexEntry::rule(Pattern::any(" \t\n").rep1(), Action::Ignore),
/// ]).unwrap());
///
/// let mut scanner = Scanner::on_str(lexicon, "hello world");
/// assert_eq!(scanner.read().unwrap().value.as_deref(), Some("hello"));
/// assert_eq!(scanner.read().unwrap().value.as_deref(), Some("world"));
/// assert!(scanner.read().unwrap().is_eof());
/// ```
pub struct Scanner<V, U = ()> {
    lexicon: Arc<Lexicon<V, U>>,
    source: SymbolSource,
    name: Option<String>,
    current_state: LexStateID,
    // Tokens produced by actions but not yet returned.
    queue: VecDeque<(V, String, Position)>,
    // The text of the most recent match.
    text: String,
    // The start position of the most recently returned token.
    last_position: Position,
    // The start position of the most recent match; produced tokens carry it.
    match_position: Position,
    user_data: U,
    eof_hook: Option<EofHook<V, U>>,
    eof_hook_done: bool,
}

impl<V, U> Scanner<V, U> {
    /// Create a scanner reading from the given stream.
    pub fn new<R>(lexicon: Arc<Lexicon<V, U>>, reader: R) -> Self
    where
        R: CharRead + 'static,
        U: Default,
    {
        Self {
            lexicon,
            source: SymbolSource::new(Box::new(reader)),
            name: None,
            current_state: LexStateID::new(0),
            queue: VecDeque::new(),
            text: String::new(),
            last_position: Position::new(1, 0),
            match_position: Position::new(1, 0),
            user_data: U::default(),
            eof_hook: None,
            eof_hook_done: false,
        }
    }

    /// Create a scanner reading from an in-memory string.
    pub fn on_str<T>(lexicon: Arc<Lexicon<V, U>>, input: T) -> Self
    where
        T: Into<String>,
        U: Default,
    {
        Self::new(lexicon, StrReader::new(input.into()))
    }

    /// Attach a name to the scanner, e.g. the file name of the input. It is
    /// only used in diagnostics.
    pub fn with_name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the user data slot. Stateful actions keep their state here.
    pub fn with_user_data(mut self, user_data: U) -> Self {
        self.user_data = user_data;
        self
    }

    /// Attach the end-of-input hook. It runs exactly once, just before the
    /// sentinel token; tokens it queues with [Scanner::produce] are drained
    /// first.
    pub fn with_eof_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Scanner<V, U>) -> Result<()> + 'static,
    {
        self.eof_hook = Some(Box::new(hook));
        self
    }

    /// The name the scanner was created with, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The position of the first character of the most recently returned
    /// token.
    pub fn position(&self) -> Position {
        self.last_position
    }

    /// The text of the most recent match.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The name of the scanner state the scanner is currently in.
    pub fn state(&self) -> &str {
        &self.lexicon.states[self.current_state.as_usize()].name
    }

    /// Switch to the named scanner state. The empty name is the default
    /// state; switching to the current state is a no-op.
    pub fn begin(&mut self, state: &str) -> Result<()> {
        match self.lexicon.state_id(state) {
            Some(id) => {
                trace!("begin({:?})", state);
                self.current_state = id;
                Ok(())
            }
            None => Err(LexrError::new(LexrErrorKind::InvalidScanner(format!(
                "begin references unknown scanner state {:?}",
                state
            )))),
        }
    }

    /// Queue a token with the text of the current match. Queued tokens are
    /// returned by subsequent [Scanner::read] calls in insertion order,
    /// before any further scanning happens.
    pub fn produce(&mut self, value: V) {
        let text = self.text.clone();
        self.queue.push_back((value, text, self.match_position));
    }

    /// Queue a token with an explicit text.
    pub fn produce_with_text(&mut self, value: V, text: &str) {
        self.queue
            .push_back((value, text.to_string(), self.match_position));
    }

    /// Borrow the user data slot.
    pub fn user_data(&self) -> &U {
        &self.user_data
    }

    /// Borrow the user data slot mutably.
    pub fn user_data_mut(&mut self) -> &mut U {
        &mut self.user_data
    }

    // Dequeue the oldest produced token, if any.
    fn dequeue(&mut self) -> Option<Token<V>> {
        self.queue.pop_front().map(|(value, text, position)| {
            self.last_position = position;
            self.text.clear();
            self.text.push_str(&text);
            Token::new(Some(value), text)
        })
    }
}

impl<V, U> Scanner<V, U>
where
    V: Clone + From<String>,
{
    /// Return the next token.
    ///
    /// Produced tokens are drained first. Otherwise the scanner reads the
    /// longest match for the current scanner state beginning at the cursor,
    /// resolves equal-length candidates by rule order and dispatches the
    /// winning rule's action. At the end of the input the EOF hook runs once
    /// and the sentinel token is returned from then on.
    ///
    /// An input no rule matches is an [LexrErrorKind::UnrecognizedInput]
    /// error.
    pub fn read(&mut self) -> Result<Token<V>> {
        loop {
            if let Some(token) = self.dequeue() {
                return Ok(token);
            }

            let start = self.source.position();
            let lexicon = Arc::clone(&self.lexicon);
            let dfa = &lexicon.states[self.current_state.as_usize()].dfa;
            let partition = &lexicon.partition;

            let mut state = dfa.start();
            let mut text = String::new();
            let mut trail: Vec<(Symbol, Position)> = Vec::new();
            let mut last_accept: Option<(RuleID, usize, usize)> = None;

            loop {
                let Some(symbol) = self.source.peek()? else {
                    break;
                };
                let next = dfa.next(state, partition.class_of(symbol));
                if next == DEAD_STATE {
                    break;
                }
                let Some(entry) = self.source.advance()? else {
                    break;
                };
                if let Symbol::Char(c) = entry.0 {
                    text.push(c);
                }
                trail.push(entry);
                state = next;
                if let Some(rule) = dfa.accept(state) {
                    last_accept = Some((rule, text.len(), trail.len()));
                }
            }

            let Some((rule, text_len, trail_len)) = last_accept else {
                // Nothing accepted. The EOF check has to happen before any
                // pushback: trailing anchors consumed while searching would
                // otherwise read as pending input.
                if text.is_empty() && self.source.peek()?.is_none() {
                    return self.finish_eof(start);
                }
                // The offending symbol is the one at the reported position:
                // the first consumed character, or the symbol the scan is
                // stuck on when nothing was consumed.
                let offending = match text.chars().next() {
                    Some(c) => c.escape_debug().to_string(),
                    None => match self.source.peek()? {
                        Some(symbol) => symbol.describe(),
                        None => "<end of file>".to_string(),
                    },
                };
                // Restore every consumed symbol; the stream still holds the
                // unrecognized input.
                for (symbol, position) in trail.drain(..).rev() {
                    self.source.push_back(symbol, position);
                }
                return Err(LexrError::new(LexrErrorKind::UnrecognizedInput {
                    name: self.name.clone(),
                    position: start,
                    symbol: offending,
                }));
            };

            // Give back everything consumed beyond the accepted match,
            // anchors included.
            for (symbol, position) in trail.drain(trail_len..).rev() {
                self.source.push_back(symbol, position);
            }
            text.truncate(text_len);
            trace!("matched rule {} text {:?} at {}", rule, text, start);

            self.text.clear();
            self.text.push_str(&text);
            self.match_position = start;

            match lexicon.rules[rule.as_usize()].action.clone() {
                Action::Ignore => {}
                Action::Text => {
                    self.last_position = start;
                    return Ok(Token::new(Some(V::from(text.clone())), text));
                }
                Action::Token(value) => {
                    self.last_position = start;
                    return Ok(Token::new(Some(value), text));
                }
                Action::Begin(state_name) => {
                    self.begin(&state_name)?;
                }
                Action::Call(callback) => {
                    let value = (*callback)(self, &text)?;
                    if let Some(token) = self.dequeue() {
                        return Ok(token);
                    }
                    if let Some(value) = value {
                        self.last_position = start;
                        return Ok(Token::new(Some(value), text));
                    }
                }
            }
        }
    }

    /// Returns an iterator over the remaining tokens, up to but not
    /// including the end-of-input sentinel.
    pub fn tokens(&mut self) -> Tokens<'_, V, U> {
        Tokens {
            scanner: self,
            done: false,
        }
    }

    // The input is exhausted: run the EOF hook exactly once, drain anything
    // it produced, then emit the sentinel.
    fn finish_eof(&mut self, start: Position) -> Result<Token<V>> {
        if !self.eof_hook_done {
            self.eof_hook_done = true;
            self.match_position = start;
            self.text.clear();
            if let Some(mut hook) = self.eof_hook.take() {
                let result = hook(self);
                self.eof_hook = Some(hook);
                result?;
            }
        }
        if let Some(token) = self.dequeue() {
            return Ok(token);
        }
        self.last_position = start;
        Ok(Token::new(None, String::new()))
    }
}

impl<V, U> std::fmt::Debug for Scanner<V, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("position", &self.last_position)
            .finish()
    }
}

/// An iterator over the tokens of a scanner.
///
/// The iterator yields `(value, text)` pairs and stops at the end-of-input
/// sentinel. Errors end the iteration after being yielded once. It can be
/// created with the [Scanner::tokens] method.
#[derive(Debug)]
pub struct Tokens<'a, V, U> {
    scanner: &'a mut Scanner<V, U>,
    done: bool,
}

impl<V, U> Iterator for Tokens<'_, V, U>
where
    V: Clone + From<String>,
{
    type Item = Result<(V, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.scanner.read() {
            Ok(token) => match token.into_pair() {
                (Some(value), text) => Some(Ok((value, text))),
                (None, _) => {
                    self.done = true;
                    None
                }
            },
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LexEntry, Pattern};

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn word_lexicon() -> Arc<Lexicon<String>> {
        Arc::new(
            Lexicon::new([
                LexEntry::rule(Pattern::str("Python"), Action::Token("A".into())),
                LexEntry::rule(Pattern::str("Perl"), Action::Token("B".into())),
                LexEntry::rule(Pattern::str("rocks"), Action::Token("C".into())),
                LexEntry::rule(Pattern::any(" \t\n").rep1(), Action::Ignore),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_read_sequence() {
        init();
        let mut scanner = Scanner::on_str(word_lexicon(), "Python rocks");
        assert_eq!(
            scanner.read().unwrap().into_pair(),
            (Some("A".to_string()), "Python".to_string())
        );
        assert_eq!(
            scanner.read().unwrap().into_pair(),
            (Some("C".to_string()), "rocks".to_string())
        );
        assert_eq!(scanner.read().unwrap().into_pair(), (None, String::new()));
        // The sentinel is idempotent.
        assert_eq!(scanner.read().unwrap().into_pair(), (None, String::new()));
    }

    #[test]
    fn test_position_reports_token_start() {
        init();
        let mut scanner = Scanner::on_str(word_lexicon(), "Python\n  rocks");
        scanner.read().unwrap();
        assert_eq!(scanner.position(), Position::new(1, 0));
        scanner.read().unwrap();
        assert_eq!(scanner.position(), Position::new(2, 2));
    }

    #[test]
    fn test_unrecognized_input() {
        init();
        let mut scanner = Scanner::on_str(word_lexicon(), "Python!").with_name("input.txt");
        scanner.read().unwrap();
        let error = scanner.read().unwrap_err();
        match *error.source {
            LexrErrorKind::UnrecognizedInput {
                ref name,
                position,
                ref symbol,
            } => {
                assert_eq!(name.as_deref(), Some("input.txt"));
                assert_eq!(position, Position::new(1, 6));
                assert_eq!(symbol, "!");
            }
            ref kind => panic!("unexpected error kind {:?}", kind),
        }
    }

    #[test]
    fn test_unrecognized_input_after_live_prefix() {
        init();
        // "Py" walks a live prefix of the "Python" rule before dying on 'x'.
        // The error must name the character at the reported position, and
        // the consumed prefix must go back onto the stream.
        let mut scanner = Scanner::on_str(word_lexicon(), "Pyx");
        let error = scanner.read().unwrap_err();
        match *error.source {
            LexrErrorKind::UnrecognizedInput {
                position,
                ref symbol,
                ..
            } => {
                assert_eq!(position, Position::new(1, 0));
                assert_eq!(symbol, "P");
            }
            ref kind => panic!("unexpected error kind {:?}", kind),
        }
        // The stream was restored, so a further read reports the same spot.
        let error = scanner.read().unwrap_err();
        match *error.source {
            LexrErrorKind::UnrecognizedInput {
                position,
                ref symbol,
                ..
            } => {
                assert_eq!(position, Position::new(1, 0));
                assert_eq!(symbol, "P");
            }
            ref kind => panic!("unexpected error kind {:?}", kind),
        }
    }

    #[test]
    fn test_longest_match_over_priority() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(Pattern::str("if"), Action::Token("K".into())),
                LexEntry::rule(
                    Pattern::range("az").unwrap().rep1(),
                    Action::Token("id".into()),
                ),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(Arc::clone(&lexicon), "ifx");
        assert_eq!(
            scanner.read().unwrap().into_pair(),
            (Some("id".to_string()), "ifx".to_string())
        );
        let mut scanner = Scanner::on_str(lexicon, "if");
        assert_eq!(
            scanner.read().unwrap().into_pair(),
            (Some("K".to_string()), "if".to_string())
        );
    }

    #[test]
    fn test_begin_switches_state() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(Pattern::range("az").unwrap().rep1(), Action::Text),
                LexEntry::rule(Pattern::str("(*"), Action::begin("comment")),
                LexEntry::rule(Pattern::any(" ").rep1(), Action::Ignore),
                LexEntry::state(
                    "comment",
                    [
                        (Pattern::str("*)"), Action::begin("")),
                        (Pattern::any_char(), Action::Ignore),
                    ],
                ),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "a (* hidden *) b");
        assert_eq!(scanner.read().unwrap().text, "a");
        assert_eq!(scanner.read().unwrap().text, "b");
        assert!(scanner.read().unwrap().is_eof());
    }

    #[test]
    fn test_state_restriction() {
        init();
        // In the "str" state only the quote rule exists, so the letters that
        // the default state would accept are unrecognized there.
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(Pattern::ch('"'), Action::begin("str")),
                LexEntry::rule(Pattern::range("az").unwrap().rep1(), Action::Text),
                LexEntry::state("str", [(Pattern::ch('"'), Action::begin(""))]),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "\"abc\"");
        let error = scanner.read().unwrap_err();
        assert!(matches!(
            *error.source,
            LexrErrorKind::UnrecognizedInput { .. }
        ));
    }

    #[test]
    fn test_begin_to_current_state_is_noop() {
        init();
        let lexicon: Arc<Lexicon<String>> =
            Arc::new(Lexicon::new([LexEntry::rule(Pattern::ch('x'), Action::Text)]).unwrap());
        let mut scanner = Scanner::on_str(lexicon, "x");
        scanner.begin("").unwrap();
        assert_eq!(scanner.read().unwrap().text, "x");
        assert!(scanner.begin("nope").is_err());
    }

    #[test]
    fn test_call_action_and_queue() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(
                    Pattern::range("09").unwrap().rep1(),
                    Action::call(|scanner, text| {
                        scanner.produce(format!("start:{}", text));
                        scanner.produce(format!("end:{}", text));
                        Ok(None)
                    }),
                ),
                LexEntry::rule(Pattern::any(" ").rep1(), Action::Ignore),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "42 7");
        assert_eq!(scanner.read().unwrap().value.as_deref(), Some("start:42"));
        assert_eq!(scanner.read().unwrap().value.as_deref(), Some("end:42"));
        assert_eq!(scanner.read().unwrap().value.as_deref(), Some("start:7"));
        assert_eq!(scanner.read().unwrap().value.as_deref(), Some("end:7"));
        assert!(scanner.read().unwrap().is_eof());
    }

    #[test]
    fn test_call_action_returning_none_ignores() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(Pattern::any(" ").rep1(), Action::call(|_, _| Ok(None))),
                LexEntry::rule(Pattern::range("az").unwrap().rep1(), Action::Text),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "  ab");
        assert_eq!(scanner.read().unwrap().text, "ab");
    }

    #[test]
    fn test_call_action_error_propagates() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([LexEntry::rule(
                Pattern::any_char(),
                Action::call(|_, text| Err(LexrError::action(format!("bad input {:?}", text)))),
            )])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "x");
        let error = scanner.read().unwrap_err();
        assert!(matches!(*error.source, LexrErrorKind::Action(_)));
    }

    #[test]
    fn test_eof_hook_produces_trailing_tokens() {
        init();
        let lexicon: Arc<Lexicon<String>> = Arc::new(
            Lexicon::new([LexEntry::rule(
                Pattern::range("az").unwrap().rep1(),
                Action::Text,
            )])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "ab").with_eof_hook(|scanner| {
            scanner.produce_with_text("trailer".to_string(), "");
            Ok(())
        });
        assert_eq!(scanner.read().unwrap().text, "ab");
        assert_eq!(scanner.read().unwrap().value.as_deref(), Some("trailer"));
        assert!(scanner.read().unwrap().is_eof());
        // The hook does not run again.
        assert!(scanner.read().unwrap().is_eof());
    }

    #[test]
    fn test_tokens_iterator() {
        init();
        let mut scanner = Scanner::on_str(word_lexicon(), "Perl rocks");
        let tokens: Vec<_> = scanner.tokens().collect::<Result<_>>().unwrap();
        assert_eq!(
            tokens,
            vec![
                ("B".to_string(), "Perl".to_string()),
                ("C".to_string(), "rocks".to_string())
            ]
        );
    }

    #[test]
    fn test_user_data_counter() {
        init();
        let lexicon: Arc<Lexicon<String, usize>> = Arc::new(
            Lexicon::new([
                LexEntry::rule(
                    Pattern::range("az").unwrap().rep1(),
                    Action::call(|scanner, text| {
                        *scanner.user_data_mut() += 1;
                        Ok(Some(text.to_string()))
                    }),
                ),
                LexEntry::rule(Pattern::any(" ").rep1(), Action::Ignore),
            ])
            .unwrap(),
        );
        let mut scanner = Scanner::on_str(lexicon, "a b c");
        while !scanner.read().unwrap().is_eof() {}
        assert_eq!(*scanner.user_data(), 3);
    }
}
