//! Module with the action type.
//! Every lexicon rule pairs a pattern with an action that decides what
//! happens when the pattern wins the match at the cursor.

use std::sync::Arc;

use crate::{Result, Scanner};

/// The callback type of a [Action::Call] action. It receives the scanner and
/// the matched text and may return a token value, or `None` to discard the
/// match. State for stateful actions belongs in the scanner's user data slot.
pub type Callback<V, U> =
    Arc<dyn Fn(&mut Scanner<V, U>, &str) -> Result<Option<V>> + Send + Sync>;

/// The action of a lexicon rule.
pub enum Action<V, U = ()> {
    /// Discard the match and resume scanning.
    Ignore,
    /// Return the matched text as the token value.
    Text,
    /// Switch the scanner to the named scanner state; no token is produced.
    Begin(String),
    /// Return the given value as the token value.
    Token(V),
    /// Invoke a callback with the scanner and the matched text. Tokens queued
    /// with [Scanner::produce] during the callback win over its return value;
    /// a `None` return value means the match is discarded.
    Call(Callback<V, U>),
}

impl<V, U> Action<V, U> {
    /// Create a [Action::Call] action from a closure.
    pub fn call<F>(f: F) -> Self
    where
        F: Fn(&mut Scanner<V, U>, &str) -> Result<Option<V>> + Send + Sync + 'static,
    {
        Action::Call(Arc::new(f))
    }

    /// Create a [Action::Begin] action switching to the named scanner state.
    pub fn begin<T: Into<String>>(state: T) -> Self {
        Action::Begin(state.into())
    }
}

impl<V: Clone, U> Clone for Action<V, U> {
    fn clone(&self) -> Self {
        match self {
            Action::Ignore => Action::Ignore,
            Action::Text => Action::Text,
            Action::Begin(state) => Action::Begin(state.clone()),
            Action::Token(value) => Action::Token(value.clone()),
            Action::Call(callback) => Action::Call(callback.clone()),
        }
    }
}

impl<V: std::fmt::Debug, U> std::fmt::Debug for Action<V, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Ignore => write!(f, "Ignore"),
            Action::Text => write!(f, "Text"),
            Action::Begin(state) => f.debug_tuple("Begin").field(state).finish(),
            Action::Token(value) => f.debug_tuple("Token").field(value).finish(),
            Action::Call(_) => write!(f, "Call(..)"),
        }
    }
}
