//! This module contains the symbol source that feeds the scan loop.
//! It layers anchor injection, position tracking and a pushback stack over a
//! [CharRead], turning the character stream into a stream of [Symbol]s.

use std::collections::VecDeque;

use crate::{stream::CharRead, Position, Result};

/// An effective input symbol: a real character or one of the three virtual
/// anchor symbols injected at structural boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Symbol {
    /// A character read from the underlying stream.
    Char(char),
    /// The virtual beginning-of-line symbol.
    Bol,
    /// The virtual end-of-line symbol, yielded before a newline and before
    /// the end of the input.
    Eol,
    /// The virtual end-of-file symbol.
    Eof,
}

impl Symbol {
    /// Returns true for the virtual anchor symbols.
    #[allow(dead_code)]
    pub(crate) fn is_anchor(&self) -> bool {
        !matches!(self, Symbol::Char(_))
    }

    /// Render the symbol for diagnostics.
    pub(crate) fn describe(&self) -> String {
        match self {
            Symbol::Char(c) => c.escape_debug().to_string(),
            Symbol::Bol => "<beginning of line>".to_string(),
            Symbol::Eol => "<end of line>".to_string(),
            Symbol::Eof => "<end of file>".to_string(),
        }
    }
}

/// The symbol source of a scanner.
///
/// Anchor injection invariant: each anchor is yielded at most once per its
/// logical position. `Bol` before the first symbol of a line, `Eol` before a
/// newline and before the end of the input, `Eof` once at the end of the
/// input. Consuming the newline resets the flags for the next line.
pub(crate) struct SymbolSource {
    reader: Box<dyn CharRead>,
    // Characters decoded but not yet consumed.
    buffer: VecDeque<char>,
    // Symbols pushed back by the scan loop after a longest-match cut-off.
    // Entries carry the position at which the symbol is yielded; while the
    // stack is non-empty the top entry defines the current position.
    pushback: Vec<(Symbol, Position)>,
    line: usize,
    column: usize,
    bol_pending: bool,
    eol_done: bool,
    eof_done: bool,
    reader_exhausted: bool,
    chunk: String,
}

impl SymbolSource {
    pub(crate) fn new(reader: Box<dyn CharRead>) -> Self {
        Self {
            reader,
            buffer: VecDeque::new(),
            pushback: Vec::new(),
            line: 1,
            column: 0,
            bol_pending: true,
            eol_done: false,
            eof_done: false,
            reader_exhausted: false,
            chunk: String::new(),
        }
    }

    /// The position of the next symbol to be yielded.
    pub(crate) fn position(&self) -> Position {
        self.pushback
            .last()
            .map(|(_, pos)| *pos)
            .unwrap_or(Position {
                line: self.line,
                column: self.column,
            })
    }

    /// Peek the next effective symbol without consuming it.
    /// Returns `None` when the input is exhausted and every anchor has been
    /// consumed.
    pub(crate) fn peek(&mut self) -> Result<Option<Symbol>> {
        if let Some((symbol, _)) = self.pushback.last() {
            return Ok(Some(*symbol));
        }
        if self.bol_pending {
            return Ok(Some(Symbol::Bol));
        }
        self.fill()?;
        match self.buffer.front() {
            Some('\n') if !self.eol_done => Ok(Some(Symbol::Eol)),
            Some(c) => Ok(Some(Symbol::Char(*c))),
            None => {
                if !self.eol_done {
                    Ok(Some(Symbol::Eol))
                } else if !self.eof_done {
                    Ok(Some(Symbol::Eof))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Consume the next effective symbol and return it along with the
    /// position it was yielded at.
    pub(crate) fn advance(&mut self) -> Result<Option<(Symbol, Position)>> {
        if let Some(entry) = self.pushback.pop() {
            return Ok(Some(entry));
        }
        let Some(symbol) = self.peek()? else {
            return Ok(None);
        };
        let position = Position {
            line: self.line,
            column: self.column,
        };
        match symbol {
            Symbol::Bol => self.bol_pending = false,
            Symbol::Eol => self.eol_done = true,
            Symbol::Eof => self.eof_done = true,
            Symbol::Char(c) => {
                self.buffer.pop_front();
                if c == '\n' {
                    self.line += 1;
                    self.column = 0;
                    self.bol_pending = true;
                    self.eol_done = false;
                } else {
                    self.column += 1;
                }
            }
        }
        Ok(Some((symbol, position)))
    }

    /// Push a symbol back so that it is yielded again, restoring the position
    /// it was consumed at. Symbols must be pushed back in reverse consumption
    /// order.
    pub(crate) fn push_back(&mut self, symbol: Symbol, position: Position) {
        self.pushback.push((symbol, position));
    }

    fn fill(&mut self) -> Result<()> {
        while self.buffer.is_empty() && !self.reader_exhausted {
            self.chunk.clear();
            let count = self.reader.read_chars(&mut self.chunk)?;
            if count == 0 {
                self.reader_exhausted = true;
            } else {
                self.buffer.extend(self.chunk.chars());
            }
        }
        Ok(())
    }
}
