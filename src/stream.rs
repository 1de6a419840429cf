//! Module with the character stream contract and its adapters.
//! A scanner reads its input through the [CharRead] trait, so any source
//! that can hand out chunks of characters can feed a scanner.

use std::io::{self, Read};

use crate::Result;

/// A source of characters for a scanner.
///
/// `read_chars` appends zero or more characters to `buf` and returns how many
/// were appended. Returning `0` signals the end of the input; the scanner
/// will not call again after that.
pub trait CharRead {
    /// Read the next chunk of characters into `buf`.
    fn read_chars(&mut self, buf: &mut String) -> Result<usize>;
}

impl CharRead for Box<dyn CharRead> {
    fn read_chars(&mut self, buf: &mut String) -> Result<usize> {
        (**self).read_chars(buf)
    }
}

/// A [CharRead] over an in-memory string.
#[derive(Debug, Clone)]
pub struct StrReader {
    input: String,
    exhausted: bool,
}

impl StrReader {
    /// Create a new reader over the given input.
    pub fn new<T: Into<String>>(input: T) -> Self {
        Self {
            input: input.into(),
            exhausted: false,
        }
    }
}

impl CharRead for StrReader {
    fn read_chars(&mut self, buf: &mut String) -> Result<usize> {
        if self.exhausted {
            return Ok(0);
        }
        self.exhausted = true;
        buf.push_str(&self.input);
        Ok(self.input.chars().count())
    }
}

impl From<&str> for StrReader {
    fn from(input: &str) -> Self {
        StrReader::new(input)
    }
}

impl From<String> for StrReader {
    fn from(input: String) -> Self {
        StrReader::new(input)
    }
}

/// A [CharRead] that incrementally decodes UTF-8 from any [std::io::Read].
///
/// Multi-byte sequences split across read calls are carried over to the next
/// chunk. Invalid UTF-8 surfaces as an I/O error.
#[derive(Debug)]
pub struct Utf8Reader<R> {
    inner: R,
    // Undecoded tail bytes of an incomplete sequence from the previous chunk.
    carry: Vec<u8>,
}

impl<R: Read> Utf8Reader<R> {
    /// Create a new reader decoding the given byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            carry: Vec::with_capacity(4),
        }
    }
}

const CHUNK_SIZE: usize = 8192;

impl<R: Read> CharRead for Utf8Reader<R> {
    fn read_chars(&mut self, buf: &mut String) -> Result<usize> {
        // Loop until at least one complete character was decoded; a chunk may
        // consist entirely of the prefix of a multi-byte sequence.
        loop {
            let mut bytes = std::mem::take(&mut self.carry);
            let offset = bytes.len();
            bytes.resize(offset + CHUNK_SIZE, 0);
            let n = self.inner.read(&mut bytes[offset..])?;
            bytes.truncate(offset + n);

            if n == 0 {
                if bytes.is_empty() {
                    return Ok(0);
                }
                // The stream ended in the middle of a multi-byte sequence.
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "stream ends with an incomplete UTF-8 sequence",
                )
                .into());
            }

            let decoded = match std::str::from_utf8(&bytes) {
                Ok(s) => s,
                Err(e) => {
                    if e.error_len().is_some() {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            "invalid UTF-8 in stream",
                        )
                        .into());
                    }
                    // An incomplete trailing sequence; keep it for the next call.
                    let valid_up_to = e.valid_up_to();
                    self.carry = bytes[valid_up_to..].to_vec();
                    std::str::from_utf8(&bytes[..valid_up_to]).expect("valid prefix")
                }
            };
            let count = decoded.chars().count();
            if count > 0 {
                buf.push_str(decoded);
                return Ok(count);
            }
        }
    }
}
