//! This module contains the parser for the traditional regex syntax.
//! We use the `regex_syntax` crate to parse the syntax into an AST, although
//! only the regular subset of it is supported further down the line.

use crate::Result;

/// Parse the regex syntax into an abstract syntax tree.
/// The function returns an error if the regex syntax is invalid.
pub(crate) fn parse_regex_syntax(input: &str) -> Result<regex_syntax::ast::Ast> {
    let mut parser = regex_syntax::ast::parse::Parser::new();
    Ok(parser.parse(input)?)
}
