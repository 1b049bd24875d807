// SPDX-License-Identifier: Apache-2.0

//! Incremental parser combinators.
//!
//! Every parser consumes tokens one at a time through [`Parse::parse_step`]
//! and answers with the reductions that the token completed. A reduction
//! carries the node it built and the number of raw tokens it spans, so a
//! parent can tell how far back a reduction reaches.
//!
//! Parsers are built from three pieces: a single-shot [`TokenMatcher`], an
//! ordered [`Rule`] and a parallel [`Alternation`]. [`SeparatedList`] covers
//! repetition without recursion. Grammars that recurse construct a fresh
//! instance for every use of a nonterminal through a [`Constructor`].

use crate::token::{Separator, Token};
use crate::ParseError;

mod alternation;
mod rule;
mod separated_list;
mod token_matcher;

pub use alternation::Alternation;
pub use rule::{Formatter, Rule};
pub use separated_list::{Fold, SeparatedList};
pub use token_matcher::TokenMatcher;

/// A completed grammar rule: the node it built and the tokens it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction<T> {
    pub node: T,
    pub consumed: usize,
}

impl<T> Reduction<T> {
    pub fn new(node: T, consumed: usize) -> Self {
        Self { node, consumed }
    }
}

/// Builds a fresh parser instance on demand.
pub type Constructor<T> = Box<dyn Fn() -> Box<dyn Parse<T>>>;

/// Wraps a function building a concrete parser into a [`Constructor`].
pub fn constructor<T, P, F>(build: F) -> Constructor<T>
where
    F: Fn() -> P + 'static,
    P: Parse<T> + 'static,
{
    Box::new(move || Box::new(build()) as Box<dyn Parse<T>>)
}

/// An incremental parser over a token stream.
pub trait Parse<T> {
    /// Feeds the next token and returns every reduction it completed.
    ///
    /// An empty result means "nothing completed yet", not failure: a parser
    /// that spans several tokens reports nothing until its last one.
    fn parse_step(&mut self, token: &Token) -> Result<Vec<Reduction<T>>, ParseError>;

    /// False once no future token can make this parser reduce again.
    fn is_live(&self) -> bool;

    /// Collects the token classes that live matchers are waiting for.
    fn expected(&self, out: &mut Vec<TokenClass>);
}

/// Token predicate used by [`TokenMatcher`], also reported back in errors as
/// the set of tokens the grammar expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// One specific structural character
    Separator(Separator),
    /// A string literal
    String,
    /// Any token that is a complete value on its own
    Primitive,
}

impl TokenClass {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            TokenClass::Separator(separator) => token.is_separator(*separator),
            TokenClass::String => matches!(token, Token::String(_)),
            TokenClass::Primitive => token.is_primitive(),
        }
    }
}

impl core::fmt::Display for TokenClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenClass::Separator(s) => write!(f, "'{}'", s.as_char()),
            TokenClass::String => f.write_str("string"),
            TokenClass::Primitive => f.write_str("primitive value"),
        }
    }
}
