// SPDX-License-Identifier: Apache-2.0

use crate::combinator::TokenClass;
use crate::lexer;
use crate::token::Token;

/// Errors that can occur during JSON parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An error bubbled up from the lexer.
    TokenizerError(lexer::Error),
    /// A token that no live grammar rule accepts.
    UnexpectedToken {
        found: Token,
        /// What the grammar was waiting for, deduplicated.
        expected: Vec<TokenClass>,
        /// Index of the offending token in the token stream.
        position: usize,
    },
    /// Input ended in the middle of a value.
    UnexpectedEndOfInput {
        /// Number of tokens seen.
        position: usize,
    },
    /// Invalid hex digits in Unicode escape sequence.
    InvalidUnicodeHex,
    /// Valid hex but invalid Unicode codepoint.
    InvalidUnicodeCodepoint,
    /// Invalid escape sequence character.
    InvalidEscapeSequence,
    /// The parser entered an unexpected internal state.
    UnexpectedState(&'static str),
}

impl ParseError {
    /// True for errors raised by the lexer rather than the grammar.
    pub fn is_lexical(&self) -> bool {
        matches!(self, ParseError::TokenizerError(_))
    }
}

impl From<lexer::Error> for ParseError {
    fn from(err: lexer::Error) -> Self {
        ParseError::TokenizerError(err)
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::TokenizerError(e) => write!(f, "{e}"),
            ParseError::UnexpectedToken {
                found,
                expected,
                position,
            } => {
                write!(f, "Unexpected token {found} at token {position}, expected ")?;
                for (i, class) in expected.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{class}")?;
                }
                if expected.is_empty() {
                    f.write_str("nothing")?;
                }
                Ok(())
            }
            ParseError::UnexpectedEndOfInput { position } => {
                write!(f, "Unexpected end of input after {position} tokens")
            }
            _ => write!(f, "{self:?}"),
        }
    }
}

impl std::error::Error for ParseError {}
