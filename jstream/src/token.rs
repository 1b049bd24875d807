// SPDX-License-Identifier: Apache-2.0

//! Lexical tokens produced by the [`Lexer`](crate::Lexer).

use crate::lexer::{ErrKind, Error};

// Type alias for the configured integer type
#[cfg(feature = "int32")]
pub type ConfiguredInt = i32;
#[cfg(feature = "int64")]
pub type ConfiguredInt = i64;

/// One of the six structural characters of JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `:`
    Colon,
    /// `,`
    Comma,
}

impl Separator {
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '{' => Some(Separator::ObjectStart),
            '}' => Some(Separator::ObjectEnd),
            '[' => Some(Separator::ArrayStart),
            ']' => Some(Separator::ArrayEnd),
            ':' => Some(Separator::Colon),
            ',' => Some(Separator::Comma),
            _ => None,
        }
    }

    pub const fn as_char(&self) -> char {
        match self {
            Separator::ObjectStart => '{',
            Separator::ObjectEnd => '}',
            Separator::ArrayStart => '[',
            Separator::ArrayEnd => ']',
            Separator::Colon => ':',
            Separator::Comma => ',',
        }
    }
}

/// A parsed JSON number.
///
/// Integers stay integers: a number lexeme without a fraction or exponent is
/// always an [`Number::Integer`], everything else is a [`Number::Float`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer that fits in the configured integer type
    Integer(ConfiguredInt),
    /// Number with a fraction and/or exponent
    Float(f64),
}

impl Number {
    /// Parses a lexeme already accepted by the number pattern.
    ///
    /// `position` locates the error when an integer does not fit the
    /// configured width or a float is out of `f64` range.
    pub(crate) fn from_lexeme(lexeme: &str, position: usize) -> Result<Self, Error> {
        if is_integer(lexeme) {
            lexeme
                .parse::<ConfiguredInt>()
                .map(Number::Integer)
                .or_else(|_| Error::new(ErrKind::NumericOverflow, first_char(lexeme), position))
        } else {
            // Rust parses out-of-range exponents to infinity, which has no
            // JSON rendering
            match lexeme.parse::<f64>() {
                Ok(val) if val.is_finite() => Ok(Number::Float(val)),
                _ => Error::new(ErrKind::InvalidNumber, first_char(lexeme), position),
            }
        }
    }

    pub fn as_int(&self) -> Option<ConfiguredInt> {
        match self {
            Number::Integer(val) => Some(*val),
            Number::Float(_) => None,
        }
    }

    /// For integers, converts to f64.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(val) => *val as f64,
            Number::Float(val) => *val,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        !self.is_integer()
    }
}

impl From<ConfiguredInt> for Number {
    fn from(val: ConfiguredInt) -> Self {
        Number::Integer(val)
    }
}

impl From<f64> for Number {
    fn from(val: f64) -> Self {
        Number::Float(val)
    }
}

impl core::fmt::Display for Number {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Number::Integer(val) => write!(f, "{val}"),
            // Debug formatting keeps the fraction (`1.0`, `1e300`), so the text
            // lexes back to a float.
            Number::Float(val) => write!(f, "{val:?}"),
        }
    }
}

/// Detects if a number lexeme represents an integer (no decimal point or exponent).
fn is_integer(lexeme: &str) -> bool {
    !lexeme.contains(['.', 'e', 'E'])
}

fn first_char(lexeme: &str) -> char {
    lexeme.chars().next().unwrap_or(' ')
}

/// A classified unit of lexical input.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Separator(Separator),
    /// A string literal, still quoted and escaped exactly as it appeared in
    /// the input. The grammar strips the quotes and decodes the escapes.
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

impl Token {
    pub fn is_separator(&self, separator: Separator) -> bool {
        matches!(self, Token::Separator(s) if *s == separator)
    }

    /// True for tokens that form a complete value on their own.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Token::Separator(_))
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Token::Separator(s) => write!(f, "'{}'", s.as_char()),
            Token::String(raw) => f.write_str(raw),
            Token::Number(n) => write!(f, "{n}"),
            Token::Bool(b) => write!(f, "{b}"),
            Token::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separator_chars_round_trip() {
        for c in ['{', '}', '[', ']', ':', ','] {
            assert_eq!(Separator::from_char(c).map(|s| s.as_char()), Some(c));
        }
        assert_eq!(Separator::from_char('x'), None);
    }

    #[test]
    fn number_type_follows_lexeme_shape() {
        assert_eq!(Number::from_lexeme("10", 0), Ok(Number::Integer(10)));
        assert_eq!(Number::from_lexeme("-0", 0), Ok(Number::Integer(0)));
        assert_eq!(Number::from_lexeme("10.1e10", 0), Ok(Number::Float(10.1e10)));
        assert_eq!(Number::from_lexeme("1E2", 0), Ok(Number::Float(100.0)));
        assert_eq!(Number::from_lexeme("2.5", 0), Ok(Number::Float(2.5)));
    }

    #[test]
    fn float_out_of_range_is_invalid() {
        for lexeme in ["1e400", "-1e400", "1.5E+999"] {
            let err = Number::from_lexeme(lexeme, 3).unwrap_err();
            assert_eq!(err.kind(), ErrKind::InvalidNumber, "{lexeme}");
            assert_eq!(err.position(), 3);
        }
        // Underflow rounds to zero, which is still a number
        assert_eq!(Number::from_lexeme("1e-400", 0), Ok(Number::Float(0.0)));
        assert_eq!(
            Number::from_lexeme("1.7976931348623157e308", 0),
            Ok(Number::Float(f64::MAX))
        );
    }

    #[test]
    fn integer_overflow_is_reported() {
        let too_big = "99999999999999999999999";
        assert_eq!(
            Number::from_lexeme(too_big, 7),
            Error::new(ErrKind::NumericOverflow, '9', 7)
        );
    }

    #[test]
    fn float_display_keeps_fraction() {
        assert_eq!(Number::Float(1.0).to_string(), "1.0");
        assert_eq!(Number::Float(1.01e11).to_string(), "101000000000.0");
        assert_eq!(Number::Integer(-3).to_string(), "-3");
    }
}
