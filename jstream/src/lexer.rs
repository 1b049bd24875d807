// SPDX-License-Identifier: Apache-2.0

//! Online longest-match lexer.
//!
//! The lexer is fed one character at a time. Characters collect in a pending
//! buffer until the longest token at the buffer start can no longer grow:
//! a tentative match is confirmed once appending a character left its span
//! unchanged and at least [`LOOKAHEAD`] characters of trailing context follow
//! it. The buffer therefore only ever holds the token being scanned plus a
//! few characters of context.

use log::trace;

use crate::token::{Number, Separator, Token};

/// Characters of trailing context required past a tentative match before it
/// is confirmed.
pub const LOOKAHEAD: usize = 2;

/// Character fed by [`Lexer::finish`] to flush the final pending token.
const SENTINEL: char = '\n';

#[derive(PartialEq, Clone)]
pub struct Error {
    kind: ErrKind,
    character: char,
    position: usize,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ErrKind {
    /// Input that is neither whitespace nor the start of any token.
    InvalidToken,
    /// A raw control character inside a string literal.
    UnescapedControlCharacter,
    /// An integer that does not fit the configured integer type.
    NumericOverflow,
    InvalidNumber,
}

impl Error {
    pub fn new<T>(kind: ErrKind, character: char, position: usize) -> Result<T, Self> {
        Err(Self {
            kind,
            character,
            position,
        })
    }

    pub fn kind(&self) -> ErrKind {
        self.kind
    }

    pub fn character(&self) -> char {
        self.character
    }

    /// Absolute character offset in the input stream.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?}({:?}) at {}",
            self.kind, self.character, self.position
        )
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

/// Lexicon entries, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Pattern {
    Separator,
    Number,
    String,
    True,
    False,
    Null,
}

const PATTERNS: [Pattern; 6] = [
    Pattern::Separator,
    Pattern::Number,
    Pattern::String,
    Pattern::True,
    Pattern::False,
    Pattern::Null,
];

/// A match anchored at the buffer start.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Match {
    pattern: Pattern,
    len: usize,
}

pub struct Lexer {
    /// Characters not yet consumed into a token
    buffer: Vec<char>,
    /// Match seen at the previous step, awaiting confirmation
    tentative: Option<Match>,
    /// Absolute position of `buffer[0]` in the input stream
    consumed: usize,
}

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Lexer {
            buffer: Vec::new(),
            tentative: None,
            consumed: 0,
        }
    }

    /// Number of characters waiting for a decision.
    pub(crate) fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Absolute position of the next character to be fed.
    pub fn position(&self) -> usize {
        self.consumed + self.buffer.len()
    }

    /// Feeds one character, passing every token it confirmed to `emit`.
    ///
    /// Tokens confirmed before an error are emitted before the error is
    /// returned. On error the broken prefix is discarded; characters after
    /// it stay buffered and are lexed with the next push.
    pub fn push<F>(&mut self, c: char, emit: &mut F) -> Result<(), Error>
    where
        F: FnMut(Token) + ?Sized,
    {
        self.buffer.push(c);
        loop {
            self.skip_whitespace();
            let Some(current) = longest_match(&self.buffer) else {
                self.tentative = None;
                if !self.buffer.is_empty() && !is_viable_prefix(&self.buffer) {
                    return Err(self.reject());
                }
                return Ok(());
            };
            let confirmed = self.tentative == Some(current)
                && current.len + LOOKAHEAD < self.buffer.len();
            if !confirmed {
                self.tentative = Some(current);
                return Ok(());
            }
            let token = self.take(current)?;
            trace!("lexer confirmed {token:?} before {}", self.consumed);
            emit(token);
            // The rest of the buffer has already been seen one character
            // shorter, so its previous match can be reconstructed directly.
            self.skip_whitespace();
            self.tentative = match self.buffer.len() {
                0 => None,
                n => longest_match(&self.buffer[..n - 1]),
            };
        }
    }

    /// Feeds every character of `s`.
    pub fn push_str<F>(&mut self, s: &str, emit: &mut F) -> Result<(), Error>
    where
        F: FnMut(Token) + ?Sized,
    {
        for c in s.chars() {
            self.push(c, emit)?;
        }
        Ok(())
    }

    /// Flushes the final pending token by feeding `LOOKAHEAD + 1` sentinels.
    ///
    /// After an error, characters behind the rejected ones may still be
    /// buffered; calling `finish` again flushes them.
    pub fn finish<F>(&mut self, emit: &mut F) -> Result<(), Error>
    where
        F: FnMut(Token) + ?Sized,
    {
        for _ in 0..=LOOKAHEAD {
            self.push(SENTINEL, emit)?;
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        let run = self
            .buffer
            .iter()
            .take_while(|c| is_whitespace(**c))
            .count();
        if run > 0 {
            self.buffer.drain(..run);
            self.consumed += run;
        }
    }

    /// Slices a confirmed match off the buffer and converts it.
    fn take(&mut self, m: Match) -> Result<Token, Error> {
        let position = self.consumed;
        let lexeme: String = self.buffer.drain(..m.len).collect();
        self.consumed += m.len;
        self.tentative = None;
        Ok(match m.pattern {
            Pattern::Separator => match lexeme.chars().next().and_then(Separator::from_char) {
                Some(separator) => Token::Separator(separator),
                None => return Error::new(ErrKind::InvalidToken, ' ', position),
            },
            Pattern::Number => Token::Number(Number::from_lexeme(&lexeme, position)?),
            Pattern::String => Token::String(lexeme),
            Pattern::True => Token::Bool(true),
            Pattern::False => Token::Bool(false),
            Pattern::Null => Token::Null,
        })
    }

    /// Builds the error for an unlexable buffer and resynchronizes.
    fn reject(&mut self) -> Error {
        let viable = (0..self.buffer.len())
            .find(|&n| !is_viable_prefix(&self.buffer[..=n]))
            .unwrap_or(0);
        let character = self.buffer[viable];
        let kind = if self.buffer[0] == '"' && is_control(character) {
            ErrKind::UnescapedControlCharacter
        } else {
            ErrKind::InvalidToken
        };
        let position = self.consumed + viable;
        // An offending character that begins a token of its own survives
        let resume = if viable > 0 && starts_token(character) {
            viable
        } else {
            viable + 1
        };
        self.buffer.drain(..resume);
        self.consumed += resume;
        self.tentative = None;
        Error {
            kind,
            character,
            position,
        }
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn starts_token(c: char) -> bool {
    is_whitespace(c) || longest_match(&[c]).is_some() || is_viable_prefix(&[c])
}

fn is_control(c: char) -> bool {
    (c as u32) < 0x20
}

/// First pattern, in priority order, that matches at the start of `buf`.
fn longest_match(buf: &[char]) -> Option<Match> {
    PATTERNS.iter().find_map(|&pattern| {
        let len = match pattern {
            Pattern::Separator => match_separator(buf),
            Pattern::Number => match_number(buf),
            Pattern::String => match_string(buf),
            Pattern::True => match_literal(buf, "true"),
            Pattern::False => match_literal(buf, "false"),
            Pattern::Null => match_literal(buf, "null"),
        }?;
        Some(Match { pattern, len })
    })
}

fn match_separator(buf: &[char]) -> Option<usize> {
    buf.first()
        .and_then(|c| Separator::from_char(*c))
        .map(|_| 1)
}

fn count_digits(buf: &[char], from: usize) -> usize {
    buf[from.min(buf.len())..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count()
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([Ee][+-]?[0-9]+)?`
fn match_number(buf: &[char]) -> Option<usize> {
    let mut i = 0;
    if buf.first() == Some(&'-') {
        i += 1;
    }
    match buf.get(i)? {
        '0' => i += 1,
        '1'..='9' => i += 1 + count_digits(buf, i + 1),
        _ => return None,
    }
    if buf.get(i) == Some(&'.') {
        let fraction = count_digits(buf, i + 1);
        if fraction > 0 {
            i += 1 + fraction;
        }
    }
    if matches!(buf.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(buf.get(j), Some('+' | '-')) {
            j += 1;
        }
        let exponent = count_digits(buf, j);
        if exponent > 0 {
            i = j + exponent;
        }
    }
    Some(i)
}

/// Outcome of scanning a string literal from the buffer start.
enum StringScan {
    /// Closing quote found; total length including both quotes
    Complete(usize),
    /// Every character so far is valid but the literal is not closed
    Open,
    /// A character that no string literal can contain at this point
    Invalid,
}

fn scan_string(buf: &[char]) -> StringScan {
    if buf.first() != Some(&'"') {
        return StringScan::Invalid;
    }
    let mut i = 1;
    while let Some(&c) = buf.get(i) {
        match c {
            '"' => return StringScan::Complete(i + 1),
            '\\' => match buf.get(i + 1) {
                None => return StringScan::Open,
                Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => i += 2,
                Some('u') => {
                    for k in 0..4 {
                        match buf.get(i + 2 + k) {
                            None => return StringScan::Open,
                            Some(h) if h.is_ascii_hexdigit() => {}
                            Some(_) => return StringScan::Invalid,
                        }
                    }
                    i += 6;
                }
                Some(_) => return StringScan::Invalid,
            },
            c if is_control(c) => return StringScan::Invalid,
            _ => i += 1,
        }
    }
    StringScan::Open
}

fn match_string(buf: &[char]) -> Option<usize> {
    match scan_string(buf) {
        StringScan::Complete(len) => Some(len),
        StringScan::Open | StringScan::Invalid => None,
    }
}

fn match_literal(buf: &[char], literal: &str) -> Option<usize> {
    let len = literal.chars().count();
    (buf.len() >= len && buf.iter().copied().take(len).eq(literal.chars())).then_some(len)
}

/// True if appending more characters to `buf` could still produce a match.
/// Only meaningful when [`longest_match`] found nothing.
fn is_viable_prefix(buf: &[char]) -> bool {
    let is_prefix_of = |literal: &str| {
        buf.len() < literal.len() && buf.iter().copied().eq(literal.chars().take(buf.len()))
    };
    buf == ['-']
        || matches!(scan_string(buf), StringScan::Open)
        || is_prefix_of("true")
        || is_prefix_of("false")
        || is_prefix_of("null")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn lex(input: &str) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        lexer.push_str(input, &mut |t| tokens.push(t))?;
        lexer.finish(&mut |t| tokens.push(t))?;
        Ok(tokens)
    }

    fn push(lexer: &mut Lexer, c: char) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        lexer.push(c, &mut |t| tokens.push(t))?;
        Ok(tokens)
    }

    fn sep(c: char) -> Token {
        Token::Separator(Separator::from_char(c).unwrap())
    }

    #[test]
    fn test_number_pattern() {
        assert_eq!(match_number(&chars("10")), Some(2));
        assert_eq!(match_number(&chars("-0.5e+3x")), Some(7));
        assert_eq!(match_number(&chars("01")), Some(1));
        assert_eq!(match_number(&chars("1.")), Some(1));
        assert_eq!(match_number(&chars("1e")), Some(1));
        assert_eq!(match_number(&chars("1e+")), Some(1));
        assert_eq!(match_number(&chars("-")), None);
        assert_eq!(match_number(&chars("-a")), None);
        assert_eq!(match_number(&chars(".5")), None);
    }

    #[test]
    fn test_string_pattern() {
        assert_eq!(match_string(&chars(r#""""#)), Some(2));
        assert_eq!(match_string(&chars(r#""a\"b" tail"#)), Some(6));
        assert_eq!(match_string(&chars(r#""é""#)), Some(3));
        assert_eq!(match_string(&chars(r#""\u00e"#)), None);
        assert!(matches!(scan_string(&chars(r#""\u00e"#)), StringScan::Open));
        assert!(matches!(scan_string(&chars(r#""\x"#)), StringScan::Invalid));
        assert!(matches!(scan_string(&chars("\"a\nb\"")), StringScan::Invalid));
    }

    #[test]
    fn test_viable_prefixes() {
        assert!(is_viable_prefix(&chars("tru")));
        assert!(is_viable_prefix(&chars("fa")));
        assert!(is_viable_prefix(&chars("n")));
        assert!(is_viable_prefix(&chars("-")));
        assert!(is_viable_prefix(&chars("\"open")));
        assert!(!is_viable_prefix(&chars("x")));
        assert!(!is_viable_prefix(&chars("trux")));
        assert!(!is_viable_prefix(&chars(".")));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(lex(""), Ok(vec![]));
        assert_eq!(lex(" \t\r\n "), Ok(vec![]));
    }

    #[test]
    fn test_number_waits_for_lookahead() {
        let mut lexer = Lexer::new();
        assert_eq!(push(&mut lexer, '1'), Ok(vec![]));
        assert_eq!(push(&mut lexer, '0'), Ok(vec![]));
        // "10" is not confirmed until three characters of context follow it
        assert_eq!(push(&mut lexer, ' '), Ok(vec![]));
        assert_eq!(push(&mut lexer, ' '), Ok(vec![]));
        assert_eq!(
            push(&mut lexer, ' '),
            Ok(vec![Token::Number(Number::Integer(10))])
        );
        assert_eq!(lexer.pending(), 0);
        assert_eq!(lexer.position(), 5);
    }

    #[test]
    fn test_maximal_munch() {
        assert_eq!(lex("10"), Ok(vec![Token::Number(Number::Integer(10))]));
        assert_eq!(
            lex("10.1e10"),
            Ok(vec![Token::Number(Number::Float(10.1e10))])
        );
        assert_eq!(lex("1e+5"), Ok(vec![Token::Number(Number::Float(1e5))]));
        assert_eq!(lex("true"), Ok(vec![Token::Bool(true)]));
        assert_eq!(lex("false null"), Ok(vec![Token::Bool(false), Token::Null]));
    }

    #[test]
    fn test_structural_sequence() {
        assert_eq!(
            lex(r#"{"hi": [10,12]}"#),
            Ok(vec![
                sep('{'),
                Token::String("\"hi\"".into()),
                sep(':'),
                sep('['),
                Token::Number(Number::Integer(10)),
                sep(','),
                Token::Number(Number::Integer(12)),
                sep(']'),
                sep('}'),
            ])
        );
    }

    #[test]
    fn test_deep_nesting_drains_on_finish() {
        let tokens = lex("[[[[[[]]]]]]").unwrap();
        assert_eq!(tokens.len(), 12);
        assert_eq!(tokens[0], sep('['));
        assert_eq!(tokens[11], sep(']'));
    }

    #[test]
    fn test_leading_zero_splits() {
        assert_eq!(
            lex("01"),
            Ok(vec![
                Token::Number(Number::Integer(0)),
                Token::Number(Number::Integer(1))
            ])
        );
    }

    #[test]
    fn test_invalid_character() {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        lexer.push_str("[1,x", &mut |t| tokens.push(t)).unwrap();
        let err = lexer.finish(&mut |t| tokens.push(t)).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidToken);
        assert_eq!(err.character(), 'x');
        assert_eq!(err.position(), 3);
        // Tokens in front of the bad character are delivered before the error
        assert_eq!(
            tokens,
            vec![sep('['), Token::Number(Number::Integer(1)), sep(',')]
        );
    }

    #[test]
    fn test_trailing_garbage_after_literal() {
        let err = lex("truex").unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidToken);
        assert_eq!(err.character(), 'x');
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_unterminated_string_on_finish() {
        let err = lex("\"abc").unwrap_err();
        assert_eq!(err.kind(), ErrKind::UnescapedControlCharacter);
        assert_eq!(err.character(), '\n');
        assert_eq!(err.position(), 4);
    }

    #[test]
    fn test_incomplete_literal_on_finish() {
        let err = lex("nul").unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidToken);
        assert_eq!(err.position(), 3);
    }

    #[test]
    fn test_resumes_after_error() {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        assert!(lexer.push_str(" ?", &mut |t| tokens.push(t)).is_err());
        lexer.push_str(" 7", &mut |t| tokens.push(t)).unwrap();
        lexer.finish(&mut |t| tokens.push(t)).unwrap();
        assert_eq!(tokens, vec![Token::Number(Number::Integer(7))]);
    }

    #[test]
    fn test_bracket_after_bad_character_survives() {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        let err = lexer.push_str("[1, @]", &mut |t| tokens.push(t)).unwrap_err();
        assert_eq!(err.character(), '@');
        assert_eq!(err.position(), 4);
        // push_str stopped at ']', which completed the rejection
        lexer.push_str(" 7", &mut |t| tokens.push(t)).unwrap();
        lexer.finish(&mut |t| tokens.push(t)).unwrap();
        assert_eq!(
            tokens,
            vec![
                sep('['),
                Token::Number(Number::Integer(1)),
                sep(','),
                sep(']'),
                Token::Number(Number::Integer(7)),
            ]
        );
    }

    #[test]
    fn test_broken_literal_keeps_following_separator() {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        let err = lexer.push_str("[tru]", &mut |t| tokens.push(t)).unwrap_err();
        assert_eq!(err.kind(), ErrKind::InvalidToken);
        assert_eq!(err.character(), ']');
        assert_eq!(err.position(), 4);
        lexer.finish(&mut |t| tokens.push(t)).unwrap();
        assert_eq!(lexer.pending(), 0);
        assert_eq!(tokens, vec![sep('['), sep(']')]);
    }

    #[test]
    fn test_finish_again_after_error() {
        let mut tokens = Vec::new();
        let mut lexer = Lexer::new();
        lexer.push_str("1x]", &mut |t| tokens.push(t)).unwrap();
        let err = lexer.finish(&mut |t| tokens.push(t)).unwrap_err();
        assert_eq!(err.character(), 'x');
        assert_eq!(err.position(), 1);
        assert_eq!(tokens, vec![Token::Number(Number::Integer(1))]);
        // The ']' behind the bad character is still buffered
        assert!(lexer.pending() > 0);
        lexer.finish(&mut |t| tokens.push(t)).unwrap();
        assert_eq!(tokens, vec![Token::Number(Number::Integer(1)), sep(']')]);
        assert_eq!(lexer.pending(), 0);
    }

    #[test]
    fn test_error_debug_format() {
        let err: Result<(), Error> = Error::new(ErrKind::InvalidToken, 'x', 5);
        assert_eq!(format!("{:?}", err.unwrap_err()), "InvalidToken('x') at 5");
    }
}
