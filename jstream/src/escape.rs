// SPDX-License-Identifier: Apache-2.0

//! Decoding of string literals into their text, and the reverse escaping used
//! when a value is rendered back to JSON.

use crate::ParseError;

/// Check if a Unicode codepoint is a high surrogate (0xD800-0xDBFF)
fn is_high_surrogate(codepoint: u32) -> bool {
    (0xD800..=0xDBFF).contains(&codepoint)
}

/// Check if a Unicode codepoint is a low surrogate (0xDC00-0xDFFF)
fn is_low_surrogate(codepoint: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&codepoint)
}

fn read_hex4(chars: &mut core::str::Chars<'_>) -> Result<u32, ParseError> {
    let mut codepoint = 0;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or(ParseError::InvalidUnicodeHex)?;
        codepoint = codepoint * 16 + digit;
    }
    Ok(codepoint)
}

/// Strips the quotes off a string literal and decodes its escape sequences.
///
/// The lexer has already checked the literal against the string pattern, so
/// only surrogate pairing can still fail here.
pub fn unescape(literal: &str) -> Result<String, ParseError> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or(ParseError::UnexpectedState("string literal without quotes"))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    let mut pending_high: Option<u32> = None;
    while let Some(c) = chars.next() {
        if c != '\\' {
            if pending_high.is_some() {
                return Err(ParseError::InvalidUnicodeCodepoint);
            }
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or(ParseError::InvalidEscapeSequence)?;
        if escaped != 'u' {
            if pending_high.is_some() {
                return Err(ParseError::InvalidUnicodeCodepoint);
            }
            out.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                '"' => '"',
                '/' => '/',
                'b' => '\u{8}',
                'f' => '\u{c}',
                _ => return Err(ParseError::InvalidEscapeSequence),
            });
            continue;
        }
        let codepoint = read_hex4(&mut chars)?;
        let scalar = match pending_high.take() {
            Some(high) if is_low_surrogate(codepoint) => {
                0x10000 + ((high & 0x3FF) << 10) + (codepoint & 0x3FF)
            }
            Some(_) => return Err(ParseError::InvalidUnicodeCodepoint),
            None if is_high_surrogate(codepoint) => {
                pending_high = Some(codepoint);
                continue;
            }
            None => codepoint,
        };
        out.push(char::from_u32(scalar).ok_or(ParseError::InvalidUnicodeCodepoint)?);
    }
    if pending_high.is_some() {
        return Err(ParseError::InvalidUnicodeCodepoint);
    }
    Ok(out)
}

/// Writes `s` as a quoted JSON string literal.
pub fn write_escaped(f: &mut impl core::fmt::Write, s: &str) -> core::fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            c if (c as u32) < 0x20 => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
