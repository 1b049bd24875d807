// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use log::{debug, trace, warn};

use crate::combinator::{Alternation, Parse, TokenClass};
use crate::grammar::{Grammar, Node};
use crate::lexer::Lexer;
use crate::token::{Separator, Token};
use crate::{Config, ParseError, Value};

/// Character-in, value-out JSON engine.
///
/// Drives a [`Lexer`] and the top-level grammar. The low-level interface
/// ([`feed_char`](Self::feed_char), [`flush_lexer`](Self::flush_lexer),
/// [`feed_token`](Self::feed_token)) exposes both stages separately; the
/// high-level one ([`push`](Self::push), [`finish`](Self::finish)) runs
/// them together and reports each completed value or error through a
/// callback.
///
/// Consecutive values need no delimiter other than whitespace. After an
/// error inside a value, the tokens that remain of that value are skipped
/// up to the bracket that closes it, and parsing resumes after it.
pub struct StreamParser {
    lexer: Lexer,
    grammar: Grammar,
    top: Alternation<Node>,
    /// Tokens fed since the stream started
    tokens_seen: usize,
    /// Tokens fed to the current top-level instance
    value_tokens: usize,
    /// Containers open in the current top-level value
    depth: usize,
    /// Containers still open in a rejected value whose tokens are skipped
    skipping: usize,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let grammar = Grammar::new(config);
        Self {
            lexer: Lexer::new(),
            grammar,
            top: grammar.value(),
            tokens_seen: 0,
            value_tokens: 0,
            depth: 0,
            skipping: 0,
        }
    }

    /// Advances the lexer by one character, passing confirmed tokens to
    /// `emit`.
    pub fn feed_char<F>(&mut self, c: char, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Token) + ?Sized,
    {
        self.lexer.push(c, emit).map_err(|err| {
            warn!("lexer rejected input: {err}");
            err.into()
        })
    }

    /// Flushes the last pending token after the real input has ended.
    pub fn flush_lexer<F>(&mut self, emit: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Token) + ?Sized,
    {
        trace!("flushing {} pending characters", self.lexer.pending());
        self.lexer.finish(emit).map_err(|err| {
            warn!("lexer rejected input at end of stream: {err}");
            err.into()
        })
    }

    /// Advances the top-level grammar by one token.
    ///
    /// Returns every value the token completed with the number of tokens it
    /// spans. A token that no live rule accepts is reported as
    /// [`ParseError::UnexpectedToken`]. The partial value is discarded and
    /// the rest of it, up to its closing bracket, is skipped.
    pub fn feed_token(&mut self, token: Token) -> Result<Vec<(Value, usize)>, ParseError> {
        let position = self.tokens_seen;
        self.tokens_seen += 1;
        trace!("token {position}: {token}");

        if self.skipping > 0 {
            self.skipping = nesting(self.skipping, &token);
            if self.skipping == 0 {
                debug!("rejected value ends at token {position}");
            }
            return Ok(Vec::new());
        }
        self.value_tokens += 1;

        let mut expected = Vec::new();
        self.top.expected(&mut expected);

        let reductions = match self.top.parse_step(&token) {
            Ok(reductions) => reductions,
            Err(err) => {
                warn!("failed to build value at token {position}: {err}");
                self.abandon(Some(&token));
                return Err(err);
            }
        };

        if reductions.is_empty() {
            if self.top.is_live() {
                self.depth = nesting(self.depth, &token);
                return Ok(Vec::new());
            }
            self.abandon(Some(&token));
            let err = ParseError::UnexpectedToken {
                found: token,
                expected: dedup(expected),
                position,
            };
            warn!("{err}");
            return Err(err);
        }

        let mut values = Vec::with_capacity(reductions.len());
        for reduction in reductions {
            let value = reduction.node.into_value()?;
            debug!("value complete at token {position} spanning {} tokens", reduction.consumed);
            values.push((value, reduction.consumed));
        }
        self.reset();
        Ok(values)
    }

    /// Feeds one character through both stages.
    ///
    /// Each value completed by this character is passed to `on_item`, as is
    /// each error raised on the way. Lexer errors abandon the partial value
    /// like grammar errors do.
    pub fn push<F>(&mut self, c: char, on_item: &mut F)
    where
        F: FnMut(Result<Value, ParseError>),
    {
        let mut tokens = Vec::new();
        let lexed = self.feed_char(c, &mut |token| tokens.push(token));
        self.parse_tokens(tokens, on_item);
        if let Err(err) = lexed {
            self.abandon(None);
            on_item(Err(err));
        }
    }

    pub fn push_str<F>(&mut self, s: &str, on_item: &mut F)
    where
        F: FnMut(Result<Value, ParseError>),
    {
        for c in s.chars() {
            self.push(c, on_item);
        }
    }

    /// Ends the current input stream.
    ///
    /// Flushes the lexer and reports [`ParseError::UnexpectedEndOfInput`] if
    /// a value was left incomplete. The parser can then be reused for a new
    /// stream.
    pub fn finish<F>(&mut self, on_item: &mut F)
    where
        F: FnMut(Result<Value, ParseError>),
    {
        loop {
            let mut tokens = Vec::new();
            let lexed = self.flush_lexer(&mut |token| tokens.push(token));
            self.parse_tokens(tokens, on_item);
            match lexed {
                Ok(()) => break,
                Err(err) => {
                    self.abandon(None);
                    on_item(Err(err));
                }
            }
        }
        if self.skipping > 0 {
            debug!("input ended inside a rejected value");
            self.skipping = 0;
        }
        if self.is_mid_value() {
            let err = ParseError::UnexpectedEndOfInput {
                position: self.tokens_seen,
            };
            warn!("{err}");
            self.reset();
            on_item(Err(err));
        }
    }

    /// True while a value has started but not completed.
    pub fn is_mid_value(&self) -> bool {
        self.value_tokens > 0
    }

    /// Number of tokens fed to the grammar so far.
    pub fn tokens_seen(&self) -> usize {
        self.tokens_seen
    }

    /// Absolute character offset of the next character.
    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    fn parse_tokens<F>(&mut self, tokens: Vec<Token>, on_item: &mut F)
    where
        F: FnMut(Result<Value, ParseError>),
    {
        for token in tokens {
            match self.feed_token(token) {
                Ok(values) => {
                    for (value, _) in values {
                        on_item(Ok(value));
                    }
                }
                Err(err) => on_item(Err(err)),
            }
        }
    }

    /// Discards the current top-level instance and builds a fresh one.
    fn reset(&mut self) {
        if self.value_tokens > 0 {
            debug!("new top-level value after {} tokens", self.tokens_seen);
        }
        self.top = self.grammar.value();
        self.value_tokens = 0;
        self.depth = 0;
    }

    /// Drops the partial value after an error, at `token` for grammar
    /// errors, and skips the containers it left open.
    fn abandon(&mut self, token: Option<&Token>) {
        let open = token.map_or(self.depth, |token| nesting(self.depth, token));
        self.skipping = self.skipping.max(open);
        if self.skipping > 0 {
            debug!("skipping {} open containers", self.skipping);
        }
        self.reset();
    }
}

/// Container depth after `token`.
fn nesting(depth: usize, token: &Token) -> usize {
    match token {
        Token::Separator(Separator::ObjectStart | Separator::ArrayStart) => depth + 1,
        Token::Separator(Separator::ObjectEnd | Separator::ArrayEnd) => depth.saturating_sub(1),
        _ => depth,
    }
}

fn dedup(classes: Vec<TokenClass>) -> Vec<TokenClass> {
    let mut out: Vec<TokenClass> = Vec::with_capacity(classes.len());
    for class in classes {
        if !out.contains(&class) {
            out.push(class);
        }
    }
    out
}

/// Lazy iterator over the values of a character source.
///
/// Errors are yielded in place and iteration continues after them, so
/// collecting into `Result<Vec<_>, _>` stops at the first one.
pub struct Values<I> {
    chars: I,
    parser: StreamParser,
    queue: VecDeque<Result<Value, ParseError>>,
    finished: bool,
}

impl<I: Iterator<Item = char>> Values<I> {
    pub fn new(chars: I, config: Config) -> Self {
        Self {
            chars,
            parser: StreamParser::with_config(config),
            queue: VecDeque::new(),
            finished: false,
        }
    }
}

impl<I: Iterator<Item = char>> Iterator for Values<I> {
    type Item = Result<Value, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.queue.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            let queue = &mut self.queue;
            match self.chars.next() {
                Some(c) => self.parser.push(c, &mut |item| queue.push_back(item)),
                None => {
                    self.finished = true;
                    self.parser.finish(&mut |item| queue.push_back(item));
                }
            }
        }
    }
}

/// Iterates the values of any character source with the default [`Config`].
pub fn values<I>(chars: I) -> Values<I::IntoIter>
where
    I: IntoIterator<Item = char>,
{
    Values::new(chars.into_iter(), Config::default())
}

/// Parses every value of a complete text, stopping at the first error.
pub fn from_str(text: &str) -> Result<Vec<Value>, ParseError> {
    values(text.chars()).collect()
}
