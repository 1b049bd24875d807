// SPDX-License-Identifier: Apache-2.0

use log::trace;

use super::{Constructor, Parse, Reduction, TokenClass};
use crate::token::Token;
use crate::ParseError;

/// Turns the sub-results of a completed [`Rule`] into its node.
pub type Formatter<T> = Box<dyn Fn(Vec<T>) -> Result<T, ParseError>>;

/// One position inside a rule: the sub-parser at `cursor`, the results of the
/// sub-parsers before it and the tokens they consumed.
struct Thread<T> {
    cursor: usize,
    parser: Box<dyn Parse<T>>,
    results: Vec<T>,
    consumed: usize,
}

/// An ordered sequence of sub-parsers, one grammar production.
///
/// Tokens go to the sub-parser at the cursor. When it reduces, its result is
/// recorded and the next sub-parser is constructed; after the last one the
/// formatter builds this rule's own reduction. There is no backtracking: a
/// sub-parser that never reduces stalls the rule forever.
///
/// A sub-parser may reduce more than once (a list completes after `1` and
/// again after `1, 2`). Each reduction therefore forks a new thread at
/// the next cursor, and the thread that reduced stays around for as long as
/// its sub-parser is live. Threads never share their partial results.
pub struct Rule<T> {
    steps: Vec<Constructor<T>>,
    formatter: Formatter<T>,
    threads: Vec<Thread<T>>,
}

impl<T> Rule<T> {
    /// Creates the rule and instantiates its first sub-parser.
    ///
    /// `steps` must not be empty.
    pub fn new(steps: Vec<Constructor<T>>, formatter: Formatter<T>) -> Self {
        let threads = steps
            .first()
            .map(|first| Thread {
                cursor: 0,
                parser: first(),
                results: Vec::new(),
                consumed: 0,
            })
            .into_iter()
            .collect();
        Self {
            steps,
            formatter,
            threads,
        }
    }
}

impl<T: Clone> Parse<T> for Rule<T> {
    fn parse_step(&mut self, token: &Token) -> Result<Vec<Reduction<T>>, ParseError> {
        let mut reductions = Vec::new();
        let mut forks = Vec::new();
        for thread in &mut self.threads {
            let completed = thread.parser.parse_step(token)?;
            let spent = !thread.parser.is_live();
            let last = completed.len();
            for (i, Reduction { node, consumed }) in completed.into_iter().enumerate() {
                // A spent thread hands its results over instead of copying
                let mut results = if spent && i + 1 == last {
                    core::mem::take(&mut thread.results)
                } else {
                    thread.results.clone()
                };
                results.push(node);
                let consumed = thread.consumed + consumed;
                let cursor = thread.cursor + 1;
                match self.steps.get(cursor) {
                    Some(next) => forks.push(Thread {
                        cursor,
                        parser: next(),
                        results,
                        consumed,
                    }),
                    None => {
                        trace!("rule reduced {} sub-results over {consumed} tokens", results.len());
                        reductions.push(Reduction::new((self.formatter)(results)?, consumed));
                    }
                }
            }
        }
        self.threads.retain(|thread| thread.parser.is_live());
        self.threads.extend(forks);
        Ok(reductions)
    }

    fn is_live(&self) -> bool {
        !self.threads.is_empty()
    }

    fn expected(&self, out: &mut Vec<TokenClass>) {
        for thread in &self.threads {
            thread.parser.expected(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{constructor, TokenMatcher};
    use crate::token::{Number, Separator};

    fn matcher(class: TokenClass) -> Constructor<Token> {
        constructor(move || TokenMatcher::new(class))
    }

    fn sep(separator: Separator) -> Token {
        Token::Separator(separator)
    }

    fn feed(rule: &mut Rule<Token>, tokens: &[Token]) -> Vec<Reduction<Token>> {
        let mut out = Vec::new();
        for token in tokens {
            out.extend(rule.parse_step(token).unwrap());
        }
        out
    }

    /// `'[' primitive ']'`, reduced to the primitive in the middle.
    fn bracketed() -> Rule<Token> {
        Rule::new(
            vec![
                matcher(TokenClass::Separator(Separator::ArrayStart)),
                matcher(TokenClass::Primitive),
                matcher(TokenClass::Separator(Separator::ArrayEnd)),
            ],
            Box::new(|mut results: Vec<Token>| Ok(results.swap_remove(1))),
        )
    }

    #[test]
    fn reduces_after_last_sub_parser() {
        let mut rule = bracketed();
        let one = Token::Number(Number::Integer(1));
        assert_eq!(rule.parse_step(&sep(Separator::ArrayStart)).unwrap(), vec![]);
        assert_eq!(rule.parse_step(&one).unwrap(), vec![]);
        assert_eq!(
            rule.parse_step(&sep(Separator::ArrayEnd)).unwrap(),
            vec![Reduction::new(one, 3)]
        );
        // Inert once complete
        assert!(!rule.is_live());
        assert_eq!(
            feed(&mut rule, &[sep(Separator::ArrayStart), Token::Null, sep(Separator::ArrayEnd)]),
            vec![]
        );
    }

    #[test]
    fn mismatch_stalls_the_rule() {
        let mut rule = bracketed();
        let out = feed(
            &mut rule,
            &[sep(Separator::ArrayStart), sep(Separator::ArrayStart), Token::Null],
        );
        assert!(out.is_empty());
        assert!(!rule.is_live());
    }

    #[test]
    fn expected_follows_cursor() {
        let mut rule = bracketed();
        rule.parse_step(&sep(Separator::ArrayStart)).unwrap();
        let mut expected = Vec::new();
        rule.expected(&mut expected);
        assert_eq!(expected, vec![TokenClass::Primitive]);
    }

    #[test]
    fn spent_thread_moves_its_results() {
        use std::rc::Rc;

        fn shared(class: TokenClass) -> Constructor<Rc<Token>> {
            constructor(move || TokenMatcher::new(class))
        }
        let mut rule: Rule<Rc<Token>> = Rule::new(
            vec![
                shared(TokenClass::Separator(Separator::ArrayStart)),
                shared(TokenClass::Separator(Separator::ArrayEnd)),
            ],
            Box::new(|mut results: Vec<Rc<Token>>| {
                if Rc::strong_count(&results[0]) != 1 {
                    return Err(ParseError::UnexpectedState("results were copied"));
                }
                Ok(results.swap_remove(0))
            }),
        );
        rule.parse_step(&sep(Separator::ArrayStart)).unwrap();
        let reductions = rule.parse_step(&sep(Separator::ArrayEnd)).unwrap();
        assert_eq!(reductions.len(), 1);
        assert_eq!(*reductions[0].node, sep(Separator::ArrayStart));
    }

    #[test]
    fn formatter_errors_propagate() {
        let mut rule: Rule<Token> = Rule::new(
            vec![matcher(TokenClass::Primitive)],
            Box::new(|_: Vec<Token>| Err(ParseError::UnexpectedState("test formatter"))),
        );
        assert_eq!(
            rule.parse_step(&Token::Null),
            Err(ParseError::UnexpectedState("test formatter"))
        );
    }
}
