// SPDX-License-Identifier: Apache-2.0

use super::{Constructor, Parse, Reduction, TokenClass};
use crate::token::Token;
use crate::ParseError;

/// Runs several alternatives side by side over the same tokens.
///
/// Each alternative is instantiated once and decides for itself whether a
/// token is relevant. The step result is the union of all reductions; an
/// unambiguous grammar yields at most one. Alternatives that can no longer
/// reduce are dropped.
pub struct Alternation<T> {
    alternatives: Vec<Box<dyn Parse<T>>>,
}

impl<T> Alternation<T> {
    pub fn new(alternatives: &[Constructor<T>]) -> Self {
        Self {
            alternatives: alternatives.iter().map(|construct| construct()).collect(),
        }
    }
}

impl<T> Parse<T> for Alternation<T> {
    fn parse_step(&mut self, token: &Token) -> Result<Vec<Reduction<T>>, ParseError> {
        let mut reductions = Vec::new();
        for alternative in &mut self.alternatives {
            reductions.extend(alternative.parse_step(token)?);
        }
        self.alternatives.retain(|alternative| alternative.is_live());
        Ok(reductions)
    }

    fn is_live(&self) -> bool {
        !self.alternatives.is_empty()
    }

    fn expected(&self, out: &mut Vec<TokenClass>) {
        for alternative in &self.alternatives {
            alternative.expected(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinator::{constructor, Rule, TokenMatcher};
    use crate::token::{Number, Separator};

    fn matcher(class: TokenClass) -> Constructor<Token> {
        constructor(move || TokenMatcher::new(class))
    }

    fn pair_rule(first: TokenClass, second: TokenClass) -> Constructor<Token> {
        constructor(move || {
            Rule::new(
                vec![matcher(first), matcher(second)],
                Box::new(|mut results: Vec<Token>| Ok(results.remove(0))),
            )
        })
    }

    #[test]
    fn picks_the_matching_alternative() {
        let colon = TokenClass::Separator(Separator::Colon);
        let comma = TokenClass::Separator(Separator::Comma);
        let mut alternation = Alternation::new(&[
            pair_rule(TokenClass::String, colon),
            pair_rule(TokenClass::String, comma),
        ]);
        let key = Token::String("\"k\"".into());
        assert_eq!(alternation.parse_step(&key).unwrap(), vec![]);

        let mut expected = Vec::new();
        alternation.expected(&mut expected);
        assert_eq!(expected, vec![colon, comma]);

        assert_eq!(
            alternation
                .parse_step(&Token::Separator(Separator::Comma))
                .unwrap(),
            vec![Reduction::new(key, 2)]
        );
        assert!(!alternation.is_live());
    }

    #[test]
    fn reports_every_simultaneous_reduction() {
        let mut alternation = Alternation::new(&[
            matcher(TokenClass::Primitive),
            matcher(TokenClass::Primitive),
        ]);
        let two = Token::Number(Number::Integer(2));
        assert_eq!(
            alternation.parse_step(&two).unwrap(),
            vec![Reduction::new(two.clone(), 1), Reduction::new(two, 1)]
        );
    }

    #[test]
    fn dead_when_no_alternative_accepts() {
        let mut alternation: Alternation<Token> = Alternation::new(&[matcher(TokenClass::String)]);
        assert_eq!(alternation.parse_step(&Token::Null).unwrap(), vec![]);
        assert!(!alternation.is_live());
    }
}
