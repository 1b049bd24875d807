// SPDX-License-Identifier: Apache-2.0

use super::{Parse, Reduction, TokenClass};
use crate::token::Token;
use crate::ParseError;

/// Matches exactly one token against a [`TokenClass`].
///
/// Single-shot: the first token decides. Every later token is rejected,
/// including one that would have matched.
pub struct TokenMatcher {
    class: TokenClass,
    done: bool,
}

impl TokenMatcher {
    pub fn new(class: TokenClass) -> Self {
        Self { class, done: false }
    }
}

impl<T: From<Token>> Parse<T> for TokenMatcher {
    fn parse_step(&mut self, token: &Token) -> Result<Vec<Reduction<T>>, ParseError> {
        if self.done {
            return Ok(Vec::new());
        }
        self.done = true;
        if self.class.matches(token) {
            Ok(vec![Reduction::new(T::from(token.clone()), 1)])
        } else {
            Ok(Vec::new())
        }
    }

    fn is_live(&self) -> bool {
        !self.done
    }

    fn expected(&self, out: &mut Vec<TokenClass>) {
        if !self.done {
            out.push(self.class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Number, Separator};

    fn step(matcher: &mut TokenMatcher, token: Token) -> Vec<Reduction<Token>> {
        Parse::<Token>::parse_step(matcher, &token).unwrap()
    }

    #[test]
    fn matches_first_token_only() {
        let mut matcher = TokenMatcher::new(TokenClass::Primitive);
        assert_eq!(
            step(&mut matcher, Token::String("\"\"".into())),
            vec![Reduction::new(Token::String("\"\"".into()), 1)]
        );
        assert!(!Parse::<Token>::is_live(&matcher));
        assert_eq!(step(&mut matcher, Token::Number(Number::Integer(2))), vec![]);
    }

    #[test]
    fn mismatch_makes_matcher_inert() {
        let mut matcher = TokenMatcher::new(TokenClass::Separator(Separator::ArrayStart));
        let mut expected = Vec::new();
        Parse::<Token>::expected(&matcher, &mut expected);
        assert_eq!(
            expected,
            vec![TokenClass::Separator(Separator::ArrayStart)]
        );

        assert_eq!(step(&mut matcher, Token::Null), vec![]);
        assert_eq!(
            step(&mut matcher, Token::Separator(Separator::ArrayStart)),
            vec![]
        );
        assert!(!Parse::<Token>::is_live(&matcher));

        expected.clear();
        Parse::<Token>::expected(&matcher, &mut expected);
        assert!(expected.is_empty());
    }
}
