// SPDX-License-Identifier: Apache-2.0

use log::trace;

use super::{Constructor, Parse, Reduction, TokenClass};
use crate::token::Token;
use crate::ParseError;

/// Adds one completed item to the list built so far (`None` before the
/// first item).
pub type Fold<T> = Box<dyn Fn(Option<&T>, T) -> Result<T, ParseError>>;

enum Expect<T> {
    Item(Box<dyn Parse<T>>),
    Separator,
    Done,
}

struct Thread<T> {
    expect: Expect<T>,
    list: Option<T>,
    consumed: usize,
}

/// `Item (Separator Item)*`, reducing after every complete item.
///
/// Only one item parser runs at a time, so a list of n items never holds
/// more than one pending item and each token is handled in constant time
/// regardless of how long the list already is. The folded list node is
/// cloned into every reduction; `Fold` should build a persistent structure.
pub struct SeparatedList<T> {
    item: Constructor<T>,
    separator: TokenClass,
    fold: Fold<T>,
    threads: Vec<Thread<T>>,
}

impl<T> SeparatedList<T> {
    pub fn new(item: Constructor<T>, separator: TokenClass, fold: Fold<T>) -> Self {
        let first = Thread {
            expect: Expect::Item(item()),
            list: None,
            consumed: 0,
        };
        Self {
            item,
            separator,
            fold,
            threads: vec![first],
        }
    }
}

impl<T: Clone> Parse<T> for SeparatedList<T> {
    fn parse_step(&mut self, token: &Token) -> Result<Vec<Reduction<T>>, ParseError> {
        let mut reductions = Vec::new();
        let mut forks = Vec::new();
        for thread in &mut self.threads {
            let next = match &mut thread.expect {
                Expect::Item(parser) => {
                    for Reduction { node, consumed } in parser.parse_step(token)? {
                        let list = (self.fold)(thread.list.as_ref(), node)?;
                        let consumed = thread.consumed + consumed;
                        trace!("list item complete after {consumed} tokens");
                        reductions.push(Reduction::new(list.clone(), consumed));
                        forks.push(Thread {
                            expect: Expect::Separator,
                            list: Some(list),
                            consumed,
                        });
                    }
                    continue;
                }
                Expect::Separator if self.separator.matches(token) => {
                    thread.consumed += 1;
                    Expect::Item((self.item)())
                }
                Expect::Separator | Expect::Done => Expect::Done,
            };
            thread.expect = next;
        }
        self.threads.retain(|thread| match &thread.expect {
            Expect::Item(parser) => parser.is_live(),
            Expect::Separator => true,
            Expect::Done => false,
        });
        self.threads.extend(forks);
        Ok(reductions)
    }

    fn is_live(&self) -> bool {
        !self.threads.is_empty()
    }

    fn expected(&self, out: &mut Vec<TokenClass>) {
        for thread in &self.threads {
            match &thread.expect {
                Expect::Item(parser) => parser.expected(out),
                Expect::Separator => out.push(self.separator),
                Expect::Done => {}
            }
        }
    }
}
