// SPDX-License-Identifier: Apache-2.0

//! The JSON grammar, wired from the combinators:
//!
//! ```text
//! Value      ::= Primitive | Object | Array
//! Object     ::= '{' '}'  |  '{' Members '}'
//! Members    ::= Pair (',' Pair)*
//! Pair       ::= String ':' Value
//! Array      ::= '[' ']'  |  '[' Elements ']'
//! Elements   ::= Value (',' Value)*
//! Primitive  ::= String | Number | Bool | Null
//! ```
//!
//! Nested values construct a new `Value` instance per level, so nesting
//! lives on the heap. `Members` and `Elements` are [`SeparatedList`]s: one
//! item parser at a time, each completed item prepended to a shared
//! [`Chain`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::combinator::{
    constructor, Alternation, Constructor, Rule, SeparatedList, TokenClass, TokenMatcher,
};
use crate::escape::unescape;
use crate::token::{Separator, Token};
use crate::{Config, DuplicateKeys, ParseError, Value};

type Member = (String, Value);

/// Intermediate results flowing between grammar rules.
///
/// Values are reference counted so that forking a rule thread does not copy
/// the subtrees it has already built. Lists hold their items newest first.
#[derive(Debug, Clone)]
pub enum Node {
    Token(Token),
    Value(Rc<Value>),
    Pair(Rc<Member>),
    Members(Chain<Rc<Member>>),
    Elements(Chain<Rc<Value>>),
}

impl From<Token> for Node {
    fn from(token: Token) -> Self {
        Node::Token(token)
    }
}

impl Node {
    /// Unwraps a complete top-level value.
    pub fn into_value(self) -> Result<Value, ParseError> {
        match self {
            Node::Value(value) => Ok(Rc::unwrap_or_clone(value)),
            _ => Err(ParseError::UnexpectedState("top-level reduction is not a value")),
        }
    }
}

/// Persistent singly linked list: prepending shares the tail, so adding an
/// item to a list that other threads still hold costs O(1).
#[derive(Debug)]
pub struct Chain<T>(Option<Rc<Link<T>>>);

#[derive(Debug)]
struct Link<T> {
    head: T,
    tail: Chain<T>,
}

impl<T> Chain<T> {
    fn single(head: T) -> Self {
        Chain(None).prepend(head)
    }

    fn prepend(&self, head: T) -> Self {
        Chain(Some(Rc::new(Link {
            head,
            tail: self.clone(),
        })))
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        let mut next = self.0.as_deref();
        core::iter::from_fn(move || {
            let link = next?;
            next = link.tail.0.as_deref();
            Some(&link.head)
        })
    }

    /// Items from head to tail. Links nobody else holds are moved out; the
    /// rest of the chain is cloned from the first shared link on.
    fn into_vec(mut self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::new();
        let mut next = self.0.take();
        while let Some(rc) = next {
            match Rc::try_unwrap(rc) {
                Ok(mut link) => {
                    next = link.tail.0.take();
                    out.push(link.head);
                }
                Err(shared) => {
                    out.push(shared.head.clone());
                    out.extend(shared.tail.iter().cloned());
                    break;
                }
            }
        }
        out
    }
}

impl<T> Clone for Chain<T> {
    fn clone(&self) -> Self {
        Chain(self.0.clone())
    }
}

// Unlink iteratively; the default recursive drop overflows on long arrays.
impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        let mut next = self.0.take();
        while let Some(rc) = next {
            match Rc::try_unwrap(rc) {
                Ok(mut link) => next = link.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}

fn malformed(rule: &'static str) -> ParseError {
    ParseError::UnexpectedState(rule)
}

fn token(class: TokenClass) -> Constructor<Node> {
    constructor(move || TokenMatcher::new(class))
}

fn separator(separator: Separator) -> Constructor<Node> {
    token(TokenClass::Separator(separator))
}

/// Factory for grammar instances. Copied into every constructor closure.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    duplicate_keys: DuplicateKeys,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Grammar {
    pub fn new(config: Config) -> Self {
        Self {
            duplicate_keys: config.duplicate_keys,
        }
    }

    /// `Value ::= Primitive | Object | Array`, the top-level entry point.
    pub fn value(self) -> Alternation<Node> {
        Alternation::new(&[
            constructor(move || self.primitive()),
            constructor(move || self.object()),
            constructor(move || self.array()),
        ])
    }

    pub fn primitive(self) -> Rule<Node> {
        Rule::new(vec![token(TokenClass::Primitive)], Box::new(format_primitive))
    }

    pub fn object(self) -> Alternation<Node> {
        let policy = self.duplicate_keys;
        Alternation::new(&[
            constructor(|| {
                Rule::new(
                    vec![
                        separator(Separator::ObjectStart),
                        separator(Separator::ObjectEnd),
                    ],
                    Box::new(format_empty_object),
                )
            }),
            constructor(move || {
                Rule::new(
                    vec![
                        separator(Separator::ObjectStart),
                        constructor(move || self.members()),
                        separator(Separator::ObjectEnd),
                    ],
                    Box::new(move |results: Vec<Node>| format_object(results, policy)),
                )
            }),
        ])
    }

    pub fn members(self) -> SeparatedList<Node> {
        SeparatedList::new(
            constructor(move || self.pair()),
            TokenClass::Separator(Separator::Comma),
            Box::new(fold_member),
        )
    }

    pub fn pair(self) -> Rule<Node> {
        Rule::new(
            vec![
                token(TokenClass::String),
                separator(Separator::Colon),
                constructor(move || self.value()),
            ],
            Box::new(format_pair),
        )
    }

    pub fn array(self) -> Alternation<Node> {
        Alternation::new(&[
            constructor(|| {
                Rule::new(
                    vec![
                        separator(Separator::ArrayStart),
                        separator(Separator::ArrayEnd),
                    ],
                    Box::new(format_empty_array),
                )
            }),
            constructor(move || {
                Rule::new(
                    vec![
                        separator(Separator::ArrayStart),
                        constructor(move || self.elements()),
                        separator(Separator::ArrayEnd),
                    ],
                    Box::new(format_array),
                )
            }),
        ])
    }

    pub fn elements(self) -> SeparatedList<Node> {
        SeparatedList::new(
            constructor(move || self.value()),
            TokenClass::Separator(Separator::Comma),
            Box::new(fold_element),
        )
    }
}

fn primitive_value(token: Token) -> Result<Value, ParseError> {
    Ok(match token {
        Token::String(literal) => Value::String(unescape(&literal)?),
        Token::Number(n) => Value::Number(n),
        Token::Bool(b) => Value::Bool(b),
        Token::Null => Value::Null,
        Token::Separator(_) => return Err(malformed("separator reduced as a primitive")),
    })
}

fn format_primitive(results: Vec<Node>) -> Result<Node, ParseError> {
    match <[Node; 1]>::try_from(results) {
        Ok([Node::Token(token)]) => Ok(Node::Value(Rc::new(primitive_value(token)?))),
        _ => Err(malformed("Primitive")),
    }
}

fn format_empty_object(_: Vec<Node>) -> Result<Node, ParseError> {
    Ok(Node::Value(Rc::new(Value::Object(Vec::new()))))
}

fn format_object(results: Vec<Node>, policy: DuplicateKeys) -> Result<Node, ParseError> {
    let members = match <[Node; 3]>::try_from(results) {
        Ok([_, Node::Members(members), _]) => members,
        _ => return Err(malformed("Object")),
    };
    let mut members = members.into_vec();
    members.reverse();
    let mut out: Vec<Member> = Vec::with_capacity(members.len());
    let mut seen: HashMap<String, usize> = HashMap::new();
    for member in members {
        let (key, value) = Rc::unwrap_or_clone(member);
        match (policy, seen.get(&key).copied()) {
            (DuplicateKeys::LastWins, Some(index)) => out[index].1 = value,
            (DuplicateKeys::FirstWins, Some(_)) => {}
            _ => {
                seen.insert(key.clone(), out.len());
                out.push((key, value));
            }
        }
    }
    Ok(Node::Value(Rc::new(Value::Object(out))))
}

fn fold_member(members: Option<&Node>, pair: Node) -> Result<Node, ParseError> {
    match (members, pair) {
        (None, Node::Pair(pair)) => Ok(Node::Members(Chain::single(pair))),
        (Some(Node::Members(members)), Node::Pair(pair)) => {
            Ok(Node::Members(members.prepend(pair)))
        }
        _ => Err(malformed("Members")),
    }
}

fn format_pair(results: Vec<Node>) -> Result<Node, ParseError> {
    match <[Node; 3]>::try_from(results) {
        Ok([Node::Token(Token::String(key)), _, Node::Value(value)]) => Ok(Node::Pair(Rc::new((
            unescape(&key)?,
            Rc::unwrap_or_clone(value),
        )))),
        _ => Err(malformed("Pair")),
    }
}

fn format_empty_array(_: Vec<Node>) -> Result<Node, ParseError> {
    Ok(Node::Value(Rc::new(Value::Array(Vec::new()))))
}

fn format_array(results: Vec<Node>) -> Result<Node, ParseError> {
    match <[Node; 3]>::try_from(results) {
        Ok([_, Node::Elements(elements), _]) => {
            let mut elements: Vec<Value> = elements
                .into_vec()
                .into_iter()
                .map(Rc::unwrap_or_clone)
                .collect();
            elements.reverse();
            Ok(Node::Value(Rc::new(Value::Array(elements))))
        }
        _ => Err(malformed("Array")),
    }
}

fn fold_element(elements: Option<&Node>, value: Node) -> Result<Node, ParseError> {
    match (elements, value) {
        (None, Node::Value(value)) => Ok(Node::Elements(Chain::single(value))),
        (Some(Node::Elements(elements)), Node::Value(value)) => {
            Ok(Node::Elements(elements.prepend(value)))
        }
        _ => Err(malformed("Elements")),
    }
}
