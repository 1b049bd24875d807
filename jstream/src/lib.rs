// SPDX-License-Identifier: Apache-2.0

//! Incremental JSON parsing, one character at a time.
//!
//! ```
//! let mut parser = jstream::StreamParser::new();
//! let mut values = Vec::new();
//! parser.push_str(r#"{"a": 1} [true, null] "#, &mut |item| values.push(item));
//! parser.finish(&mut |item| values.push(item));
//! assert_eq!(values.len(), 2);
//! assert_eq!(values[0].as_ref().unwrap().to_string(), r#"{"a":1}"#);
//! ```

// Compile-time configuration validation
mod config_check;

mod token;
pub use token::{ConfiguredInt, Number, Separator, Token};

pub mod lexer;
pub use lexer::Lexer;

pub mod combinator;

mod grammar;
pub use grammar::{Grammar, Node};

mod escape;

mod value;
pub use value::Value;

mod parse_error;
pub use parse_error::ParseError;

mod config;
pub use config::{Config, DuplicateKeys};

mod stream_parser;
pub use stream_parser::{from_str, values, StreamParser, Values};
