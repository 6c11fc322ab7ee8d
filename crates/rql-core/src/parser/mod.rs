//! Query parser
//!
//! A hand-written recursive descent parser with speculative matching over
//! a backtrackable scanner.

mod error;
mod parser;

pub use error::{Error, ParseError, QueryError, Result};
pub use parser::{Parser, ParserOptions, QueryType, DEFAULT_MAX_CONNECTIVES, DEFAULT_MAX_DEPTH};
