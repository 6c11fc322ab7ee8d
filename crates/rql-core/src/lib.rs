//! # rql-core
//!
//! A parser and AST for RQL, the query language of a document database.
//!
//! This crate provides:
//! - A backtrackable scanner driven by a hand-written recursive descent
//!   parser
//! - An owned, serializable AST that renders back to canonical query text
//! - Read-only and mutable visitors over the parsed query
//!
//! ## Parsing
//!
//! ```rust
//! let query = rql_core::parse(
//!     "FROM Users WHERE Age >= 18 AND Country = 'IL' ORDER BY Name SELECT Name",
//! )
//! .unwrap();
//!
//! assert_eq!(query.from.source.path, "Users");
//! // AND chains associate left, in source order.
//! let filter = query.where_clause.unwrap();
//! assert_eq!(filter.to_string(), "Age >= 18 AND Country = 'IL'");
//! ```
//!
//! ## Patch queries
//!
//! ```rust
//! let query = rql_core::parse_update("FROM Users WHERE Age < 0 UPDATE { this.Age = 0; }")
//!     .unwrap();
//! assert_eq!(query.update_body.unwrap().text, "{ this.Age = 0; }");
//! ```
//!
//! ## Errors
//!
//! Grammar violations report the position, the offending token and the
//! query:
//!
//! ```rust
//! let err = rql_core::parse("FROM Users WHERE SELECT = 1").unwrap_err();
//! assert!(err.to_string().starts_with("1:18 Unable to parse WHERE clause"));
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod visitor;

pub use ast::{Query, QueryExpression};
pub use lexer::{Location, Scanner, Span};
pub use parser::{Error, ParseError, Parser, ParserOptions, QueryError, QueryType, Result};
pub use visitor::{Visit, VisitMut};

/// Parses a read query with default options.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn parse(query: &str) -> Result<Query> {
    Parser::new(query).parse(QueryType::Select)
}

/// Parses a patch query, which must end with `UPDATE { ... }`.
///
/// # Errors
///
/// See [`Parser::parse`].
pub fn parse_update(query: &str) -> Result<Query> {
    Parser::new(query).parse(QueryType::Update)
}
