#![allow(dead_code)]

use rql_core::ast::{OperatorType, Query, QueryExpression, ValueExpression};
use rql_core::{Error, ParseError, Parser, ParserOptions, QueryError, QueryType};

pub fn parse(query: &str) -> Query {
    rql_core::parse(query).unwrap_or_else(|e| panic!("Failed to parse: {query}\nError: {e}"))
}

pub fn parse_update(query: &str) -> Query {
    rql_core::parse_update(query)
        .unwrap_or_else(|e| panic!("Failed to parse: {query}\nError: {e}"))
}

pub fn parse_with_depth(query: &str, max_depth: usize) -> Result<Query, Error> {
    let options = ParserOptions::default().with_max_depth(max_depth);
    Parser::with_options(query, options).parse(QueryType::Select)
}

pub fn parse_with_connectives(query: &str, max_connectives: usize) -> Result<Query, Error> {
    let options = ParserOptions::default().with_max_connectives(max_connectives);
    Parser::with_options(query, options).parse(QueryType::Select)
}

/// `FROM X WHERE A = 0 <connective> A = 1 ...` with `links` connectives.
pub fn chain(connective: &str, links: usize) -> String {
    let mut query = String::from("FROM X WHERE A = 0");
    for value in 1..=links {
        query.push_str(&format!(" {connective} A = {value}"));
    }
    query
}

/// Expects a grammar error.
pub fn parse_err(query: &str) -> ParseError {
    match rql_core::parse(query) {
        Err(Error::Parse(err)) => err,
        other => panic!("Expected parse error for: {query}\nGot: {other:?}"),
    }
}

/// Expects a semantic error.
pub fn query_err(query: &str) -> QueryError {
    match rql_core::parse(query) {
        Err(Error::Query(err)) => err,
        other => panic!("Expected query error for: {query}\nGot: {other:?}"),
    }
}

/// Parses a query and returns its WHERE filter.
pub fn parse_where(query: &str) -> QueryExpression {
    parse(query)
        .where_clause
        .unwrap_or_else(|| panic!("Expected a WHERE clause in: {query}"))
}

/// `path <op> value` with an integer value.
pub fn cmp(path: &str, operator: OperatorType, value: i64) -> QueryExpression {
    QueryExpression::field(path).compare(operator, ValueExpression::long(value))
}

/// `path = value` with an integer value.
pub fn eq(path: &str, value: i64) -> QueryExpression {
    cmp(path, OperatorType::Equal, value)
}

/// Verifies that `to_string()` produces a fixed point: the rendered
/// query parses back to an equal AST that renders the same way.
pub fn round_trip(query: &str) {
    let ast1 = parse(query);
    let rendered1 = ast1.to_string();
    let ast2 = parse(&rendered1);
    let rendered2 = ast2.to_string();
    assert_eq!(
        rendered1, rendered2,
        "Round-trip failed.\n  Input:    {query}\n  First:    {rendered1}\n  Second:   {rendered2}"
    );
    assert_eq!(ast1, ast2, "Round-trip changed the AST for: {query}");
}
