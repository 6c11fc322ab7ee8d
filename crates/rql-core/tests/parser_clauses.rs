//! Tests for DECLARE, GROUP BY, ORDER BY, LOAD, SELECT, INCLUDE and UPDATE.

mod common;
use common::*;

use pretty_assertions::assert_eq;
use rql_core::ast::{
    FieldExpression, OperatorType, OrderingType, QueryExpression, ValueExpression, ValueKind,
};

// ===== DECLARE =====

#[test]
fn declare_function() {
    let query = parse(
        "DECLARE function output(u) { return { Name: u.Name }; } \
         FROM Users AS u SELECT output(u)",
    );
    assert_eq!(query.declared_functions.len(), 1);
    let body = &query.declared_functions["output"];
    assert_eq!(body.text, "function output(u) { return { Name: u.Name }; }");

    let select = query.select.expect("select");
    let QueryExpression::Method(method) = &select[0].expression else {
        panic!("Expected a method call");
    };
    assert_eq!(method.name, "output");
    assert_eq!(method.arguments, [QueryExpression::field("u")]);
}

#[test]
fn declare_multiple_functions() {
    let query = parse(
        "declare function b(x) { return x; }\n\
         declare function a() { return 1; }\n\
         from Users",
    );
    let names: Vec<_> = query.declared_functions.keys().map(String::as_str).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn declare_function_body_with_nested_braces() {
    let query = parse("DECLARE function f(o) { if (o) { return '}'; } return {}; } FROM Orders");
    assert_eq!(
        query.declared_functions["f"].text,
        "function f(o) { if (o) { return '}'; } return {}; }"
    );
}

// ===== GROUP BY =====

#[test]
fn group_by_fields() {
    let query = parse("FROM Orders GROUP BY Company, ShipTo.City WHERE count() > 5");
    let paths: Vec<_> = query
        .group_by
        .expect("group by")
        .into_iter()
        .map(|field| field.path)
        .collect();
    assert_eq!(paths, ["Company", "ShipTo.City"]);

    let QueryExpression::Method(method) = query.where_clause.expect("where") else {
        panic!("Expected a method call");
    };
    assert_eq!(method.name, "count");
    assert!(method.trailing_predicate().is_some());
}

#[test]
fn group_by_array() {
    let query = parse("FROM Orders GROUP BY Lines[].Product");
    assert_eq!(query.group_by.unwrap()[0].path, "Lines[].Product");
}

// ===== ORDER BY =====

#[test]
fn order_by_terms() {
    let query = parse(
        "FROM Users ORDER BY Name, Age AS long DESC, LastName ASC, score() DESCENDING, Code AS alphaNumeric",
    );
    let terms = query.order_by.expect("order by");
    assert_eq!(terms.len(), 5);

    assert_eq!(terms[0].expression, QueryExpression::field("Name"));
    assert_eq!(terms[0].ordering, OrderingType::Implicit);
    assert!(terms[0].ascending);

    assert_eq!(terms[1].ordering, OrderingType::Long);
    assert!(!terms[1].ascending);

    assert!(terms[2].ascending);

    assert!(matches!(&terms[3].expression, QueryExpression::Method(m) if m.name == "score"));
    assert!(!terms[3].ascending);

    assert_eq!(terms[4].ordering, OrderingType::AlphaNumeric);
}

#[test]
fn order_by_type_is_case_insensitive() {
    let query = parse("FROM Users ORDER BY Age as DOUBLE desc");
    let terms = query.order_by.unwrap();
    assert_eq!(terms[0].ordering, OrderingType::Double);
    assert!(!terms[0].ascending);
}

#[test]
fn order_by_after_where() {
    let query = parse("FROM Users WHERE Age > 3 ORDER BY Age");
    assert_eq!(
        query.where_clause,
        Some(cmp("Age", OperatorType::GreaterThan, 3))
    );
    assert_eq!(query.order_by.unwrap().len(), 1);
}

// ===== LOAD =====

#[test]
fn load_with_aliases() {
    let query = parse("FROM Orders AS o LOAD o.Company AS c, o.Employee e SELECT c.Name");
    let load = query.load.expect("load");
    assert_eq!(load.len(), 2);
    assert_eq!(load[0].expression, QueryExpression::field("o.Company"));
    assert_eq!(load[0].alias.as_deref(), Some("c"));
    assert_eq!(load[1].alias.as_deref(), Some("e"));

    let select = query.select.expect("select");
    assert_eq!(select[0].expression, QueryExpression::field("c.Name"));
}

// ===== SELECT =====

#[test]
fn select_fields() {
    let query = parse("FROM Users SELECT Name, Address.City AS City, Age AS 'Years Old'");
    let select = query.select.expect("select");
    assert_eq!(select.len(), 3);
    assert_eq!(select[0].alias, None);
    assert_eq!(select[1].expression, QueryExpression::field("Address.City"));
    assert_eq!(select[1].alias.as_deref(), Some("City"));
    assert_eq!(select[2].alias.as_deref(), Some("Years Old"));
    assert!(!query.is_distinct);
}

#[test]
fn select_requires_as_for_alias() {
    let err = parse_err("FROM Users SELECT Name n");
    assert_eq!(err.message, "Expected end of query");
    assert_eq!(err.found.as_deref(), Some("n"));
}

#[test]
fn select_value_gets_inferred_alias() {
    let query = parse("FROM Users SELECT 42, $p, 1.5 AS ratio");
    let select = query.select.expect("select");
    assert_eq!(
        select[0].expression,
        QueryExpression::Value(ValueExpression::long(42))
    );
    assert_eq!(select[0].alias.as_deref(), Some("42"));
    assert_eq!(select[1].alias.as_deref(), Some("p"));
    assert_eq!(select[2].alias.as_deref(), Some("ratio"));
}

#[test]
fn select_quoted_name_is_a_field() {
    let query = parse("FROM Users SELECT 'First Name'");
    let select = query.select.expect("select");
    assert_eq!(
        select[0].expression,
        QueryExpression::Field(FieldExpression::quoted("First Name"))
    );
}

#[test]
fn select_distinct() {
    let query = parse("FROM Users SELECT DISTINCT Country");
    assert!(query.is_distinct);
    assert_eq!(query.select.unwrap().len(), 1);
}

#[test]
fn select_star() {
    let query = parse("FROM Users SELECT *");
    assert!(query.select.is_none());
    assert!(!query.is_distinct);

    let query = parse("FROM Users SELECT DISTINCT *");
    assert!(query.select.is_none());
    assert!(query.is_distinct);
}

#[test]
fn select_function_body() {
    let query = parse("FROM Users AS u SELECT { Name: u.First + ' ' + u.Last }");
    assert_eq!(query.select, Some(Vec::new()));
    assert_eq!(
        query.select_function_body.expect("body").text,
        "{ Name: u.First + ' ' + u.Last }"
    );
}

#[test]
fn select_method_call() {
    let query = parse("FROM Users SELECT id(), counter('likes') AS likes");
    let select = query.select.expect("select");
    assert!(matches!(&select[0].expression, QueryExpression::Method(m) if m.arguments.is_empty()));
    let QueryExpression::Method(method) = &select[1].expression else {
        panic!("Expected a method call");
    };
    assert_eq!(method.arguments.len(), 1);
    assert_eq!(select[1].alias.as_deref(), Some("likes"));
}

// ===== INCLUDE =====

#[test]
fn include_fields_and_values() {
    let query = parse("FROM Orders SELECT Company INCLUDE Company, Lines[].Product, 'Employee'");
    let include = query.include.expect("include");
    assert_eq!(include.len(), 3);
    assert_eq!(include[0], QueryExpression::field("Company"));
    assert_eq!(include[1], QueryExpression::field("Lines[].Product"));
    assert!(matches!(
        &include[2],
        QueryExpression::Value(value) if value.kind == ValueKind::String && value.text() == "Employee"
    ));
}

#[test]
fn include_parameter() {
    let query = parse("FROM Orders INCLUDE $ids");
    assert_eq!(
        query.include.unwrap(),
        [QueryExpression::Value(ValueExpression::parameter("ids"))]
    );
}

// ===== UPDATE =====

#[test]
fn update_query() {
    let query = parse_update("FROM Users WHERE Age < 0 UPDATE { this.Age = 0; }");
    assert_eq!(
        query.where_clause,
        Some(cmp("Age", OperatorType::LessThan, 0))
    );
    assert_eq!(query.update_body.expect("update").text, "{ this.Age = 0; }");
    assert!(query.select.is_none());
}

#[test]
fn update_query_with_load() {
    let query = parse_update(
        "FROM Orders AS o LOAD o.Company AS c UPDATE { o.CompanyName = c.Name; }",
    );
    assert_eq!(query.load.unwrap().len(), 1);
    assert!(query.update_body.is_some());
}

#[test]
fn full_query() {
    let query = parse(
        "DECLARE function name(u) { return u.Name; }\n\
         FROM INDEX 'Users/ByCity' AS u\n\
         WHERE u.City IN ('Hadera', 'Haifa') AND u.Age BETWEEN 18 AND 65\n\
         ORDER BY u.Age DESC\n\
         LOAD u.Manager AS m\n\
         SELECT name(u) AS Name, m.Name AS Manager\n\
         INCLUDE u.Company",
    );
    assert_eq!(query.declared_functions.len(), 1);
    assert!(query.from.is_index);
    assert!(query.where_clause.as_ref().is_some_and(QueryExpression::is_connective));
    assert_eq!(query.order_by.unwrap().len(), 1);
    assert_eq!(query.load.unwrap().len(), 1);
    assert_eq!(query.select.unwrap().len(), 2);
    assert_eq!(query.include.unwrap().len(), 1);
}
