//! Read-only traversal of a query.

use std::collections::BTreeMap;

use crate::ast::{
    BetweenExpression, BinaryExpression, FieldExpression, FromClause, FunctionBody, InExpression,
    MethodExpression, OrderByField, Query, QueryExpression, SelectField, ValueExpression,
};

/// Read-only query visitor.
///
/// Clauses are visited in the order declared functions, FROM, GROUP BY,
/// WHERE, ORDER BY, LOAD, SELECT, SELECT function body, UPDATE, INCLUDE.
pub trait Visit<'ast> {
    /// Called once for the whole query; walks every clause.
    fn visit_query(&mut self, query: &'ast Query) {
        visit_query(self, query);
    }

    /// Called with all DECLARE functions when there is at least one.
    fn visit_declared_functions(&mut self, functions: &'ast BTreeMap<String, FunctionBody>) {
        visit_declared_functions(self, functions);
    }

    /// Called for each declared function, in name order.
    fn visit_declared_function(&mut self, _name: &'ast str, _body: &'ast FunctionBody) {}

    /// Called for the FROM clause with the query's DISTINCT flag.
    fn visit_from_clause(&mut self, _from: &'ast FromClause, _is_distinct: bool) {}

    /// Called with the GROUP BY fields.
    fn visit_group_by(&mut self, _fields: &'ast [FieldExpression]) {}

    /// Called with the WHERE root when it is a binary expression.
    fn visit_where_clause(&mut self, filter: &'ast BinaryExpression) {
        visit_where_clause(self, filter);
    }

    /// Called for a comparison reached from the WHERE root.
    fn visit_simple_where_expression(&mut self, _expr: &'ast BinaryExpression) {}

    /// Called for an AND/OR reached from the WHERE root.
    fn visit_compound_where_expression(&mut self, expr: &'ast BinaryExpression) {
        visit_compound_where_expression(self, expr);
    }

    /// Called with the ORDER BY terms; visits each term's expression.
    fn visit_order_by(&mut self, terms: &'ast [OrderByField]) {
        visit_order_by(self, terms);
    }

    /// Called with the LOAD fields; visits each field's expression.
    fn visit_load(&mut self, fields: &'ast [SelectField]) {
        visit_load(self, fields);
    }

    /// Called with the SELECT fields; visits each field's expression.
    fn visit_select(&mut self, fields: &'ast [SelectField]) {
        visit_select(self, fields);
    }

    /// Called with the JavaScript object literal of a SELECT.
    fn visit_select_function_body(&mut self, _body: &'ast FunctionBody) {}

    /// Called with the body of an UPDATE clause.
    fn visit_update(&mut self, _body: &'ast FunctionBody) {}

    /// Called with the INCLUDE expressions; visits each of them.
    fn visit_include(&mut self, includes: &'ast [QueryExpression]) {
        visit_include(self, includes);
    }

    /// Dispatches on the expression kind.
    fn visit_expression(&mut self, expr: &'ast QueryExpression) {
        visit_expression(self, expr);
    }

    /// Called for a field reference.
    fn visit_field(&mut self, _field: &'ast FieldExpression) {}

    /// Called for a literal or parameter.
    fn visit_value(&mut self, _value: &'ast ValueExpression) {}

    /// Visits the left operand, then the right one.
    fn visit_binary(&mut self, expr: &'ast BinaryExpression) {
        visit_binary(self, expr);
    }

    /// Visits the source field, then both bounds.
    fn visit_between(&mut self, expr: &'ast BetweenExpression) {
        visit_between(self, expr);
    }

    /// Visits the candidate values; the source field is not visited.
    fn visit_in(&mut self, expr: &'ast InExpression) {
        visit_in(self, expr);
    }

    /// Visits every argument in order.
    fn visit_method(&mut self, expr: &'ast MethodExpression) {
        visit_method(self, expr);
    }

    /// Called for the `true` predicate.
    fn visit_true(&mut self) {}
}

pub fn visit_query<'ast, V>(v: &mut V, query: &'ast Query)
where
    V: Visit<'ast> + ?Sized,
{
    if !query.declared_functions.is_empty() {
        v.visit_declared_functions(&query.declared_functions);
    }
    v.visit_from_clause(&query.from, query.is_distinct);
    if let Some(group_by) = &query.group_by {
        v.visit_group_by(group_by);
    }
    if let Some(QueryExpression::Binary(filter)) = &query.where_clause {
        v.visit_where_clause(filter);
    }
    if let Some(order_by) = &query.order_by {
        v.visit_order_by(order_by);
    }
    if let Some(load) = &query.load {
        v.visit_load(load);
    }
    if let Some(select) = &query.select {
        v.visit_select(select);
    }
    if let Some(body) = &query.select_function_body {
        v.visit_select_function_body(body);
    }
    if let Some(body) = &query.update_body {
        v.visit_update(body);
    }
    if let Some(include) = &query.include {
        v.visit_include(include);
    }
}

pub fn visit_declared_functions<'ast, V>(
    v: &mut V,
    functions: &'ast BTreeMap<String, FunctionBody>,
) where
    V: Visit<'ast> + ?Sized,
{
    for (name, body) in functions {
        v.visit_declared_function(name, body);
    }
}

pub fn visit_where_clause<'ast, V>(v: &mut V, filter: &'ast BinaryExpression)
where
    V: Visit<'ast> + ?Sized,
{
    if filter.operator.is_comparison() {
        v.visit_simple_where_expression(filter);
    } else {
        v.visit_compound_where_expression(filter);
    }
}

pub fn visit_compound_where_expression<'ast, V>(v: &mut V, expr: &'ast BinaryExpression)
where
    V: Visit<'ast> + ?Sized,
{
    v.visit_expression(&expr.left);
    v.visit_expression(&expr.right);
}

pub fn visit_order_by<'ast, V>(v: &mut V, terms: &'ast [OrderByField])
where
    V: Visit<'ast> + ?Sized,
{
    for term in terms {
        v.visit_expression(&term.expression);
    }
}

pub fn visit_load<'ast, V>(v: &mut V, fields: &'ast [SelectField])
where
    V: Visit<'ast> + ?Sized,
{
    for field in fields {
        v.visit_expression(&field.expression);
    }
}

pub fn visit_select<'ast, V>(v: &mut V, fields: &'ast [SelectField])
where
    V: Visit<'ast> + ?Sized,
{
    for field in fields {
        v.visit_expression(&field.expression);
    }
}

pub fn visit_include<'ast, V>(v: &mut V, includes: &'ast [QueryExpression])
where
    V: Visit<'ast> + ?Sized,
{
    for include in includes {
        v.visit_expression(include);
    }
}

pub fn visit_expression<'ast, V>(v: &mut V, expr: &'ast QueryExpression)
where
    V: Visit<'ast> + ?Sized,
{
    match expr {
        QueryExpression::Field(field) => v.visit_field(field),
        QueryExpression::Value(value) => v.visit_value(value),
        QueryExpression::Binary(binary) => v.visit_binary(binary),
        QueryExpression::Between(between) => v.visit_between(between),
        QueryExpression::In(in_expr) => v.visit_in(in_expr),
        QueryExpression::Method(method) => v.visit_method(method),
        QueryExpression::True => v.visit_true(),
    }
}

pub fn visit_binary<'ast, V>(v: &mut V, expr: &'ast BinaryExpression)
where
    V: Visit<'ast> + ?Sized,
{
    v.visit_expression(&expr.left);
    v.visit_expression(&expr.right);
}

pub fn visit_between<'ast, V>(v: &mut V, expr: &'ast BetweenExpression)
where
    V: Visit<'ast> + ?Sized,
{
    v.visit_field(&expr.source);
    v.visit_value(&expr.min);
    v.visit_value(&expr.max);
}

pub fn visit_in<'ast, V>(v: &mut V, expr: &'ast InExpression)
where
    V: Visit<'ast> + ?Sized,
{
    for value in &expr.values {
        v.visit_value(value);
    }
}

pub fn visit_method<'ast, V>(v: &mut V, expr: &'ast MethodExpression)
where
    V: Visit<'ast> + ?Sized,
{
    for argument in &expr.arguments {
        v.visit_expression(argument);
    }
}
