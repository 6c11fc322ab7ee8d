//! Mutable traversal of a query, for rewriting passes.

use std::collections::BTreeMap;

use crate::ast::{
    BetweenExpression, BinaryExpression, FieldExpression, FromClause, FunctionBody, InExpression,
    MethodExpression, OrderByField, Query, QueryExpression, SelectField, ValueExpression,
};

/// Mutable query visitor, in the same order as [`Visit`](super::Visit).
///
/// Unlike the read-only visitor, the FROM filter, WHERE roots that are not
/// binary expressions and the source of IN are walked too, so that a
/// rewrite such as parameter substitution reaches every expression.
pub trait VisitMut {
    fn visit_query_mut(&mut self, query: &mut Query) {
        visit_query_mut(self, query);
    }

    fn visit_declared_functions_mut(&mut self, functions: &mut BTreeMap<String, FunctionBody>) {
        visit_declared_functions_mut(self, functions);
    }

    fn visit_declared_function_mut(&mut self, _name: &str, _body: &mut FunctionBody) {}

    fn visit_from_clause_mut(&mut self, from: &mut FromClause, _is_distinct: bool) {
        visit_from_clause_mut(self, from);
    }

    fn visit_group_by_mut(&mut self, fields: &mut [FieldExpression]) {
        visit_group_by_mut(self, fields);
    }

    fn visit_where_clause_mut(&mut self, filter: &mut BinaryExpression) {
        visit_where_clause_mut(self, filter);
    }

    fn visit_simple_where_expression_mut(&mut self, expr: &mut BinaryExpression) {
        visit_binary_mut(self, expr);
    }

    fn visit_compound_where_expression_mut(&mut self, expr: &mut BinaryExpression) {
        visit_binary_mut(self, expr);
    }

    fn visit_order_by_mut(&mut self, terms: &mut [OrderByField]) {
        visit_order_by_mut(self, terms);
    }

    fn visit_load_mut(&mut self, fields: &mut [SelectField]) {
        visit_select_mut(self, fields);
    }

    fn visit_select_mut(&mut self, fields: &mut [SelectField]) {
        visit_select_mut(self, fields);
    }

    fn visit_select_function_body_mut(&mut self, _body: &mut FunctionBody) {}

    fn visit_update_mut(&mut self, _body: &mut FunctionBody) {}

    fn visit_include_mut(&mut self, includes: &mut [QueryExpression]) {
        for include in includes {
            self.visit_expression_mut(include);
        }
    }

    fn visit_expression_mut(&mut self, expr: &mut QueryExpression) {
        visit_expression_mut(self, expr);
    }

    fn visit_field_mut(&mut self, _field: &mut FieldExpression) {}

    fn visit_value_mut(&mut self, _value: &mut ValueExpression) {}

    fn visit_binary_mut(&mut self, expr: &mut BinaryExpression) {
        visit_binary_mut(self, expr);
    }

    fn visit_between_mut(&mut self, expr: &mut BetweenExpression) {
        visit_between_mut(self, expr);
    }

    fn visit_in_mut(&mut self, expr: &mut InExpression) {
        visit_in_mut(self, expr);
    }

    fn visit_method_mut(&mut self, expr: &mut MethodExpression) {
        visit_method_mut(self, expr);
    }

    fn visit_true_mut(&mut self) {}
}

pub fn visit_query_mut<V>(v: &mut V, query: &mut Query)
where
    V: VisitMut + ?Sized,
{
    if !query.declared_functions.is_empty() {
        v.visit_declared_functions_mut(&mut query.declared_functions);
    }
    v.visit_from_clause_mut(&mut query.from, query.is_distinct);
    if let Some(group_by) = &mut query.group_by {
        v.visit_group_by_mut(group_by);
    }
    match &mut query.where_clause {
        Some(QueryExpression::Binary(filter)) => v.visit_where_clause_mut(filter),
        Some(filter) => v.visit_expression_mut(filter),
        None => {}
    }
    if let Some(order_by) = &mut query.order_by {
        v.visit_order_by_mut(order_by);
    }
    if let Some(load) = &mut query.load {
        v.visit_load_mut(load);
    }
    if let Some(select) = &mut query.select {
        v.visit_select_mut(select);
    }
    if let Some(body) = &mut query.select_function_body {
        v.visit_select_function_body_mut(body);
    }
    if let Some(body) = &mut query.update_body {
        v.visit_update_mut(body);
    }
    if let Some(include) = &mut query.include {
        v.visit_include_mut(include);
    }
}

pub fn visit_declared_functions_mut<V>(v: &mut V, functions: &mut BTreeMap<String, FunctionBody>)
where
    V: VisitMut + ?Sized,
{
    for (name, body) in functions.iter_mut() {
        v.visit_declared_function_mut(name, body);
    }
}

pub fn visit_from_clause_mut<V>(v: &mut V, from: &mut FromClause)
where
    V: VisitMut + ?Sized,
{
    if let Some(filter) = &mut from.filter {
        v.visit_expression_mut(filter);
    }
}

pub fn visit_group_by_mut<V>(v: &mut V, fields: &mut [FieldExpression])
where
    V: VisitMut + ?Sized,
{
    for field in fields {
        v.visit_field_mut(field);
    }
}

pub fn visit_where_clause_mut<V>(v: &mut V, filter: &mut BinaryExpression)
where
    V: VisitMut + ?Sized,
{
    if filter.operator.is_comparison() {
        v.visit_simple_where_expression_mut(filter);
    } else {
        v.visit_compound_where_expression_mut(filter);
    }
}

pub fn visit_order_by_mut<V>(v: &mut V, terms: &mut [OrderByField])
where
    V: VisitMut + ?Sized,
{
    for term in terms {
        v.visit_expression_mut(&mut term.expression);
    }
}

pub fn visit_select_mut<V>(v: &mut V, fields: &mut [SelectField])
where
    V: VisitMut + ?Sized,
{
    for field in fields {
        v.visit_expression_mut(&mut field.expression);
    }
}

pub fn visit_expression_mut<V>(v: &mut V, expr: &mut QueryExpression)
where
    V: VisitMut + ?Sized,
{
    match expr {
        QueryExpression::Field(field) => v.visit_field_mut(field),
        QueryExpression::Value(value) => v.visit_value_mut(value),
        QueryExpression::Binary(binary) => v.visit_binary_mut(binary),
        QueryExpression::Between(between) => v.visit_between_mut(between),
        QueryExpression::In(in_expr) => v.visit_in_mut(in_expr),
        QueryExpression::Method(method) => v.visit_method_mut(method),
        QueryExpression::True => v.visit_true_mut(),
    }
}

pub fn visit_binary_mut<V>(v: &mut V, expr: &mut BinaryExpression)
where
    V: VisitMut + ?Sized,
{
    v.visit_expression_mut(&mut expr.left);
    v.visit_expression_mut(&mut expr.right);
}

pub fn visit_between_mut<V>(v: &mut V, expr: &mut BetweenExpression)
where
    V: VisitMut + ?Sized,
{
    v.visit_field_mut(&mut expr.source);
    v.visit_value_mut(&mut expr.min);
    v.visit_value_mut(&mut expr.max);
}

pub fn visit_in_mut<V>(v: &mut V, expr: &mut InExpression)
where
    V: VisitMut + ?Sized,
{
    v.visit_field_mut(&mut expr.source);
    for value in &mut expr.values {
        v.visit_value_mut(value);
    }
}

pub fn visit_method_mut<V>(v: &mut V, expr: &mut MethodExpression)
where
    V: VisitMut + ?Sized,
{
    for argument in &mut expr.arguments {
        v.visit_expression_mut(argument);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ValueKind;
    use crate::parse;

    /// Replaces `$name` parameters with string literals.
    struct Substitute<'a> {
        name: &'a str,
        value: &'a str,
    }

    impl VisitMut for Substitute<'_> {
        fn visit_value_mut(&mut self, value: &mut ValueExpression) {
            if value.kind == ValueKind::Parameter && value.token == self.name {
                *value = ValueExpression::string(self.value);
            }
        }
    }

    /// Prefixes every field path.
    struct Prefix;

    impl VisitMut for Prefix {
        fn visit_field_mut(&mut self, field: &mut FieldExpression) {
            if !field.is_implicit() {
                field.path = format!("doc.{}", field.path);
            }
        }
    }

    #[test]
    fn test_substitute_parameters() {
        let mut query = parse("FROM Users WHERE Name = $name AND Age IN ($a, $b)").unwrap();
        Substitute {
            name: "name",
            value: "Oren",
        }
        .visit_query_mut(&mut query);
        assert_eq!(
            query.where_clause.unwrap().to_string(),
            "Name = 'Oren' AND Age IN ($a, $b)"
        );
    }

    #[test]
    fn test_rewrite_fields_everywhere() {
        let mut query =
            parse("FROM Users(Active = true) GROUP BY City WHERE Age BETWEEN 1 AND 5 ORDER BY Name")
                .unwrap();
        Prefix.visit_query_mut(&mut query);
        assert_eq!(
            query.to_string(),
            "FROM Users(doc.Active = true)\nGROUP BY doc.City\n\
             WHERE doc.Age BETWEEN 1 AND 5\nORDER BY doc.Name"
        );
    }

    #[test]
    fn test_in_source_is_visited_mutably() {
        let mut query = parse("FROM Users WHERE Status IN ('a', 'b')").unwrap();
        Prefix.visit_query_mut(&mut query);
        assert_eq!(
            query.where_clause.unwrap().to_string(),
            "doc.Status IN ('a', 'b')"
        );
    }
}
