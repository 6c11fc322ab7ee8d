//! Abstract Syntax Tree (AST) types for queries.

mod expression;
mod query;

pub use expression::{
    BetweenExpression, BinaryExpression, FieldExpression, InExpression, MethodExpression,
    OperatorType, QueryExpression, ValueExpression, ValueKind,
};
pub use query::{
    FromClause, FunctionBody, OrderByField, OrderingType, Query, SelectField,
};
