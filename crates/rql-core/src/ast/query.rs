//! Query AST types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::expression::{
    is_bare_path, write_list, write_quoted, FieldExpression, QueryExpression,
};
use crate::lexer::Span;

/// Sort type requested with `ORDER BY x AS <type>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderingType {
    /// No explicit type.
    #[default]
    Implicit,
    /// `AS string`.
    String,
    /// `AS long`.
    Long,
    /// `AS double`.
    Double,
    /// `AS alphaNumeric`.
    AlphaNumeric,
}

impl OrderingType {
    /// Type names accepted after `AS` in ORDER BY.
    pub const NAMES: [&'static str; 4] = ["string", "long", "double", "alphaNumeric"];

    /// Returns the query representation, or `None` for [`Self::Implicit`].
    #[must_use]
    pub const fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::Implicit => None,
            Self::String => Some("string"),
            Self::Long => Some("long"),
            Self::Double => Some("double"),
            Self::AlphaNumeric => Some("alphaNumeric"),
        }
    }

    /// Looks up an ordering type by name (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<Self> {
        [Self::String, Self::Long, Self::Double, Self::AlphaNumeric]
            .into_iter()
            .find(|ty| ty.as_str().is_some_and(|s| s.eq_ignore_ascii_case(name)))
    }
}

/// The verbatim text of a `{ ... }` script body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionBody {
    /// The text, braces included.
    pub text: String,
    /// Source span of the text.
    pub span: Span,
}

impl FunctionBody {
    /// Creates a body with no source location.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            span: Span::default(),
        }
    }
}

impl PartialEq for FunctionBody {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Display for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The FROM clause: a collection or an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromClause {
    /// Collection or index name.
    pub source: FieldExpression,
    /// Alias introduced with `AS` (or directly after the source).
    pub alias: Option<String>,
    /// Filter in `FROM Users(Age > 3)`. Never set for indexes.
    pub filter: Option<QueryExpression>,
    /// Whether the source is an index.
    pub is_index: bool,
}

impl FromClause {
    /// Creates a FROM clause over a collection.
    #[must_use]
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            source: FieldExpression::new(name),
            alias: None,
            filter: None,
            is_index: false,
        }
    }

    /// Creates a FROM clause over an index.
    #[must_use]
    pub fn index(name: impl Into<String>) -> Self {
        Self {
            is_index: true,
            ..Self::collection(name)
        }
    }
}

/// An ORDER BY term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByField {
    /// Field or method call to sort by.
    pub expression: QueryExpression,
    /// Requested sort type.
    pub ordering: OrderingType,
    /// Ascending unless DESC/DESCENDING was given.
    pub ascending: bool,
}

/// An entry of a SELECT or LOAD list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectField {
    /// The projected field, value or method call.
    pub expression: QueryExpression,
    /// Alias; values without one are aliased by their own text.
    pub alias: Option<String>,
}

impl SelectField {
    fn has_inferred_alias(&self) -> bool {
        match (&self.expression, &self.alias) {
            (QueryExpression::Value(value), Some(alias)) => value.text() == alias,
            _ => false,
        }
    }
}

/// A parsed query.
///
/// Equality compares the clauses only, not the query text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The original query text.
    pub query_text: String,
    /// Functions introduced with `DECLARE function`.
    pub declared_functions: BTreeMap<String, FunctionBody>,
    /// The FROM clause.
    pub from: FromClause,
    /// GROUP BY fields.
    pub group_by: Option<Vec<FieldExpression>>,
    /// The WHERE filter.
    pub where_clause: Option<QueryExpression>,
    /// ORDER BY terms.
    pub order_by: Option<Vec<OrderByField>>,
    /// LOAD entries.
    pub load: Option<Vec<SelectField>>,
    /// SELECT entries. `None` for `SELECT *` or no SELECT at all.
    pub select: Option<Vec<SelectField>>,
    /// Script projection in `SELECT { ... }`.
    pub select_function_body: Option<FunctionBody>,
    /// Script in `UPDATE { ... }`.
    pub update_body: Option<FunctionBody>,
    /// INCLUDE entries.
    pub include: Option<Vec<QueryExpression>>,
    /// Whether `SELECT DISTINCT` was given.
    pub is_distinct: bool,
}

impl Query {
    /// Creates an empty query over `from`.
    #[must_use]
    pub fn new(query_text: impl Into<String>, from: FromClause) -> Self {
        Self {
            query_text: query_text.into(),
            declared_functions: BTreeMap::new(),
            from,
            group_by: None,
            where_clause: None,
            order_by: None,
            load: None,
            select: None,
            select_function_body: None,
            update_body: None,
            include: None,
            is_distinct: false,
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.declared_functions == other.declared_functions
            && self.from == other.from
            && self.group_by == other.group_by
            && self.where_clause == other.where_clause
            && self.order_by == other.order_by
            && self.load == other.load
            && self.select == other.select
            && self.select_function_body == other.select_function_body
            && self.update_body == other.update_body
            && self.include == other.include
            && self.is_distinct == other.is_distinct
    }
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: &str) -> fmt::Result {
    f.write_str(" AS ")?;
    if is_bare_path(alias) {
        f.write_str(alias)
    } else {
        write_quoted(f, alias)
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_index { "FROM INDEX " } else { "FROM " })?;
        let bare = !self.source.escaped
            && !self.source.path.contains(['.', '['])
            && is_bare_path(&self.source.path);
        if bare {
            f.write_str(&self.source.path)?;
        } else {
            write_quoted(f, &self.source.path)?;
        }
        if let Some(filter) = &self.filter {
            write!(f, "({filter})")?;
        }
        if let Some(alias) = &self.alias {
            write_alias(f, alias)?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderByField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)?;
        if let Some(ty) = self.ordering.as_str() {
            write!(f, " AS {ty}")?;
        }
        if !self.ascending {
            f.write_str(" DESC")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)?;
        match &self.alias {
            Some(alias) if !self.has_inferred_alias() => write_alias(f, alias),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Query {
    /// Renders the query in canonical form, one clause per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for body in self.declared_functions.values() {
            writeln!(f, "DECLARE {body}")?;
        }
        write!(f, "{}", self.from)?;
        if let Some(group_by) = &self.group_by {
            f.write_str("\nGROUP BY ")?;
            write_list(f, group_by)?;
        }
        if let Some(filter) = &self.where_clause {
            write!(f, "\nWHERE {filter}")?;
        }
        if let Some(order_by) = &self.order_by {
            f.write_str("\nORDER BY ")?;
            write_list(f, order_by)?;
        }
        if let Some(load) = &self.load {
            f.write_str("\nLOAD ")?;
            write_list(f, load)?;
        }

        let distinct = if self.is_distinct { "DISTINCT " } else { "" };
        if let Some(body) = &self.select_function_body {
            write!(f, "\nSELECT {distinct}{body}")?;
        } else if let Some(select) = self.select.as_ref().filter(|s| !s.is_empty()) {
            write!(f, "\nSELECT {distinct}")?;
            write_list(f, select)?;
        } else if self.is_distinct {
            f.write_str("\nSELECT DISTINCT *")?;
        }

        if let Some(include) = &self.include {
            f.write_str("\nINCLUDE ")?;
            write_list(f, include)?;
        }
        if let Some(body) = &self.update_body {
            write!(f, "\nUPDATE {body}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ValueExpression;

    #[test]
    fn test_ordering_type_lookup() {
        assert_eq!(OrderingType::from_str("LONG"), Some(OrderingType::Long));
        assert_eq!(
            OrderingType::from_str("alphanumeric"),
            Some(OrderingType::AlphaNumeric)
        );
        assert_eq!(OrderingType::from_str("implicit"), None);
        assert_eq!(OrderingType::Implicit.as_str(), None);
    }

    #[test]
    fn test_equality_ignores_query_text() {
        let a = Query::new("FROM Users", FromClause::collection("Users"));
        let b = Query::new("from   Users", FromClause::collection("Users"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display_minimal() {
        let query = Query::new("", FromClause::collection("Users"));
        assert_eq!(query.to_string(), "FROM Users");
    }

    #[test]
    fn test_display_index_with_alias() {
        let mut from = FromClause::index("Orders/Totals");
        from.alias = Some("o".into());
        let query = Query::new("", from);
        assert_eq!(query.to_string(), "FROM INDEX 'Orders/Totals' AS o");
    }

    #[test]
    fn test_display_clauses() {
        let mut query = Query::new("", FromClause::collection("Users"));
        query.where_clause =
            Some(QueryExpression::field("Age").equals(ValueExpression::long(3)));
        query.order_by = Some(vec![OrderByField {
            expression: QueryExpression::field("Name"),
            ordering: OrderingType::String,
            ascending: false,
        }]);
        query.select = Some(vec![
            SelectField {
                expression: QueryExpression::field("Name"),
                alias: Some("First Name".into()),
            },
            SelectField {
                expression: QueryExpression::Value(ValueExpression::string("x")),
                alias: Some("x".into()),
            },
        ]);
        query.is_distinct = true;
        assert_eq!(
            query.to_string(),
            "FROM Users\nWHERE Age = 3\nORDER BY Name AS string DESC\n\
             SELECT DISTINCT Name AS 'First Name', 'x'"
        );
    }

    #[test]
    fn test_display_distinct_star_and_update() {
        let mut query = Query::new("", FromClause::collection("Users"));
        query.is_distinct = true;
        assert_eq!(query.to_string(), "FROM Users\nSELECT DISTINCT *");

        let mut query = Query::new("", FromClause::collection("Users"));
        query.update_body = Some(FunctionBody::new("{ this.Age++; }"));
        assert_eq!(query.to_string(), "FROM Users\nUPDATE { this.Age++; }");
    }
}
