//! Query parser implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use super::error::{Error, ParseError, QueryError, Result};
use crate::ast::{
    BetweenExpression, BinaryExpression, FieldExpression, FromClause, FunctionBody, InExpression,
    MethodExpression, OperatorType, OrderByField, OrderingType, Query, QueryExpression,
    SelectField, ValueExpression, ValueKind,
};
use crate::lexer::{Keyword, NumberToken, Scanner, Span};

/// Default cap on nested parentheses and method argument lists.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default cap on AND/OR connectives in one query.
pub const DEFAULT_MAX_CONNECTIVES: usize = 1024;

/// Operators that may follow a field, longest match first.
const OPERATORS: [&str; 12] = [
    ">=", "<=", "<>", "<", ">", "==", "=", "!=", "BETWEEN", "IN", "ALL IN", "(",
];

/// Operators that may follow a method call; another call may not.
const TRAILING_OPERATORS: [&str; 11] = [
    ">=", "<=", "<>", "<", ">", "==", "=", "!=", "BETWEEN", "IN", "ALL IN",
];

/// The kind of query being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryType {
    /// A read query, optionally ending in SELECT and INCLUDE.
    #[default]
    Select,
    /// A patch query ending in `UPDATE { ... }`.
    Update,
}

impl QueryType {
    /// Returns the lower-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = QueryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("select") {
            Ok(Self::Select)
        } else if s.eq_ignore_ascii_case("update") {
            Ok(Self::Update)
        } else {
            Err(QueryError::UnknownQueryType(s.to_string()))
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum nesting of parenthesized groups and method argument lists.
    pub max_depth: usize,
    /// Maximum number of AND/OR connectives across the whole query.
    ///
    /// Every connective adds a level to the expression tree, so this also
    /// bounds how deep rendering, comparing and visiting a parsed query go.
    pub max_connectives: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_connectives: DEFAULT_MAX_CONNECTIVES,
        }
    }
}

impl ParserOptions {
    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of connectives.
    #[must_use]
    pub const fn with_max_connectives(mut self, max_connectives: usize) -> Self {
        self.max_connectives = max_connectives;
        self
    }
}

/// Query parser.
///
/// A recursive-descent parser over a backtrackable [`Scanner`]. A failed
/// speculative match is reported as `Ok(None)`; `Err` is reserved for
/// input that can no longer be a valid query.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    depth: usize,
    connectives: usize,
    options: ParserOptions,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, ParserOptions::default())
    }

    /// Creates a new parser with custom options.
    #[must_use]
    pub const fn with_options(input: &'a str, options: ParserOptions) -> Self {
        Self {
            scanner: Scanner::new(input),
            depth: 0,
            connectives: 0,
            options,
        }
    }

    /// Points the parser at a new query text.
    pub fn init(&mut self, input: &'a str) {
        self.scanner.init(input);
        self.depth = 0;
        self.connectives = 0;
    }

    /// Returns the parser options.
    #[must_use]
    pub const fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parses the whole input as a query of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a grammar violation and [`Error::Query`]
    /// for mismatched BETWEEN/IN value kinds, nesting beyond
    /// [`ParserOptions::max_depth`] or more connectives than
    /// [`ParserOptions::max_connectives`].
    pub fn parse(&mut self, query_type: QueryType) -> Result<Query> {
        self.depth = 0;
        self.connectives = 0;
        debug!(
            %query_type,
            len = self.scanner.input().len(),
            "parsing query"
        );

        let mut declared_functions = BTreeMap::new();
        while self.scanner.try_scan_keyword(Keyword::Declare) {
            let (name, body) = self.declared_function()?;
            if declared_functions.contains_key(&name) {
                return Err(self.parse_error(format!(
                    "{name} function was declared multiple times"
                )));
            }
            declared_functions.insert(name, body);
        }

        let from = self.from_clause()?;
        let mut query = Query::new(self.scanner.input(), from);
        query.declared_functions = declared_functions;

        if self.scanner.try_scan_keyword(Keyword::GroupBy) {
            query.group_by = Some(self.group_by()?);
        }

        if self.scanner.try_scan_keyword(Keyword::Where) {
            match self.expression()? {
                Some(filter) => query.where_clause = Some(filter),
                None => return Err(self.parse_error("Unable to parse WHERE clause")),
            }
        }

        if self.scanner.try_scan_keyword(Keyword::OrderBy) {
            query.order_by = Some(self.order_by()?);
        }

        if self.scanner.try_scan_keyword(Keyword::Load) {
            query.load = Some(self.select_clause_expressions("LOAD", false)?);
        }

        match query_type {
            QueryType::Select => {
                if self.scanner.try_scan_keyword(Keyword::Select) {
                    let select = self.select_clause(&mut query)?;
                    query.select = select;
                }
                if self.scanner.try_scan_keyword(Keyword::Include) {
                    query.include = Some(self.include_clause()?);
                }
            }
            QueryType::Update => {
                self.expect_keyword(
                    Keyword::Update,
                    "Update operations must end with UPDATE clause",
                )?;
                let body = self
                    .function_body()
                    .ok_or_else(|| self.parse_error("Update clause must have a single function body"))?;
                query.update_body = Some(body);
            }
        }

        if !self.scanner.at_end_of_input() {
            return Err(self.parse_error("Expected end of query"));
        }

        debug!(
            %query_type,
            functions = query.declared_functions.len(),
            has_where = query.where_clause.is_some(),
            distinct = query.is_distinct,
            "parsed query"
        );
        Ok(query)
    }

    // ===== Clauses =====

    /// Parses `function name(args) { body }` after DECLARE.
    fn declared_function(&mut self) -> Result<(String, FunctionBody)> {
        self.expect_keyword(
            Keyword::Function,
            "DECLARE clause found but missing 'function' keyword",
        )?;
        let start = self.scanner.token_start();

        if !self.scanner.identifier(true) {
            return Err(self.parse_error("DECLARE functions require a name and cannot be anonymous"));
        }
        let name = self.scanner.current_token().to_string();

        // The signature is only scanned for its boundary.
        self.expect_char('(', &format!("Unable to parse function {name} signature"))?;
        self.method_arguments()?;

        if self.function_body().is_none() {
            return Err(self.parse_error(format!("Unable to get function body for {name}")));
        }

        let span = Span::between(start, self.scanner.position());
        let text = span.slice(self.scanner.input()).unwrap_or_default().to_string();
        Ok((name, FunctionBody { text, span }))
    }

    /// Parses `FROM [INDEX] source [(filter)] [alias]`.
    fn from_clause(&mut self) -> Result<FromClause> {
        self.expect_keyword(Keyword::From, "Expected FROM clause")?;

        let is_index = self.scanner.try_scan_keyword(Keyword::Index);
        let source = if self.scanner.identifier(true) {
            FieldExpression {
                path: self.scanner.current_token().to_string(),
                span: self.scanner.token_span(),
                escaped: false,
            }
        } else if self.scanner.string() {
            FieldExpression {
                path: self.scanner.string_content().to_string(),
                span: self.scanner.token_span(),
                escaped: true,
            }
        } else if is_index {
            return Err(self.parse_error("Expected FROM INDEX source"));
        } else {
            return Err(self.parse_error("Expected FROM source"));
        };

        let mut filter = None;
        if !is_index && self.scanner.try_scan_char('(') {
            self.enter()?;
            filter = match self.expression()? {
                Some(expr) => Some(expr),
                None => return Err(self.parse_error("Expected filter in filtered FROM clause")),
            };
            self.expect_char(
                ')',
                "Expected closing parenthesis in filtered FROM clause after filter",
            )?;
            self.leave();
        }

        let alias = self.alias(false)?;
        Ok(FromClause {
            source,
            alias,
            filter,
            is_index,
        })
    }

    /// Parses the fields of GROUP BY.
    fn group_by(&mut self) -> Result<Vec<FieldExpression>> {
        let mut fields = Vec::new();
        loop {
            match self.field()? {
                Some(field) => fields.push(field),
                None => return Err(self.parse_error("Unable to get field for GROUP BY")),
            }
            if !self.scanner.try_scan_char(',') {
                break;
            }
        }
        Ok(fields)
    }

    /// Parses the terms of ORDER BY.
    fn order_by(&mut self) -> Result<Vec<OrderByField>> {
        let mut terms = Vec::new();
        loop {
            let Some(field) = self.field()? else {
                return Err(self.parse_error("Unable to get field for ORDER BY"));
            };
            let expression = if self.scanner.try_scan_char('(') {
                QueryExpression::Method(self.method(field)?)
            } else {
                QueryExpression::Field(field)
            };

            let mut ordering = OrderingType::Implicit;
            if self.scanner.try_scan_keyword(Keyword::As) {
                let Some(name) = self.scanner.try_scan_any(&OrderingType::NAMES) else {
                    return Err(self.parse_error(
                        "Expected one of string, long, double, alphaNumeric after AS in ORDER BY",
                    ));
                };
                ordering = OrderingType::from_str(name).unwrap_or_default();
            }

            let ascending = !matches!(
                self.scanner.try_scan_any_keyword(&Keyword::DIRECTIONS),
                Some(Keyword::Desc | Keyword::Descending)
            );

            terms.push(OrderByField {
                expression,
                ordering,
                ascending,
            });
            if !self.scanner.try_scan_char(',') {
                break;
            }
        }
        Ok(terms)
    }

    /// Parses what follows SELECT. Returns `None` for `*`.
    fn select_clause(&mut self, query: &mut Query) -> Result<Option<Vec<SelectField>>> {
        query.is_distinct = self.scanner.try_scan_keyword(Keyword::Distinct);

        if self.scanner.try_scan_char('*') {
            return Ok(None);
        }

        if let Some(body) = self.function_body() {
            query.select_function_body = Some(body);
            return Ok(Some(Vec::new()));
        }

        self.select_clause_expressions("SELECT", true).map(Some)
    }

    /// Parses a comma-separated projection list for SELECT or LOAD.
    fn select_clause_expressions(
        &mut self,
        clause: &str,
        alias_requires_as: bool,
    ) -> Result<Vec<SelectField>> {
        let mut fields = Vec::new();
        loop {
            let expression = if let Some(field) = self.field()? {
                if self.scanner.try_scan_char('(') {
                    QueryExpression::Method(self.method(field)?)
                } else {
                    QueryExpression::Field(field)
                }
            } else if let Some(value) = self.value()? {
                QueryExpression::Value(value)
            } else {
                return Err(self.parse_error(format!("Unable to get field for {clause}")));
            };

            let alias = match (self.alias(alias_requires_as)?, &expression) {
                (None, QueryExpression::Value(value)) => Some(value.text().to_string()),
                (alias, _) => alias,
            };

            fields.push(SelectField { expression, alias });
            if !self.scanner.try_scan_char(',') {
                break;
            }
        }
        Ok(fields)
    }

    /// Parses the entries of INCLUDE.
    fn include_clause(&mut self) -> Result<Vec<QueryExpression>> {
        let mut includes = Vec::new();
        loop {
            if let Some(value) = self.value()? {
                includes.push(QueryExpression::Value(value));
            } else if let Some(field) = self.field()? {
                includes.push(QueryExpression::Field(field));
            } else {
                return Err(self.parse_error("Unable to understand include clause expression"));
            }
            if !self.scanner.try_scan_char(',') {
                break;
            }
        }
        Ok(includes)
    }

    /// Parses an optional alias.
    ///
    /// A clause keyword other than AS is left unconsumed. With
    /// `requires_as`, a bare field is not taken as an alias.
    fn alias(&mut self, requires_as: bool) -> Result<Option<String>> {
        let mut saw_as = false;
        if let Some(keyword) = self.scanner.try_scan_any_keyword(&Keyword::RESERVED) {
            if keyword != Keyword::As {
                self.scanner.go_back(self.scanner.token_length());
                return Ok(None);
            }
            saw_as = true;
        }

        if requires_as && !saw_as {
            return Ok(None);
        }

        if let Some(field) = self.field()? {
            return Ok(Some(field.path));
        }

        if saw_as {
            return Err(self.parse_error("Expected field alias after AS in SELECT"));
        }
        Ok(None)
    }

    /// Captures a `{ ... }` block verbatim.
    fn function_body(&mut self) -> Option<FunctionBody> {
        if !self.scanner.function_body() {
            return None;
        }
        Some(FunctionBody {
            text: self.scanner.current_token().to_string(),
            span: self.scanner.token_span(),
        })
    }

    // ===== Expressions =====

    /// Parses a boolean expression.
    fn expression(&mut self) -> Result<Option<QueryExpression>> {
        self.binary()
    }

    /// Parses an atom followed by any chain of AND/OR connectives.
    ///
    /// The chain is read in a loop and folded from the right. An AND whose
    /// right operand does not open with a parenthesis is spliced into the
    /// bottom of the left spine built so far, so AND chains associate to
    /// the left and bind tighter than OR. OR is never re-rooted:
    /// `A OR B OR C` parses as `A OR (B OR C)`.
    fn binary(&mut self) -> Result<Option<QueryExpression>> {
        let Some(first) = self.parenthesis()? else {
            return Ok(None);
        };

        let mut operands = vec![first];
        let mut links = Vec::new();
        while let Some(connective) = self.scanner.try_scan_any_keyword(&Keyword::CONNECTIVES) {
            self.count_connective()?;
            let negate = self.scanner.try_scan_keyword(Keyword::Not);
            let operator = match (connective, negate) {
                (Keyword::Or, false) => OperatorType::Or,
                (Keyword::Or, true) => OperatorType::OrNot,
                (_, false) => OperatorType::And,
                (_, true) => OperatorType::AndNot,
            };

            let parenthesis = self.scanner.try_peek('(');
            let Some(operand) = self.parenthesis()? else {
                return Err(self.parse_error(format!(
                    "Failed to find second part of {operator:?} expression"
                )));
            };
            operands.push(operand);
            links.push((operator, parenthesis));
        }

        if !links.is_empty() {
            trace!(links = links.len(), "folding connective chain");
        }
        Ok(fold_chain(operands, links))
    }

    /// Parses `( expression )` or a single predicate.
    fn parenthesis(&mut self) -> Result<Option<QueryExpression>> {
        if !self.scanner.try_scan_char('(') {
            return self.operator(true);
        }

        self.enter()?;
        let Some(expr) = self.expression()? else {
            return Ok(None);
        };
        self.expect_char(')', "Unmatched parenthesis, expected ')'")?;
        self.leave();
        Ok(Some(expr))
    }

    /// Parses a predicate: `true`, or a field followed by an operator.
    ///
    /// Without `field_required` this parses the trailing comparison of
    /// `method(...) <op> value`, whose subject is implicit.
    fn operator(&mut self, field_required: bool) -> Result<Option<QueryExpression>> {
        let field = if field_required {
            if self.scanner.try_scan_keyword(Keyword::True) {
                return Ok(Some(QueryExpression::True));
            }
            match self.field()? {
                Some(field) => field,
                None => return Ok(None),
            }
        } else {
            FieldExpression::implicit(Span::new(self.scanner.position(), 0))
        };

        let operators: &[&str] = if field_required {
            &OPERATORS
        } else {
            &TRAILING_OPERATORS
        };
        let Some(found) = self.scanner.try_scan_any(operators) else {
            if !field_required {
                return Ok(None);
            }
            return Err(self.parse_error(
                "Invalid operator expected any of (In, Between, =, <, >, <=, >=)",
            ));
        };

        let operator = match found {
            "<" => OperatorType::LessThan,
            ">" => OperatorType::GreaterThan,
            "<=" => OperatorType::LessThanEqual,
            ">=" => OperatorType::GreaterThanEqual,
            "=" | "==" => OperatorType::Equal,
            "!=" | "<>" => OperatorType::NotEqual,
            "BETWEEN" => return self.between(field).map(Some),
            "IN" | "ALL IN" => return self.in_list(field, found == "ALL IN").map(Some),
            _ => {
                let mut method = self.method(field)?;
                if let Some(predicate) = self.operator(false)? {
                    method.arguments.push(predicate);
                }
                return Ok(Some(QueryExpression::Method(method)));
            }
        };

        let Some(value) = self.value()? else {
            return Err(self.parse_error(format!(
                "parsing {operator:?} expression, expected a value (operators only work on scalar / parameters values)"
            )));
        };
        Ok(Some(QueryExpression::Field(field).compare(operator, value)))
    }

    /// Parses the bounds of `field BETWEEN min AND max`.
    fn between(&mut self, source: FieldExpression) -> Result<QueryExpression> {
        let Some(min) = self.value()? else {
            return Err(self.parse_error("parsing Between, expected value (1st)"));
        };
        self.expect_keyword(Keyword::And, "parsing Between, expected AND")?;
        let Some(max) = self.value()? else {
            return Err(self.parse_error("parsing Between, expected value (2nd)"));
        };

        if min.kind != max.kind {
            return Err(self.query_error(format!(
                "Invalid Between expression, values must have the same type but got {} and {}",
                min.kind, max.kind
            )));
        }
        Ok(QueryExpression::Between(BetweenExpression { source, min, max }))
    }

    /// Parses the value list of `field IN (...)` / `field ALL IN (...)`.
    fn in_list(&mut self, source: FieldExpression, all: bool) -> Result<QueryExpression> {
        self.expect_char('(', "parsing In, expected '('")?;

        let mut values: Vec<ValueExpression> = Vec::new();
        loop {
            if self.scanner.try_scan_char(')') {
                break;
            }
            if !values.is_empty() {
                self.expect_char(',', "parsing In expression, expected ','")?;
            }
            let Some(value) = self.value()? else {
                return Err(self.parse_error("parsing In, expected a value"));
            };
            if let Some(first) = values.first() {
                if first.kind != value.kind {
                    return Err(self.query_error(format!(
                        "Invalid In expression, all values must have the same type, expected {} but got {}",
                        first.kind, value.kind
                    )));
                }
            }
            values.push(value);
        }

        Ok(QueryExpression::In(InExpression {
            source,
            values,
            all,
        }))
    }

    /// Parses the arguments of a call to `name`; the `(` is consumed.
    fn method(&mut self, name: FieldExpression) -> Result<MethodExpression> {
        let arguments = self.method_arguments()?;
        Ok(MethodExpression {
            name: name.path,
            span: name.span,
            escaped: name.escaped,
            arguments,
        })
    }

    /// Parses `arg, arg, ... )`.
    ///
    /// Values and plain field references are taken directly; anything
    /// else is re-parsed from the start of the field as an expression.
    fn method_arguments(&mut self) -> Result<Vec<QueryExpression>> {
        self.enter()?;
        let mut arguments = Vec::new();
        loop {
            if self.scanner.try_scan_char(')') {
                break;
            }
            if !arguments.is_empty() {
                self.expect_char(',', "parsing method expression, expected ','")?;
            }

            if let Some(value) = self.value()? {
                arguments.push(QueryExpression::Value(value));
                continue;
            }

            let start = self.scanner.position();
            if let Some(field) = self.field()? {
                if self.scanner.try_peek(',') || self.scanner.try_peek(')') {
                    arguments.push(QueryExpression::Field(field));
                    continue;
                }
                trace!(field = %field.path, "re-parsing method argument as expression");
                self.scanner.reset(start);
            }

            match self.expression()? {
                Some(expr) => arguments.push(expr),
                None => return Err(self.parse_error("parsing method, expected an argument")),
            }
        }
        self.leave();
        Ok(arguments)
    }

    // ===== Terminals =====

    /// Parses a number, string, `true`/`false`/`null` or `$parameter`.
    fn value(&mut self) -> Result<Option<ValueExpression>> {
        if let Some(number) = self.scanner.try_number() {
            let kind = match number {
                NumberToken::Long => ValueKind::Long,
                NumberToken::Double => ValueKind::Double,
            };
            return Ok(Some(self.current_value(kind, false)));
        }

        if self.scanner.string() {
            let escaped = self.scanner.escape_chars() != 0;
            return Ok(Some(self.current_value(ValueKind::String, escaped)));
        }

        if let Some(literal) = self.scanner.try_scan_any_keyword(&Keyword::LITERALS) {
            let kind = match literal {
                Keyword::True => ValueKind::True,
                Keyword::False => ValueKind::False,
                _ => ValueKind::Null,
            };
            return Ok(Some(ValueExpression {
                token: literal.as_str().to_string(),
                span: self.scanner.token_span(),
                kind,
                escaped: false,
            }));
        }

        if self.scanner.try_scan_char('$') {
            let name_start = self.scanner.position();
            if !self.scanner.identifier(false) || self.scanner.token_start() != name_start {
                return Err(self.parse_error("Expected parameter name"));
            }
            return Ok(Some(self.current_value(ValueKind::Parameter, false)));
        }

        Ok(None)
    }

    fn current_value(&self, kind: ValueKind, escaped: bool) -> ValueExpression {
        ValueExpression {
            token: self.scanner.current_token().to_string(),
            span: self.scanner.token_span(),
            kind,
            escaped,
        }
    }

    /// Parses a property path such as `a.'b c'[2].d`.
    ///
    /// An unquoted first segment that is a clause keyword is not a field;
    /// the cursor is left on the keyword.
    fn field(&mut self) -> Result<Option<FieldExpression>> {
        let origin = self.scanner.position();
        let mut start = None;
        let mut path = String::new();
        let mut escaped = false;

        loop {
            let first = start.is_none();
            if self.scanner.identifier(first) {
                if first && self.scanner.current_token_matches_any_of(&Keyword::RESERVED) {
                    self.scanner.go_back(self.scanner.token_length());
                    return Ok(None);
                }
                path.push_str(self.scanner.current_token());
            } else if self.scanner.string() {
                escaped = true;
                path.push_str(self.scanner.string_content());
            } else {
                self.scanner.reset(origin);
                return Ok(None);
            }
            start.get_or_insert(self.scanner.token_start());

            if self.scanner.try_scan_char('[') {
                let index = match self.scanner.try_number() {
                    Some(NumberToken::Double) => {
                        return Err(
                            self.parse_error("Array indexer must be integer, but got double")
                        );
                    }
                    Some(NumberToken::Long) if self.scanner.current_token().starts_with('-') => {
                        return Err(self.parse_error(
                            "Array indexer must be a non-negative integer",
                        ));
                    }
                    Some(NumberToken::Long) => self.scanner.current_token(),
                    None => "",
                };
                self.expect_char(']', "Expected to find closing ]")?;
                path.push('[');
                path.push_str(index);
                path.push(']');
            }

            if !self.scanner.try_scan_char('.') {
                break;
            }
            path.push('.');
        }

        let start = start.unwrap_or(origin);
        Ok(Some(FieldExpression {
            path,
            span: Span::between(start, self.scanner.position()),
            escaped,
        }))
    }

    // ===== Helpers =====

    /// Enters a nested group, enforcing the depth cap.
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.query_error(format!(
                "Query is too complex, over {} nested clauses are not allowed",
                self.options.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Counts one more connective, enforcing the connective cap.
    fn count_connective(&mut self) -> Result<()> {
        self.connectives += 1;
        if self.connectives > self.options.max_connectives {
            return Err(self.query_error(format!(
                "Query is too complex, over {} chained conditions are not allowed",
                self.options.max_connectives
            )));
        }
        Ok(())
    }

    /// Consumes `expected` or fails with `message`.
    fn expect_char(&mut self, expected: char, message: &str) -> Result<()> {
        if self.scanner.try_scan_char(expected) {
            Ok(())
        } else {
            Err(self.parse_error(message))
        }
    }

    /// Consumes `keyword` or fails with `message`.
    fn expect_keyword(&mut self, keyword: Keyword, message: &str) -> Result<()> {
        if self.scanner.try_scan_keyword(keyword) {
            Ok(())
        } else {
            Err(self.parse_error(message))
        }
    }

    /// Builds a parse error pointing at the next token.
    fn parse_error(&mut self, message: impl Into<String>) -> Error {
        let message = message.into();
        let found = self
            .scanner
            .next_token()
            .then(|| self.scanner.current_token().to_string());
        let location = self.scanner.location_at(self.scanner.token_start());
        debug!(%location, ?found, %message, "parse error");
        Error::Parse(ParseError {
            message,
            location,
            found,
            query: self.scanner.input().to_string(),
        })
    }

    /// Builds a semantic error at the cursor.
    fn query_error(&self, message: String) -> Error {
        let location = self.scanner.location();
        debug!(%location, %message, "query error");
        Error::Query(QueryError::Invalid { message, location })
    }
}

/// Folds `operands` joined by `links` into a tree, right to left.
///
/// `links[i]` joins `operands[i]` and `operands[i + 1]` and records whether
/// the right operand opened with a parenthesis. `spine` counts the
/// connectives on the left spine of the tree folded so far.
fn fold_chain(
    mut operands: Vec<QueryExpression>,
    links: Vec<(OperatorType, bool)>,
) -> Option<QueryExpression> {
    let mut tree = operands.pop()?;
    let mut spine = 0;
    for (operator, parenthesis) in links.into_iter().rev() {
        let left = operands.pop()?;
        if operator.is_and() && !parenthesis && spine > 0 {
            splice_left(&mut tree, spine - 1, left, operator);
            spine += 1;
        } else {
            tree = QueryExpression::Binary(BinaryExpression::new(left, operator, tree));
            spine = 1;
        }
    }
    Some(tree)
}

/// Replaces the leftmost operand `depth` levels down the left spine of
/// `node` with `left <operator> operand`.
fn splice_left(
    node: &mut QueryExpression,
    depth: usize,
    left: QueryExpression,
    operator: OperatorType,
) {
    let mut node = node;
    for _ in 0..depth {
        node = match { node } {
            QueryExpression::Binary(binary) => binary.left.as_mut(),
            other => other,
        };
    }
    if let QueryExpression::Binary(binary) = node {
        let operand = std::mem::replace(binary.left.as_mut(), QueryExpression::True);
        *binary.left = QueryExpression::Binary(BinaryExpression::new(left, operator, operand));
    }
}
