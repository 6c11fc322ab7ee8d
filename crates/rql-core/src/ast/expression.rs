//! Expression AST types.
//!
//! Every node owns its text and remembers the [`Span`] it was parsed
//! from. Equality is structural: spans are ignored, so two parses of
//! differently formatted but equivalent text compare equal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::lexer::{Keyword, Span};

/// The lexical kind of a value token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Integer literal.
    Long,
    /// Floating-point literal.
    Double,
    /// Quoted string literal.
    String,
    /// `true`.
    True,
    /// `false`.
    False,
    /// `null`.
    Null,
    /// `$name` parameter reference.
    Parameter,
}

impl ValueKind {
    /// Returns a human-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Long => "Long",
            Self::Double => "Double",
            Self::String => "String",
            Self::True => "True",
            Self::False => "False",
            Self::Null => "Null",
            Self::Parameter => "Parameter",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operators: comparisons and logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorType {
    // Comparison
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,

    // Logical
    And,
    AndNot,
    Or,
    OrNot,
}

impl OperatorType {
    /// Returns the canonical query representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEqual => "<=",
            Self::GreaterThanEqual => ">=",
            Self::And => "AND",
            Self::AndNot => "AND NOT",
            Self::Or => "OR",
            Self::OrNot => "OR NOT",
        }
    }

    /// Returns true for `=`, `!=`, `<`, `>`, `<=` and `>=`.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::GreaterThan
                | Self::LessThanEqual
                | Self::GreaterThanEqual
        )
    }

    /// Returns true for the AND/OR family.
    #[must_use]
    pub const fn is_connective(&self) -> bool {
        !self.is_comparison()
    }

    /// Returns true for `AND` and `AND NOT`.
    #[must_use]
    pub const fn is_and(&self) -> bool {
        matches!(self, Self::And | Self::AndNot)
    }
}

impl fmt::Display for OperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dotted/bracketed property path such as `a.b[3].c`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldExpression {
    /// The path, with the quotes of quoted segments removed.
    pub path: String,
    /// Source span of the whole path.
    pub span: Span,
    /// Whether the path contained a quoted segment.
    pub escaped: bool,
}

impl FieldExpression {
    /// Creates a field reference with no source location.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            span: Span::default(),
            escaped: false,
        }
    }

    /// Creates a field that was written with quotes.
    #[must_use]
    pub fn quoted(path: impl Into<String>) -> Self {
        Self {
            escaped: true,
            ..Self::new(path)
        }
    }

    /// Creates the implicit subject of a comparison that trails a method
    /// call, as in `exists(Tags) = true`.
    #[must_use]
    pub const fn implicit(span: Span) -> Self {
        Self {
            path: String::new(),
            span,
            escaped: false,
        }
    }

    /// Returns true for the implicit subject of a trailing comparison.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        self.path.is_empty()
    }

    /// Returns the path with escape sequences decoded.
    #[must_use]
    pub fn unescaped(&self) -> String {
        if self.escaped {
            unescape(&self.path)
        } else {
            self.path.clone()
        }
    }
}

impl PartialEq for FieldExpression {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.escaped == other.escaped
    }
}

impl fmt::Display for FieldExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_path(f, &self.path, self.escaped)
    }
}

/// A literal or parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueExpression {
    /// The token text. Strings keep their quotes; parameters drop the `$`.
    pub token: String,
    /// Source span of the token.
    pub span: Span,
    /// The lexical kind.
    pub kind: ValueKind,
    /// Whether a string contains escape sequences.
    pub escaped: bool,
}

impl ValueExpression {
    /// Creates a value with no source location.
    #[must_use]
    pub fn new(token: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            token: token.into(),
            span: Span::default(),
            kind,
            escaped: false,
        }
    }

    /// Creates an integer value.
    #[must_use]
    pub fn long(value: i64) -> Self {
        Self::new(value.to_string(), ValueKind::Long)
    }

    /// Creates a floating-point value from its literal text.
    #[must_use]
    pub fn double(literal: impl Into<String>) -> Self {
        Self::new(literal, ValueKind::Double)
    }

    /// Creates a single-quoted string value.
    #[must_use]
    pub fn string(value: &str) -> Self {
        let escaped = value.contains('\'') || value.contains('\\');
        let body = value.replace('\\', "\\\\").replace('\'', "''");
        Self {
            escaped,
            ..Self::new(format!("'{body}'"), ValueKind::String)
        }
    }

    /// Creates a `$name` parameter reference.
    #[must_use]
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Parameter)
    }

    /// Returns the token without string quotes.
    #[must_use]
    pub fn text(&self) -> &str {
        if self.kind != ValueKind::String {
            return &self.token;
        }
        ['\'', '"']
            .into_iter()
            .find_map(|quote| self.token.strip_prefix(quote)?.strip_suffix(quote))
            .unwrap_or(&self.token)
    }

    /// Returns the value text with escape sequences decoded.
    #[must_use]
    pub fn unescaped(&self) -> String {
        if self.escaped {
            unescape(self.text())
        } else {
            self.text().to_string()
        }
    }
}

impl PartialEq for ValueExpression {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token && self.kind == other.kind && self.escaped == other.escaped
    }
}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ValueKind::Parameter => write!(f, "${}", self.token),
            _ => f.write_str(&self.token),
        }
    }
}

/// A binary expression: a comparison or a logical connective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    /// Left operand.
    pub left: Box<QueryExpression>,
    /// Operator.
    pub operator: OperatorType,
    /// Right operand.
    pub right: Box<QueryExpression>,
}

impl BinaryExpression {
    /// Creates a binary expression.
    #[must_use]
    pub fn new(left: QueryExpression, operator: OperatorType, right: QueryExpression) -> Self {
        Self {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }
}

/// `source BETWEEN min AND max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetweenExpression {
    /// The field being tested.
    pub source: FieldExpression,
    /// Lower bound.
    pub min: ValueExpression,
    /// Upper bound, of the same kind as `min`.
    pub max: ValueExpression,
}

/// `source IN (values)` or `source ALL IN (values)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InExpression {
    /// The field being tested.
    pub source: FieldExpression,
    /// Candidate values, all of the same kind.
    pub values: Vec<ValueExpression>,
    /// ALL IN: every stored value must match.
    pub all: bool,
}

/// A method call such as `search(Name, 'foo')`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodExpression {
    /// The method name.
    pub name: String,
    /// Source span of the name.
    pub span: Span,
    /// Whether the name was written with quotes.
    pub escaped: bool,
    /// Arguments, each a full expression.
    pub arguments: Vec<QueryExpression>,
}

impl MethodExpression {
    /// Creates a method call with no source location.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: Vec<QueryExpression>) -> Self {
        Self {
            name: name.into(),
            span: Span::default(),
            escaped: false,
            arguments,
        }
    }

    /// Returns the comparison appended by `method(...) <op> value`, if any.
    #[must_use]
    pub fn trailing_predicate(&self) -> Option<&QueryExpression> {
        self.arguments.last().filter(|arg| arg.has_implicit_subject())
    }
}

impl PartialEq for MethodExpression {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.escaped == other.escaped
            && self.arguments == other.arguments
    }
}

/// A query expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryExpression {
    /// A field reference.
    Field(FieldExpression),
    /// A literal or parameter.
    Value(ValueExpression),
    /// A comparison or connective.
    Binary(BinaryExpression),
    /// A BETWEEN range test.
    Between(BetweenExpression),
    /// An IN / ALL IN membership test.
    In(InExpression),
    /// A method call.
    Method(MethodExpression),
    /// Literal truth, a filter with no predicate.
    True,
}

impl QueryExpression {
    /// Creates a field reference.
    #[must_use]
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(FieldExpression::new(path))
    }

    /// Creates a comparison of `self` against a value.
    #[must_use]
    pub fn compare(self, operator: OperatorType, value: ValueExpression) -> Self {
        Self::Binary(BinaryExpression::new(self, operator, Self::Value(value)))
    }

    /// Creates an equality comparison.
    #[must_use]
    pub fn equals(self, value: ValueExpression) -> Self {
        self.compare(OperatorType::Equal, value)
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        Self::Binary(BinaryExpression::new(self, OperatorType::And, right))
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        Self::Binary(BinaryExpression::new(self, OperatorType::Or, right))
    }

    /// Returns the binary expression, if this is one.
    #[must_use]
    pub const fn as_binary(&self) -> Option<&BinaryExpression> {
        match self {
            Self::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    /// Returns true for AND/OR binary expressions.
    #[must_use]
    pub const fn is_connective(&self) -> bool {
        matches!(self, Self::Binary(binary) if binary.operator.is_connective())
    }

    /// Returns true for predicates whose subject is implicit.
    #[must_use]
    pub fn has_implicit_subject(&self) -> bool {
        match self {
            Self::Binary(binary) => {
                matches!(binary.left.as_ref(), Self::Field(field) if field.is_implicit())
            }
            Self::Between(between) => between.source.is_implicit(),
            Self::In(in_expr) => in_expr.source.is_implicit(),
            _ => false,
        }
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => field.fmt(f),
            Self::Value(value) => value.fmt(f),
            Self::Binary(binary) => binary.fmt(f),
            Self::Between(between) => between.fmt(f),
            Self::In(in_expr) => in_expr.fmt(f),
            Self::Method(method) => method.fmt(f),
            Self::True => f.write_str("true"),
        }
    }
}

impl fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.is_comparison() {
            write_subject(f, &self.left)?;
            return write!(f, "{} {}", self.operator, self.right);
        }
        write_connective(f, self)
    }
}

impl fmt::Display for BetweenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.source.is_implicit() {
            write!(f, "{} ", self.source)?;
        }
        write!(f, "BETWEEN {} AND {}", self.min, self.max)
    }
}

impl fmt::Display for InExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.source.is_implicit() {
            write!(f, "{} ", self.source)?;
        }
        f.write_str(if self.all { "ALL IN (" } else { "IN (" })?;
        write_list(f, &self.values)?;
        f.write_str(")")
    }
}

impl fmt::Display for MethodExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trailing = self.trailing_predicate();
        let count = self.arguments.len() - usize::from(trailing.is_some());
        write_path(f, &self.name, self.escaped)?;
        f.write_str("(")?;
        write_list(f, &self.arguments[..count])?;
        f.write_str(")")?;
        if let Some(predicate) = trailing {
            write!(f, " {predicate}")?;
        }
        Ok(())
    }
}

/// Writes the left side of a comparison followed by a space, or nothing
/// when the subject is implicit.
fn write_subject(f: &mut fmt::Formatter<'_>, left: &QueryExpression) -> fmt::Result {
    match left {
        QueryExpression::Field(field) if field.is_implicit() => Ok(()),
        other => write!(f, "{other} "),
    }
}

/// Writes a connective chain with only the parentheses needed to parse
/// back to the same tree, walking the tree iteratively.
///
/// Left-nested AND links whose right operand is a single predicate and
/// right-nested OR links are written flat. An AND whose right side is a
/// connective is written flat only when that side opens with a group;
/// otherwise the right side is grouped.
fn write_connective(f: &mut fmt::Formatter<'_>, mut node: &BinaryExpression) -> fmt::Result {
    loop {
        write_and_chain(f, &node.left)?;
        write!(f, " {} ", node.operator)?;
        let right = match node.right.as_ref() {
            QueryExpression::Binary(right) if right.operator.is_connective() => right,
            right => return write!(f, "{right}"),
        };
        if node.operator.is_and() && !chain_bottom(&right.left).is_connective() {
            return write!(f, "({right})");
        }
        node = right;
    }
}

/// Writes a left-nested run of AND links flat, grouping whatever ends it.
fn write_and_chain(f: &mut fmt::Formatter<'_>, expr: &QueryExpression) -> fmt::Result {
    let mut links = Vec::new();
    let mut node = expr;
    while let QueryExpression::Binary(binary) = node {
        if !binary.operator.is_and() || binary.right.is_connective() {
            break;
        }
        links.push(binary);
        node = &binary.left;
    }
    write_operand(f, node)?;
    for binary in links.iter().rev() {
        write!(f, " {} {}", binary.operator, binary.right)?;
    }
    Ok(())
}

/// Follows AND links whose right operand is a single predicate down the
/// left spine and returns the first operand of the run.
fn chain_bottom(expr: &QueryExpression) -> &QueryExpression {
    let mut node = expr;
    while let QueryExpression::Binary(binary) = node {
        if !binary.operator.is_and() || binary.right.is_connective() {
            break;
        }
        node = &binary.left;
    }
    node
}

/// Writes a connective operand, grouping nested connectives.
fn write_operand(f: &mut fmt::Formatter<'_>, operand: &QueryExpression) -> fmt::Result {
    if operand.is_connective() {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

/// Writes a field path or method name, quoted when it was written quoted
/// or could not be read back bare.
fn write_path(f: &mut fmt::Formatter<'_>, path: &str, escaped: bool) -> fmt::Result {
    if escaped || !is_bare_path(path) {
        write_quoted(f, path)
    } else {
        f.write_str(path)
    }
}

/// Writes a comma-separated list.
pub(crate) fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Writes text in quotes, picking a quote character it does not contain.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{quote}{text}{quote}")
}

/// Returns true if `path` can be written without quotes.
pub(crate) fn is_bare_path(path: &str) -> bool {
    let mut chars = path.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == '@') {
        return false;
    }
    if !chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']')) {
        return false;
    }
    let head = path.split(['.', '[']).next().unwrap_or_default();
    !Keyword::from_str(head).is_some_and(|kw| kw.is_reserved() || kw == Keyword::True)
}

/// Decodes backslash escapes and doubled quotes.
pub(crate) fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '\'' | '"' if chars.peek() == Some(&c) => {
                chars.next();
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classification() {
        assert!(OperatorType::LessThanEqual.is_comparison());
        assert!(OperatorType::OrNot.is_connective());
        assert!(OperatorType::AndNot.is_and());
        assert!(!OperatorType::Or.is_and());
    }

    #[test]
    fn test_equality_ignores_spans() {
        let a = FieldExpression {
            path: "Name".into(),
            span: Span::new(3, 4),
            escaped: false,
        };
        assert_eq!(a, FieldExpression::new("Name"));
        assert_ne!(a, FieldExpression::quoted("Name"));
    }

    #[test]
    fn test_value_text_and_unescape() {
        let value = ValueExpression {
            token: "'it''s'".into(),
            span: Span::default(),
            kind: ValueKind::String,
            escaped: true,
        };
        assert_eq!(value.text(), "it''s");
        assert_eq!(value.unescaped(), "it's");
        assert_eq!(ValueExpression::string("it's"), value);
        assert_eq!(ValueExpression::long(42).text(), "42");
    }

    #[test]
    fn test_unescape_backslash() {
        assert_eq!(unescape(r"a\'b\\c"), r"a'b\c");
    }

    #[test]
    fn test_bare_paths() {
        assert!(is_bare_path("Address.City"));
        assert!(is_bare_path("Tags[3].Name"));
        assert!(is_bare_path("@metadata"));
        assert!(!is_bare_path("First Name"));
        assert!(!is_bare_path("select"));
        assert!(!is_bare_path("1st"));
        assert!(!is_bare_path(""));
    }

    #[test]
    fn test_display_comparison() {
        let expr = QueryExpression::field("Age").compare(OperatorType::GreaterThan, ValueExpression::long(18));
        assert_eq!(expr.to_string(), "Age > 18");
    }

    #[test]
    fn test_display_groups_nested_connectives() {
        let a = QueryExpression::field("A").equals(ValueExpression::long(1));
        let b = QueryExpression::field("B").equals(ValueExpression::long(2));
        let c = QueryExpression::field("C").equals(ValueExpression::long(3));
        assert_eq!(a.clone().and(b.clone()).or(c.clone()).to_string(), "A = 1 AND B = 2 OR C = 3");
        assert_eq!(a.clone().and(b.clone()).and(c.clone()).to_string(), "A = 1 AND B = 2 AND C = 3");
        assert_eq!(a.clone().or(b.clone()).or(c.clone()).to_string(), "(A = 1 OR B = 2) OR C = 3");
        assert_eq!(a.clone().or(b.clone().or(c.clone())).to_string(), "A = 1 OR B = 2 OR C = 3");
        assert_eq!(a.clone().and(b.clone().and(c.clone())).to_string(), "A = 1 AND (B = 2 AND C = 3)");
        assert_eq!(a.clone().or(b.clone()).and(c.clone()).to_string(), "(A = 1 OR B = 2) AND C = 3");
        assert_eq!(a.and(b.or(c)).to_string(), "A = 1 AND (B = 2 OR C = 3)");
    }

    #[test]
    fn test_display_flattens_long_chains() {
        let mut and_chain = QueryExpression::field("A").equals(ValueExpression::long(0));
        let mut or_chain = QueryExpression::field("A").equals(ValueExpression::long(0));
        for value in (1..500).rev() {
            let link = QueryExpression::field("A").equals(ValueExpression::long(value));
            or_chain = link.clone().or(or_chain);
            and_chain = and_chain.and(link);
        }
        let and_text = and_chain.to_string();
        let or_text = or_chain.to_string();
        assert!(!and_text.contains('('));
        assert!(!or_text.contains('('));
        assert!(and_text.starts_with("A = 0 AND A = 499 AND A = 498"));
        assert!(or_text.starts_with("A = 1 OR A = 2 OR A = 3"));
    }

    #[test]
    fn test_display_quoted_method_name() {
        let quoted = MethodExpression {
            escaped: true,
            ..MethodExpression::new("quoted name", vec![QueryExpression::field("x")])
        };
        assert_eq!(quoted.to_string(), "'quoted name'(x)");
        assert_ne!(quoted, MethodExpression::new("quoted name", vec![QueryExpression::field("x")]));

        let spaced = MethodExpression::new("my method", Vec::new());
        assert_eq!(spaced.to_string(), "'my method'()");
        assert_eq!(MethodExpression::new("count", Vec::new()).to_string(), "count()");
    }

    #[test]
    fn test_value_text_without_quotes() {
        assert_eq!(ValueExpression::new("é", ValueKind::String).text(), "é");
        assert_eq!(ValueExpression::new("'", ValueKind::String).text(), "'");
        assert_eq!(ValueExpression::new("\"é\"", ValueKind::String).text(), "é");
        assert_eq!(ValueExpression::new("'a\"", ValueKind::String).text(), "'a\"");
    }

    #[test]
    fn test_display_method_with_trailing_predicate() {
        let predicate = QueryExpression::Field(FieldExpression::implicit(Span::default()))
            .equals(ValueExpression::new("true", ValueKind::True));
        let method = MethodExpression::new(
            "exists",
            vec![QueryExpression::field("Tags"), predicate],
        );
        assert_eq!(method.to_string(), "exists(Tags) = true");
    }

    #[test]
    fn test_display_quoted_field_and_parameter() {
        let expr = QueryExpression::Field(FieldExpression::quoted("First Name"))
            .equals(ValueExpression::parameter("name"));
        assert_eq!(expr.to_string(), "'First Name' = $name");
    }

    #[test]
    fn test_display_in_and_between() {
        let in_expr = InExpression {
            source: FieldExpression::new("Status"),
            values: vec![ValueExpression::string("a"), ValueExpression::string("b")],
            all: true,
        };
        assert_eq!(in_expr.to_string(), "Status ALL IN ('a', 'b')");

        let between = BetweenExpression {
            source: FieldExpression::new("Age"),
            min: ValueExpression::long(1),
            max: ValueExpression::long(5),
        };
        assert_eq!(between.to_string(), "Age BETWEEN 1 AND 5");
    }
}
