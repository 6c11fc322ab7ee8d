//! Keywords and token classes recognized by the scanner.

use serde::{Deserialize, Serialize};

/// Query keywords.
///
/// Multi-word keywords (`GROUP BY`, `ORDER BY`, `ALL IN`) are single
/// variants; the scanner matches them with any whitespace between words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Declarations
    Declare,
    Function,

    // Clauses
    From,
    Index,
    Group,
    GroupBy,
    Where,
    Order,
    OrderBy,
    Load,
    Select,
    Distinct,
    Include,
    Update,
    As,

    // Connectives
    And,
    Or,
    Not,

    // Predicates
    Between,
    In,
    AllIn,

    // Literals
    True,
    False,
    Null,

    // Ordering
    Asc,
    Desc,
    Ascending,
    Descending,
}

impl Keyword {
    /// Keywords that may not start a field path, because they start the
    /// next clause (or an alias).
    pub const RESERVED: [Self; 8] = [
        Self::As,
        Self::Select,
        Self::Where,
        Self::Load,
        Self::Group,
        Self::Order,
        Self::Include,
        Self::Update,
    ];

    /// Connectives between two expressions.
    pub const CONNECTIVES: [Self; 2] = [Self::Or, Self::And];

    /// Literal keyword values.
    pub const LITERALS: [Self; 3] = [Self::True, Self::False, Self::Null];

    /// Sort direction keywords for ORDER BY.
    pub const DIRECTIONS: [Self; 4] = [Self::Asc, Self::Desc, Self::Ascending, Self::Descending];

    /// Attempts to parse a keyword from a string (case-insensitive).
    ///
    /// Words of multi-word keywords may be separated by any whitespace.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "DECLARE" => Some(Self::Declare),
            "FUNCTION" => Some(Self::Function),
            "FROM" => Some(Self::From),
            "INDEX" => Some(Self::Index),
            "GROUP" => Some(Self::Group),
            "GROUP BY" => Some(Self::GroupBy),
            "WHERE" => Some(Self::Where),
            "ORDER" => Some(Self::Order),
            "ORDER BY" => Some(Self::OrderBy),
            "LOAD" => Some(Self::Load),
            "SELECT" => Some(Self::Select),
            "DISTINCT" => Some(Self::Distinct),
            "INCLUDE" => Some(Self::Include),
            "UPDATE" => Some(Self::Update),
            "AS" => Some(Self::As),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "BETWEEN" => Some(Self::Between),
            "IN" => Some(Self::In),
            "ALL IN" => Some(Self::AllIn),
            "TRUE" => Some(Self::True),
            "FALSE" => Some(Self::False),
            "NULL" => Some(Self::Null),
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            "ASCENDING" => Some(Self::Ascending),
            "DESCENDING" => Some(Self::Descending),
            _ => None,
        }
    }

    /// Returns the keyword as written in canonical query text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Declare => "DECLARE",
            Self::Function => "function",
            Self::From => "FROM",
            Self::Index => "INDEX",
            Self::Group => "GROUP",
            Self::GroupBy => "GROUP BY",
            Self::Where => "WHERE",
            Self::Order => "ORDER",
            Self::OrderBy => "ORDER BY",
            Self::Load => "LOAD",
            Self::Select => "SELECT",
            Self::Distinct => "DISTINCT",
            Self::Include => "INCLUDE",
            Self::Update => "UPDATE",
            Self::As => "AS",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::AllIn => "ALL IN",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Ascending => "ASCENDING",
            Self::Descending => "DESCENDING",
        }
    }

    /// Returns true if this keyword cannot start a field path.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        Self::RESERVED.contains(self)
    }
}

/// The lexical class of a scanned number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberToken {
    /// Digits only.
    Long,
    /// Digits with a fractional part or an exponent.
    Double,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(Keyword::from_str("select"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::from_str("Users"), None);
    }

    #[test]
    fn test_from_str_multi_word() {
        assert_eq!(Keyword::from_str("group   by"), Some(Keyword::GroupBy));
        assert_eq!(Keyword::from_str("ORDER\nBY"), Some(Keyword::OrderBy));
        assert_eq!(Keyword::from_str("all in"), Some(Keyword::AllIn));
    }

    #[test]
    fn test_as_str_round_trips() {
        for kw in [
            Keyword::Declare,
            Keyword::GroupBy,
            Keyword::AllIn,
            Keyword::Descending,
            Keyword::Null,
        ] {
            assert_eq!(Keyword::from_str(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_reserved() {
        assert!(Keyword::Select.is_reserved());
        assert!(Keyword::As.is_reserved());
        assert!(!Keyword::From.is_reserved());
        assert!(!Keyword::And.is_reserved());
    }
}
