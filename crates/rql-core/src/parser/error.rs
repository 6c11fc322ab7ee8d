//! Parser error types.

use crate::lexer::Location;

/// A grammar violation.
///
/// The message carries the position, the offending token and the whole
/// query so it can be shown to a user as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location} {message} but got{}\nQuery: \n{query}", describe_found(.found))]
pub struct ParseError {
    /// What the parser expected.
    pub message: String,
    /// Where the offending token starts.
    pub location: Location,
    /// The offending token; `None` at the end of the query.
    pub found: Option<String>,
    /// The full query text.
    pub query: String,
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(token) => format!(": {token}"),
        None => " to the end of the query".to_string(),
    }
}

/// Input that is grammatical but cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Mismatched BETWEEN/IN value kinds, or nesting that is too deep.
    #[error("{location} {message}")]
    Invalid {
        /// Error message.
        message: String,
        /// Cursor position when the error was detected.
        location: Location,
    },

    /// A query type selector that is neither `select` nor `update`.
    #[error("Unknown query type: {0}")]
    UnknownQueryType(String),
}

/// Any error raised while parsing a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Grammar violation.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Semantic violation.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl Error {
    /// Returns the parse error, if this is one.
    #[must_use]
    pub const fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Query(_) => None,
        }
    }

    /// Returns the query error, if this is one.
    #[must_use]
    pub const fn as_query(&self) -> Option<&QueryError> {
        match self {
            Self::Query(err) => Some(err),
            Self::Parse(_) => None,
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display_with_token() {
        let err = ParseError {
            message: "Expected end of query".into(),
            location: Location { line: 1, column: 12 },
            found: Some("foo".into()),
            query: "FROM Users foo".into(),
        };
        assert_eq!(
            err.to_string(),
            "1:12 Expected end of query but got: foo\nQuery: \nFROM Users foo"
        );
    }

    #[test]
    fn test_parse_error_display_at_end() {
        let err = ParseError {
            message: "Expected FROM source".into(),
            location: Location { line: 1, column: 5 },
            found: None,
            query: "FROM".into(),
        };
        assert_eq!(
            err.to_string(),
            "1:5 Expected FROM source but got to the end of the query\nQuery: \nFROM"
        );
    }

    #[test]
    fn test_error_is_transparent() {
        let err: Error = QueryError::UnknownQueryType("delete".into()).into();
        assert_eq!(err.to_string(), "Unknown query type: delete");
        assert!(err.as_query().is_some());
        assert!(err.as_parse().is_none());
    }
}
