//! Backtrackable cursor over query text.
//!
//! Unlike a token-stream lexer, the scanner is driven by the parser: every
//! operation is a speculative match that either advances past the token
//! and records it, or leaves the cursor exactly where it was. Failed
//! matches are the parser's main branching mechanism, so they must be
//! cheap and side-effect free.

use super::{Keyword, Location, NumberToken, Span};

/// Returns true if `c` may start an identifier.
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@'
}

/// Returns true if `c` may continue an identifier.
fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A positioned cursor over a single query text.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    /// The query text.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position where the last matched token starts.
    token_start: usize,
    /// The byte length of the last matched token.
    token_length: usize,
    /// Escape sequences seen in the last scanned string.
    escape_chars: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_start: 0,
            token_length: 0,
            escape_chars: 0,
        }
    }

    /// Re-initializes the scanner over new text, resetting the cursor.
    pub fn init(&mut self, input: &'a str) {
        *self = Self::new(input);
    }

    /// Returns the full query text.
    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    /// Returns the current byte position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the start of the last matched token.
    #[must_use]
    pub const fn token_start(&self) -> usize {
        self.token_start
    }

    /// Returns the length of the last matched token.
    #[must_use]
    pub const fn token_length(&self) -> usize {
        self.token_length
    }

    /// Returns the span of the last matched token.
    #[must_use]
    pub const fn token_span(&self) -> Span {
        Span::new(self.token_start, self.token_length)
    }

    /// Returns the number of escape sequences in the last scanned string.
    #[must_use]
    pub const fn escape_chars(&self) -> usize {
        self.escape_chars
    }

    /// Returns the text of the last matched token.
    #[must_use]
    pub fn current_token(&self) -> &'a str {
        self.token_span().slice(self.input).unwrap_or_default()
    }

    /// Returns the line/column of the cursor.
    #[must_use]
    pub fn location(&self) -> Location {
        Location::of(self.input, self.pos)
    }

    /// Returns the line/column of an arbitrary byte offset.
    #[must_use]
    pub fn location_at(&self, offset: usize) -> Location {
        Location::of(self.input, offset)
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Records `start..pos` as the current token.
    fn finish_token(&mut self, start: usize) {
        self.token_start = start;
        self.token_length = self.pos - start;
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // Single-line comments (-- ... and // ...)
            if matches!(
                (self.peek(), self.peek_next()),
                (Some('-'), Some('-')) | (Some('/'), Some('/'))
            ) {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // Multi-line comments (/* ... */)
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    /// Matches one word of a literal at the cursor, case-insensitively.
    ///
    /// A word ending in an identifier character only matches at a word
    /// boundary, so `IN` does not match the start of `Index`.
    fn match_word(&mut self, word: &str) -> bool {
        let rest = &self.input[self.pos..];
        let Some(candidate) = rest.get(..word.len()) else {
            return false;
        };
        if !candidate.eq_ignore_ascii_case(word) {
            return false;
        }
        let needs_boundary = word.chars().last().is_some_and(is_identifier_part);
        if needs_boundary && rest[word.len()..].chars().next().is_some_and(is_identifier_part) {
            return false;
        }
        self.pos += word.len();
        true
    }

    /// Tries to match a keyword or punctuation literal.
    ///
    /// Leading whitespace and comments are skipped. Words of a multi-word
    /// literal must be separated by whitespace in the input. On failure
    /// the cursor does not move.
    pub fn try_scan(&mut self, literal: &str) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        for (idx, word) in literal.split_whitespace().enumerate() {
            if idx > 0 {
                let before = self.pos;
                self.skip_whitespace_and_comments();
                if self.pos == before {
                    self.pos = start;
                    return false;
                }
            }
            if !self.match_word(word) {
                self.pos = start;
                return false;
            }
        }

        if self.pos == token_start {
            self.pos = start;
            return false;
        }
        self.finish_token(token_start);
        true
    }

    /// Tries to match a single character.
    pub fn try_scan_char(&mut self, expected: char) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        if self.peek() == Some(expected) {
            let token_start = self.pos;
            self.advance();
            self.finish_token(token_start);
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Tries to match a keyword.
    pub fn try_scan_keyword(&mut self, keyword: Keyword) -> bool {
        self.try_scan(keyword.as_str())
    }

    /// Tries each literal in order and returns the first that matches.
    pub fn try_scan_any<'k>(&mut self, literals: &[&'k str]) -> Option<&'k str> {
        literals.iter().copied().find(|literal| self.try_scan(literal))
    }

    /// Tries each keyword in order and returns the first that matches.
    pub fn try_scan_any_keyword(&mut self, keywords: &[Keyword]) -> Option<Keyword> {
        keywords.iter().copied().find(|kw| self.try_scan_keyword(*kw))
    }

    /// Consumes an identifier.
    ///
    /// With `beginning` false the token may start with a character that is
    /// only legal inside an identifier (a digit), which is how path
    /// continuations such as `a.1` are scanned.
    pub fn identifier(&mut self, beginning: bool) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        let starts = match self.peek() {
            Some(c) if beginning => is_identifier_start(c),
            Some(c) => is_identifier_start(c) || is_identifier_part(c),
            None => false,
        };
        if !starts {
            self.pos = start;
            return false;
        }

        self.advance();
        while self.peek().is_some_and(is_identifier_part) {
            self.advance();
        }
        self.finish_token(token_start);
        true
    }

    /// Consumes a single- or double-quoted string.
    ///
    /// The token includes the quotes. A doubled quote or a backslash
    /// escape counts as one escape character. An unterminated string
    /// fails without moving the cursor.
    pub fn string(&mut self) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => {
                self.pos = start;
                return false;
            }
        };
        self.advance();

        let mut escapes = 0;
        loop {
            match self.advance() {
                Some('\\') => {
                    if self.advance().is_none() {
                        self.pos = start;
                        return false;
                    }
                    escapes += 1;
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.advance();
                        escapes += 1;
                    } else {
                        break;
                    }
                }
                Some(_) => {}
                None => {
                    self.pos = start;
                    return false;
                }
            }
        }

        self.escape_chars = escapes;
        self.finish_token(token_start);
        true
    }

    /// Returns the text between the quotes of the last scanned string.
    #[must_use]
    pub fn string_content(&self) -> &'a str {
        let token = self.current_token();
        if token.len() >= 2 {
            &token[1..token.len() - 1]
        } else {
            ""
        }
    }

    /// Consumes a number and reports whether it is integral or not.
    ///
    /// The kind is decided lexically: a fractional part or an exponent
    /// makes a `Double`, regardless of magnitude.
    pub fn try_number(&mut self) -> Option<NumberToken> {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }
        if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos = start;
            return None;
        }

        let mut kind = NumberToken::Long;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            kind = NumberToken::Double;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let before_exponent = self.pos;
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                kind = NumberToken::Double;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.pos = before_exponent;
            }
        }

        self.finish_token(token_start);
        Some(kind)
    }

    /// Consumes a balanced `{ ... }` block verbatim.
    ///
    /// Braces inside string literals and comments do not count. Fails
    /// without moving the cursor if the next token is not `{` or the block
    /// never closes.
    pub fn function_body(&mut self) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        if self.peek() != Some('{') {
            self.pos = start;
            return false;
        }

        let mut depth = 0usize;
        loop {
            match self.advance() {
                Some('{') => depth += 1,
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(quote @ ('\'' | '"' | '`')) => {
                    if !self.skip_script_string(quote) {
                        self.pos = start;
                        return false;
                    }
                }
                Some('/') if self.peek() == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    loop {
                        match self.advance() {
                            Some('*') if self.peek() == Some('/') => {
                                self.advance();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                self.pos = start;
                                return false;
                            }
                        }
                    }
                }
                Some(_) => {}
                None => {
                    self.pos = start;
                    return false;
                }
            }
        }

        self.finish_token(token_start);
        true
    }

    /// Skips a string literal inside a function body; the opening quote is
    /// already consumed.
    fn skip_script_string(&mut self, quote: char) -> bool {
        loop {
            match self.advance() {
                Some('\\') => {
                    if self.advance().is_none() {
                        return false;
                    }
                }
                Some(c) if c == quote => return true,
                Some(_) => {}
                None => return false,
            }
        }
    }

    /// Moves the cursor back by `count` bytes.
    pub fn go_back(&mut self, count: usize) {
        self.pos = self.pos.saturating_sub(count);
    }

    /// Moves the cursor to an absolute byte offset.
    pub fn reset(&mut self, position: usize) {
        self.pos = position.min(self.input.len());
    }

    /// Returns true if the last matched token is one of `keywords`.
    #[must_use]
    pub fn current_token_matches_any_of(&self, keywords: &[Keyword]) -> bool {
        Keyword::from_str(self.current_token()).is_some_and(|kw| keywords.contains(&kw))
    }

    /// Returns true if the next non-whitespace character is `expected`.
    /// Never moves the cursor.
    pub fn try_peek(&mut self, expected: char) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let found = self.peek() == Some(expected);
        self.pos = start;
        found
    }

    /// Returns true if only whitespace and comments remain.
    pub fn at_end_of_input(&mut self) -> bool {
        let start = self.pos;
        self.skip_whitespace_and_comments();
        let at_end = self.pos >= self.input.len();
        self.pos = start;
        at_end
    }

    /// Consumes whatever token comes next, for diagnostics.
    ///
    /// Returns false at the end of the input; the token start is still
    /// updated so it points at the end.
    pub fn next_token(&mut self) -> bool {
        self.skip_whitespace_and_comments();
        let token_start = self.pos;

        match self.peek() {
            None => {
                self.finish_token(token_start);
                false
            }
            Some('\'' | '"') if self.string() => true,
            Some(c) if c.is_ascii_digit() => self.try_number().is_some(),
            Some(c) if is_identifier_start(c) || is_identifier_part(c) => {
                self.identifier(false)
            }
            Some(_) => {
                self.advance();
                self.finish_token(token_start);
                true
            }
        }
    }
}
