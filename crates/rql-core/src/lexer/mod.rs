//! Query scanner.
//!
//! This module provides a hand-written, backtrackable scanner that the
//! parser drives one speculative match at a time.

mod scanner;
mod span;
mod token;

pub use scanner::Scanner;
pub use span::{Location, Span};
pub use token::{Keyword, NumberToken};
