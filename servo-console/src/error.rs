//! Console errors

use thiserror::Error;

/// Errors raised before a command gets to run
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Input line longer than the console accepts
    #[error("Command line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    /// More arguments than the console accepts
    #[error("Too many arguments: {count} (max {max})")]
    TooManyArguments { count: usize, max: usize },

    /// Quote opened but never closed
    #[error("Unbalanced quote in command line")]
    UnbalancedQuote,

    /// Line bytes are not UTF-8; holds the offset of the first bad byte
    #[error("invalid UTF-8 in command line at byte {0}")]
    InvalidUtf8(usize),
}
