//! Error types for the scripted-data text parser.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while tokenizing or parsing scripted text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A quoted string was still open at end of line/file.
    UnterminatedString {
        /// Line where the opening quote appeared.
        line: usize,
    },
    /// A malformed operator token (e.g. a lone `+`).
    BadOperator {
        /// Line where the operator appeared.
        line: usize,
        /// The characters that were found.
        found: String,
    },
    /// A `}` with no matching `{`.
    UnexpectedClose {
        /// Line of the stray brace.
        line: usize,
    },
    /// End of input reached inside an unclosed block.
    UnclosedBlock {
        /// Line where the unclosed block started.
        line: usize,
    },
    /// An operator token with no value or `{` after it.
    MissingValue {
        /// Line of the dangling operator.
        line: usize,
        /// The property key preceding the operator.
        key: String,
    },
    /// A token that cannot start a property, value, or block.
    UnexpectedToken {
        /// Line of the offending token.
        line: usize,
        /// The token that was found.
        token: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnterminatedString { line } => {
                write!(f, "Unterminated string starting on line {}", line)
            }
            ParseError::BadOperator { line, found } => {
                write!(f, "Malformed operator '{}' on line {}", found, line)
            }
            ParseError::UnexpectedClose { line } => {
                write!(f, "Unmatched '}}' on line {}", line)
            }
            ParseError::UnclosedBlock { line } => {
                write!(f, "Unclosed block starting on line {}", line)
            }
            ParseError::MissingValue { line, key } => {
                write!(f, "Missing value after '{}' on line {}", key, line)
            }
            ParseError::UnexpectedToken { line, token } => {
                write!(f, "Unexpected token '{}' on line {}", token, line)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that can occur when loading a scripted or tabular file from disk.
#[derive(Debug)]
pub enum FileError {
    /// The source path does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Io(PathBuf, std::io::Error),
    /// The file was read but its contents failed to parse.
    Parse(PathBuf, ParseError),
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            FileError::Io(path, e) => write!(f, "Cannot read {}: {}", path.display(), e),
            FileError::Parse(path, e) => write!(f, "Cannot parse {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::NotFound(_) => None,
            FileError::Io(_, e) => Some(e),
            FileError::Parse(_, e) => Some(e),
        }
    }
}

/// Errors raised when writing a data tree back out as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// A tagged block still carries the `None` sentinel operator.
    ///
    /// The sentinel means "operator not yet determined" and must never
    /// reach the serialization boundary.
    NoneOperator {
        /// Tag of the offending block, or the property key.
        tag: String,
    },
    /// A token contains a `"` character.
    ///
    /// The format has no escape sequences, so such a token would quote
    /// as text that cannot be parsed back.
    UnquotableToken {
        /// The offending token.
        token: String,
    },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::NoneOperator { tag } => {
                write!(f, "Cannot serialize '{}': operator was never set", tag)
            }
            SerializeError::UnquotableToken { token } => {
                write!(
                    f,
                    "Cannot serialize '{}': the format has no escape for '\"'",
                    token
                )
            }
        }
    }
}

impl std::error::Error for SerializeError {}
