//! Error taxonomy for the scripting layer.
//!
//! Parse-time and load-time errors abort the offending document; `check()`
//! errors abort startup, naming the offending entity so content authors can
//! fix their script. Runtime evaluation of data that passed `check()` does
//! not produce errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    /// An unrecognized tag or key for a given scripting construct.
    #[error("unknown {kind} `{tag}`")]
    Schema {
        /// Which construct the tag was read for ("condition", "effect", ...).
        kind: &'static str,
        tag: String,
    },

    /// A post-load invariant violation reported by `check()`.
    #[error("validation failed for `{entity}`: {message}")]
    Validation { entity: String, message: String },

    /// An identifier lookup through a "must exist" accessor failed.
    #[error("`{identifier}` not found")]
    NotFound { identifier: String },

    /// A property value that could not be interpreted.
    #[error("invalid value `{value}` for `{key}`")]
    InvalidValue { key: String, value: String },

    /// A mean-time-to-happen with no days/months/years ever configured.
    #[error("mean time to happen has no configured duration")]
    MissingDuration,

    /// Malformed scripted text.
    #[error(transparent)]
    Parse(#[from] gstxt::ParseError),

    /// A file that could not be found, read, or parsed.
    #[error(transparent)]
    File(#[from] gstxt::FileError),
}

impl ScriptError {
    /// Convenience constructor for `check()`-time failures.
    pub fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::Validation {
            entity: entity.into(),
            message: message.into(),
        }
    }
}
