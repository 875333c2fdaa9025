//! Error types.
//!
//! Only configuration and store access can fail loudly. Everything on the
//! evaluation path is fail-soft: malformed `manual` expressions surface as
//! [`ExprError`] to the caller that decides to log and skip, never to the
//! page being rendered.

use thiserror::Error;

/// Errors from lexing, parsing or evaluating a `manual` rule expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The expression is empty (or only whitespace).
    #[error("expression is empty")]
    Empty,

    /// A character that cannot start any token.
    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar {
        /// The offending character.
        found: char,
        /// Byte offset in the source.
        offset: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },

    /// The parser found a token it did not expect.
    #[error("expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        /// What the grammar required at this point.
        expected: &'static str,
        /// Description of what was there instead.
        found: String,
        /// Byte offset in the source.
        offset: usize,
    },

    /// A call to a predicate that is not in the whitelist.
    #[error("unknown predicate `{name}`")]
    UnknownPredicate {
        /// The name as written.
        name: String,
    },

    /// Nesting exceeds [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("expression nesting depth exceeds {max}")]
    DepthExceeded {
        /// Maximum allowed depth.
        max: usize,
    },

    /// A call carries more than [`MAX_CALL_ARGS`](crate::MAX_CALL_ARGS) arguments.
    #[error("call to `{name}` has {count} arguments, maximum is {max}")]
    TooManyArguments {
        /// The predicate name.
        name: String,
        /// Actual argument count after flattening.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
}

/// Errors reported by a [`BoxStore`](crate::BoxStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be read.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("corrupt record for box {id}: {reason}")]
    Corrupt {
        /// Box the record belongs to.
        id: u64,
        /// What was wrong with it.
        reason: String,
    },
}

/// Errors loading settings or a site file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read \"{path}\": {source}")]
    Io {
        /// Path as given.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON parse failure.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse failure.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two boxes share an id.
    #[error("duplicate box id {0}")]
    DuplicateBox(u64),
}
