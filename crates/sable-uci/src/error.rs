//! UCI protocol errors.

use sable_core::FenError;

/// Errors from parsing or executing UCI commands.
#[derive(Debug, thiserror::Error)]
pub enum UciError {
    /// `position` without `startpos` or `fen`.
    #[error("malformed position command")]
    MalformedPosition,

    /// The FEN in a `position` command did not parse.
    #[error("invalid FEN: {source}")]
    InvalidFen {
        #[from]
        source: FenError,
    },

    /// A move in a `position ... moves` list is not legal.
    #[error("illegal move in position command: {0}")]
    IllegalMove(String),

    /// A `go` or `setoption` parameter value did not parse.
    #[error("invalid value for {param}: {value}")]
    InvalidValue { param: String, value: String },

    /// Reading stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
