//! Error types for FEN parsing.

/// Errors produced when parsing a FEN string into a [`Board`](crate::Board).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The string does not have exactly six space-separated fields.
    #[error("expected 6 FEN fields, found {found}")]
    FieldCount { found: usize },

    /// The piece placement does not describe exactly eight ranks.
    #[error("expected 8 ranks in piece placement, found {found}")]
    RankCount { found: usize },

    /// A rank describes more or fewer than eight squares.
    #[error("rank {rank} describes {squares} squares, expected 8")]
    RankLength { rank: usize, squares: usize },

    /// An unrecognized character in the piece placement.
    #[error("invalid piece character '{0}'")]
    PieceChar(char),

    /// The active color is not "w" or "b".
    #[error("invalid active color \"{0}\"")]
    Color(String),

    /// The castling field contains an unrecognized character.
    #[error("invalid castling field \"{0}\"")]
    Castling(String),

    /// The en passant field is neither "-" nor a square.
    #[error("invalid en passant square \"{0}\"")]
    EnPassant(String),

    /// A move counter is not a number.
    #[error("invalid {field} \"{value}\"")]
    Counter {
        field: &'static str,
        value: String,
    },

    /// A side is missing its king or has more than one.
    #[error("each side needs exactly one king")]
    KingCount,
}
