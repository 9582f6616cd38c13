//! FEN parsing and serialization.

use std::fmt;
use std::str::FromStr;

use crate::bitboard::Bitboard;
use crate::board::Board;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::error::FenError;
use crate::piece::{Piece, PieceKind};
use crate::square::Square;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl FromStr for Board {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount {
                found: fields.len(),
            });
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount { found: ranks.len() });
        }

        let mut pieces = [Bitboard::EMPTY; PieceKind::COUNT];
        let mut sides = [Bitboard::EMPTY; Color::COUNT];

        for (i, rank_str) in ranks.iter().enumerate() {
            // FEN lists rank 8 first
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::PieceChar(c));
                    }
                    file += skip as u8;
                } else {
                    let kind = PieceKind::from_fen_char(c).ok_or(FenError::PieceChar(c))?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if file >= 8 {
                        return Err(FenError::RankLength {
                            rank: i,
                            squares: file as usize + 1,
                        });
                    }
                    let bb = Square::from_coords(file, rank).bb();
                    pieces[kind.index()] |= bb;
                    sides[color.index()] |= bb;
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::RankLength {
                    rank: i,
                    squares: file as usize,
                });
            }
        }

        for color in Color::ALL {
            if (pieces[PieceKind::King.index()] & sides[color.index()]).count() != 1 {
                return Err(FenError::KingCount);
            }
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::Color(other.to_string())),
        };

        let castling = CastleRights::from_fen(fields[2])
            .ok_or_else(|| FenError::Castling(fields[2].to_string()))?;

        let en_passant = if fields[3] == "-" {
            None
        } else {
            Some(
                Square::from_algebraic(fields[3])
                    .ok_or_else(|| FenError::EnPassant(fields[3].to_string()))?,
            )
        };

        let halfmove_clock = fields[4].parse().map_err(|_| FenError::Counter {
            field: "halfmove clock",
            value: fields[4].to_string(),
        })?;
        let fullmove_number = fields[5].parse().map_err(|_| FenError::Counter {
            field: "fullmove number",
            value: fields[5].to_string(),
        })?;

        Ok(Board::from_parts(
            pieces,
            sides,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        ))
    }
}

impl fmt::Display for Board {
    /// Render the position as a FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                let sq = Square::from_coords(file, rank);
                match (self.piece_on(sq), self.color_on(sq)) {
                    (Some(kind), Some(color)) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{}", Piece::new(kind, color).fen_char())?;
                    }
                    _ => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        let side = match self.side_to_move() {
            Color::White => 'w',
            Color::Black => 'b',
        };
        write!(f, " {side} {} ", self.castling())?;
        match self.en_passant() {
            Some(sq) => write!(f, "{sq}")?,
            None => write!(f, "-")?,
        }
        write!(f, " {} {}", self.halfmove_clock(), self.fullmove_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_fen_round_trips() {
        let board: Board = STARTING_FEN.parse().unwrap();
        assert_eq!(board.to_string(), STARTING_FEN);
    }

    #[test]
    fn en_passant_and_counters_round_trip() {
        let fen = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2";
        let board: Board = fen.parse().unwrap();
        assert_eq!(board.to_string(), fen);
        assert_eq!(board.en_passant(), Some(Square::from_algebraic("c6").unwrap()));
    }

    #[test]
    fn sparse_position_round_trips() {
        let fen = "4k3/4Q3/4K3/8/8/8/8/8 w - - 0 1";
        let board: Board = fen.parse().unwrap();
        assert_eq!(board.to_string(), fen);
    }

    #[test]
    fn rejects_malformed_fens() {
        assert!(matches!(
            "8/8/8/8 w - - 0 1".parse::<Board>(),
            Err(FenError::FieldCount { .. })
        ));
        assert!(matches!(
            "9/8/8/8/8/8/8/8 w - - 0 1".parse::<Board>(),
            Err(FenError::PieceChar('9'))
        ));
        assert!(matches!(
            "8/8/8/8/8/8/8/8 w - - 0 1".parse::<Board>(),
            Err(FenError::KingCount)
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1".parse::<Board>(),
            Err(FenError::Color(_))
        ));
        assert!(matches!(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w XQkq - 0 1".parse::<Board>(),
            Err(FenError::Castling(_))
        ));
    }
}
