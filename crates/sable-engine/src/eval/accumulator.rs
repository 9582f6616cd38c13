//! Incrementally maintained evaluation accumulator, one per ply.

use sable_core::{Board, Color, Move, MoveKind, PieceKind};

use super::pst::{piece_value, MAX_PHASE, PHASE_WEIGHT};
use super::score::Score;

/// Running material + piece-square totals for a position.
///
/// The accumulator is plain copyable data: the search keeps a stack of
/// them indexed by ply, copies the parent into the child slot, and applies
/// the move's deltas with [`Accumulator::apply`] *before* the move is made
/// on the board. [`Accumulator::refresh`] rebuilds one from scratch and is
/// the ground truth the incremental path must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulator {
    /// White-perspective score total.
    score: Score,
    /// Remaining non-pawn material, clamped to [`MAX_PHASE`] at use.
    phase: i32,
}

impl Accumulator {
    /// Full recompute from the board.
    pub fn refresh(board: &Board) -> Accumulator {
        let mut acc = Accumulator::default();
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for sq in board.pieces(kind) & board.side(color) {
                    acc.add(color, kind, sq);
                }
            }
        }
        acc
    }

    #[inline]
    fn add(&mut self, color: Color, kind: PieceKind, sq: sable_core::Square) {
        let value = piece_value(color, kind, sq);
        match color {
            Color::White => self.score += value,
            Color::Black => self.score -= value,
        }
        self.phase += PHASE_WEIGHT[kind.index()];
    }

    #[inline]
    fn remove(&mut self, color: Color, kind: PieceKind, sq: sable_core::Square) {
        let value = piece_value(color, kind, sq);
        match color {
            Color::White => self.score -= value,
            Color::Black => self.score += value,
        }
        self.phase -= PHASE_WEIGHT[kind.index()];
    }

    /// Apply the deltas of `mv`, which must not have been made on `board` yet.
    pub fn apply(&mut self, board: &Board, mv: Move) {
        let us = board.side_to_move();
        let them = !us;
        let from = mv.from();
        let to = mv.to();

        match mv.kind() {
            MoveKind::Normal => {
                let kind = board.piece_on(from).expect("move source is occupied");
                if let Some(victim) = board.piece_on(to) {
                    self.remove(them, victim, to);
                }
                self.remove(us, kind, from);
                self.add(us, kind, to);
            }
            MoveKind::Promotion => {
                if let Some(victim) = board.piece_on(to) {
                    self.remove(them, victim, to);
                }
                self.remove(us, PieceKind::Pawn, from);
                self.add(us, mv.promotion_target().piece_kind(), to);
            }
            MoveKind::EnPassant => {
                self.remove(them, PieceKind::Pawn, to.offset(-us.pawn_push()));
                self.remove(us, PieceKind::Pawn, from);
                self.add(us, PieceKind::Pawn, to);
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = match to.file() {
                    6 => (to.offset(1), to.offset(-1)),
                    _ => (to.offset(-2), to.offset(1)),
                };
                self.remove(us, PieceKind::King, from);
                self.add(us, PieceKind::King, to);
                self.remove(us, PieceKind::Rook, rook_from);
                self.add(us, PieceKind::Rook, rook_to);
            }
        }
    }

    /// White-perspective tapered total.
    #[inline]
    pub(crate) fn white_score(&self) -> i32 {
        self.score.taper(self.phase.min(MAX_PHASE), MAX_PHASE)
    }
}
