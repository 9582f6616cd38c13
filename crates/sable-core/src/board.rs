//! The chess position: piece placement, game state, and make/undo.

use std::fmt;

use crate::attacks;
use crate::bitboard::Bitboard;
use crate::castling::CastleRights;
use crate::color::Color;
use crate::moves::{Move, MoveKind};
use crate::piece::{Piece, PieceKind};
use crate::square::Square;
use crate::zobrist;

/// Castling rights cleared when a move touches each square.
static CASTLE_MASK: [u8; 64] = {
    let mut mask = [0u8; 64];
    mask[Square::A1.index()] = CastleRights::WHITE_QUEENSIDE;
    mask[Square::E1.index()] = CastleRights::WHITE_KINGSIDE | CastleRights::WHITE_QUEENSIDE;
    mask[Square::H1.index()] = CastleRights::WHITE_KINGSIDE;
    mask[Square::A8.index()] = CastleRights::BLACK_QUEENSIDE;
    mask[Square::E8.index()] = CastleRights::BLACK_KINGSIDE | CastleRights::BLACK_QUEENSIDE;
    mask[Square::H8.index()] = CastleRights::BLACK_KINGSIDE;
    mask
};

/// State required to take back a move.
#[derive(Debug, Clone, Copy)]
pub struct Undo {
    captured: Option<PieceKind>,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    hash: u64,
}

/// A complete chess position with enough history for repetition detection.
///
/// Moves are applied in place: [`Board::make_move`] returns an [`Undo`]
/// record and [`Board::undo_move`] restores the prior position exactly,
/// including the Zobrist hash and the key history.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    pieces: [Bitboard; PieceKind::COUNT],
    sides: [Bitboard; Color::COUNT],
    side_to_move: Color,
    castling: CastleRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    hash: u64,
    /// Zobrist keys of every earlier position, most recent last.
    history: Vec<u64>,
}

impl Board {
    /// The standard starting position.
    pub fn starting_position() -> Board {
        crate::fen::STARTING_FEN
            .parse()
            .expect("starting FEN is valid")
    }

    /// Assemble a board from parsed FEN fields. The hash is computed here.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        pieces: [Bitboard; PieceKind::COUNT],
        sides: [Bitboard; Color::COUNT],
        side_to_move: Color,
        castling: CastleRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) -> Board {
        let mut board = Board {
            pieces,
            sides,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            hash: 0,
            history: Vec::new(),
        };
        board.hash = zobrist::full_hash(&board);
        board
    }

    /// Bitboard of the given piece kind, both colors.
    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// Bitboard of all pieces of one side.
    #[inline]
    pub fn side(&self, color: Color) -> Bitboard {
        self.sides[color.index()]
    }

    /// Bitboard of all occupied squares.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.sides[0] | self.sides[1]
    }

    /// The piece kind on `sq`, if any.
    pub fn piece_on(&self, sq: Square) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces[kind.index()].contains(sq))
    }

    /// The color of the piece on `sq`, if any.
    pub fn color_on(&self, sq: Square) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|&color| self.sides[color.index()].contains(sq))
    }

    /// The king square of the given side.
    pub fn king_square(&self, color: Color) -> Square {
        (self.pieces[PieceKind::King.index()] & self.sides[color.index()])
            .first()
            .expect("each side has exactly one king")
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastleRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Zobrist key of the current position.
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn put_piece(&mut self, color: Color, kind: PieceKind, sq: Square) {
        let bb = sq.bb();
        self.pieces[kind.index()] |= bb;
        self.sides[color.index()] |= bb;
        self.hash ^= zobrist::piece_key(Piece::new(kind, color), sq.index());
    }

    #[inline]
    fn remove_piece(&mut self, color: Color, kind: PieceKind, sq: Square) {
        let bb = sq.bb();
        self.pieces[kind.index()] ^= bb;
        self.sides[color.index()] ^= bb;
        self.hash ^= zobrist::piece_key(Piece::new(kind, color), sq.index());
    }

    /// Apply a pseudo-legal move. Legality is the caller's concern.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let us = self.side_to_move;
        let them = !us;
        let from = mv.from();
        let to = mv.to();

        let mut undo = Undo {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };
        self.history.push(self.hash);

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.halfmove_clock += 1;

        match mv.kind() {
            MoveKind::Normal => {
                let kind = self.piece_on(from).expect("move source is occupied");
                if let Some(victim) = self.piece_on(to) {
                    self.remove_piece(them, victim, to);
                    undo.captured = Some(victim);
                    self.halfmove_clock = 0;
                }
                self.remove_piece(us, kind, from);
                self.put_piece(us, kind, to);
                if kind == PieceKind::Pawn {
                    self.halfmove_clock = 0;
                    let delta = to.index() as i8 - from.index() as i8;
                    if delta == 16 || delta == -16 {
                        let ep = from.offset(us.pawn_push());
                        self.en_passant = Some(ep);
                        self.hash ^= zobrist::en_passant_key(ep.file());
                    }
                }
            }
            MoveKind::Promotion => {
                if let Some(victim) = self.piece_on(to) {
                    self.remove_piece(them, victim, to);
                    undo.captured = Some(victim);
                }
                self.remove_piece(us, PieceKind::Pawn, from);
                self.put_piece(us, mv.promotion_target().piece_kind(), to);
                self.halfmove_clock = 0;
            }
            MoveKind::EnPassant => {
                let victim_sq = to.offset(-us.pawn_push());
                self.remove_piece(them, PieceKind::Pawn, victim_sq);
                self.remove_piece(us, PieceKind::Pawn, from);
                self.put_piece(us, PieceKind::Pawn, to);
                self.halfmove_clock = 0;
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                self.remove_piece(us, PieceKind::King, from);
                self.put_piece(us, PieceKind::King, to);
                self.remove_piece(us, PieceKind::Rook, rook_from);
                self.put_piece(us, PieceKind::Rook, rook_to);
            }
        }

        let cleared = CASTLE_MASK[from.index()] | CASTLE_MASK[to.index()];
        if cleared != 0 {
            self.hash ^= zobrist::castling_key(self.castling.bits());
            self.castling = self.castling.without(cleared);
            self.hash ^= zobrist::castling_key(self.castling.bits());
        }

        self.side_to_move = them;
        self.hash ^= zobrist::side_key();
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        undo
    }

    /// Take back a move applied by [`Board::make_move`].
    pub fn undo_move(&mut self, mv: Move, undo: Undo) {
        let us = !self.side_to_move;
        let them = self.side_to_move;
        let from = mv.from();
        let to = mv.to();

        match mv.kind() {
            MoveKind::Normal => {
                let kind = self.piece_on(to).expect("move destination is occupied");
                self.remove_piece(us, kind, to);
                self.put_piece(us, kind, from);
                if let Some(victim) = undo.captured {
                    self.put_piece(them, victim, to);
                }
            }
            MoveKind::Promotion => {
                self.remove_piece(us, mv.promotion_target().piece_kind(), to);
                self.put_piece(us, PieceKind::Pawn, from);
                if let Some(victim) = undo.captured {
                    self.put_piece(them, victim, to);
                }
            }
            MoveKind::EnPassant => {
                self.remove_piece(us, PieceKind::Pawn, to);
                self.put_piece(us, PieceKind::Pawn, from);
                self.put_piece(them, PieceKind::Pawn, to.offset(-us.pawn_push()));
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                self.remove_piece(us, PieceKind::King, to);
                self.put_piece(us, PieceKind::King, from);
                self.remove_piece(us, PieceKind::Rook, rook_to);
                self.put_piece(us, PieceKind::Rook, rook_from);
            }
        }

        self.side_to_move = us;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
        self.history.pop();
    }

    /// Pass the turn to the opponent without moving.
    pub fn make_null_move(&mut self) -> Undo {
        let undo = Undo {
            captured: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };
        self.history.push(self.hash);
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= zobrist::en_passant_key(ep.file());
        }
        self.side_to_move = !self.side_to_move;
        self.hash ^= zobrist::side_key();
        undo
    }

    /// Take back a null move.
    pub fn undo_null_move(&mut self, undo: Undo) {
        self.side_to_move = !self.side_to_move;
        self.en_passant = undo.en_passant;
        self.hash = undo.hash;
        self.history.pop();
    }

    /// Whether `sq` is attacked by any piece of `by`.
    pub fn is_attacked(&self, sq: Square, by: Color) -> bool {
        let them = self.sides[by.index()];
        let occupied = self.occupied();
        if (attacks::knight_attacks(sq) & them & self.pieces(PieceKind::Knight)).any() {
            return true;
        }
        if (attacks::king_attacks(sq) & them & self.pieces(PieceKind::King)).any() {
            return true;
        }
        // A pawn of `by` attacks sq iff sq attacks it as a pawn of the other side
        if (attacks::pawn_attacks(!by, sq) & them & self.pieces(PieceKind::Pawn)).any() {
            return true;
        }
        let rooks = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        if (attacks::rook_attacks(sq, occupied) & them & rooks).any() {
            return true;
        }
        let bishops = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        (attacks::bishop_attacks(sq, occupied) & them & bishops).any()
    }

    /// Bitboard of enemy pieces giving check to the side to move.
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        let them = !us;
        let sq = self.king_square(us);
        let occupied = self.occupied();
        let their = self.sides[them.index()];

        let mut checkers = attacks::knight_attacks(sq) & their & self.pieces(PieceKind::Knight);
        checkers |= attacks::pawn_attacks(us, sq) & their & self.pieces(PieceKind::Pawn);
        let rooks = self.pieces(PieceKind::Rook) | self.pieces(PieceKind::Queen);
        checkers |= attacks::rook_attacks(sq, occupied) & their & rooks;
        let bishops = self.pieces(PieceKind::Bishop) | self.pieces(PieceKind::Queen);
        checkers |= attacks::bishop_attacks(sq, occupied) & their & bishops;
        checkers
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers().any()
    }

    /// Whether a generated pseudo-legal move leaves the mover's king safe.
    ///
    /// Applies the move, inspects the king, and takes it back. Moves not
    /// produced by [`generate_moves`](crate::movegen::generate_moves) for
    /// this position have undefined results.
    pub fn is_legal(&mut self, mv: Move) -> bool {
        let us = self.side_to_move;
        let undo = self.make_move(mv);
        let legal = !self.is_attacked(self.king_square(us), self.side_to_move);
        self.undo_move(mv, undo);
        legal
    }

    /// Fifty-move rule, threefold repetition, or insufficient material.
    pub fn is_draw(&self) -> bool {
        if self.halfmove_clock >= 100 {
            return true;
        }
        if self.insufficient_material() {
            return true;
        }
        // Threefold: this position occurred at least twice before. Only
        // positions since the last irreversible move can repeat.
        let window = (self.halfmove_clock as usize).min(self.history.len());
        let mut seen = 0;
        for &key in self.history.iter().rev().take(window) {
            if key == self.hash {
                seen += 1;
                if seen >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// Neither side can deliver mate: no pawns or major pieces, and at most
    /// one minor piece per side.
    pub fn insufficient_material(&self) -> bool {
        let majors_or_pawns = self.pieces(PieceKind::Pawn)
            | self.pieces(PieceKind::Rook)
            | self.pieces(PieceKind::Queen);
        if majors_or_pawns.any() {
            return false;
        }
        let minors = self.pieces(PieceKind::Knight) | self.pieces(PieceKind::Bishop);
        (minors & self.side(Color::White)).count() <= 1
            && (minors & self.side(Color::Black)).count() <= 1
    }

    /// Whether the given side has any piece besides pawns and the king.
    ///
    /// Used as the zugzwang gate for null-move pruning.
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let pieces = self.pieces(PieceKind::Knight)
            | self.pieces(PieceKind::Bishop)
            | self.pieces(PieceKind::Rook)
            | self.pieces(PieceKind::Queen);
        (pieces & self.side(color)).any()
    }
}

/// Rook from/to squares for a castle move, keyed by the king destination.
fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        Square::G1 => (Square::H1, Square::F1),
        Square::C1 => (Square::A1, Square::D1),
        Square::G8 => (Square::H8, Square::F8),
        Square::C8 => (Square::A8, Square::D8),
        _ => unreachable!("castle moves always target G1/C1/G8/C8"),
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\"{self}\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{generate_moves, GenKind, MoveList};

    fn all_moves(board: &Board) -> MoveList {
        let mut list = MoveList::new();
        generate_moves(board, GenKind::Captures, &mut list);
        generate_moves(board, GenKind::Quiets, &mut list);
        list
    }

    #[test]
    fn starting_position_basics() {
        let board = Board::starting_position();
        assert_eq!(board.side_to_move(), Color::White);
        assert_eq!(board.occupied().count(), 32);
        assert_eq!(board.king_square(Color::White), Square::E1);
        assert_eq!(board.king_square(Color::Black), Square::E8);
        assert!(!board.in_check());
    }

    #[test]
    fn make_undo_restores_position_exactly() {
        let mut board = Board::starting_position();
        let before = board.clone();
        for i in 0..all_moves(&board).len() {
            let mv = all_moves(&board)[i];
            if !board.is_legal(mv) {
                continue;
            }
            let undo = board.make_move(mv);
            board.undo_move(mv, undo);
            assert_eq!(board, before, "make/undo of {mv} did not restore the position");
        }
    }

    #[test]
    fn make_undo_restores_en_passant_and_castling() {
        // Position with both an EP square and full castling rights
        let mut board: Board = "r3k2r/pppppppp/8/3P4/8/8/PPP1PPPP/R3K2R b KQkq - 0 1"
            .parse()
            .unwrap();
        let before = board.clone();
        for i in 0..all_moves(&board).len() {
            let mv = all_moves(&board)[i];
            if !board.is_legal(mv) {
                continue;
            }
            let undo = board.make_move(mv);
            board.undo_move(mv, undo);
            assert_eq!(board, before, "make/undo of {mv} lost state");
        }
    }

    #[test]
    fn hash_changes_and_restores_across_moves() {
        let mut board = Board::starting_position();
        let h0 = board.hash();
        let mv = Move::normal(Square::E2, Square::E4);
        let undo = board.make_move(mv);
        assert_ne!(board.hash(), h0);
        assert_eq!(board.hash(), crate::zobrist::full_hash(&board));
        board.undo_move(mv, undo);
        assert_eq!(board.hash(), h0);
    }

    #[test]
    fn null_move_flips_side_and_restores() {
        let mut board = Board::starting_position();
        let before = board.clone();
        let undo = board.make_null_move();
        assert_eq!(board.side_to_move(), Color::Black);
        assert_eq!(board.hash(), crate::zobrist::full_hash(&board));
        board.undo_null_move(undo);
        assert_eq!(board, before);
    }

    #[test]
    fn castling_moves_rook() {
        let mut board: Board = "4k3/8/8/8/8/8/8/4K2R w K - 0 1".parse().unwrap();
        let mv = Move::castle(Square::E1, Square::G1);
        board.make_move(mv);
        assert_eq!(board.piece_on(Square::G1), Some(PieceKind::King));
        assert_eq!(board.piece_on(Square::F1), Some(PieceKind::Rook));
        assert_eq!(board.piece_on(Square::H1), None);
        assert!(!board.castling().kingside(Color::White));
    }

    #[test]
    fn en_passant_removes_victim() {
        let mut board: Board = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1".parse().unwrap();
        let mv = Move::en_passant(Square::E5, Square::from_coords(3, 5));
        board.make_move(mv);
        assert_eq!(board.piece_on(Square::D5), None, "captured pawn removed");
        assert_eq!(
            board.piece_on(Square::from_coords(3, 5)),
            Some(PieceKind::Pawn)
        );
    }

    #[test]
    fn rook_capture_revokes_castling() {
        let mut board: Board = "r3k3/8/8/8/8/8/8/R3K3 w Qq - 0 1".parse().unwrap();
        // Rxa8 removes black's queenside right along with the rook
        let mv = Move::normal(Square::A1, Square::A8);
        board.make_move(mv);
        assert!(!board.castling().queenside(Color::Black));
        assert!(!board.castling().queenside(Color::White));
    }

    #[test]
    fn threefold_repetition_detected() {
        let mut board = Board::starting_position();
        let sequence = [
            Move::normal(Square::G1, Square::from_coords(5, 2)), // Nf3
            Move::normal(Square::G8, Square::from_coords(5, 5)), // Nf6
            Move::normal(Square::from_coords(5, 2), Square::G1), // Ng1
            Move::normal(Square::from_coords(5, 5), Square::G8), // Ng8
        ];
        assert!(!board.is_draw());
        for _ in 0..2 {
            for mv in sequence {
                board.make_move(mv);
            }
        }
        assert!(board.is_draw(), "position repeated three times");
    }

    #[test]
    fn fifty_move_rule() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 100 80".parse().unwrap();
        assert!(board.is_draw());
    }

    #[test]
    fn insufficient_material_cases() {
        let kk: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        assert!(kk.insufficient_material());
        let kbk: Board = "4k3/8/8/8/8/8/8/2B1K3 w - - 0 1".parse().unwrap();
        assert!(kbk.insufficient_material());
        let kpk: Board = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".parse().unwrap();
        assert!(!kpk.insufficient_material());
        let kbbk: Board = "4k3/8/8/8/8/8/8/1BB1K3 w - - 0 1".parse().unwrap();
        assert!(!kbbk.insufficient_material());
    }

    #[test]
    fn non_pawn_material_gate() {
        let board: Board = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1".parse().unwrap();
        assert!(!board.has_non_pawn_material(Color::White));
        let board: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        assert!(board.has_non_pawn_material(Color::White));
    }

    #[test]
    fn checkers_identifies_attacker() {
        let board: Board = "4k3/8/8/8/8/8/4r3/4K3 w - - 0 1".parse().unwrap();
        assert!(board.in_check());
        assert_eq!(board.checkers().count(), 1);
        assert_eq!(board.checkers().first(), Some(Square::E2));
    }

    #[test]
    fn pinned_piece_is_illegal_to_move_away() {
        // Knight on e2 pinned against the king by the rook on e8
        let mut board: Board = "4r2k/8/8/8/8/8/4N3/4K3 w - - 0 1".parse().unwrap();
        let mv = Move::normal(Square::E2, Square::from_coords(2, 2)); // Nc3
        assert!(!board.is_legal(mv));
    }
}
