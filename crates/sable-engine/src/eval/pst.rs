//! Material values and piece-square tables.
//!
//! Tables are written from White's perspective in LERF order (index 0 = a1,
//! index 63 = h8). Black lookups mirror the square vertically.

use sable_core::{Color, PieceKind, Square};

use super::score::{Score, S};

/// Base material values indexed by [`PieceKind::index()`].
pub const MATERIAL: [Score; PieceKind::COUNT] = [
    S(100, 140), // Pawn
    S(320, 300), // Knight
    S(330, 320), // Bishop
    S(500, 540), // Rook
    S(900, 940), // Queen
    S(0, 0),     // King
];

/// Phase weight contributed by each piece kind (pawns and kings count 0).
pub const PHASE_WEIGHT: [i32; PieceKind::COUNT] = [0, 1, 1, 2, 4, 0];

/// Full non-pawn material complement: 4 minors, 4 rooks, 2 queens.
pub const MAX_PHASE: i32 = 24;

#[rustfmt::skip]
const PAWN: [Score; 64] = [
    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),
    S(2,-4),   S(8,-4),   S(6,-8),   S(-18,-8), S(-18,-8), S(6,-8),   S(8,-4),   S(2,-4),
    S(4,0),    S(-4,0),   S(-8,2),   S(2,4),    S(2,4),    S(-8,2),   S(-4,0),   S(4,0),
    S(0,6),    S(2,6),    S(4,6),    S(18,16),  S(18,16),  S(4,6),    S(2,6),    S(0,6),
    S(6,12),   S(6,12),   S(10,14),  S(22,22),  S(22,22),  S(10,14),  S(6,12),   S(6,12),
    S(12,24),  S(12,24),  S(18,28),  S(26,32),  S(26,32),  S(18,28),  S(12,24),  S(12,24),
    S(80,160), S(80,160), S(80,160), S(80,160), S(80,160), S(80,160), S(80,160), S(80,160),
    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),
];

#[rustfmt::skip]
const KNIGHT: [Score; 64] = [
    S(-48,-44),S(-38,-34),S(-28,-26),S(-28,-24),S(-28,-24),S(-28,-26),S(-38,-34),S(-48,-44),
    S(-36,-32),S(-18,-18),S(-2,-4),  S(4,2),    S(4,2),    S(-2,-4),  S(-18,-18),S(-36,-32),
    S(-28,-26),S(4,-2),   S(10,8),   S(14,12),  S(14,12),  S(10,8),   S(4,-2),   S(-28,-26),
    S(-26,-18),S(2,4),    S(14,14),  S(20,18),  S(20,18),  S(14,14),  S(2,4),    S(-26,-18),
    S(-26,-18),S(6,4),    S(16,14),  S(22,18),  S(22,18),  S(16,14),  S(6,4),    S(-26,-18),
    S(-28,-26),S(2,0),    S(10,8),   S(16,14),  S(16,14),  S(10,8),   S(2,0),    S(-28,-26),
    S(-38,-34),S(-18,-18),S(0,-2),   S(2,2),    S(2,2),    S(0,-2),   S(-18,-18),S(-38,-34),
    S(-48,-44),S(-38,-34),S(-28,-26),S(-28,-24),S(-28,-24),S(-28,-26),S(-38,-34),S(-48,-44),
];

#[rustfmt::skip]
const BISHOP: [Score; 64] = [
    S(-18,-18),S(-8,-10), S(-10,-8), S(-8,-8),  S(-8,-8),  S(-10,-8), S(-8,-10), S(-18,-18),
    S(-8,-8),  S(6,-2),   S(0,0),    S(2,0),    S(2,0),    S(0,0),    S(6,-2),   S(-8,-8),
    S(-8,-6),  S(6,4),    S(6,4),    S(6,6),    S(6,6),    S(6,4),    S(6,4),    S(-8,-6),
    S(-8,-4),  S(4,0),    S(6,6),    S(12,10),  S(12,10),  S(6,6),    S(4,0),    S(-8,-4),
    S(-8,-4),  S(0,0),    S(6,8),    S(12,10),  S(12,10),  S(6,8),    S(0,0),    S(-8,-4),
    S(-8,-4),  S(8,4),    S(2,2),    S(6,6),    S(6,6),    S(2,2),    S(8,4),    S(-8,-4),
    S(-8,-8),  S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(0,0),    S(-8,-8),
    S(-18,-18),S(-8,-10), S(-10,-8), S(-8,-8),  S(-8,-8),  S(-10,-8), S(-8,-10), S(-18,-18),
];

#[rustfmt::skip]
const ROOK: [Score; 64] = [
    S(0,0),    S(0,0),    S(2,4),    S(6,6),    S(6,6),    S(2,4),    S(0,0),    S(0,0),
    S(-4,0),   S(0,4),    S(2,4),    S(2,4),    S(2,4),    S(2,4),    S(0,4),    S(-4,0),
    S(-4,0),   S(0,0),    S(0,2),    S(0,2),    S(0,2),    S(0,2),    S(0,0),    S(-4,0),
    S(-4,0),   S(0,0),    S(0,2),    S(0,2),    S(0,2),    S(0,2),    S(0,0),    S(-4,0),
    S(-4,2),   S(0,2),    S(0,2),    S(0,2),    S(0,2),    S(0,2),    S(0,2),    S(-4,2),
    S(-4,2),   S(0,2),    S(0,4),    S(0,4),    S(0,4),    S(0,4),    S(0,2),    S(-4,2),
    S(6,12),   S(10,12),  S(12,12),  S(12,12),  S(12,12),  S(12,12),  S(10,12),  S(6,12),
    S(2,6),    S(2,6),    S(2,6),    S(2,6),    S(2,6),    S(2,6),    S(2,6),    S(2,6),
];

#[rustfmt::skip]
const QUEEN: [Score; 64] = [
    S(-18,-20),S(-10,-12),S(-8,-8),  S(-4,-6),  S(-4,-6),  S(-8,-8),  S(-10,-12),S(-18,-20),
    S(-8,-10), S(0,-4),   S(2,0),    S(2,0),    S(2,0),    S(2,0),    S(0,-4),   S(-8,-10),
    S(-8,-6),  S(2,0),    S(4,4),    S(4,4),    S(4,4),    S(4,4),    S(2,0),    S(-8,-6),
    S(-4,-2),  S(2,2),    S(4,6),    S(6,8),    S(6,8),    S(4,6),    S(2,2),    S(-4,-2),
    S(-4,-2),  S(2,2),    S(4,6),    S(6,8),    S(6,8),    S(4,6),    S(2,2),    S(-4,-2),
    S(-8,-6),  S(2,0),    S(4,4),    S(4,6),    S(4,6),    S(4,4),    S(2,0),    S(-8,-6),
    S(-8,-10), S(0,-4),   S(2,0),    S(2,2),    S(2,2),    S(2,0),    S(0,-4),   S(-8,-10),
    S(-18,-20),S(-10,-12),S(-8,-8),  S(-4,-6),  S(-4,-6),  S(-8,-8),  S(-10,-12),S(-18,-20),
];

#[rustfmt::skip]
const KING: [Score; 64] = [
    S(24,-40), S(32,-24), S(14,-16), S(-8,-12), S(-8,-12), S(14,-16), S(32,-24), S(24,-40),
    S(14,-20), S(16,-8),  S(-4,0),   S(-18,4),  S(-18,4),  S(-4,0),   S(16,-8),  S(14,-20),
    S(-12,-16),S(-16,2),  S(-20,10), S(-28,14), S(-28,14), S(-20,10), S(-16,2),  S(-12,-16),
    S(-22,-12),S(-26,8),  S(-32,18), S(-40,24), S(-40,24), S(-32,18), S(-26,8),  S(-22,-12),
    S(-28,-10),S(-32,12), S(-38,22), S(-44,28), S(-44,28), S(-38,22), S(-32,12), S(-28,-10),
    S(-30,-10),S(-34,14), S(-38,22), S(-44,26), S(-44,26), S(-38,22), S(-34,14), S(-30,-10),
    S(-32,-16),S(-36,2),  S(-38,12), S(-42,16), S(-42,16), S(-38,12), S(-36,2),  S(-32,-16),
    S(-36,-40),S(-36,-22),S(-38,-14),S(-42,-10),S(-42,-10),S(-38,-14),S(-36,-22),S(-36,-40),
];

const TABLES: [&[Score; 64]; PieceKind::COUNT] =
    [&PAWN, &KNIGHT, &BISHOP, &ROOK, &QUEEN, &KING];

/// Material plus square bonus for a piece of `color` on `sq`, from White's
/// perspective (always positive-leaning for White pieces; callers subtract
/// for Black).
#[inline]
pub fn piece_value(color: Color, kind: PieceKind, sq: Square) -> Score {
    let sq = match color {
        Color::White => sq,
        Color::Black => sq.flip_rank(),
    };
    MATERIAL[kind.index()] + TABLES[kind.index()][sq.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_lookups_are_equal() {
        for kind in PieceKind::ALL {
            for sq in Square::all() {
                assert_eq!(
                    piece_value(Color::White, kind, sq),
                    piece_value(Color::Black, kind, sq.flip_rank()),
                );
            }
        }
    }

    #[test]
    fn central_knight_beats_corner_knight() {
        let center = piece_value(Color::White, PieceKind::Knight, Square::E4);
        let corner = piece_value(Color::White, PieceKind::Knight, Square::A1);
        assert!(center.mg > corner.mg);
        assert!(center.eg > corner.eg);
    }

    #[test]
    fn seventh_rank_pawn_is_nearly_promoted() {
        let seventh = piece_value(Color::White, PieceKind::Pawn, Square::E7);
        let second = piece_value(Color::White, PieceKind::Pawn, Square::E2);
        assert!(seventh.eg > second.eg + 100);
    }
}
