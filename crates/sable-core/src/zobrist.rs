//! Zobrist keys for position hashing.

use crate::board::Board;
use crate::color::Color;
use crate::piece::{Piece, PieceKind};

const SEED: u64 = 0xE926_42A4_5BA1_0D3C;

/// SplitMix64 step, usable in const context.
const fn splitmix64(state: u64) -> (u64, u64) {
    let next = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = next;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31), next)
}

/// Generate `N` keys starting after `skip` draws from the shared stream.
const fn keys<const N: usize>(skip: usize) -> [u64; N] {
    let mut state = SEED;
    let mut i = 0;
    while i < skip {
        let (_, next) = splitmix64(state);
        state = next;
        i += 1;
    }
    let mut table = [0u64; N];
    let mut k = 0;
    while k < N {
        let (val, next) = splitmix64(state);
        table[k] = val;
        state = next;
        k += 1;
    }
    table
}

/// One key per (piece, square), indexed `[Piece::index()][Square::index()]`.
static PIECE_SQUARE: [[u64; 64]; 12] = {
    let flat: [u64; 768] = keys(0);
    let mut table = [[0u64; 64]; 12];
    let mut p = 0;
    while p < 12 {
        let mut s = 0;
        while s < 64 {
            table[p][s] = flat[p * 64 + s];
            s += 1;
        }
        p += 1;
    }
    table
};

/// Key XORed in when Black is to move.
static SIDE_TO_MOVE: u64 = keys::<1>(768)[0];

/// Keys indexed by the raw castling-rights mask (0..16).
static CASTLING: [u64; 16] = keys(769);

/// Keys indexed by en-passant file (0..8).
static EN_PASSANT_FILE: [u64; 8] = keys(785);

/// Key contribution of a piece standing on a square.
#[inline]
pub(crate) fn piece_key(piece: Piece, sq: usize) -> u64 {
    PIECE_SQUARE[piece.index()][sq]
}

/// Key contribution of the side to move.
#[inline]
pub(crate) fn side_key() -> u64 {
    SIDE_TO_MOVE
}

/// Key contribution of a castling-rights mask.
#[inline]
pub(crate) fn castling_key(bits: u8) -> u64 {
    CASTLING[bits as usize]
}

/// Key contribution of an en-passant file.
#[inline]
pub(crate) fn en_passant_key(file: u8) -> u64 {
    EN_PASSANT_FILE[file as usize]
}

/// Recompute the full hash of a board from scratch.
pub(crate) fn full_hash(board: &Board) -> u64 {
    let mut hash = 0u64;
    for color in Color::ALL {
        for kind in PieceKind::ALL {
            let piece = Piece::new(kind, color);
            for sq in board.pieces(kind) & board.side(color) {
                hash ^= piece_key(piece, sq.index());
            }
        }
    }
    if board.side_to_move() == Color::Black {
        hash ^= side_key();
    }
    hash ^= castling_key(board.castling().bits());
    if let Some(ep) = board.en_passant() {
        hash ^= en_passant_key(ep.file());
    }
    hash
}
