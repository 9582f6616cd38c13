//! Static evaluation over an incrementally maintained accumulator.

mod accumulator;
mod pst;
mod score;

use sable_core::Color;

pub use accumulator::Accumulator;

/// Evaluate a position from the side-to-move's perspective, in centipawns.
///
/// The accumulator must be consistent with the position being evaluated;
/// the search guarantees this by keeping one accumulator per ply.
#[inline]
pub fn evaluate(acc: &Accumulator, side_to_move: Color) -> i32 {
    let white = acc.white_score();
    match side_to_move {
        Color::White => white,
        Color::Black => -white,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::Board;

    #[test]
    fn perspective_flips_sign() {
        let board: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        let acc = Accumulator::refresh(&board);
        let white_view = evaluate(&acc, Color::White);
        let black_view = evaluate(&acc, Color::Black);
        assert!(white_view > 0, "White is a queen up");
        assert_eq!(white_view, -black_view);
    }

    #[test]
    fn material_advantage_dominates() {
        let board: Board = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        let acc = Accumulator::refresh(&board);
        assert!(evaluate(&acc, Color::White) > 700);
    }
}
