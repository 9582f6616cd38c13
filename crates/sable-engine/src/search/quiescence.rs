//! Quiescence search: resolve tactical sequences before trusting the
//! static evaluation.

use crate::eval::evaluate;
use crate::search::context::{SearchContext, STACK_SIZE};
use crate::search::selector::MoveSelector;
use crate::search::{CHECKMATE, DRAW};

/// Fail-soft quiescence search.
///
/// The stand-pat score bounds what the side to move can claim without
/// capturing; while in check there is no such right, so the bound starts
/// at the mated score and every evasion is searched. Quiescence never
/// writes the transposition table and never checks the clock.
pub(crate) fn quiescence(ctx: &mut SearchContext, mut alpha: i32, beta: i32) -> i32 {
    ctx.nodes += 1;

    if ctx.board.is_draw() {
        return DRAW;
    }

    let in_check = ctx.board.in_check();
    // Stand pat. A stalemate reaching this point is still evaluated
    // statically; only check forces the mated bound.
    let mut best_score = if in_check {
        -CHECKMATE + ctx.ply as i32
    } else {
        evaluate(ctx.accumulator(), ctx.board.side_to_move())
    };

    // Evasion chains are the only unbounded recursion here; cap them at
    // the accumulator stack.
    if ctx.ply + 1 >= STACK_SIZE {
        return best_score;
    }

    if best_score > alpha {
        if best_score >= beta {
            return best_score;
        }
        alpha = best_score;
    }

    let mut selector = MoveSelector::quiescence(&ctx.board, in_check);
    while let Some(mv) = selector.next() {
        if !ctx.board.is_legal(mv) {
            continue;
        }

        let undo = ctx.push_move(mv);
        let score = -quiescence(ctx, -beta, -alpha);
        ctx.pop_move(mv, undo);

        if score > best_score {
            if score > alpha {
                if score >= beta {
                    return score;
                }
                alpha = score;
            }
            best_score = score;
        }
    }

    best_score
}
