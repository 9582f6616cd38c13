//! Fail-soft negamax alpha-beta search.

use sable_core::{Board, Move, MoveKind, Promotion};

use crate::eval::evaluate;
use crate::search::context::SearchContext;
use crate::search::pv::PvLine;
use crate::search::quiescence::quiescence;
use crate::search::selector::MoveSelector;
use crate::search::tt::Bound;
use crate::search::{CHECKMATE, DRAW, INFINITE};

/// How a node relates to the principal variation. Root and PV nodes search
/// with a full window and collect the PV; non-PV nodes prune harder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Root,
    Pv,
    NonPv,
}

impl NodeKind {
    #[inline]
    fn is_pv(self) -> bool {
        self != NodeKind::NonPv
    }
}

/// A move that can rescue a position hovering below alpha: a capture, an
/// en passant, or a queen promotion. Everything else is futility-prunable.
fn is_interesting(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.to()).is_some()
        || mv.kind() == MoveKind::EnPassant
        || (mv.kind() == MoveKind::Promotion && mv.promotion_target() == Promotion::Queen)
}

/// Margin for reverse futility and futility pruning.
fn futility_margin(depth: u8) -> i32 {
    150 * depth as i32
}

/// Fail-soft alpha-beta. Returns the best score found, which may lie
/// outside the `[alpha, beta]` window.
///
/// `pv[0]` receives this node's best line; `pv[1..]` is scratch space for
/// the subtree.
pub(crate) fn alpha_beta(
    ctx: &mut SearchContext,
    mut alpha: i32,
    beta: i32,
    depth: u8,
    node: NodeKind,
    pv: &mut [PvLine],
) -> i32 {
    let (line, children) = pv.split_first_mut().expect("one pv line per ply");
    // Reset before anything can return early, so stale moves from a prior
    // iteration never leak into the reported line.
    line.clear();

    if depth == 0 {
        return quiescence(ctx, alpha, beta);
    }

    ctx.nodes += 1;

    if (node != NodeKind::Root && ctx.board.is_draw()) || ctx.out_of_time() {
        return DRAW;
    }

    let is_pv = node.is_pv();
    let hash = ctx.board.hash();
    let tt_entry = ctx.tt.probe(hash, ctx.ply);
    let mut tt_move = Move::NONE;
    if let Some(entry) = &tt_entry {
        if !is_pv && entry.depth >= depth {
            match entry.bound {
                Bound::Exact => return entry.score,
                Bound::Lower if entry.score >= beta => return entry.score,
                Bound::Upper if entry.score <= alpha => return entry.score,
                _ => {}
            }
        }
        tt_move = entry.mv;
    }

    let in_check = ctx.board.in_check();
    // Inside check the static evaluation is meaningless; a TT hit donates
    // its recorded evaluation otherwise.
    let static_eval = if in_check {
        -INFINITE
    } else if let Some(entry) = &tt_entry {
        entry.eval
    } else {
        evaluate(ctx.accumulator(), ctx.board.side_to_move())
    };

    // Null move pruning: hand the opponent a free move; if they still
    // cannot reach beta the position is good enough to cut. Skipped without
    // non-pawn material, where zugzwang makes the bet unsound.
    if !is_pv
        && !in_check
        && depth > 3
        && static_eval >= beta
        && ctx.board.has_non_pawn_material(ctx.board.side_to_move())
    {
        let undo = ctx.push_null();
        let score = -alpha_beta(ctx, -beta, -beta + 1, depth - 4, NodeKind::NonPv, children);
        ctx.pop_null(undo);
        if score >= beta {
            return score;
        }
    }

    // Reverse futility pruning
    if !is_pv && !in_check && static_eval - futility_margin(depth) >= beta {
        return static_eval;
    }

    let mut selector = MoveSelector::new(&ctx.board, tt_move);
    let mut legal_moves = 0u32;
    let mut best_score = -INFINITE;
    let mut best_move = Move::NONE;
    let old_alpha = alpha;

    while let Some(mv) = selector.next() {
        if !ctx.board.is_legal(mv) {
            continue;
        }
        legal_moves += 1;

        // The first move of a PV node is searched as PV; everything else is
        // expected to fail low.
        let expected_non_pv = !is_pv || legal_moves > 1;

        // Futility pruning near the horizon
        if expected_non_pv
            && depth < 4
            && !in_check
            && !is_interesting(&ctx.board, mv)
            && static_eval + futility_margin(depth) <= alpha
        {
            continue;
        }

        // Late move reductions, constant schedule
        let reduction = if legal_moves > 1 && depth > 1 { 2 } else { 1 };

        let undo = ctx.push_move(mv);

        // Principal variation search: null window first, full-window
        // re-search when the null window fails high in a PV node.
        let mut score = 0;
        if expected_non_pv {
            score = -alpha_beta(
                ctx,
                -alpha - 1,
                -alpha,
                depth - reduction,
                NodeKind::NonPv,
                children,
            );
        }
        if is_pv && (legal_moves == 1 || score > alpha) {
            score = -alpha_beta(ctx, -beta, -alpha, depth - 1, NodeKind::Pv, children);
        }

        ctx.pop_move(mv, undo);

        if score > best_score {
            if score > alpha {
                if score >= beta {
                    if !ctx.stop {
                        ctx.tt
                            .store(hash, mv, depth, Bound::Lower, score, static_eval, ctx.ply);
                    }
                    return score;
                }
                line.extend(mv, &children[0]);
                alpha = score;
            }
            best_score = score;
            best_move = mv;
        }
    }

    // No legal moves: mate or stalemate
    if legal_moves == 0 {
        best_score = if in_check {
            -CHECKMATE + ctx.ply as i32
        } else {
            DRAW
        };
    }

    if !ctx.stop {
        // Every move may have been pruned; fall back to the static eval so
        // the entry still carries usable information.
        let stored = if best_score == -INFINITE {
            static_eval
        } else {
            best_score
        };
        let bound = if best_score > old_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        ctx.tt
            .store(hash, best_move, depth, bound, stored, static_eval, ctx.ply);
    }

    best_score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::pv::PvStack;
    use crate::search::tt::TranspositionTable;

    fn search_fen(fen: &str, depth: u8) -> (i32, Vec<Move>, usize) {
        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(fen.parse::<Board>().unwrap(), &tt, None);
        let mut pv = PvStack::new();
        let score = alpha_beta(
            &mut ctx,
            -INFINITE,
            INFINITE,
            depth,
            NodeKind::Root,
            pv.as_mut_slice(),
        );
        (score, pv.root().moves().to_vec(), ctx.ply)
    }

    #[test]
    fn mate_in_one_found_at_depth_1() {
        // Back-rank mate: Re8#
        let (score, pv, ply) = search_fen("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", 1);
        assert_eq!(score, CHECKMATE - 1);
        assert_eq!(pv[0].to_uci(), "e1e8");
        assert_eq!(ply, 0);
    }

    #[test]
    fn stalemate_scores_draw() {
        // Black to move has no legal moves and is not in check
        let (score, pv, _) = search_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 1);
        assert_eq!(score, DRAW);
        assert!(pv.is_empty(), "no PV in a stalemate");
    }

    #[test]
    fn mated_side_sees_negative_mate_score() {
        // Black to move is already checkmated
        let (score, pv, _) = search_fen("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1", 2);
        assert_eq!(score, -CHECKMATE);
        assert!(pv.is_empty());
    }

    #[test]
    fn wins_hanging_queen_at_depth_2() {
        let (score, pv, _) = search_fen("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1", 2);
        assert!(score > 500, "should win the queen, got {score}");
        assert_eq!(pv[0].to_uci(), "d1d5");
    }

    #[test]
    fn pv_is_a_playable_line() {
        let (_, pv, _) = search_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            4,
        );
        assert!(pv.len() >= 2, "depth-4 PV should have at least 2 moves");
        let mut board = Board::starting_position();
        for mv in &pv {
            let mut found = false;
            let mut selector = MoveSelector::new(&board, Move::NONE);
            while let Some(cand) = selector.next() {
                if cand == *mv && board.is_legal(cand) {
                    found = true;
                    break;
                }
            }
            assert!(found, "PV move {mv} is not legal in its position");
            board.make_move(*mv);
        }
    }

    #[test]
    fn repeated_position_scores_draw_at_non_root_node() {
        use sable_core::Square;

        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(Board::starting_position(), &tt, None);
        let cycle = [
            Move::normal(Square::G1, Square::from_coords(5, 2)),
            Move::normal(Square::G8, Square::from_coords(5, 5)),
            Move::normal(Square::from_coords(5, 2), Square::G1),
            Move::normal(Square::from_coords(5, 5), Square::G8),
        ];
        for _ in 0..2 {
            for mv in cycle {
                ctx.board.make_move(mv);
            }
        }
        assert!(ctx.board.is_draw(), "threefold cycle completed");

        let mut pv = PvStack::new();
        let score = alpha_beta(
            &mut ctx,
            -INFINITE,
            INFINITE,
            3,
            NodeKind::Pv,
            pv.as_mut_slice(),
        );
        assert_eq!(score, DRAW, "non-root node returns the draw immediately");
    }

    #[test]
    fn deeper_search_from_losing_position_stays_sound() {
        // Black is a queen down; depth 3 with all pruning enabled must
        // still return a sane (negative for Black) score.
        let (score, _, ply) = search_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1", 3);
        assert!(score < -500, "got {score}");
        assert_eq!(ply, 0);
    }
}
