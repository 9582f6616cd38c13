//! End-to-end searches through the public API.

use std::time::Duration;

use sable_core::Board;
use sable_engine::{
    is_mate_score, search_to_time, RootMove, SearchContext, TranspositionTable, CHECKMATE, DRAW,
};

fn search(fen: &str, depth: u8, tt: &TranspositionTable) -> RootMove {
    let mut ctx = SearchContext::new(fen.parse::<Board>().unwrap(), tt, None);
    ctx.max_depth = depth;
    search_to_time(&mut ctx, |_| {})
}

#[test]
fn mate_in_one_is_found_and_scored() {
    let tt = TranspositionTable::new(4);
    let best = search("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", 4, &tt);
    assert_eq!(best.mv.to_uci(), "e1e8");
    assert_eq!(best.score, CHECKMATE - 1);
}

#[test]
fn stalemate_returns_draw_with_no_best_move() {
    let tt = TranspositionTable::new(4);
    let best = search("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4, &tt);
    assert_eq!(best.score, DRAW);
    assert!(best.mv.is_none());
}

#[test]
fn free_queen_is_taken() {
    let tt = TranspositionTable::new(4);
    let best = search("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1", 4, &tt);
    assert_eq!(best.mv.to_uci(), "d1d5");
    assert!(best.score > 500);
}

#[test]
fn deeper_search_keeps_finding_the_mate_through_a_warm_table() {
    // Re-searching with entries from earlier iterations (and an earlier
    // root search) must not corrupt mate distances.
    let tt = TranspositionTable::new(4);
    let first = search("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", 5, &tt);
    tt.bump_age();
    let second = search("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1", 5, &tt);
    assert_eq!(first.mv, second.mv);
    assert_eq!(first.score, CHECKMATE - 1);
    assert_eq!(second.score, CHECKMATE - 1);
}

#[test]
fn timed_search_on_startpos_reports_progress() {
    let tt = TranspositionTable::new(4);
    let mut ctx = SearchContext::new(
        Board::starting_position(),
        &tt,
        Some(Duration::from_millis(150)),
    );
    let mut reports = 0u32;
    let mut last_nodes = 0u64;
    let best = search_to_time(&mut ctx, |report| {
        reports += 1;
        assert!(report.nodes >= last_nodes);
        last_nodes = report.nodes;
        assert!(!report.pv.is_empty());
    });
    assert!(reports >= 1, "at least the depth-1 report arrives in 150ms");
    assert!(best.mv.is_some());
    assert!(!is_mate_score(best.score), "startpos is not a forced mate");
}

#[test]
fn self_play_game_fragment_stays_consistent() {
    // Drive one context through a handful of root moves the way the
    // training driver does.
    let tt = TranspositionTable::new(4);
    let mut ctx = SearchContext::new(Board::starting_position(), &tt, None);
    ctx.max_depth = 3;

    for _ in 0..6 {
        let best = search_to_time(&mut ctx, |_| {});
        assert!(best.mv.is_some());
        assert!(!is_mate_score(best.score));
        ctx.advance_root(best.mv);
        assert_eq!(ctx.ply, 0);
    }
}
